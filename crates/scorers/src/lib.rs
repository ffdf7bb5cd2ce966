//! Concrete recommendation scorers and their shared contract.
//!
//! Four strategies over a shared [`catalog::CatalogSnapshot`]:
//!
//! - [`content::ContentScorer`] — TF-IDF plus numeric-feature similarity
//! - [`collaborative::CollaborativeScorer`] — user-user cosine neighborhoods
//! - [`mood::MoodScorer`] — genre/keyword/sentiment mood fit
//! - [`group::GroupScorer`] — watch-party consensus
//!
//! All of them degrade to popularity ranking when their data runs out, and
//! every ranking breaks score ties by ascending movie id so repeated runs
//! over unchanged data return the same order.

pub mod arena;
pub mod collaborative;
pub mod content;
pub mod error;
pub mod group;
pub mod mood;
pub mod text;
pub mod types;

pub use arena::IdArena;
pub use collaborative::{CollaborativeModel, CollaborativeScorer, friend_recommendations};
pub use content::{ContentModel, ContentScorer};
pub use error::{Result, ScoreError};
pub use group::{DEFAULT_MIN_SATISFACTION, GroupScorer};
pub use mood::{Mood, MoodScorer};
pub use types::{
    Explanation, Recommendation, ScoreSource, Scorer, SourceContribution, popularity_fallback,
    rank,
};
