//! Hybrid recommendation engine.
//!
//! Ties the concrete scorers from the `scorers` crate together behind one
//! async front door: activity-adaptive blending for personal
//! recommendations, direct pass-throughs for similar/mood/friend/group
//! queries, combined explanations, and a swap-on-completion train
//! lifecycle. The embedding application owns persistence and transport;
//! this crate only needs a built [`catalog::CatalogSnapshot`].

pub mod blend;
pub mod engine;
pub mod explain;

pub use blend::{BlendWeights, blend_weights, fuse};
pub use engine::{HybridEngine, ScorerSet};
pub use explain::{HybridExplanation, RecommendationStrength, combine};
