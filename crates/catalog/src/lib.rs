//! # Catalog Crate
//!
//! In-memory, point-in-time snapshot of the data the recommendation core
//! consumes: ratings, movie metadata, reviews, friendships, and trending
//! lists. The external CRUD layer owns persistence; this crate only holds
//! what a single training/scoring session needs, loaded once and then read
//! concurrently without locks.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Rating, Movie, Genre)
//! - **snapshot**: CatalogSnapshot with secondary indices and validation
//! - **error**: Error types for snapshot validation
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::{CatalogSnapshot, Movie, Rating};
//!
//! let mut snapshot = CatalogSnapshot::new();
//! snapshot.insert_movie(movie);
//! snapshot.insert_rating(rating);
//! snapshot.build_genre_index();
//! snapshot.validate()?;
//!
//! let ratings = snapshot.ratings_for_user(42);
//! ```

// Public modules
pub mod error;
pub mod snapshot;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{CatalogError, Result};
pub use snapshot::CatalogSnapshot;
pub use types::{Genre, Movie, MovieId, Rating, TrendingPeriod, UserId};
