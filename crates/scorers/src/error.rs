//! Error types shared by every scorer.
//!
//! The first two variants are soft failures: callers are expected to fall
//! back to popularity ranking rather than surface them to end users.
//! `InvalidMood` and `InvalidGroupSize` are user-facing validation errors.

use catalog::MovieId;
use thiserror::Error;

/// Errors produced while building or querying a scorer
#[derive(Error, Debug)]
pub enum ScoreError {
    /// Not enough ratings/movies to build or query an index.
    /// Callers fall back to popularity ranking.
    #[error("insufficient data to build index: needed {needed}, found {found}")]
    InsufficientData { needed: usize, found: usize },

    /// Requested movie is absent from a built index.
    /// Callers fall back to popularity ranking.
    #[error("movie {movie_id} is not present in the built index")]
    NotIndexed { movie_id: MovieId },

    /// Unknown mood label (the mood vocabulary is closed)
    #[error("unknown mood: {0:?}")]
    InvalidMood(String),

    /// Group recommendations need at least 2 distinct users
    #[error("group recommendations require at least 2 distinct users, got {0}")]
    InvalidGroupSize(usize),

    /// A rebuild could not complete; the previous model stays in service
    #[error("training failed: {0}")]
    Training(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, ScoreError>;
