//! Error types for the catalog crate.

use thiserror::Error;

/// Errors that can occur while building or validating a snapshot
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Referenced entity doesn't exist (e.g., rating for a movie not in the snapshot)
    #[error("Missing reference: {entity} with id {id}")]
    MissingReference { entity: &'static str, id: u32 },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CatalogError>;
