//! Error taxonomy for manifest and delivery operations.
//!
//! Lookups that may legitimately miss return `Ok(None)`; `NotFound` is
//! reserved for operations where the caller asserted the row exists
//! (e.g. marking an outcome on a stop that is not on the manifest).

use thiserror::Error;

/// Errors surfaced by repositories and services.
#[derive(Debug, Error)]
pub enum Error {
    /// An id the operation requires does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The operation is not legal in the entity's current lifecycle state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Input failed validation before touching storage.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A concurrent writer got there first (version mismatch, shipment
    /// already claimed by another active manifest).
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

impl Error {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            entity,
            id: id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
