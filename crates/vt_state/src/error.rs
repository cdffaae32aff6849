//! Error types for the deployment state store.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for state store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur while reading or writing deployment state.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("State store {0} is locked by another process")]
    Locked(PathBuf),

    #[error("Invalid bucket name: {0}")]
    InvalidBucket(String),

    #[error("Corrupt deployment record {provider}/{template}: {message}")]
    CorruptRecord {
        provider: String,
        template: String,
        message: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
