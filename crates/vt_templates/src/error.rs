//! Error types for templates.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur while loading, selecting or syncing templates.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Failed to fetch templates repository: {0}")]
    FetchFailed(String),

    #[error("Failed to sync templates repository: {0}")]
    SyncFailed(String),

    #[error("Detected uncommitted changes in {0}")]
    UncommittedChanges(PathBuf),

    #[error("Exceeded maximum directory depth of {max} at {path}")]
    DepthExceeded { path: PathBuf, max: usize },

    #[error("Template id '{got}' and directory name '{want}' should match")]
    IdMismatch { got: String, want: String },

    #[error("Duplicate template id '{id}' found at {first} and {second}")]
    DuplicateId {
        id: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Failed to parse template definition {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid template definition {path}: {message}")]
    InvalidDefinition { path: PathBuf, message: String },

    #[error("No tags provided")]
    NoTagsProvided,

    #[error("No templates found matching tags: {}", .0.join(", "))]
    NoMatch(Vec<String>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TemplateError {
    /// Whether this error rejects the template content or the caller's
    /// selection input rather than the environment.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TemplateError::IdMismatch { .. }
                | TemplateError::DuplicateId { .. }
                | TemplateError::Parse { .. }
                | TemplateError::InvalidDefinition { .. }
                | TemplateError::NoTagsProvided
                | TemplateError::NoMatch(_)
        )
    }
}
