//! Error types for provider lifecycle operations.

use thiserror::Error;
use vt_state::StateError;

/// Result type alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur while starting, stopping or inspecting environments.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Template {template} is already running on {provider}")]
    AlreadyRunning { provider: String, template: String },

    #[error("Template {template} is not running on {provider}")]
    NotRunning { provider: String, template: String },

    #[error("Provider {provider} failed for {template}: {message}")]
    Backend {
        provider: String,
        template: String,
        message: String,
    },

    #[error(
        "Template {template} was started on {provider} but could not be recorded; \
         the environment is running untracked: {source}"
    )]
    Untracked {
        provider: String,
        template: String,
        #[source]
        source: StateError,
    },

    #[error(
        "Template {template} was stopped on {provider} but its deployment record \
         could not be removed: {source}"
    )]
    StaleRecord {
        provider: String,
        template: String,
        #[source]
        source: StateError,
    },

    #[error("Template {template} has no configuration for provider {provider}")]
    MissingConfig { provider: String, template: String },

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Container runtime not available: {0}")]
    RuntimeNotAvailable(String),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Docker API error: {0}")]
    DockerApi(#[from] bollard::errors::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    /// Attach provider and template context to an opaque backend failure.
    ///
    /// Errors that already carry context are returned unchanged.
    pub fn into_backend(self, provider: &str, template: &str) -> Self {
        match self {
            Self::DockerApi(_) | Self::Io(_) => Self::Backend {
                provider: provider.to_string(),
                template: template.to_string(),
                message: self.to_string(),
            },
            other => other,
        }
    }

    /// Whether the error leaves the tracked state inconsistent with reality.
    pub fn is_inconsistent(&self) -> bool {
        matches!(self, Self::Untracked { .. } | Self::StaleRecord { .. })
    }
}
