//! Provider lifecycle contract and its state-enforcing implementation.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use vt_state::DeploymentStore;
use vt_templates::Template;

use crate::backend::Backend;
use crate::error::{ProviderError, ProviderResult};

/// Coarse, display-only environment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Running,
    Unknown,
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle operations the CLI drives.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    /// Start the template. Fails with [`ProviderError::AlreadyRunning`] if tracked.
    async fn start(&self, template: &Template) -> ProviderResult<()>;

    /// Stop the template. Fails with [`ProviderError::NotRunning`] if untracked.
    async fn stop(&self, template: &Template) -> ProviderResult<()>;

    /// Query the backend. Never fails; inspection errors read as unknown.
    async fn status(&self, template: &Template) -> DeploymentStatus;
}

/// Provider that enforces the Stopped/Running state machine around a [`Backend`].
///
/// Each start or stop holds the store's lifecycle guard across the existence
/// check, the backend action and the state write.
pub struct ManagedProvider<B> {
    backend: B,
    store: Arc<DeploymentStore>,
}

impl<B: Backend> ManagedProvider<B> {
    pub fn new(backend: B, store: Arc<DeploymentStore>) -> Self {
        Self { backend, store }
    }
}

#[async_trait]
impl<B: Backend> Provider for ManagedProvider<B> {
    fn name(&self) -> &str {
        self.backend.name()
    }

    async fn start(&self, template: &Template) -> ProviderResult<()> {
        let provider = self.backend.name();
        let _guard = self.store.lifecycle_guard().await;

        if self.store.exists(provider, &template.id)? {
            return Err(ProviderError::AlreadyRunning {
                provider: provider.to_string(),
                template: template.id.clone(),
            });
        }

        info!("Starting {} with {}", template.id, provider);
        self.backend
            .up(template)
            .await
            .map_err(|e| e.into_backend(provider, &template.id))?;

        if let Err(source) = self.store.add(provider, &template.id) {
            error!(
                "{} is running on {} but its deployment could not be recorded: {}. \
                 Stop it manually or re-run once the state store is writable",
                template.id, provider, source
            );
            return Err(ProviderError::Untracked {
                provider: provider.to_string(),
                template: template.id.clone(),
                source,
            });
        }

        debug!("Deployment {}/{} recorded", provider, template.id);
        Ok(())
    }

    async fn stop(&self, template: &Template) -> ProviderResult<()> {
        let provider = self.backend.name();
        let _guard = self.store.lifecycle_guard().await;

        if !self.store.exists(provider, &template.id)? {
            return Err(ProviderError::NotRunning {
                provider: provider.to_string(),
                template: template.id.clone(),
            });
        }

        info!("Stopping {} on {}", template.id, provider);
        self.backend
            .down(template)
            .await
            .map_err(|e| e.into_backend(provider, &template.id))?;

        if let Err(source) = self.store.remove(provider, &template.id) {
            error!(
                "{} was stopped on {} but its deployment record remains: {}",
                template.id, provider, source
            );
            return Err(ProviderError::StaleRecord {
                provider: provider.to_string(),
                template: template.id.clone(),
                source,
            });
        }

        Ok(())
    }

    async fn status(&self, template: &Template) -> DeploymentStatus {
        match self.backend.inspect(template).await {
            Ok(true) => DeploymentStatus::Running,
            Ok(false) => DeploymentStatus::Unknown,
            Err(e) => {
                warn!(
                    "Could not inspect {} on {}: {}",
                    template.id,
                    self.backend.name(),
                    e
                );
                DeploymentStatus::Unknown
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(DeploymentStatus::Running.to_string(), "running");
        assert_eq!(DeploymentStatus::Unknown.to_string(), "unknown");
        assert_eq!(
            serde_json::to_string(&DeploymentStatus::Running).unwrap(),
            "\"running\""
        );
    }
}
