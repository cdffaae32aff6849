//! Backend trait: the externally-owned provisioning actions.

use async_trait::async_trait;
use vt_templates::Template;

use crate::error::ProviderResult;

/// Container engine integration that brings a template's environment up or down.
///
/// Backends know nothing about deployment state; [`crate::ManagedProvider`]
/// wraps a backend with the lifecycle rules.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Provider name, also the key under `providers` in template definitions.
    fn name(&self) -> &str;

    /// Provision and start the environment.
    async fn up(&self, template: &Template) -> ProviderResult<()>;

    /// Tear the environment down.
    async fn down(&self, template: &Template) -> ProviderResult<()>;

    /// Whether the environment is currently running.
    async fn inspect(&self, template: &Template) -> ProviderResult<bool>;
}
