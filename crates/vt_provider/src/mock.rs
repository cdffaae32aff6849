//! Mock backend for testing.
//!
//! Records every call and can be told to fail for specific templates, so
//! lifecycle and batch behaviour can be exercised without a container engine.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use vt_templates::Template;

use crate::backend::Backend;
use crate::error::{ProviderError, ProviderResult};

/// Backend action recorded by [`MockBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendAction {
    Up,
    Down,
    Inspect,
}

/// Captured call information for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCall {
    pub action: BackendAction,
    pub template_id: String,
}

/// Recording backend with injectable failures.
///
/// Clones share state, so a test can keep a handle after moving one into a
/// provider.
#[derive(Clone)]
pub struct MockBackend {
    name: String,
    calls: Arc<RwLock<Vec<BackendCall>>>,
    failures: Arc<RwLock<HashMap<(BackendAction, String), String>>>,
    running: Arc<RwLock<HashSet<String>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("mock")
    }
}

impl MockBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calls: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            running: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Make `action` fail for `template_id` with `message`.
    pub fn fail_on(
        self,
        action: BackendAction,
        template_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.failures
            .write()
            .insert((action, template_id.into()), message.into());
        self
    }

    /// Remove every injected failure.
    pub fn clear_failures(&self) {
        self.failures.write().clear();
    }

    /// All calls in order.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.read().clone()
    }

    /// Number of calls for an action.
    pub fn call_count(&self, action: BackendAction) -> usize {
        self.calls
            .read()
            .iter()
            .filter(|c| c.action == action)
            .count()
    }

    /// Whether the mock considers the template's environment up.
    pub fn is_running(&self, template_id: &str) -> bool {
        self.running.read().contains(template_id)
    }

    fn record(&self, action: BackendAction, template: &Template) -> ProviderResult<()> {
        self.calls.write().push(BackendCall {
            action,
            template_id: template.id.clone(),
        });

        match self.failures.read().get(&(action, template.id.clone())) {
            Some(message) => Err(ProviderError::Backend {
                provider: self.name.clone(),
                template: template.id.clone(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn up(&self, template: &Template) -> ProviderResult<()> {
        self.record(BackendAction::Up, template)?;
        self.running.write().insert(template.id.clone());
        Ok(())
    }

    async fn down(&self, template: &Template) -> ProviderResult<()> {
        self.record(BackendAction::Down, template)?;
        self.running.write().remove(&template.id);
        Ok(())
    }

    async fn inspect(&self, template: &Template) -> ProviderResult<bool> {
        self.record(BackendAction::Inspect, template)?;
        Ok(self.is_running(&template.id))
    }
}
