//! Provider registry for looking up lifecycle implementations by name.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};
use vt_state::DeploymentStore;

use crate::compose::ComposeBackend;
use crate::docker::DockerBackend;
use crate::error::{ProviderError, ProviderResult};
use crate::provider::{ManagedProvider, Provider};

/// A registry of provider implementations.
///
/// Built once at startup; every provider shares the same deployment store.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Registry with the built-in backends.
    ///
    /// The compose provider is always registered. The Docker provider is
    /// registered only when the daemon answers.
    pub async fn standard(store: Arc<DeploymentStore>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ManagedProvider::new(
            ComposeBackend::detect(),
            Arc::clone(&store),
        )));

        match DockerBackend::connect().await {
            Ok(backend) => registry.register(Arc::new(ManagedProvider::new(backend, store))),
            Err(e) => warn!("Docker provider unavailable: {}", e),
        }

        registry
    }

    /// Register a provider under its `name()`, replacing any existing entry.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        let name = provider.name().to_string();
        debug!("Registering provider: {}", name);
        self.providers.insert(name, provider);
    }

    /// Get a provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// Get a provider by name, returning an error if not found.
    pub fn get_required(&self, name: &str) -> ProviderResult<Arc<dyn Provider>> {
        self.get(name)
            .ok_or_else(|| ProviderError::ProviderNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;

    fn registry() -> ProviderRegistry {
        let store = Arc::new(DeploymentStore::in_memory().unwrap());
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(ManagedProvider::new(
            MockBackend::new("docker-compose"),
            Arc::clone(&store),
        )));
        registry.register(Arc::new(ManagedProvider::new(MockBackend::new("docker"), store)));
        registry
    }

    #[test]
    fn test_lookup() {
        let registry = registry();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["docker", "docker-compose"]);
        assert!(registry.contains("docker"));
        assert_eq!(registry.get_required("docker").unwrap().name(), "docker");
    }

    #[test]
    fn test_unknown_provider() {
        match registry().get_required("kubernetes") {
            Err(ProviderError::ProviderNotFound(name)) => assert_eq!(name, "kubernetes"),
            Err(other) => panic!("unexpected {other:?}"),
            Ok(_) => panic!("expected ProviderNotFound"),
        }
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = registry();
        let store = Arc::new(DeploymentStore::in_memory().unwrap());
        registry.register(Arc::new(ManagedProvider::new(MockBackend::new("docker"), store)));
        assert_eq!(registry.len(), 2);
        assert!(ProviderRegistry::new().is_empty());
    }
}
