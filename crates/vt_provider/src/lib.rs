//! # vt_provider
//!
//! Lifecycle management for vulnerable target environments.
//!
//! A [`Backend`] knows how to bring an environment up or down on one
//! container engine. [`ManagedProvider`] wraps a backend with the deployment
//! state machine: a template is either Stopped (no record) or Running
//! (record present), start requires Stopped and stop requires Running.
//!
//! # Features
//!
//! - **Compose backend**: `docker compose` / `podman compose` per template project
//! - **Docker backend**: single container via the Docker API, pulled or built
//! - **Mock backend**: recording test double with failure injection
//! - **Batches**: per-template isolation with an aggregate report
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vt_provider::{ProviderRegistry, Provider};
//! use vt_state::{DeploymentStore, StoreConfig};
//! use vt_templates::TemplateLoader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(DeploymentStore::open(&StoreConfig::new("/home/op/.vt-cli"))?);
//!     let registry = ProviderRegistry::standard(store).await;
//!     let catalog = TemplateLoader::new("/home/op/vt-templates").load_all()?;
//!
//!     let provider = registry.get_required("docker-compose")?;
//!     provider.start(catalog.select_by_id("sqli-basic")?).await?;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod batch;
pub mod compose;
pub mod docker;
pub mod error;
pub mod mock;
pub mod provider;
pub mod registry;

pub use backend::Backend;
pub use batch::{
    start_batch, stop_batch, BatchAction, BatchFailure, BatchReport, BatchReporter, NoopReporter,
};
pub use compose::{ComposeBackend, ContainerRuntime, COMPOSE_PROVIDER};
pub use docker::{DockerBackend, DOCKER_PROVIDER};
pub use error::{ProviderError, ProviderResult};
pub use mock::{BackendAction, BackendCall, MockBackend};
pub use provider::{DeploymentStatus, ManagedProvider, Provider};
pub use registry::ProviderRegistry;
