//! # vt_state
//!
//! Persistent record of which templates are running on which providers.
//!
//! The store is a single `SQLite` file guarded by an exclusive process lock.
//! Records are keyed by `(provider_name, template_id)`; at most one record
//! exists per pair.
//!
//! ```no_run
//! use vt_state::{DeploymentStore, StoreConfig};
//!
//! let store = DeploymentStore::open(&StoreConfig::new("/home/op/.vt-cli"))?;
//! store.add("docker-compose", "sqli-basic")?;
//! assert!(store.exists("docker-compose", "sqli-basic")?);
//! # Ok::<(), vt_state::StateError>(())
//! ```

pub mod config;
pub mod error;
pub mod store;

pub use config::{StoreConfig, DEFAULT_BUCKET_NAME, DEFAULT_FILE_NAME};
pub use error::{StateError, StateResult};
pub use store::{Deployment, DeploymentStore};
