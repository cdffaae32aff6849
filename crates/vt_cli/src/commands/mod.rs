//! CLI command definitions.
//!
//! Each subcommand maps to one operation on templates or deployments.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use tracing::warn;

use vt_provider::{BatchAction, BatchReport, ProviderRegistry};
use vt_state::DeploymentStore;
use vt_templates::{GitRepository, TemplateCatalog, TemplateLoader};

use crate::config::AppConfig;

pub mod inspect;
pub mod lifecycle;
pub mod ps;
pub mod report;
pub mod template;

/// vt - vulnerable target lab manager
#[derive(Parser, Debug)]
#[command(name = "vt")]
#[command(version, about = "Create and manage vulnerable target environments")]
#[command(long_about = r#"
vt starts, stops and tracks intentionally vulnerable lab environments
described by templates.

COMMANDS:
  start     → Start a template (or every template matching tags)
  stop      → Stop a running template (or every template matching tags)
  ps        → List running deployments and their status
  template  → List or update the local template repository
  inspect   → Show the full description of a template

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Validation failure
  4 - Template error
  5 - State store error
  6 - Provider error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, env = "VT_VERBOSITY")]
    pub verbosity: Option<String>,

    /// Local template repository
    #[arg(long, global = true, env = "VT_TEMPLATES_PATH")]
    pub templates_path: Option<PathBuf>,

    /// Directory holding deployment state and config.toml
    #[arg(long, global = true, env = "VT_STORAGE_PATH")]
    pub storage_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the selected template(s) on a provider
    Start(lifecycle::LifecycleArgs),

    /// Stop the selected template(s) on a provider
    Stop(lifecycle::LifecycleArgs),

    /// List running deployments and their status
    Ps,

    /// Template repository operations
    Template(template::TemplateArgs),

    /// Show a template's details
    Inspect(inspect::InspectArgs),
}

/// Selection of templates by a single ID or by tags.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct TargetArgs {
    /// Template ID
    #[arg(long)]
    pub id: Option<String>,

    /// Comma-separated tags; every template matching any tag is selected
    #[arg(short, long)]
    pub tags: Option<String>,
}

/// Some members of a tag batch failed.
#[derive(Error, Debug)]
#[error("{} of {} template(s) failed to {}: {}", .failed.len(), .total, .action, .failed.join(", "))]
pub struct BatchFailed {
    pub action: BatchAction,
    pub total: usize,
    pub failed: Vec<String>,
}

impl From<&BatchReport> for BatchFailed {
    fn from(report: &BatchReport) -> Self {
        Self {
            action: report.action,
            total: report.total(),
            failed: report
                .failed_ids()
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Resources shared by commands, created on demand.
pub struct Context {
    pub config: AppConfig,
}

impl Context {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn loader(&self) -> TemplateLoader {
        TemplateLoader::new(&self.config.templates_path)
    }

    /// Load the catalog, cloning the template repository on first use.
    pub fn catalog(&self) -> Result<TemplateCatalog> {
        self.loader()
            .load_or_fetch(&GitRepository::default())
            .context("Failed to load templates")
    }

    /// Load the catalog if present; an unreadable repository yields an empty catalog.
    pub fn catalog_or_empty(&self) -> TemplateCatalog {
        match self.loader().load_all() {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("Templates unavailable: {}", e);
                TemplateCatalog::new(&self.config.templates_path)
            }
        }
    }

    pub fn open_store(&self) -> Result<Arc<DeploymentStore>> {
        let store = DeploymentStore::open(&self.config.store_config())
            .context("Failed to open deployment state")?;
        Ok(Arc::new(store))
    }

    pub async fn registry(&self, store: Arc<DeploymentStore>) -> ProviderRegistry {
        ProviderRegistry::standard(store).await
    }

    /// Provider named on the command line, or the configured default.
    pub fn provider_name<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested.unwrap_or(&self.config.default_provider)
    }
}
