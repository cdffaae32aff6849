//! # vt_templates
//!
//! Vulnerable target template definitions for vt.
//!
//! This crate discovers templates in a (possibly nested) repository
//! directory, validates them, and selects them by ID or tag:
//!
//! - Recursive, depth-bounded discovery of `index.yaml` definitions
//! - Global uniqueness of template IDs across categories
//! - Case-insensitive, substring-capable tag filtering
//! - Clone-once and pull-in-place sync of the remote repository
//!
//! ## Example
//!
//! ```rust,no_run
//! use vt_templates::{GitRepository, TemplateLoader};
//!
//! let loader = TemplateLoader::new("vt-templates");
//! let catalog = loader.load_or_fetch(&GitRepository::default()).unwrap();
//!
//! for template in catalog.select_by_tags(&["sqli", "xss"]).unwrap() {
//!     println!("{} - {}", template.id, template.info.name);
//! }
//! ```

pub mod catalog;
pub mod error;
pub mod loader;
pub mod repository;
pub mod selector;
pub mod template;

pub use catalog::TemplateCatalog;
pub use error::{TemplateError, TemplateResult};
pub use loader::{is_template_directory, TemplateLoader, DEFINITION_FILES, MAX_SCAN_DEPTH};
pub use repository::{GitRepository, TemplateFetcher, TEMPLATE_REMOTE_REPOSITORY};
pub use selector::{parse_tag_list, select_by_id, select_by_tags, template_matches_tags};
pub use template::{Cvss, Info, ProviderConfig, Template, IMAGE_PREFIX};
