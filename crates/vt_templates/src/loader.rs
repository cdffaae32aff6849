//! Template loading functionality.
//!
//! The repository is an arbitrarily nested tree. A directory that directly
//! contains `index.yaml` is a template directory and is not descended into;
//! any other directory is a category and is scanned recursively. Directories
//! starting with `.` are ignored, and symlinks are never followed.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::catalog::TemplateCatalog;
use crate::error::{TemplateError, TemplateResult};
use crate::repository::TemplateFetcher;
use crate::template::Template;

/// Deepest directory level scanned below the repository root.
pub const MAX_SCAN_DEPTH: usize = 5;

/// Definition file names, in lookup order.
pub const DEFINITION_FILES: [&str; 2] = ["index.yaml", "index.yml"];

/// Template loader.
pub struct TemplateLoader {
    templates_path: PathBuf,
    max_depth: usize,
}

impl TemplateLoader {
    /// Create a new template loader.
    pub fn new(templates_path: impl Into<PathBuf>) -> Self {
        Self {
            templates_path: templates_path.into(),
            max_depth: MAX_SCAN_DEPTH,
        }
    }

    /// Override the maximum scan depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Load the catalog, fetching the repository first if it is missing.
    pub fn load_or_fetch(&self, fetcher: &dyn TemplateFetcher) -> TemplateResult<TemplateCatalog> {
        if !self.templates_path.exists() {
            info!("Fetching templates for the first time");
            fetcher.fetch(&self.templates_path).map_err(|e| match e {
                TemplateError::FetchFailed(_) => e,
                other => TemplateError::FetchFailed(other.to_string()),
            })?;
        }
        self.load_all()
    }

    /// Load all templates below the templates directory.
    ///
    /// Any invalid definition, duplicate ID or over-deep directory fails the
    /// whole load.
    pub fn load_all(&self) -> TemplateResult<TemplateCatalog> {
        if !self.templates_path.is_dir() {
            return Err(TemplateError::NotFound(format!(
                "templates directory {}",
                self.templates_path.display()
            )));
        }

        let mut catalog = TemplateCatalog::new(self.templates_path.clone());
        let mut seen: HashMap<String, PathBuf> = HashMap::new();

        let mut walker = WalkDir::new(&self.templates_path)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e));

        while let Some(entry) = walker.next() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_dir() {
                continue;
            }

            if entry.depth() > self.max_depth {
                return Err(TemplateError::DepthExceeded {
                    path: entry.path().to_path_buf(),
                    max: self.max_depth,
                });
            }

            if !is_template_directory(entry.path()) {
                continue;
            }
            walker.skip_current_dir();

            let template = self.load_template(entry.path())?;
            if let Some(first) = seen.get(&template.id) {
                return Err(TemplateError::DuplicateId {
                    id: template.id,
                    first: first.clone(),
                    second: entry.path().to_path_buf(),
                });
            }

            debug!("Loaded template: {} ({})", template.info.name, template.id);
            seen.insert(template.id.clone(), entry.path().to_path_buf());
            catalog.insert(template);
        }

        info!(
            "Loaded {} templates from {}",
            catalog.len(),
            self.templates_path.display()
        );
        Ok(catalog)
    }

    /// Load a single template directory and check it against its name.
    pub fn load_template(&self, path: &Path) -> TemplateResult<Template> {
        let definition = definition_file(path).ok_or_else(|| {
            TemplateError::NotFound(format!("No index.yaml found in {}", path.display()))
        })?;

        let mut template = load_definition(&definition)?;

        let dir_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if template.id != dir_name {
            return Err(TemplateError::IdMismatch {
                got: template.id,
                want: dir_name,
            });
        }

        template.path = path.to_path_buf();
        Ok(template)
    }
}

/// Check whether a directory directly contains a definition file.
pub fn is_template_directory(path: &Path) -> bool {
    definition_file(path).is_some()
}

fn definition_file(dir: &Path) -> Option<PathBuf> {
    DEFINITION_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

/// Parse a definition file and check its required fields.
fn load_definition(path: &Path) -> TemplateResult<Template> {
    debug!("Loading definition from {:?}", path);
    let content = fs::read_to_string(path)?;
    let template: Template =
        serde_yaml::from_str(&content).map_err(|source| TemplateError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let missing = if template.id.trim().is_empty() {
        Some("id")
    } else if template.info.name.trim().is_empty() {
        Some("info.name")
    } else if template.providers.is_empty() {
        Some("providers")
    } else {
        None
    };

    if let Some(field) = missing {
        return Err(TemplateError::InvalidDefinition {
            path: path.to_path_buf(),
            message: format!("missing required field '{}'", field),
        });
    }

    Ok(template)
}
