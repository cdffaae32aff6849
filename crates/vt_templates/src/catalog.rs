//! Template catalog.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::TemplateResult;
use crate::selector;
use crate::template::Template;

/// Loaded templates keyed by ID.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: HashMap<String, Template>,
    root: PathBuf,
}

impl TemplateCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            templates: HashMap::new(),
            root: root.into(),
        }
    }

    /// Build a catalog from already constructed templates.
    pub fn from_templates(templates: impl IntoIterator<Item = Template>) -> Self {
        Self {
            templates: templates
                .into_iter()
                .map(|t| (t.id.clone(), t))
                .collect(),
            root: PathBuf::new(),
        }
    }

    /// Insert a template, returning the entry it replaced.
    pub(crate) fn insert(&mut self, template: Template) -> Option<Template> {
        self.templates.insert(template.id.clone(), template)
    }

    #[cfg(test)]
    pub(crate) fn insert_raw(&mut self, key: &str, template: Template) {
        self.templates.insert(key.to_string(), template);
    }

    /// Repository root the catalog was loaded from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Raw lookup without the empty-ID check of [`TemplateCatalog::select_by_id`].
    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    pub fn list(&self) -> Vec<&Template> {
        self.templates.values().collect()
    }

    /// Template IDs in sorted order.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.templates.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// See [`selector::select_by_id`].
    pub fn select_by_id(&self, id: &str) -> TemplateResult<&Template> {
        selector::select_by_id(self, id)
    }

    /// See [`selector::select_by_tags`].
    pub fn select_by_tags<S: AsRef<str>>(&self, tags: &[S]) -> TemplateResult<Vec<&Template>> {
        selector::select_by_tags(self, tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(id: &str) -> Template {
        Template {
            id: id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_templates_keys_by_id() {
        let catalog = TemplateCatalog::from_templates(vec![template("b"), template("a")]);
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("a"));
        assert_eq!(catalog.ids(), vec!["a", "b"]);
    }

    #[test]
    fn test_insert_replaces() {
        let mut catalog = TemplateCatalog::new("/repo");
        assert!(catalog.insert(template("a")).is_none());
        assert!(catalog.insert(template("a")).is_some());
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.root(), Path::new("/repo"));
    }
}
