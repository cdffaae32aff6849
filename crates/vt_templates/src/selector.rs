//! Template selection by ID or tag filter.
//!
//! Tag filters use OR semantics: a template is selected when any filter tag
//! equals, or is a case-insensitive substring of, any of its own tags.

use crate::catalog::TemplateCatalog;
use crate::error::{TemplateError, TemplateResult};
use crate::template::Template;

/// Look up a single template.
///
/// Entries whose own `id` is empty are treated as absent.
pub fn select_by_id<'a>(catalog: &'a TemplateCatalog, id: &str) -> TemplateResult<&'a Template> {
    match catalog.get(id) {
        Some(template) if !template.id.is_empty() => Ok(template),
        _ => Err(TemplateError::NotFound(id.to_string())),
    }
}

/// Select every template matching at least one of `tags`.
///
/// Blank entries are discarded first. Results are ordered by template ID.
pub fn select_by_tags<'a, S: AsRef<str>>(
    catalog: &'a TemplateCatalog,
    tags: &[S],
) -> TemplateResult<Vec<&'a Template>> {
    let filter = normalize_tags(tags);
    if filter.is_empty() {
        return Err(TemplateError::NoTagsProvided);
    }

    let mut matched: Vec<&Template> = catalog
        .list()
        .into_iter()
        .filter(|t| matches_normalized(t, &filter))
        .collect();

    if matched.is_empty() {
        return Err(TemplateError::NoMatch(filter));
    }

    matched.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(matched)
}

/// Check whether a template matches any of the given filter tags.
pub fn template_matches_tags<S: AsRef<str>>(template: &Template, tags: &[S]) -> bool {
    matches_normalized(template, &normalize_tags(tags))
}

/// Split a comma separated tag list as typed on the command line.
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    normalize_tags(&raw.split(',').collect::<Vec<_>>())
}

fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    tags.iter()
        .map(|t| t.as_ref().trim())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn matches_normalized(template: &Template, filter: &[String]) -> bool {
    template.info.tags.iter().any(|tag| {
        let tag = tag.to_lowercase();
        filter.iter().any(|f| tag == *f || tag.contains(f.as_str()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Info;

    fn template(id: &str, tags: &[&str]) -> Template {
        Template {
            id: id.to_string(),
            info: Info {
                name: id.to_string(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn catalog() -> TemplateCatalog {
        TemplateCatalog::from_templates(vec![
            template("sqli-template", &["sqli", "web", "owasp"]),
            template("xss-template", &["xss", "web", "owasp"]),
            template("ssrf-template", &["ssrf", "web"]),
        ])
    }

    fn ids(templates: &[&Template]) -> Vec<String> {
        templates.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn test_single_tag() {
        let catalog = catalog();
        let matched = select_by_tags(&catalog, &["sqli"]).unwrap();
        assert_eq!(ids(&matched), vec!["sqli-template"]);
    }

    #[test]
    fn test_or_semantics_case_insensitive() {
        let catalog = catalog();
        let matched = select_by_tags(&catalog, &["SQLI", "xss"]).unwrap();
        assert_eq!(ids(&matched), vec!["sqli-template", "xss-template"]);
    }

    #[test]
    fn test_shared_tag_selects_all() {
        let catalog = catalog();
        assert_eq!(select_by_tags(&catalog, &["web"]).unwrap().len(), 3);
    }

    #[test]
    fn test_substring_match() {
        let catalog = catalog();
        let matched = select_by_tags(&catalog, &["owa"]).unwrap();
        assert_eq!(ids(&matched), vec!["sqli-template", "xss-template"]);
    }

    #[test]
    fn test_empty_and_blank_filters() {
        let catalog = catalog();
        let empty: [&str; 0] = [];
        assert!(matches!(
            select_by_tags(&catalog, &empty),
            Err(TemplateError::NoTagsProvided)
        ));
        assert!(matches!(
            select_by_tags(&catalog, &["  ", ""]),
            Err(TemplateError::NoTagsProvided)
        ));
        assert_eq!(select_by_tags(&catalog, &["  ", "sqli"]).unwrap().len(), 1);
    }

    #[test]
    fn test_no_match() {
        let catalog = catalog();
        let err = select_by_tags(&catalog, &["nonexistent"]).unwrap_err();
        assert!(matches!(err, TemplateError::NoMatch(ref tags) if tags == &["nonexistent"]));
    }

    #[test]
    fn test_template_matches_tags() {
        let t = template("test-template", &["sqli", "XSS", "OWASP-Top10"]);
        assert!(template_matches_tags(&t, &["sqli"]));
        assert!(template_matches_tags(&t, &["SQLI"]));
        assert!(template_matches_tags(&t, &["xss"]));
        assert!(template_matches_tags(&t, &["owasp"]));
        assert!(template_matches_tags(&t, &["top10"]));
        assert!(!template_matches_tags(&t, &["nonexistent"]));
        assert!(!template_matches_tags::<&str>(&t, &[]));
        assert!(!template_matches_tags(&t, &["  ", ""]));
    }

    #[test]
    fn test_select_by_id() {
        let catalog = catalog();
        assert_eq!(select_by_id(&catalog, "xss-template").unwrap().id, "xss-template");
        assert!(matches!(
            select_by_id(&catalog, "none-exist-template"),
            Err(TemplateError::NotFound(id)) if id == "none-exist-template"
        ));
    }

    #[test]
    fn test_select_by_id_rejects_empty_entry() {
        let mut catalog = TemplateCatalog::new("/repo");
        catalog.insert_raw("ghost", template("", &["web"]));
        assert!(catalog.contains("ghost"));
        assert!(matches!(
            select_by_id(&catalog, "ghost"),
            Err(TemplateError::NotFound(id)) if id == "ghost"
        ));
    }

    #[test]
    fn test_parse_tag_list() {
        assert_eq!(parse_tag_list("sqli, XSS ,,"), vec!["sqli", "xss"]);
        assert!(parse_tag_list(" , ").is_empty());
    }
}
