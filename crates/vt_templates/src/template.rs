//! Template definitions.
//!
//! A template describes one vulnerable lab environment: display metadata,
//! proof-of-concept steps, remediation advice and per-provider provisioning
//! configuration. Templates are read from `index.yaml` files and are never
//! modified after loading.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

/// Prefix in [`ProviderConfig::content`] marking a prebuilt image reference.
pub const IMAGE_PREFIX: &str = "IMAGE:";

/// Vulnerable target environment definition.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Template {
    /// Unique identifier, equal to the name of the defining directory.
    #[serde(default)]
    pub id: String,
    /// Display metadata.
    #[serde(default)]
    pub info: Info,
    /// Proof-of-concept steps grouped by category.
    #[serde(default, rename = "poc")]
    pub proof_of_concept: BTreeMap<String, Vec<String>>,
    /// Remediation steps.
    #[serde(default)]
    pub remediation: Vec<String>,
    /// Provider name to provider-specific configuration.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Instructions shown after a successful start.
    #[serde(default, rename = "post-install")]
    pub post_install: Vec<String>,
    /// Directory the definition was loaded from.
    #[serde(skip)]
    pub path: PathBuf,
}

/// Template metadata.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Info {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub targets: Vec<String>,
    /// Vulnerability type (e.g. "Lab", "CVE").
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub affected_versions: Vec<String>,
    #[serde(default)]
    pub fixed_version: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub cwe: String,
    #[serde(default)]
    pub cvss: Cvss,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub references: Vec<String>,
}

/// Common Vulnerability Scoring System information.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Cvss {
    #[serde(default, deserialize_with = "string_or_number")]
    pub score: String,
    #[serde(default)]
    pub metrics: String,
}

/// Provider-specific provisioning configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    /// File relative to the template directory (compose file or Dockerfile).
    #[serde(default)]
    pub path: Option<String>,
    /// Inline content: `IMAGE: <ref>` or Dockerfile text.
    #[serde(default)]
    pub content: Option<String>,
    /// Container port (`"80/tcp"`) to host port.
    #[serde(default)]
    pub ports: HashMap<String, String>,
}

impl ProviderConfig {
    /// Image reference when the content is an `IMAGE:` directive.
    pub fn image(&self) -> Option<&str> {
        self.content
            .as_deref()
            .and_then(|c| c.trim_start().strip_prefix(IMAGE_PREFIX))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Inline Dockerfile text, if the content is not an image reference.
    pub fn dockerfile(&self) -> Option<&str> {
        match (&self.content, self.image()) {
            (Some(content), None) if !content.trim().is_empty() => Some(content.as_str()),
            _ => None,
        }
    }

    /// Resolve [`ProviderConfig::path`] against a template directory.
    pub fn resolve_path(&self, template_dir: &Path) -> Option<PathBuf> {
        self.path.as_ref().map(|p| template_dir.join(p))
    }
}

impl Template {
    /// Get the configuration for a provider.
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    /// Check whether the template declares configuration for a provider.
    pub fn supports(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Render a human readable description of the template.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let info = &self.info;

        let _ = writeln!(out, "ID:          {}", self.id);
        let _ = writeln!(out, "Name:        {}", info.name);
        let _ = writeln!(out, "Author:      {}", info.author);
        let _ = writeln!(out, "Type:        {}", info.kind);
        if !info.description.is_empty() {
            let _ = writeln!(out, "Description: {}", info.description.trim());
        }
        if !info.targets.is_empty() {
            let _ = writeln!(out, "Targets:     {}", info.targets.join(", "));
        }
        if !info.affected_versions.is_empty() {
            let _ = writeln!(out, "Affected:    {}", info.affected_versions.join(", "));
        }
        if !info.fixed_version.is_empty() {
            let _ = writeln!(out, "Fixed in:    {}", info.fixed_version);
        }
        if !info.cwe.is_empty() {
            let _ = writeln!(out, "CWE:         {}", info.cwe);
        }
        if !info.cvss.score.is_empty() || !info.cvss.metrics.is_empty() {
            let _ = writeln!(out, "CVSS:        {} {}", info.cvss.score, info.cvss.metrics);
        }
        if !info.tags.is_empty() {
            let _ = writeln!(out, "Tags:        {}", info.tags.join(", "));
        }

        render_list(&mut out, "References", &info.references);

        if !self.proof_of_concept.is_empty() {
            let _ = writeln!(out, "\nProof of Concept:");
            for (category, steps) in &self.proof_of_concept {
                let _ = writeln!(out, "  [{}]", category);
                for step in steps {
                    let _ = writeln!(out, "    - {}", step);
                }
            }
        }

        render_list(&mut out, "Remediation", &self.remediation);

        let mut providers: Vec<_> = self.providers.keys().cloned().collect();
        providers.sort();
        render_list(&mut out, "Providers", &providers);

        render_list(&mut out, "Post-install", &self.post_install);

        out
    }
}

fn render_list(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{}:", title);
    for item in items {
        let _ = writeln!(out, "  - {}", item);
    }
}

/// Accept scalars written either as strings or numbers (`score: 9.8`).
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_yaml::Value::Null => String::new(),
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        other => {
            return Err(serde::de::Error::custom(format!(
                "expected a scalar, found {:?}",
                other
            )))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFINITION: &str = r#"
id: sqli-lab
info:
  name: SQL Injection Lab
  description: Classic login bypass
  author: hhs
  targets: [php]
  type: Lab
  affected_versions: ["1.0"]
  fixed_version: "1.1"
  cwe: 89
  cvss:
    score: 9.8
    metrics: CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H
  tags: [sqli, web, owasp]
  references:
    - https://owasp.org/www-community/attacks/SQL_Injection
poc:
  login:
    - "username: ' OR 1=1 --"
remediation:
  - Use prepared statements
providers:
  docker-compose:
    path: docker-compose.yml
  docker:
    content: "IMAGE: vulnerables/web-dvwa"
    ports:
      80/tcp: "8080"
post-install:
  - Browse to http://localhost:8080
"#;

    #[test]
    fn test_parse_full_definition() {
        let template: Template = serde_yaml::from_str(DEFINITION).unwrap();
        assert_eq!(template.id, "sqli-lab");
        assert_eq!(template.info.kind, "Lab");
        assert_eq!(template.info.cwe, "89");
        assert_eq!(template.info.cvss.score, "9.8");
        assert_eq!(template.proof_of_concept["login"].len(), 1);
        assert_eq!(template.post_install, vec!["Browse to http://localhost:8080"]);
        assert!(template.supports("docker-compose"));
        assert!(!template.supports("kubernetes"));
    }

    #[test]
    fn test_provider_content_kinds() {
        let template: Template = serde_yaml::from_str(DEFINITION).unwrap();
        let docker = template.provider("docker").unwrap();
        assert_eq!(docker.image(), Some("vulnerables/web-dvwa"));
        assert_eq!(docker.dockerfile(), None);

        let inline = ProviderConfig {
            content: Some("FROM nginx:alpine\n".to_string()),
            ..Default::default()
        };
        assert_eq!(inline.image(), None);
        assert_eq!(inline.dockerfile(), Some("FROM nginx:alpine\n"));
    }

    #[test]
    fn test_resolve_path() {
        let template: Template = serde_yaml::from_str(DEFINITION).unwrap();
        let compose = template.provider("docker-compose").unwrap();
        assert_eq!(
            compose.resolve_path(Path::new("/repo/web/sqli-lab")),
            Some(PathBuf::from("/repo/web/sqli-lab/docker-compose.yml"))
        );
    }

    #[test]
    fn test_render_contains_sections() {
        let template: Template = serde_yaml::from_str(DEFINITION).unwrap();
        let rendered = template.render();
        assert!(rendered.contains("ID:          sqli-lab"));
        assert!(rendered.contains("Proof of Concept:"));
        assert!(rendered.contains("[login]"));
        assert!(rendered.contains("Remediation:"));
        assert!(rendered.contains("  - docker\n  - docker-compose"));
    }
}
