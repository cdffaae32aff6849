//! Compose backend driving `docker compose` or `podman compose`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command as StdCommand, Stdio};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info, warn};
use vt_templates::Template;

use crate::backend::Backend;
use crate::error::{ProviderError, ProviderResult};

/// Provider name for the compose backend.
pub const COMPOSE_PROVIDER: &str = "docker-compose";

/// Container runtime type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerRuntime {
    Docker,
    Podman,
}

impl ContainerRuntime {
    /// Get the CLI command name.
    pub fn command(&self) -> &'static str {
        match self {
            Self::Docker => "docker",
            Self::Podman => "podman",
        }
    }

    /// Detect an available runtime, preferring Docker.
    pub fn detect() -> Option<Self> {
        [Self::Docker, Self::Podman]
            .into_iter()
            .find(|runtime| runtime.is_available())
    }

    fn is_available(&self) -> bool {
        StdCommand::new(self.command())
            .args(["compose", "version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

impl std::fmt::Display for ContainerRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.command())
    }
}

/// Compose project name for a template.
pub fn project_name(template_id: &str) -> String {
    format!("vt-{}", template_id)
}

/// Backend running a template's compose file as its own project.
#[derive(Debug, Clone)]
pub struct ComposeBackend {
    runtime: ContainerRuntime,
}

impl ComposeBackend {
    /// Create a backend using the detected runtime.
    ///
    /// Falls back to Docker when neither runtime answers; invocations then
    /// fail with [`ProviderError::RuntimeNotAvailable`].
    pub fn detect() -> Self {
        let runtime = ContainerRuntime::detect().unwrap_or_else(|| {
            warn!("Neither docker compose nor podman compose is available");
            ContainerRuntime::Docker
        });
        info!("Using container runtime: {}", runtime);
        Self { runtime }
    }

    pub fn with_runtime(runtime: ContainerRuntime) -> Self {
        Self { runtime }
    }

    fn compose_file(&self, template: &Template) -> ProviderResult<PathBuf> {
        template
            .provider(COMPOSE_PROVIDER)
            .and_then(|config| config.resolve_path(&template.path))
            .ok_or_else(|| ProviderError::MissingConfig {
                provider: COMPOSE_PROVIDER.to_string(),
                template: template.id.clone(),
            })
    }

    async fn compose(&self, template: &Template, action: &[&str]) -> ProviderResult<String> {
        let file = self.compose_file(template)?;
        let args = compose_args(&file, &project_name(&template.id), action);
        debug!("Executing: {} {}", self.runtime, args.join(" "));

        let mut cmd = Command::new(self.runtime.command());
        cmd.args(&args);
        if template.path.is_dir() {
            cmd.current_dir(&template.path);
        }

        let output = cmd.output().await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => ProviderError::RuntimeNotAvailable(self.runtime.to_string()),
            _ => ProviderError::Io(e),
        })?;

        if !output.status.success() {
            return Err(ProviderError::Backend {
                provider: COMPOSE_PROVIDER.to_string(),
                template: template.id.clone(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Backend for ComposeBackend {
    fn name(&self) -> &str {
        COMPOSE_PROVIDER
    }

    async fn up(&self, template: &Template) -> ProviderResult<()> {
        self.compose(template, &["up", "-d"]).await?;
        Ok(())
    }

    async fn down(&self, template: &Template) -> ProviderResult<()> {
        self.compose(template, &["down"]).await?;
        Ok(())
    }

    async fn inspect(&self, template: &Template) -> ProviderResult<bool> {
        let out = self
            .compose(template, &["ps", "--status", "running", "-q"])
            .await?;
        Ok(out.lines().any(|line| !line.trim().is_empty()))
    }
}

fn compose_args(file: &Path, project: &str, action: &[&str]) -> Vec<String> {
    let mut args = vec![
        "compose".to_string(),
        "-f".to_string(),
        file.to_string_lossy().into_owned(),
        "-p".to_string(),
        project.to_string(),
    ];
    args.extend(action.iter().map(|a| a.to_string()));
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use vt_templates::ProviderConfig;

    fn template(path: Option<&str>) -> Template {
        let mut providers = HashMap::new();
        providers.insert(
            COMPOSE_PROVIDER.to_string(),
            ProviderConfig {
                path: path.map(String::from),
                ..Default::default()
            },
        );
        Template {
            id: "sqli-basic".into(),
            providers,
            path: PathBuf::from("/opt/vt-templates/web/sqli-basic"),
            ..Default::default()
        }
    }

    #[test]
    fn test_compose_args() {
        let args = compose_args(
            Path::new("/t/sqli/docker-compose.yaml"),
            &project_name("sqli"),
            &["up", "-d"],
        );
        assert_eq!(
            args,
            vec!["compose", "-f", "/t/sqli/docker-compose.yaml", "-p", "vt-sqli", "up", "-d"]
        );
    }

    #[test]
    fn test_compose_file_resolves_against_template_dir() {
        let backend = ComposeBackend::with_runtime(ContainerRuntime::Podman);
        let file = backend
            .compose_file(&template(Some("docker-compose.yaml")))
            .unwrap();
        assert_eq!(
            file,
            PathBuf::from("/opt/vt-templates/web/sqli-basic/docker-compose.yaml")
        );
    }

    #[test]
    fn test_missing_compose_path() {
        let backend = ComposeBackend::with_runtime(ContainerRuntime::Docker);
        assert!(matches!(
            backend.compose_file(&template(None)),
            Err(ProviderError::MissingConfig { .. })
        ));

        let mut other = template(Some("docker-compose.yaml"));
        other.providers.clear();
        assert!(matches!(
            backend.compose_file(&other),
            Err(ProviderError::MissingConfig { .. })
        ));
    }

    #[test]
    fn test_runtime_command() {
        assert_eq!(ContainerRuntime::Docker.command(), "docker");
        assert_eq!(ContainerRuntime::Podman.to_string(), "podman");
    }
}
