//! Application configuration.
//!
//! Values are layered from lowest to highest precedence: built-in defaults,
//! `<storage_path>/config.toml`, then environment variables and flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use vt_provider::COMPOSE_PROVIDER;
use vt_state::StoreConfig;

/// Name of the optional configuration file inside the storage directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Log levels accepted by `--verbosity`.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub templates_path: PathBuf,
    pub storage_path: PathBuf,
    pub log_level: String,
    pub default_provider: String,
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub templates_path: Option<PathBuf>,
    pub storage_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct FileConfig {
    templates_path: Option<PathBuf>,
    log_level: Option<String>,
    default_provider: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            templates_path: home.join("vt-templates"),
            storage_path: home.join(".vt-cli"),
            log_level: "info".to_string(),
            default_provider: COMPOSE_PROVIDER.to_string(),
        }
    }
}

impl AppConfig {
    /// Resolve the configuration for this invocation.
    pub fn load(overrides: ConfigOverrides) -> Result<Self> {
        let mut config = Self::default();
        if let Some(storage_path) = overrides.storage_path {
            config.storage_path = storage_path;
        }

        let file_path = config.storage_path.join(CONFIG_FILE_NAME);
        if let Some(file) = read_file_config(&file_path)? {
            config.apply_file(file);
        }

        if let Some(templates_path) = overrides.templates_path {
            config.templates_path = templates_path;
        }
        if let Some(log_level) = overrides.log_level {
            config.log_level = log_level;
        }

        config.validate()?;
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(templates_path) = file.templates_path {
            self.templates_path = expand_home(&templates_path);
        }
        if let Some(log_level) = file.log_level {
            self.log_level = log_level;
        }
        if let Some(default_provider) = file.default_provider {
            self.default_provider = default_provider;
        }
    }

    fn validate(&self) -> Result<()> {
        let level = self.log_level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            anyhow::bail!(
                "Invalid log level '{}' (expected one of: {})",
                self.log_level,
                LOG_LEVELS.join(", ")
            );
        }
        Ok(())
    }

    /// Where deployment state is persisted.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(&self.storage_path)
    }
}

fn read_file_config(path: &Path) -> Result<Option<FileConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file = toml::from_str(&content)
        .with_context(|| format!("Invalid configuration file {}", path.display()))?;
    Ok(Some(file))
}

/// Expand a leading `~` to the home directory.
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(config.templates_path.ends_with("vt-templates"));
        assert!(config.storage_path.ends_with(".vt-cli"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.default_provider, "docker-compose");
    }

    #[test]
    fn test_file_layer() {
        let temp = tempdir().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "templates_path = \"/srv/labs\"\ndefault_provider = \"docker\"\n",
        )
        .unwrap();

        let config = AppConfig::load(ConfigOverrides {
            storage_path: Some(temp.path().to_path_buf()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(config.templates_path, PathBuf::from("/srv/labs"));
        assert_eq!(config.default_provider, "docker");
        assert_eq!(config.log_level, "info");
        assert_eq!(
            config.store_config().database_path(),
            temp.path().join("deployments.db")
        );
    }

    #[test]
    fn test_overrides_beat_file() {
        let temp = tempdir().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "templates_path = \"/srv/labs\"\nlog_level = \"warn\"\n",
        )
        .unwrap();

        let config = AppConfig::load(ConfigOverrides {
            storage_path: Some(temp.path().to_path_buf()),
            templates_path: Some(PathBuf::from("/tmp/other")),
            log_level: Some("debug".into()),
        })
        .unwrap();

        assert_eq!(config.templates_path, PathBuf::from("/tmp/other"));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "templates_path = [").unwrap();

        let err = AppConfig::load(ConfigOverrides {
            storage_path: Some(temp.path().to_path_buf()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("Invalid configuration file"));
    }

    #[test]
    fn test_invalid_log_level() {
        let temp = tempdir().unwrap();
        let err = AppConfig::load(ConfigOverrides {
            storage_path: Some(temp.path().to_path_buf()),
            log_level: Some("loud".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_expand_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/labs")), home.join("labs"));
        }
        assert_eq!(expand_home(Path::new("/abs")), PathBuf::from("/abs"));
    }
}
