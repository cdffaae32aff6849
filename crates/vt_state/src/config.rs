//! State store location configuration.

use std::path::{Path, PathBuf};

/// Default database file name.
pub const DEFAULT_FILE_NAME: &str = "deployments.db";

/// Default partition holding deployment records.
pub const DEFAULT_BUCKET_NAME: &str = "deployments";

/// Where and how the deployment state is persisted.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub directory: PathBuf,
    pub file_name: String,
    pub bucket_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            file_name: DEFAULT_FILE_NAME.to_string(),
            bucket_name: DEFAULT_BUCKET_NAME.to_string(),
        }
    }
}

impl StoreConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Default::default()
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    pub fn with_bucket_name(mut self, name: impl Into<String>) -> Self {
        self.bucket_name = name.into();
        self
    }

    /// Path of the database file.
    pub fn database_path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }

    /// Path of the sidecar file holding the process lock.
    pub fn lock_path(&self) -> PathBuf {
        lock_path_for(&self.database_path())
    }
}

pub(crate) fn lock_path_for(database: &Path) -> PathBuf {
    let mut name = database
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    database.with_file_name(name)
}

/// Bucket names become table identifiers, so only `[A-Za-z_][A-Za-z0-9_]*` is accepted.
pub(crate) fn is_valid_bucket(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
