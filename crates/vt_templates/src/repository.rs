//! Remote template repository synchronisation.
//!
//! Templates live in a git repository. The first load clones it shallowly;
//! later updates pull in place and refuse to discard local edits unless
//! forced.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::{TemplateError, TemplateResult};

/// Default upstream for template definitions.
pub const TEMPLATE_REMOTE_REPOSITORY: &str = "https://github.com/HappyHackingSpace/vt-templates";

/// Obtains and refreshes a local copy of the template repository.
pub trait TemplateFetcher: Send + Sync {
    /// Clone the repository into `path` if it is absent.
    fn fetch(&self, path: &Path) -> TemplateResult<()>;

    /// Update `path` in place. Fails on uncommitted changes unless `force`.
    fn sync(&self, path: &Path, force: bool) -> TemplateResult<()>;
}

/// Git CLI backed fetcher.
#[derive(Debug, Clone)]
pub struct GitRepository {
    remote_url: String,
}

impl Default for GitRepository {
    fn default() -> Self {
        Self::new(TEMPLATE_REMOTE_REPOSITORY)
    }
}

impl GitRepository {
    pub fn new(remote_url: impl Into<String>) -> Self {
        Self {
            remote_url: remote_url.into(),
        }
    }

    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }

    fn is_repository(path: &Path) -> bool {
        path.join(".git").exists()
    }

    fn git(cwd: Option<&Path>, args: &[&str]) -> Result<String, String> {
        let mut cmd = Command::new("git");
        cmd.args(args);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        debug!("Running git {}", args.join(" "));

        let output = cmd
            .output()
            .map_err(|e| format!("failed to run git {}: {}", args[0], e))?;
        if !output.status.success() {
            return Err(format!(
                "git {} failed: {}",
                args[0],
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn has_uncommitted_changes(path: &Path) -> Result<bool, String> {
        let status = Self::git(Some(path), &["status", "--porcelain"])?;
        Ok(status.lines().any(|l| !l.trim().is_empty()))
    }

    fn clone_into(&self, path: &Path) -> TemplateResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let target: PathBuf = path.to_path_buf();
        let target = target.to_string_lossy();
        info!("Cloning {} into {}", self.remote_url, target);
        Self::git(None, &["clone", "--depth", "1", &self.remote_url, &target])
            .map(|_| ())
            .map_err(TemplateError::FetchFailed)
    }
}

impl TemplateFetcher for GitRepository {
    fn fetch(&self, path: &Path) -> TemplateResult<()> {
        if path.exists() {
            debug!("Templates already present at {}", path.display());
            return Ok(());
        }
        self.clone_into(path)
    }

    fn sync(&self, path: &Path, force: bool) -> TemplateResult<()> {
        if !Self::is_repository(path) {
            return self.clone_into(path);
        }

        let dirty = Self::has_uncommitted_changes(path).map_err(TemplateError::SyncFailed)?;
        if dirty && !force {
            return Err(TemplateError::UncommittedChanges(path.to_path_buf()));
        }

        if dirty {
            info!("Discarding local changes in {}", path.display());
            Self::git(Some(path), &["reset", "--hard"]).map_err(TemplateError::SyncFailed)?;
        }

        info!("Pulling {} into {}", self.remote_url, path.display());
        Self::git(Some(path), &["pull", "--ff-only", "origin"]).map_err(TemplateError::SyncFailed)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_remote() {
        assert_eq!(GitRepository::default().remote_url(), TEMPLATE_REMOTE_REPOSITORY);
    }

    #[test]
    fn test_fetch_existing_path_is_noop() {
        let temp = tempdir().unwrap();
        let repo = GitRepository::new("file:///nonexistent");
        assert!(repo.fetch(temp.path()).is_ok());
    }

    #[test]
    fn test_fetch_unreachable_remote_fails() {
        let temp = tempdir().unwrap();
        let target = temp.path().join("templates");
        let repo = GitRepository::new(format!("file://{}", temp.path().join("absent").display()));

        let err = repo.fetch(&target).unwrap_err();
        assert!(matches!(err, TemplateError::FetchFailed(_)));
        assert!(!target.join("index.yaml").exists());
    }

    #[test]
    fn test_is_repository() {
        let temp = tempdir().unwrap();
        assert!(!GitRepository::is_repository(temp.path()));
        std::fs::create_dir(temp.path().join(".git")).unwrap();
        assert!(GitRepository::is_repository(temp.path()));
    }
}
