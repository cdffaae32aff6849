//! `SQLite`-backed deployment state store.
//!
//! One table (the "bucket") holds a row per running `(provider, template)`
//! pair. Every operation runs in its own transaction. The database file is
//! guarded by an exclusive lock on a sidecar `.lock` file for as long as the
//! store is open, so a second process fails fast instead of racing.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};
use tracing::{debug, info};

use crate::config::{is_valid_bucket, lock_path_for, StoreConfig};
use crate::error::{StateError, StateResult};

/// A template running on a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub provider_name: String,
    pub template_id: String,
    pub created_at: DateTime<Utc>,
}

/// Persistent record of active deployments.
pub struct DeploymentStore {
    conn: Mutex<Connection>,
    bucket: String,
    lifecycle: AsyncMutex<()>,
    path: Option<PathBuf>,
    // Held for the lifetime of the store; dropping it releases the lock.
    _lock: Option<File>,
}

impl DeploymentStore {
    /// Open (creating if needed) the store described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Locked`] if another process holds the store.
    pub fn open(config: &StoreConfig) -> StateResult<Self> {
        if !is_valid_bucket(&config.bucket_name) {
            return Err(StateError::InvalidBucket(config.bucket_name.clone()));
        }
        fs::create_dir_all(&config.directory)?;
        Self::open_path(config.database_path(), &config.bucket_name)
    }

    fn open_path(path: PathBuf, bucket: &str) -> StateResult<Self> {
        let lock = acquire_lock(&lock_path_for(&path))?;

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        initialize(&conn, bucket)?;
        info!("Opened deployment store at {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
            bucket: bucket.to_string(),
            lifecycle: AsyncMutex::new(()),
            path: Some(path),
            _lock: Some(lock),
        })
    }

    /// Create an unlocked in-memory store for testing.
    pub fn in_memory() -> StateResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize(&conn, crate::config::DEFAULT_BUCKET_NAME)?;
        Ok(Self {
            conn: Mutex::new(conn),
            bucket: crate::config::DEFAULT_BUCKET_NAME.to_string(),
            lifecycle: AsyncMutex::new(()),
            path: None,
            _lock: None,
        })
    }

    /// Database path, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Serialise a check-then-act lifecycle sequence.
    ///
    /// Callers hold the guard across the existence check, the backend action
    /// and the state write.
    pub async fn lifecycle_guard(&self) -> AsyncMutexGuard<'_, ()> {
        self.lifecycle.lock().await
    }

    /// Whether a deployment exists for the pair.
    pub fn exists(&self, provider_name: &str, template_id: &str) -> StateResult<bool> {
        Ok(self.find(provider_name, template_id)?.is_some())
    }

    /// Fetch the deployment for the pair, if any.
    pub fn find(&self, provider_name: &str, template_id: &str) -> StateResult<Option<Deployment>> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let row: Option<String> = tx
            .query_row(
                &format!(
                    "SELECT created_at FROM {} WHERE provider_name = ?1 AND template_id = ?2",
                    self.bucket
                ),
                params![provider_name, template_id],
                |row| row.get(0),
            )
            .optional()?;
        tx.commit()?;

        row.map(|created_at| decode(provider_name, template_id, &created_at))
            .transpose()
    }

    /// Record a new deployment created now.
    ///
    /// An existing record for the pair is replaced; duplicate prevention is
    /// the caller's job.
    pub fn add(&self, provider_name: &str, template_id: &str) -> StateResult<()> {
        let created_at = Utc::now().to_rfc3339();
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute(
            &format!(
                "INSERT OR REPLACE INTO {} (provider_name, template_id, created_at) VALUES (?1, ?2, ?3)",
                self.bucket
            ),
            params![provider_name, template_id, created_at],
        )?;
        tx.commit()?;
        debug!("Recorded deployment {}/{}", provider_name, template_id);
        Ok(())
    }

    /// Delete the deployment for the pair. Deleting an absent record is a no-op.
    pub fn remove(&self, provider_name: &str, template_id: &str) -> StateResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let removed = tx.execute(
            &format!(
                "DELETE FROM {} WHERE provider_name = ?1 AND template_id = ?2",
                self.bucket
            ),
            params![provider_name, template_id],
        )?;
        tx.commit()?;
        debug!(
            "Removed {} deployment record(s) for {}/{}",
            removed, provider_name, template_id
        );
        Ok(())
    }

    /// Every tracked deployment, in no particular order.
    pub fn list_all(&self) -> StateResult<Vec<Deployment>> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut stmt = tx.prepare(&format!(
            "SELECT provider_name, template_id, created_at FROM {}",
            self.bucket
        ))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);
        tx.commit()?;

        rows.iter()
            .map(|(provider, template, created_at)| decode(provider, template, created_at))
            .collect()
    }
}

impl std::fmt::Debug for DeploymentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentStore")
            .field("path", &self.path)
            .field("bucket", &self.bucket)
            .finish()
    }
}

fn acquire_lock(lock_path: &Path) -> StateResult<File> {
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(lock_path)?;
    file.try_lock_exclusive()
        .map_err(|_| StateError::Locked(lock_path.to_path_buf()))?;
    Ok(file)
}

fn initialize(conn: &Connection, bucket: &str) -> StateResult<()> {
    conn.execute_batch(&format!(
        "PRAGMA synchronous = FULL;
         CREATE TABLE IF NOT EXISTS {bucket} (
             provider_name TEXT NOT NULL,
             template_id   TEXT NOT NULL,
             created_at    TEXT NOT NULL,
             PRIMARY KEY (provider_name, template_id)
         );"
    ))?;
    Ok(())
}

fn decode(provider: &str, template: &str, created_at: &str) -> StateResult<Deployment> {
    let created_at = DateTime::parse_from_rfc3339(created_at)
        .map_err(|e| StateError::CorruptRecord {
            provider: provider.to_string(),
            template: template.to_string(),
            message: e.to_string(),
        })?
        .with_timezone(&Utc);
    Ok(Deployment {
        provider_name: provider.to_string(),
        template_id: template.to_string(),
        created_at,
    })
}
