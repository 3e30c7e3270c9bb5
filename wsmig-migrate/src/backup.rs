//! Pre-mutation backups.
//!
//! Every pipeline hands its collected items to a [`BackupSink`] before the
//! first create call. Backups are write-once artifacts for manual recovery;
//! nothing in the engine reads them back.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::{MigrateResult, MigrationError};
use crate::resource::ResourceKind;

/// A written backup.
#[derive(Debug, Clone, Serialize)]
pub struct BackupRecord {
    /// Resource kind.
    pub kind: ResourceKind,
    /// When the backup was written.
    pub written_at: DateTime<Local>,
    /// Where the backup lives.
    pub path: PathBuf,
    /// Number of items in the backup.
    pub item_count: usize,
}

/// Destination for pipeline backups.
#[async_trait::async_trait]
pub trait BackupSink: Send + Sync {
    /// Persist the collected items for a kind.
    async fn write(&self, kind: ResourceKind, items: &[Value]) -> MigrateResult<BackupRecord>;
}

/// Writes `backup_<kind>_<YYYYMMDD_HHMMSS>.json` files into a directory.
#[derive(Debug, Clone)]
pub struct FileBackupWriter {
    dir: PathBuf,
}

impl FileBackupWriter {
    /// Create a writer for a directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory backups are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for a backup written at `at`.
    pub fn file_name(kind: ResourceKind, at: &DateTime<Local>) -> String {
        format!("backup_{}_{}.json", kind.as_str(), at.format("%Y%m%d_%H%M%S"))
    }

    async fn write_at(
        &self,
        kind: ResourceKind,
        items: &[Value],
        written_at: DateTime<Local>,
    ) -> MigrateResult<BackupRecord> {
        let path = self.dir.join(Self::file_name(kind, &written_at));

        let content = serde_json::to_string_pretty(items)
            .map_err(|e| MigrationError::backup(kind.as_str(), e.to_string()))?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| MigrationError::backup(kind.as_str(), e.to_string()))?;

        // Backups are write-once: never replace one from an earlier run.
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => MigrationError::backup(
                    kind.as_str(),
                    format!("backup file {} already exists", path.display()),
                ),
                _ => MigrationError::backup(kind.as_str(), e.to_string()),
            })?;
        file.write_all(content.as_bytes())
            .await
            .map_err(|e| MigrationError::backup(kind.as_str(), e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| MigrationError::backup(kind.as_str(), e.to_string()))?;

        info!(path = %path.display(), items = items.len(), "Backup saved");

        Ok(BackupRecord {
            kind,
            written_at,
            path,
            item_count: items.len(),
        })
    }
}

#[async_trait::async_trait]
impl BackupSink for FileBackupWriter {
    async fn write(&self, kind: ResourceKind, items: &[Value]) -> MigrateResult<BackupRecord> {
        self.write_at(kind, items, Local::now()).await
    }
}
