//! Log - The on-disk NDJSON audit log
//!
//! All access (append, recent, export, rotation) goes through one
//! `tokio::sync::Mutex`, so concurrent writers never interleave partial
//! lines and readers always see whole records.
//!
//! Rotation happens before an append that would push the current file past
//! `max_bytes`: `audit.log.N` is discarded, each remaining backup shifts up
//! by one, and the current file becomes `audit.log.1`.

use crate::error::Result;
use crate::event::{AuditRecord, EventKind};
use crate::redact::redact;
use crate::sink::AuditSink;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Default rotation threshold (50 MiB)
pub const DEFAULT_MAX_BYTES: u64 = 50 * 1024 * 1024;

/// Default number of rotated backups kept
pub const DEFAULT_MAX_BACKUPS: usize = 3;

/// Audit log configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Current log file
    pub path: PathBuf,
    /// Rotation threshold in bytes
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    /// Rotated backups to keep
    #[serde(default = "default_max_backups")]
    pub max_backups: usize,
}

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_BYTES
}

fn default_max_backups() -> usize {
    DEFAULT_MAX_BACKUPS
}

impl AuditConfig {
    /// Configuration with default rotation for `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_bytes: DEFAULT_MAX_BYTES,
            max_backups: DEFAULT_MAX_BACKUPS,
        }
    }

    /// Set the rotation threshold
    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Set the number of backups
    #[must_use]
    pub fn with_max_backups(mut self, max_backups: usize) -> Self {
        self.max_backups = max_backups;
        self
    }
}

/// Path of the `index`-th backup (`audit.log.1`, `audit.log.2`, ...)
#[must_use]
pub fn backup_path(path: &Path, index: usize) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

struct WriterState {
    file: File,
    size: u64,
}

/// Append-only, redacted, rotating audit log
pub struct AuditLog {
    config: AuditConfig,
    writer: Mutex<WriterState>,
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AuditLog {
    /// Open (or create) the log described by `config`
    pub async fn open(config: AuditConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let file = open_append(&config.path).await?;
        let size = file.metadata().await?.len();
        info!(path = %config.path.display(), size, "Audit log opened");

        Ok(Self {
            config,
            writer: Mutex::new(WriterState { file, size }),
        })
    }

    /// Current log file path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Log configuration
    #[must_use]
    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Redact, serialize and append one record.
    pub async fn record(&self, event: EventKind, payload: serde_json::Value) -> Result<()> {
        let record = AuditRecord::new(event, redact(payload));
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');
        let len = line.len() as u64;

        let mut state = self.writer.lock().await;
        if state.size > 0 && state.size + len > self.config.max_bytes {
            self.rotate(&mut state).await?;
        }
        state.file.write_all(line.as_bytes()).await?;
        state.file.flush().await?;
        state.size += len;

        debug!(event = %event, bytes = len, "Audit record appended");
        Ok(())
    }

    /// The last `n` raw lines of the current file, oldest first
    pub async fn recent_lines(&self, n: usize) -> Result<Vec<String>> {
        let mut state = self.writer.lock().await;
        state.file.flush().await?;
        let content = fs::read_to_string(&self.config.path).await?;
        let lines: Vec<&str> = content.lines().filter(|l| !l.is_empty()).collect();
        let start = lines.len().saturating_sub(n);
        Ok(lines[start..].iter().map(|l| (*l).to_string()).collect())
    }

    /// Copy the current (already redacted) file to `dest`.
    ///
    /// Returns the number of bytes copied.
    pub async fn export(&self, dest: &Path) -> Result<u64> {
        let mut state = self.writer.lock().await;
        state.file.flush().await?;
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let bytes = fs::copy(&self.config.path, dest).await?;
        info!(dest = %dest.display(), bytes, "Audit log exported");
        Ok(bytes)
    }

    async fn rotate(&self, state: &mut WriterState) -> Result<()> {
        state.file.flush().await?;
        let path = &self.config.path;
        let backups = self.config.max_backups;

        if backups == 0 {
            fs::remove_file(path).await?;
        } else {
            remove_if_exists(&backup_path(path, backups)).await?;
            for index in (1..backups).rev() {
                let from = backup_path(path, index);
                if fs::try_exists(&from).await? {
                    fs::rename(&from, backup_path(path, index + 1)).await?;
                }
            }
            fs::rename(path, backup_path(path, 1)).await?;
        }

        state.file = open_append(path).await?;
        state.size = 0;
        info!(path = %path.display(), backups, "Audit log rotated");
        Ok(())
    }
}

#[async_trait]
impl AuditSink for AuditLog {
    async fn append(&self, event: EventKind, payload: serde_json::Value) -> Result<()> {
        self.record(event, payload).await
    }

    async fn recent(&self, n: usize) -> Result<Vec<AuditRecord>> {
        let lines = self.recent_lines(n).await?;
        let mut records = Vec::with_capacity(lines.len());
        for line in lines {
            match serde_json::from_str::<AuditRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(error = %e, "Skipping unreadable audit line"),
            }
        }
        Ok(records)
    }

    fn name(&self) -> &str {
        "file"
    }
}

async fn open_append(path: &Path) -> Result<File> {
    Ok(OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?)
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
