//! Workspace - The single directory every operation is scoped to
//!
//! The root is chosen by the user and persisted across restarts. It is never
//! trusted on the strength of a past check: every [`WorkspaceRoot::current`]
//! call revalidates that it still exists and is a directory, and reports no
//! root at all when that fails.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// On-disk shape of the persisted root
#[derive(Debug, Serialize, Deserialize)]
struct PersistedRoot {
    root: PathBuf,
}

/// Default location of the workspace state file
#[must_use]
pub fn default_state_file() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("warden").join("workspace.json"))
}

/// Persisted, revalidated workspace root
///
/// Reads hand out snapshots; `set`/`clear` replace the snapshot as a whole.
#[derive(Debug, Default)]
pub struct WorkspaceRoot {
    state_file: Option<PathBuf>,
    current: RwLock<Option<Arc<PathBuf>>>,
}

impl WorkspaceRoot {
    /// A root that lives only for this process
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// A root persisted in `state_file`, loading whatever was stored there.
    ///
    /// An unreadable or malformed state file is treated as "no root".
    #[must_use]
    pub fn with_state_file(state_file: impl Into<PathBuf>) -> Self {
        let state_file = state_file.into();
        let stored = match std::fs::read_to_string(&state_file) {
            Ok(content) => match serde_json::from_str::<PersistedRoot>(&content) {
                Ok(persisted) => Some(Arc::new(persisted.root)),
                Err(e) => {
                    warn!(
                        path = %state_file.display(),
                        error = %e,
                        "Ignoring malformed workspace state file"
                    );
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(
                    path = %state_file.display(),
                    error = %e,
                    "Ignoring unreadable workspace state file"
                );
                None
            }
        };

        Self {
            state_file: Some(state_file),
            current: RwLock::new(stored),
        }
    }

    /// An in-memory root set to `path` (validated like [`Self::set`])
    pub fn fixed(path: &Path) -> Result<Self> {
        let root = Self::in_memory();
        root.set(path)?;
        Ok(root)
    }

    /// Where the root is persisted, if anywhere
    #[must_use]
    pub fn state_file(&self) -> Option<&Path> {
        self.state_file.as_deref()
    }

    /// The stored root, without revalidation (for display only)
    #[must_use]
    pub fn stored(&self) -> Option<PathBuf> {
        self.current
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|p| p.as_ref().clone()))
    }

    /// The current root, revalidated on every call.
    ///
    /// Returns `None` if no root is set, or if the stored root no longer
    /// exists or is no longer a directory.
    #[must_use]
    pub fn current(&self) -> Option<PathBuf> {
        let stored = self.stored()?;
        match std::fs::metadata(&stored) {
            Ok(meta) if meta.is_dir() => Some(stored),
            Ok(_) => {
                warn!(root = %stored.display(), "Workspace root is no longer a directory");
                None
            }
            Err(e) => {
                warn!(root = %stored.display(), error = %e, "Workspace root is unavailable");
                None
            }
        }
    }

    /// Set the root to `path`.
    ///
    /// The path must exist and be a directory; it is stored canonicalized and
    /// persisted before the in-memory snapshot is replaced.
    pub fn set(&self, path: &Path) -> Result<PathBuf> {
        let canonical = path.canonicalize().map_err(|e| {
            Error::InvalidWorkspace(format!("cannot resolve '{}': {}", path.display(), e))
        })?;
        if !canonical.is_dir() {
            return Err(Error::InvalidWorkspace(format!(
                "'{}' is not a directory",
                canonical.display()
            )));
        }

        if let Some(state_file) = &self.state_file {
            persist(
                state_file,
                &PersistedRoot {
                    root: canonical.clone(),
                },
            )?;
        }

        let mut guard = self
            .current
            .write()
            .map_err(|_| Error::InvalidWorkspace("workspace state poisoned".to_string()))?;
        *guard = Some(Arc::new(canonical.clone()));
        info!(root = %canonical.display(), "Workspace root set");
        Ok(canonical)
    }

    /// Forget the root (and its persisted copy).
    pub fn clear(&self) -> Result<()> {
        if let Some(state_file) = &self.state_file {
            match std::fs::remove_file(state_file) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }
        let mut guard = self
            .current
            .write()
            .map_err(|_| Error::InvalidWorkspace("workspace state poisoned".to_string()))?;
        *guard = None;
        info!("Workspace root cleared");
        Ok(())
    }
}

/// Write the state file via a temp file + rename so readers never see a torn
/// document.
fn persist(state_file: &Path, value: &PersistedRoot) -> Result<()> {
    if let Some(parent) = state_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(value)
        .map_err(|e| Error::InvalidWorkspace(e.to_string()))?;
    let tmp = state_file.with_extension("json.tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, state_file)?;
    debug!(path = %state_file.display(), "Workspace state persisted");
    Ok(())
}
