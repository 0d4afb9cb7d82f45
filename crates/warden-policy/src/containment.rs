//! Containment - The canonical workspace containment check
//!
//! Every boundary that touches the filesystem (engine, read handler, search
//! handler) calls into this module; nothing re-derives the algorithm.
//!
//! Both sides are resolved first: symlinks followed, `.` and `..` removed.
//! A candidate is contained when its resolved form equals the resolved root
//! or lies beneath it component-wise (so `/ws-other` is not inside `/ws`).

use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Resolve `path` to an absolute, symlink-free form.
///
/// Existing paths are canonicalized. For a path that does not exist yet the
/// deepest existing ancestor is canonicalized and the remaining components
/// are applied lexically. A `..` in that tail could step back onto an
/// existing component that was never resolved (possibly a symlink), so any
/// `..` there makes the path unresolvable. Returns `None` when nothing along
/// the path resolves.
#[must_use]
pub fn resolve_path(path: &Path) -> Option<PathBuf> {
    if let Ok(canonical) = path.canonicalize() {
        return Some(canonical);
    }

    let mut base = None;
    for ancestor in path.ancestors().skip(1) {
        if ancestor.as_os_str().is_empty() {
            break;
        }
        if let Ok(canonical) = ancestor.canonicalize() {
            base = Some((ancestor, canonical));
            break;
        }
    }
    let (ancestor, mut resolved) = base?;
    let tail = path.strip_prefix(ancestor).ok()?;

    for component in tail.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                debug!(path = %path.display(), "Rejecting '..' past a missing component");
                return None;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(resolved)
}

/// Turn a planner-supplied path into a candidate path.
///
/// Absolute paths are used as-is; relative paths are taken under `root`.
#[must_use]
pub fn resolve_candidate(root: &Path, candidate: &str) -> PathBuf {
    let candidate = Path::new(candidate);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    }
}

/// Resolve `candidate` and return it only if it is contained under `root`.
#[must_use]
pub fn resolve_within(root: &Path, candidate: &Path) -> Option<PathBuf> {
    let root = root.canonicalize().ok()?;
    let resolved = resolve_path(candidate)?;

    if resolved == root || resolved.starts_with(&root) {
        Some(resolved)
    } else {
        debug!(
            root = %root.display(),
            candidate = %candidate.display(),
            resolved = %resolved.display(),
            "Path escapes workspace root"
        );
        None
    }
}

/// Check whether `candidate` is contained under `root`.
///
/// A root that does not resolve contains nothing.
#[must_use]
pub fn is_contained(root: &Path, candidate: &Path) -> bool {
    resolve_within(root, candidate).is_some()
}
