//! Shared path manipulation utilities.

use std::env;
use std::path::{Component, Path, PathBuf};

use crate::core::errors::{Result, SyncError};

/// Resolve a path to an absolute, normalized path.
///
/// If `fs::canonicalize` succeeds (path exists), it is used to resolve symlinks
/// and normalize components.
///
/// If it fails (e.g. path does not exist), the path is made absolute relative
/// to CWD and `..`/`.` components are resolved syntactically.
pub fn resolve_absolute_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };

    if let Ok(canonical) = std::fs::canonicalize(&absolute) {
        return canonical;
    }

    normalize_syntactic(&absolute)
}

fn normalize_syntactic(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(..) | Component::RootDir | Component::Normal(_) => {
                components.push(component);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                }
            }
        }
    }
    components.into_iter().collect()
}

/// Re-root `path` from `from_root` onto `to_root`.
///
/// Returns `None` when `path` does not live under `from_root`.
pub fn mirror_path(from_root: &Path, to_root: &Path, path: &Path) -> Option<PathBuf> {
    let relative = path.strip_prefix(from_root).ok()?;
    if relative.as_os_str().is_empty() {
        return Some(to_root.to_path_buf());
    }
    Some(to_root.join(relative))
}

/// Reject a source/replica pair where one root contains the other.
///
/// Both paths are expected to be already resolved with [`resolve_absolute_path`].
/// Identical roots count as nested.
pub fn check_disjoint(source: &Path, replica: &Path) -> Result<()> {
    if replica.starts_with(source) {
        return Err(SyncError::OverlappingRoots {
            outer: source.to_path_buf(),
            inner: replica.to_path_buf(),
        });
    }
    if source.starts_with(replica) {
        return Err(SyncError::OverlappingRoots {
            outer: replica.to_path_buf(),
            inner: source.to_path_buf(),
        });
    }
    Ok(())
}
