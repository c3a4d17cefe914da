//! Path containment for the filesystem tools

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Path validation errors
#[derive(Error, Debug)]
pub enum FsError {
    #[error("Access denied - path outside allowed directory: {path} not in {root}")]
    AccessDenied { path: PathBuf, root: PathBuf },

    #[error("Parent directory does not exist: {0}")]
    ParentMissing(PathBuf),

    #[error("Allowed directory is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Error accessing directory {path}: {source}")]
    RootInaccessible {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type FsResult<T> = Result<T, FsError>;

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(path.trim_start_matches('~').trim_start_matches('/'));
        }
    }
    PathBuf::from(path)
}

/// Canonicalize the allowed root; it must exist and be a directory
pub fn canonical_root(root: &Path) -> FsResult<PathBuf> {
    let expanded = expand_home(&root.to_string_lossy());
    let canonical = expanded
        .canonicalize()
        .map_err(|source| FsError::RootInaccessible {
            path: expanded.clone(),
            source,
        })?;

    if !canonical.is_dir() {
        return Err(FsError::NotADirectory(canonical));
    }
    Ok(canonical)
}

/// Resolve `requested` against `root` and check it stays inside
///
/// `root` must already be canonical. Returns the canonical path when it
/// exists; for a path that does not exist yet, its parent is checked instead
/// and the unresolved absolute path is returned.
pub fn validate_path(requested: &str, root: &Path) -> FsResult<PathBuf> {
    let expanded = expand_home(requested);
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        root.join(expanded)
    };

    let deny = || FsError::AccessDenied {
        path: absolute.clone(),
        root: root.to_path_buf(),
    };

    match absolute.canonicalize() {
        Ok(real) => {
            if real.starts_with(root) {
                Ok(real)
            } else {
                Err(deny())
            }
        }
        Err(_) => {
            let parent = absolute.parent().unwrap_or(root);
            let real_parent = parent
                .canonicalize()
                .map_err(|_| FsError::ParentMissing(parent.to_path_buf()))?;
            if real_parent.starts_with(root) {
                Ok(absolute.clone())
            } else {
                Err(deny())
            }
        }
    }
}
