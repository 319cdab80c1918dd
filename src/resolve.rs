//! Mapping of logical request paths onto the served root.
//!
//! Logical paths are always `/`-separated. They are split into segments and
//! pushed onto the root one component at a time, so the native path uses the
//! host's own separator without any textual rewriting. The joined path is then
//! canonicalized and must stay under the canonical root.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ShareError;

/// The single directory exposed by the server.
///
/// Holds the canonical form of the directory, computed once at startup.
#[derive(Debug, Clone)]
pub struct ServedRoot {
    path: PathBuf,
}

impl ServedRoot {
    /// Canonicalize `path` and check that it is a directory.
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().canonicalize()?;
        if !path.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("served root is not a directory: {}", path.display()),
            ));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path segments of `native` relative to the root. Empty for the root
    /// itself or for paths outside it.
    ///
    /// Components are converted lossily. Every directory reachable here was
    /// named by a UTF-8 request path, and listings skip non-UTF-8 names, so
    /// the lossy branch only matters for paths built by hand.
    pub fn relative_segments(&self, native: &Path) -> Vec<String> {
        let Ok(relative) = native.strip_prefix(&self.path) else {
            return Vec::new();
        };

        relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect()
    }

    /// Logical path (always starting with `/`) for a native path under the root.
    pub fn logical_path(&self, native: &Path) -> String {
        format!("/{}", self.relative_segments(native).join("/"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    File,
    Directory,
    Missing,
}

#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub native_path: PathBuf,
    pub kind: TargetKind,
}

/// Classify a native path by a single `stat`.
pub fn classify(path: &Path) -> TargetKind {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => TargetKind::Directory,
        Ok(_) => TargetKind::File,
        Err(_) => TargetKind::Missing,
    }
}

/// Resolve a logical request path against the served root.
///
/// `/` maps to the root itself. A path that does not exist is classified
/// [`TargetKind::Missing`]; a path that exists but canonicalizes outside the
/// root (through `..` or a symlink) is rejected with
/// [`ShareError::PathTraversal`].
pub fn resolve(root: &ServedRoot, request_path: &str) -> Result<ResolvedTarget, ShareError> {
    if request_path == "/" {
        return Ok(ResolvedTarget {
            native_path: root.path().to_path_buf(),
            kind: classify(root.path()),
        });
    }

    let joined = join_segments(root.path(), request_path)?;

    let canonical = match joined.canonicalize() {
        Ok(canonical) => canonical,
        Err(err) => {
            debug!("Cannot resolve {}: {}", joined.display(), err);
            return Ok(ResolvedTarget {
                native_path: joined,
                kind: TargetKind::Missing,
            });
        }
    };

    if !canonical.starts_with(root.path()) {
        warn!(
            "Rejected {:?}: resolved to {:?} outside {:?}",
            request_path,
            canonical,
            root.path()
        );
        return Err(ShareError::PathTraversal);
    }

    let kind = classify(&canonical);
    Ok(ResolvedTarget {
        native_path: canonical,
        kind,
    })
}

/// Push each `/`-separated segment onto `root` as exactly one component.
fn join_segments(root: &Path, request_path: &str) -> Result<PathBuf, ShareError> {
    let mut result = root.to_path_buf();

    for segment in request_path.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }

        if segment.contains('\0') || segment.contains('\\') {
            warn!("Rejected path segment {:?}", segment);
            return Err(ShareError::PathTraversal);
        }

        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => result.push(name),
            (Some(Component::ParentDir), None) => result.push(Component::ParentDir),
            _ => {
                warn!("Rejected path segment {:?}", segment);
                return Err(ShareError::PathTraversal);
            }
        }
    }

    Ok(result)
}
