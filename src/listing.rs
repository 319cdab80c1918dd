//! Directory listings with shareable links.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::address;
use crate::error::ShareError;
use crate::resolve::ServedRoot;

/// URL prefix under which the served root is mounted.
pub const FILES_PREFIX: &str = "/files";

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub name: String,
    pub is_file: bool,
    pub url: String,
}

/// Scheme, host and port that shareable links point at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBase {
    pub host: String,
    pub port: u16,
}

impl LinkBase {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Link base for the host's current LAN address.
    pub fn resolve(port: u16) -> Self {
        Self::new(address::resolve_lan_address(), port)
    }

    /// Absolute URL for a path given as segments relative to the served root.
    ///
    /// Segments are percent-encoded individually and joined with `/`.
    pub fn url_for<S: AsRef<str>>(&self, segments: &[S]) -> String {
        let mut url = format!("http://{}:{}{}", self.host, self.port, FILES_PREFIX);
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment.as_ref()));
        }
        url
    }
}

/// List the immediate children of `dir`, which must lie under `root`.
///
/// Entries come back sorted by name (case-insensitive, then bytewise). An
/// entry that disappears or fails to read mid-listing is skipped, as is any
/// entry whose name is not valid UTF-8; the result is a best-effort snapshot.
pub fn list_directory(
    dir: &Path,
    root: &ServedRoot,
    base: &LinkBase,
) -> Result<Vec<Entry>, ShareError> {
    let read_dir = fs::read_dir(dir).map_err(|source| ShareError::DirectoryOpen {
        path: dir.to_path_buf(),
        source,
    })?;

    let parent_segments = root.relative_segments(dir);
    let mut entries = Vec::new();

    for dir_entry in read_dir {
        let dir_entry = match dir_entry {
            Ok(dir_entry) => dir_entry,
            Err(err) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), err);
                continue;
            }
        };

        // Request paths are UTF-8, so a non-UTF-8 name could never be fetched.
        let name = match dir_entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                warn!("Skipping non-UTF-8 name {:?} in {}", raw, dir.display());
                continue;
            }
        };

        // Follow symlinks so a link to a directory lists as a directory.
        let is_dir = match fs::metadata(dir_entry.path()) {
            Ok(metadata) => metadata.is_dir(),
            Err(_) => match dir_entry.file_type() {
                Ok(file_type) => file_type.is_dir(),
                Err(err) => {
                    debug!("Entry {} vanished during listing: {}", name, err);
                    continue;
                }
            },
        };

        let mut segments = parent_segments.clone();
        segments.push(name.clone());

        entries.push(Entry {
            url: base.url_for(&segments),
            name,
            is_file: !is_dir,
        });
    }

    entries.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });

    Ok(entries)
}
