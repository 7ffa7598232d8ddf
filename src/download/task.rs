//! Files to mirror and where they land on disk.
//!
//! A [`DownloadTask`] pairs a remote file with its destination relative to the
//! output root. The destination is derived from the URL path below the crawl
//! root, decoded and sanitized so it can never leave the output root.
//!
//! ```rust
//! use dirmirror::download::DownloadTask;
//! use std::path::PathBuf;
//! use url::Url;
//!
//! let root = Url::parse("http://h/pub/")?;
//! let file = Url::parse("http://h/pub/iso/disk%201.img")?;
//! let task = DownloadTask::from_url(&root, &file)?;
//! assert_eq!(task.destination, PathBuf::from("iso").join("disk 1.img"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use super::unit::PARTIAL_SUFFIX;
use crate::error::{Error, Result};
use crate::listing::{as_directory, is_strict_descendant};

use std::path::{Component, Path, PathBuf};
use url::Url;

/// Represents a file to be mirrored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    /// URL of the remote file.
    pub source_url: Url,
    /// Location of the file relative to the output root.
    pub destination: PathBuf,
    /// Size announced before the transfer, if any.
    pub expected_size: Option<u64>,
    /// Offset the transfer starts from.
    pub resume_offset: u64,
}

impl DownloadTask {
    /// Creates a new [`DownloadTask`] with an explicit destination.
    pub fn new(source_url: &Url, destination: impl Into<PathBuf>) -> Self {
        Self {
            source_url: source_url.clone(),
            destination: destination.into(),
            expected_size: None,
            resume_offset: 0,
        }
    }

    /// Creates a task for `url`, placed at its path relative to `root`.
    pub fn from_url(root: &Url, url: &Url) -> Result<Self> {
        Ok(Self::new(url, destination_for(root, url)?))
    }

    /// Returns a copy with the size the file is expected to have.
    pub fn with_expected_size(self, size: u64) -> Self {
        Self {
            expected_size: Some(size),
            ..self
        }
    }

    /// Returns a copy recording the offset a transfer resumed from.
    pub fn with_resume_offset(self, offset: u64) -> Self {
        Self {
            resume_offset: offset,
            ..self
        }
    }

    /// Last component of the destination, for display.
    pub fn filename(&self) -> String {
        self.destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Derive the relative destination of `url` below `root`.
pub fn destination_for(root: &Url, url: &Url) -> Result<PathBuf> {
    let root = as_directory(root);
    if !is_strict_descendant(url, &root) {
        return Err(Error::InvalidUrl(format!(
            "\"{}\" is not below the mirror root \"{}\"",
            url, root
        )));
    }

    let relative = &url.path()[root.path().len()..];
    let mut segments: Vec<String> = relative
        .split('/')
        .filter_map(sanitize_segment)
        .collect();
    segments.iter_mut().for_each(escape_partial_name);
    let path: PathBuf = segments.iter().collect();

    if path.as_os_str().is_empty() || !is_contained(&path) {
        return Err(Error::InvalidUrl(format!(
            "\"{}\" does not map to a local file name",
            url
        )));
    }
    Ok(path)
}

/// Decode one URL path segment into a safe file name.
///
/// Empty and `.` segments vanish, `..` is neutralized, and separators smuggled
/// in through percent-encoding are replaced.
pub(crate) fn sanitize_segment(segment: &str) -> Option<String> {
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());

    let cleaned: String = decoded
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            #[cfg(windows)]
            ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." => None,
        ".." => Some("__".to_string()),
        _ => Some(cleaned),
    }
}

/// Keep remote names off the partial namespace.
///
/// A segment ending in the partial suffix, optionally followed by underscores,
/// gets one more underscore, so neither a file nor a directory named `x.part`
/// lands on the partial of `x`, and distinct remote names stay distinct.
fn escape_partial_name(name: &mut String) {
    if name.trim_end_matches('_').ends_with(PARTIAL_SUFFIX) {
        name.push('_');
    }
}

fn is_contained(path: &Path) -> bool {
    path.components().all(|c| matches!(c, Component::Normal(_)))
}
