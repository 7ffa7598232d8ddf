//! Entries discovered on a listing page and the descendant rule that keeps a
//! crawl inside its subtree.

use url::Url;

/// Whether an entry is a file or another listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

/// One child of a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteEntry {
    /// Absolute URL, without query or fragment.
    pub url: Url,
    pub kind: EntryKind,
}

impl RemoteEntry {
    /// Classify `url` by its trailing slash.
    pub fn from_url(url: Url) -> Self {
        let kind = if url.path().ends_with('/') {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        Self { url, kind }
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Return `url` with a trailing slash on its path.
///
/// Listing pages are directories, and relative links only resolve below them
/// when the base path ends with `/`.
pub fn as_directory(url: &Url) -> Url {
    let mut dir = url.clone();
    if !dir.path().ends_with('/') {
        let path = format!("{}/", dir.path());
        dir.set_path(&path);
    }
    dir
}

/// Whether `candidate` lies strictly below the directory `base`.
///
/// Both URLs must share scheme, host and port, and the candidate path must
/// extend the base path. The base itself is not a descendant.
pub fn is_strict_descendant(candidate: &Url, base: &Url) -> bool {
    if candidate.scheme() != base.scheme()
        || candidate.host_str() != base.host_str()
        || candidate.port_or_known_default() != base.port_or_known_default()
    {
        return false;
    }

    let base = as_directory(base);
    let base_path = base.path();
    let path = candidate.path();
    path.len() > base_path.len() && path.starts_with(base_path)
}
