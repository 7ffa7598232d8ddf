//! Configuration structures and defaults for a mirroring run.
//!
//! # Example
//!
//! ```rust
//! use dirmirror::mirror::{EventCallback, MirrorEvent};
//!
//! let callback: EventCallback = Box::new(|event: &MirrorEvent<'_>| match event {
//!     MirrorEvent::Discovered(task) => println!("+ {}", task.source_url),
//!     MirrorEvent::Transferred(result) => println!("= {:?}", result.outcome()),
//!     MirrorEvent::ListingFailed(failure) => println!("! {}", failure.url),
//! });
//! ```

use crate::download::{DownloadTask, TransferResult};
use crate::stats::ListingFailure;
use crate::StyleOptions;

use reqwest::header::HeaderMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Something that happened during a run.
#[derive(Debug)]
pub enum MirrorEvent<'a> {
    /// A file was found and queued.
    Discovered(&'a DownloadTask),
    /// A queued file reached its final outcome.
    Transferred(&'a TransferResult),
    /// A directory could not be listed; its subtree is missing.
    ListingFailed(&'a ListingFailure),
}

/// Callback type for run events. Called from the walker and from the workers,
/// so it must not block.
pub type EventCallback = Box<dyn Fn(&MirrorEvent<'_>) + Send + Sync>;

/// Configuration structure for the mirror.
#[derive(Clone)]
pub struct MirrorConfig {
    /// Directory listing to mirror, possibly with embedded credentials.
    pub url: Option<String>,
    /// Directory where the tree is reproduced.
    pub directory: PathBuf,
    /// Number of concurrent transfers.
    pub threads: usize,
    /// Basic auth username, overriding the one embedded in the URL.
    pub username: Option<String>,
    /// Basic auth password, overriding the one embedded in the URL.
    pub password: Option<String>,
    /// HTTP(S) proxy address, optionally with credentials.
    pub proxy: Option<String>,
    /// Log every finished file at info level.
    pub verbose: bool,
    /// Retries per request and per interrupted transfer.
    pub retries: u32,
    /// Smallest and largest delay between two retries.
    pub backoff: (Duration, Duration),
    pub connect_timeout: Duration,
    /// Longest silence tolerated on an open connection.
    pub read_timeout: Duration,
    /// Files buffered between the walker and the workers.
    pub queue_capacity: usize,
    /// Place the tree under a directory named after the root.
    pub nest_under_root: bool,
    /// Custom HTTP headers.
    pub headers: Option<HeaderMap>,
    pub style_options: StyleOptions,
    /// Callback for run events.
    pub on_event: Option<Arc<EventCallback>>,
}

impl std::fmt::Debug for MirrorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MirrorConfig")
            .field("url", &self.url.as_deref().map(redact_url))
            .field("directory", &self.directory)
            .field("threads", &self.threads)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("proxy", &self.proxy.as_deref().map(redact_url))
            .field("verbose", &self.verbose)
            .field("retries", &self.retries)
            .field("backoff", &self.backoff)
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("queue_capacity", &self.queue_capacity)
            .field("nest_under_root", &self.nest_under_root)
            .field("headers", &self.headers.as_ref().map(|h| h.len()))
            .field("style_options", &self.style_options)
            .field("on_event", &self.on_event.is_some())
            .finish()
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            url: None,
            directory: PathBuf::from("downloads"),
            threads: 10,
            username: None,
            password: None,
            proxy: None,
            verbose: false,
            retries: 3,
            backoff: (Duration::from_secs(1), Duration::from_secs(30)),
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(30),
            queue_capacity: 1024,
            nest_under_root: false,
            headers: None,
            style_options: StyleOptions::default(),
            on_event: None,
        }
    }
}

/// Hide the password of a URL that may embed credentials.
fn redact_url(value: &str) -> String {
    match url::Url::parse(value) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("redacted"));
            url.to_string()
        }
        Ok(url) => url.to_string(),
        Err(_) => "<unparsable>".to_string(),
    }
}
