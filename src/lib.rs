//! Dirmirror reproduces the tree behind an HTTP directory index on the local
//! disk, resuming interrupted transfers and never leaving the listed subtree.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use dirmirror::{MirrorBuilder, Error};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Error> {
//! let mirror = MirrorBuilder::new()
//!     .url("https://mirror.local/pub/iso/")
//!     .directory(PathBuf::from("output"))
//!     .threads(8)
//!     .build()?;
//! let summary = mirror.run().await?;
//! println!("{}", summary);
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`listing`] - parsing of directory index pages
//! - [`walker`] - depth-first expansion of the listings below the root
//! - [`http`] - the authenticated, retrying transport
//! - [`download`] - single-file transfers with resume and atomic rename
//! - [`mirror`] - the `Mirror`, its builder and the worker pool
//! - [`stats`] - run counters and the final summary
//! - [`progress`] - progress bar styling and display management
//! - [`error`] - centralized error handling with the `Error` enum
//! - [`utils`] - header parsing helpers

pub mod download;
pub mod error;
pub mod http;
pub mod listing;
pub mod mirror;
pub mod progress;
pub mod stats;
pub mod utils;
pub mod walker;

pub use download::{DownloadTask, DownloadUnit, Outcome, TransferResult};
pub use error::{Error, ErrorKind, Result};
pub use http::{create_http_client, Credentials, HttpClientConfig, ProxyConfig, Transport};
pub use listing::{parse_listing, EntryKind, RemoteEntry};
pub use mirror::{Mirror, MirrorBuilder, MirrorEvent};
pub use progress::{ProgressBarOpts, StyleOptions};
pub use stats::{MirrorSummary, Stats, StatsSnapshot};
pub use walker::TreeWalker;
