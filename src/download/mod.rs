//! Download module containing everything needed to mirror a single file.
//!
//! # Overview
//!
//! - [`task`] - [`DownloadTask`] and the mapping from URLs to local paths
//! - [`resume`] - the [`resume_plan`] decision taken before each transfer
//! - [`unit`] - [`DownloadUnit`], which streams one task to disk
//! - [`summary`] - [`TransferResult`] and its [`Outcome`]
//!
//! # Example
//!
//! ```rust
//! use dirmirror::download::{partial_path, DownloadTask};
//! use std::path::Path;
//! use url::Url;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let root = Url::parse("http://mirror.local/pub/")?;
//! let task = DownloadTask::from_url(&root, &Url::parse("http://mirror.local/pub/a.txt")?)?;
//! let out = Path::new("downloads").join(&task.destination);
//! assert_eq!(partial_path(&out), Path::new("downloads/a.txt.part"));
//! # Ok(())
//! # }
//! ```

pub mod resume;
pub mod summary;
pub mod task;
pub mod unit;

pub use resume::{resume_plan, ResumePlan};
pub use summary::{Outcome, TransferResult};
pub use task::{destination_for, DownloadTask};
pub(crate) use task::sanitize_segment;
pub use unit::{partial_path, DownloadUnit};
