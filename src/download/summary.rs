//! Transfer results.
//!
//! Every processed [`DownloadTask`] produces exactly one [`TransferResult`],
//! which records what happened ([`Outcome`]), how many bytes went over the
//! wire and how long it took.
//!
//! ```rust
//! use dirmirror::download::{DownloadTask, Outcome, TransferResult};
//! use std::time::Duration;
//! use url::Url;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let root = Url::parse("http://h/")?;
//! let task = DownloadTask::from_url(&root, &Url::parse("http://h/a.txt")?)?;
//! let result = TransferResult::new(task, Outcome::Success, 100, Duration::from_millis(5));
//!
//! match result.outcome() {
//!     Outcome::Success => println!("{} bytes", result.bytes_transferred()),
//!     Outcome::Skipped(reason) => println!("skipped: {}", reason),
//!     Outcome::Failed(kind, reason) => println!("{} failure: {}", kind, reason),
//! }
//! # Ok(())
//! # }
//! ```

use super::task::DownloadTask;
use crate::error::{Error, ErrorKind};
use std::time::Duration;

/// Transfer outcome enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The file was transferred and moved into place.
    Success,
    /// Nothing had to be transferred, with the reason.
    Skipped(String),
    /// The transfer failed.
    Failed(ErrorKind, String),
}

impl Outcome {
    /// Build a failure outcome from an error.
    pub fn from_error(error: &Error) -> Self {
        Outcome::Failed(error.kind(), error.to_string())
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(..))
    }
}

/// Represents the result of one [`DownloadTask`].
#[derive(Debug, Clone)]
pub struct TransferResult {
    task: DownloadTask,
    outcome: Outcome,
    bytes_transferred: u64,
    duration: Duration,
}

impl TransferResult {
    pub fn new(
        task: DownloadTask,
        outcome: Outcome,
        bytes_transferred: u64,
        duration: Duration,
    ) -> Self {
        Self {
            task,
            outcome,
            bytes_transferred,
            duration,
        }
    }

    /// The task this result belongs to.
    pub fn task(&self) -> &DownloadTask {
        &self.task
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Bytes received during this run, excluding bytes resumed from disk.
    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}
