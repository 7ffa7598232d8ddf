//! Resume decisions.
//!
//! Whether a transfer can continue is reconstructed on every run from two
//! facts: how many bytes are already on disk and how the server answered the
//! range request. [`resume_plan`] combines them without touching the network
//! or the filesystem.

use crate::http::{RangeSupport, ServerCapabilities};

/// What to do with the bytes already on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumePlan {
    /// The local copy already holds the whole file.
    Complete,
    /// Append the response body after `offset` local bytes.
    Append { offset: u64 },
    /// Discard the local bytes and write the file from byte zero.
    Restart,
}

impl ResumePlan {
    /// Local bytes kept by this plan.
    pub fn offset(&self, existing_local_size: u64) -> u64 {
        match self {
            ResumePlan::Complete => existing_local_size,
            ResumePlan::Append { offset } => *offset,
            ResumePlan::Restart => 0,
        }
    }

    /// Whether the partial file must be truncated before writing.
    pub fn truncate_first(&self) -> bool {
        matches!(self, ResumePlan::Restart)
    }
}

/// Decide how to continue a transfer with `existing_local_size` bytes on disk.
///
/// ```rust
/// use dirmirror::download::{resume_plan, ResumePlan};
/// use dirmirror::http::{RangeSupport, ServerCapabilities};
///
/// let honored = ServerCapabilities {
///     range: RangeSupport::Honored { start: 40 },
///     total_size: Some(100),
/// };
/// assert_eq!(resume_plan(40, &honored), ResumePlan::Append { offset: 40 });
///
/// let ignored = ServerCapabilities { range: RangeSupport::Ignored, total_size: Some(100) };
/// assert_eq!(resume_plan(40, &ignored), ResumePlan::Restart);
/// ```
pub fn resume_plan(existing_local_size: u64, server: &ServerCapabilities) -> ResumePlan {
    let existing = existing_local_size;
    if existing > 0 && server.total_size == Some(existing) {
        return ResumePlan::Complete;
    }

    match server.range {
        // Nothing left after our offset. Unless the server says the file is
        // smaller than what we hold, the local copy is complete.
        RangeSupport::Unsatisfiable => match server.total_size {
            None if existing > 0 => ResumePlan::Complete,
            _ => ResumePlan::Restart,
        },
        RangeSupport::Honored { start } if existing > 0 && start == existing => {
            ResumePlan::Append { offset: existing }
        }
        RangeSupport::Honored { .. } | RangeSupport::Ignored => ResumePlan::Restart,
    }
}
