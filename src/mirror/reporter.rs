//! Fan-out of run events to the statistics, the progress bars, the log and
//! the user callback.

use super::config::{EventCallback, MirrorEvent};
use crate::download::{DownloadTask, Outcome, TransferResult};
use crate::progress::ProgressDisplay;
use crate::stats::{ListingFailure, Stats};

use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared by the walker and the workers of one run.
#[derive(Clone)]
pub struct Reporter {
    stats: Arc<Stats>,
    progress: ProgressDisplay,
    on_event: Option<Arc<EventCallback>>,
    verbose: bool,
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("stats", &self.stats)
            .field("on_event", &self.on_event.is_some())
            .field("verbose", &self.verbose)
            .finish()
    }
}

impl Reporter {
    pub fn new(stats: Arc<Stats>, progress: ProgressDisplay) -> Self {
        Self {
            stats,
            progress,
            on_event: None,
            verbose: false,
        }
    }

    pub fn with_callback(mut self, on_event: Option<Arc<EventCallback>>) -> Self {
        self.on_event = on_event;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn progress(&self) -> &ProgressDisplay {
        &self.progress
    }

    pub fn discovered(&self, task: &DownloadTask) {
        debug!("Queued {} as {:?}", task.source_url, task.destination);
        self.stats.record_discovered(1);
        self.progress.add_discovered(1);
        self.emit(&MirrorEvent::Discovered(task));
    }

    /// Record a final outcome. Must be called once per result.
    pub fn transferred(&self, result: &TransferResult) {
        self.stats.record(result);
        self.progress.increment_main();

        let task = result.task();
        match result.outcome() {
            Outcome::Success if self.verbose => info!(
                "Downloaded {:?} ({} bytes in {:?})",
                task.destination,
                result.bytes_transferred(),
                result.duration()
            ),
            Outcome::Skipped(reason) if self.verbose => {
                info!("Skipped {:?}: {}", task.destination, reason)
            }
            Outcome::Failed(kind, reason) => {
                warn!("Failed {} ({}): {}", task.source_url, kind, reason)
            }
            outcome => debug!("{:?} finished: {:?}", task.destination, outcome),
        }

        self.emit(&MirrorEvent::Transferred(result));
    }

    pub fn listing_failed(&self, failure: &ListingFailure) {
        warn!(
            "Could not list {} ({}): {}; skipping its subtree",
            failure.url, failure.kind, failure.reason
        );
        self.stats.record_listing_failure();
        self.emit(&MirrorEvent::ListingFailed(failure));
    }

    fn emit(&self, event: &MirrorEvent<'_>) {
        if let Some(ref callback) = self.on_event {
            callback(event);
        }
    }
}
