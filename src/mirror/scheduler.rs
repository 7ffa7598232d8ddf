//! The worker pool.
//!
//! Tasks are pulled from the walker's channel and run with at most `threads`
//! transfers in flight. Two tasks for the same destination never run at the
//! same time: the second waits on the per-path lock held by the first.

use super::reporter::Reporter;
use crate::download::{DownloadTask, DownloadUnit, TransferResult};

use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Lock table keyed by destination path.
///
/// Entries only live while some task holds or waits for them.
#[derive(Debug, Default)]
pub struct PathLocks {
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock guarding `path`, shared with every other current holder.
    pub fn acquire(&self, path: &Path) -> Arc<Mutex<()>> {
        self.locks.entry(path.to_path_buf()).or_default().value().clone()
    }

    /// Drop the entry for `path` once nobody else refers to it.
    ///
    /// The caller must have dropped its own handle first.
    pub fn release(&self, path: &Path) {
        self.locks
            .remove_if(path, |_, lock| Arc::strong_count(lock) == 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Runs download tasks concurrently.
#[derive(Debug)]
pub struct Scheduler {
    unit: DownloadUnit,
    threads: usize,
    locks: PathLocks,
    reporter: Reporter,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(
        unit: DownloadUnit,
        threads: usize,
        reporter: Reporter,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            unit,
            threads: threads.max(1),
            locks: PathLocks::new(),
            reporter,
            cancel,
        }
    }

    /// Process tasks until the channel is closed or the run is cancelled.
    ///
    /// Returns the failed transfers. Transfers already in flight when the run
    /// is cancelled finish as [`Outcome::Failed`](crate::download::Outcome::Failed)
    /// with [`ErrorKind::Cancelled`](crate::ErrorKind::Cancelled); queued ones
    /// are left alone.
    pub async fn run(&self, mut rx: mpsc::Receiver<DownloadTask>) -> Vec<TransferResult> {
        let tasks = stream::poll_fn(move |cx| rx.poll_recv(cx));

        tasks
            .take_until(self.cancel.cancelled())
            .map(|task| self.process(task))
            .buffer_unordered(self.threads)
            .filter(|result| futures::future::ready(result.outcome().is_failure()))
            .collect::<Vec<_>>()
            .await
    }

    async fn process(&self, task: DownloadTask) -> TransferResult {
        let destination = task.destination.clone();
        let lock = self.locks.acquire(&destination);

        let result = {
            let _guard = lock.lock().await;
            debug!("Starting {}", task.source_url);
            self.unit.process(task, self.reporter.progress()).await
        };

        drop(lock);
        self.locks.release(&destination);

        self.reporter.transferred(&result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_locks_are_shared_and_released() {
        let locks = PathLocks::new();
        let a = locks.acquire(Path::new("sub/c.txt"));
        let b = locks.acquire(Path::new("sub/c.txt"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(locks.len(), 1);

        drop(a);
        locks.release(Path::new("sub/c.txt"));
        assert_eq!(locks.len(), 1, "still referenced by the second holder");

        drop(b);
        locks.release(Path::new("sub/c.txt"));
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_same_path_is_serialized() {
        let locks = PathLocks::new();
        let first = locks.acquire(Path::new("a.txt"));
        let guard = first.lock().await;

        let second = locks.acquire(Path::new("a.txt"));
        assert!(second.try_lock().is_err());
        drop(guard);
        assert!(second.try_lock().is_ok());
    }
}
