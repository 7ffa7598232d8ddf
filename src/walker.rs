//! Recursive expansion of directory listings.
//!
//! [`TreeWalker::start`] lists the crawl root; a failure there ends the run
//! before anything is queued. [`TreeWalker::walk`] then expands the remaining
//! directories depth-first and feeds every file into a bounded channel that the
//! workers drain at the same time. A directory that cannot be listed costs its
//! own subtree only.

use crate::download::DownloadTask;
use crate::error::{Error, Result};
use crate::http::Transport;
use crate::listing::{as_directory, is_strict_descendant, parse_listing, RemoteEntry};
use crate::mirror::Reporter;
use crate::stats::ListingFailure;

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::SystemTime;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

/// Walks the tree below one root listing. Consumed by [`TreeWalker::walk`].
#[derive(Debug)]
pub struct TreeWalker {
    transport: Transport,
    root: Url,
    /// Entries still to handle; the last one is handled first.
    pending: Vec<RemoteEntry>,
    visited: HashSet<Url>,
    destinations: HashSet<PathBuf>,
    reporter: Reporter,
    cancel: CancellationToken,
}

impl TreeWalker {
    /// List `root` and prepare the walk below it.
    pub async fn start(
        transport: Transport,
        root: &Url,
        reporter: Reporter,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let root = as_directory(root);
        info!("Listing {}", root);
        let entries = list(&transport, &root, &root, &cancel).await?;
        debug!("Root listing has {} entries", entries.len());

        let mut visited = HashSet::new();
        visited.insert(root.clone());

        let mut walker = Self {
            transport,
            root,
            pending: Vec::new(),
            visited,
            destinations: HashSet::new(),
            reporter,
            cancel,
        };
        walker.push_children(entries);
        Ok(walker)
    }

    pub fn root(&self) -> &Url {
        &self.root
    }

    /// Queue every file below the root into `tx`.
    ///
    /// Returns the directories that could not be listed. The channel is closed
    /// when this returns, which lets the workers finish.
    pub async fn walk(mut self, tx: mpsc::Sender<DownloadTask>) -> Vec<ListingFailure> {
        let mut failures = Vec::new();

        while let Some(entry) = self.pending.pop() {
            if self.cancel.is_cancelled() {
                debug!("Walk cancelled with {} entries pending", self.pending.len() + 1);
                break;
            }

            if entry.is_directory() {
                if !self.visited.insert(entry.url.clone()) {
                    continue;
                }
                match list(&self.transport, &entry.url, &self.root, &self.cancel).await {
                    Ok(children) => self.push_children(children),
                    Err(Error::Cancelled) => break,
                    Err(e) => {
                        let failure = ListingFailure {
                            url: entry.url,
                            kind: e.kind(),
                            reason: e.to_string(),
                        };
                        self.reporter.listing_failed(&failure);
                        failures.push(failure);
                    }
                }
                continue;
            }

            let task = match DownloadTask::from_url(&self.root, &entry.url) {
                Ok(task) => task,
                Err(e) => {
                    warn!("Ignoring {}: {}", entry.url, e);
                    continue;
                }
            };
            if !self.destinations.insert(task.destination.clone()) {
                debug!("{:?} already queued, ignoring {}", task.destination, entry.url);
                continue;
            }

            self.reporter.discovered(&task);
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                sent = tx.send(task) => {
                    if sent.is_err() {
                        debug!("Workers are gone, stopping the walk");
                        break;
                    }
                }
            }
        }

        info!(
            "Walk finished: {} directories listed, {} files queued",
            self.visited.len(),
            self.destinations.len()
        );
        failures
    }

    /// Children are popped in page order.
    fn push_children(&mut self, children: Vec<RemoteEntry>) {
        let root = &self.root;
        self.pending.extend(
            children
                .into_iter()
                .rev()
                .filter(|e| is_strict_descendant(&e.url, root)),
        );
    }
}

/// Fetch and parse one listing, retrying interrupted bodies with the
/// transport's backoff.
async fn list(
    transport: &Transport,
    url: &Url,
    root: &Url,
    cancel: &CancellationToken,
) -> Result<Vec<RemoteEntry>> {
    let started_at = SystemTime::now();
    let mut past_retries = 0;

    loop {
        let fetched = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            fetched = transport.fetch(url) => fetched,
        };
        let err = match fetched {
            Ok(page) => {
                if !page.is_html() {
                    return Err(Error::Listing {
                        url: url.to_string(),
                        reason: format!(
                            "unexpected content type {}",
                            page.content_type.unwrap_or_default()
                        ),
                    });
                }
                let landed = as_directory(&page.url);
                if landed != *root && !is_strict_descendant(&landed, root) {
                    return Err(Error::Listing {
                        url: url.to_string(),
                        reason: format!("redirected outside the mirror root to {}", page.url),
                    });
                }
                return Ok(parse_listing(&page.body, &page.url));
            }
            Err(e) => e,
        };

        if !err.is_interruption() {
            return Err(err);
        }
        let Some(delay) = transport.backoff_delay(started_at, past_retries) else {
            return Err(err);
        };
        past_retries += 1;
        warn!(
            "Listing {} interrupted, retry {} in {:?}: {}",
            url, past_retries, delay, err
        );
        tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
