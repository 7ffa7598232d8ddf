//! Retrieval of a single file.
//!
//! [`DownloadUnit::process`] turns one [`DownloadTask`] into one
//! [`TransferResult`]. Bytes are streamed into a `.part` sibling of the
//! destination, which is renamed into place only once the transfer is complete
//! and its size checks out. Whatever happens, the partial file is left on disk
//! so the next attempt (or the next run) can resume from it.

use super::resume::{resume_plan, ResumePlan};
use super::summary::{Outcome, TransferResult};
use super::task::DownloadTask;
use crate::error::{Error, Result};
use crate::http::{RangeResponse, Transport};
use crate::progress::ProgressDisplay;

use futures::StreamExt;
use indicatif::ProgressBar;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};
use tokio::{
    fs::{self, OpenOptions},
    io::{AsyncWriteExt, BufWriter},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Suffix of in-progress files.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Path of the in-progress artifact for `destination`.
pub fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(PARTIAL_SUFFIX);
    destination.with_file_name(name)
}

/// Downloads files below an output root.
#[derive(Debug, Clone)]
pub struct DownloadUnit {
    transport: Transport,
    output_root: PathBuf,
    cancel: CancellationToken,
}

impl DownloadUnit {
    pub fn new(transport: Transport, output_root: PathBuf, cancel: CancellationToken) -> Self {
        Self {
            transport,
            output_root,
            cancel,
        }
    }

    /// Absolute path a task is written to.
    pub fn destination_path(&self, task: &DownloadTask) -> PathBuf {
        self.output_root.join(&task.destination)
    }

    /// Transfer `task`, retrying interrupted bodies from the partial file.
    pub async fn process(&self, task: DownloadTask, progress: &ProgressDisplay) -> TransferResult {
        let started = Instant::now();
        let started_at = SystemTime::now();
        let mut transferred = 0;
        let mut resumed_from = 0;
        let mut past_retries = 0;

        let outcome = loop {
            let err = match self
                .attempt(&task, progress, &mut transferred, &mut resumed_from)
                .await
            {
                Ok(outcome) => break outcome,
                Err(err) => err,
            };

            if !err.is_interruption() {
                break Outcome::from_error(&err);
            }
            let Some(delay) = self.transport.backoff_delay(started_at, past_retries) else {
                break Outcome::from_error(&err);
            };

            past_retries += 1;
            warn!(
                "Transfer of {} interrupted, retry {} in {:?}: {}",
                task.source_url, past_retries, delay, err
            );
            tokio::select! {
                _ = self.cancel.cancelled() => break Outcome::from_error(&Error::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        };

        TransferResult::new(
            task.with_resume_offset(resumed_from),
            outcome,
            transferred,
            started.elapsed(),
        )
    }

    async fn attempt(
        &self,
        task: &DownloadTask,
        progress: &ProgressDisplay,
        transferred: &mut u64,
        resumed_from: &mut u64,
    ) -> Result<Outcome> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let final_path = self.destination_path(task);
        let part_path = partial_path(&final_path);

        // A file already in place is checked like a partial of its own size.
        let final_len = file_len(&final_path).await?;
        let in_place = final_len.is_some();
        let existing = match final_len {
            Some(len) => len,
            None => file_len(&part_path).await?.unwrap_or(0),
        };

        if in_place && task.expected_size == Some(existing) {
            return Ok(Outcome::Skipped("the file was already fully downloaded".into()));
        }

        let response = tokio::select! {
            _ = self.cancel.cancelled() => return Err(Error::Cancelled),
            response = self.transport.fetch_range(&task.source_url, existing) => response?,
        };
        let plan = resume_plan(existing, &response.capabilities);
        debug!(
            "Resume plan for {:?}: {:?} ({} local bytes, {:?})",
            task.destination, plan, existing, response.capabilities
        );

        match plan {
            ResumePlan::Complete => {
                if !in_place {
                    self.finalize(&part_path, &final_path).await?;
                }
                return Ok(Outcome::Skipped(
                    "the file was already fully downloaded".into(),
                ));
            }
            ResumePlan::Append { .. } if in_place => {
                // The copy in place is short; continue it as a partial.
                rename(&final_path, &part_path).await?;
            }
            _ => {}
        }

        let response = if plan.truncate_first() && !response.capabilities.body_starts_at_zero() {
            drop(response);
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(Error::Cancelled),
                response = self.transport.fetch_range(&task.source_url, 0) => response?,
            }
        } else {
            response
        };

        let offset = plan.offset(existing);
        *resumed_from = offset;
        let expected = task
            .expected_size
            .or(response.capabilities.total_size);

        if let Some(parent) = part_path.parent() {
            debug!("Creating destination directory {:?}", parent);
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::filesystem(parent, e))?;
        }

        let pb = progress.create_child_progress(expected, offset);
        let written = self
            .write_partial(task, &part_path, response, plan.truncate_first(), &pb, transferred)
            .await;
        progress.finish_child(pb);
        written?;

        let actual = file_len(&part_path).await?.unwrap_or(0);
        if let Some(expected) = expected {
            if actual != expected {
                warn!(
                    "Size mismatch for {:?}: expected {}, got {}; keeping partial",
                    task.destination, expected, actual
                );
                return Err(Error::Integrity {
                    path: task.destination.clone(),
                    expected,
                    actual,
                });
            }
        }

        self.finalize(&part_path, &final_path).await?;
        Ok(Outcome::Success)
    }

    /// Stream the response body into the partial file.
    ///
    /// The file handle lives only inside this call and is flushed on every
    /// exit, so the partial on disk is always a valid prefix.
    async fn write_partial(
        &self,
        task: &DownloadTask,
        part_path: &Path,
        response: RangeResponse,
        truncate: bool,
        pb: &ProgressBar,
        transferred: &mut u64,
    ) -> Result<u64> {
        debug!("Writing {:?} (truncate: {})", part_path, truncate);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(!truncate)
            .truncate(truncate)
            .open(part_path)
            .await
            .map_err(|e| Error::filesystem(part_path, e))?;
        let mut writer = BufWriter::new(file);

        let mut written = 0;
        let mut stream = response.into_response().bytes_stream();
        let result = loop {
            let item = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break Err(Error::Cancelled),
                item = stream.next() => item,
            };
            let chunk = match item {
                None => break Ok(()),
                Some(Ok(chunk)) => chunk,
                Some(Err(source)) => {
                    break Err(Error::Interrupted {
                        url: task.source_url.to_string(),
                        source,
                    })
                }
            };
            if let Err(e) = writer.write_all(&chunk).await {
                break Err(Error::filesystem(part_path, e));
            }
            let len = chunk.len() as u64;
            written += len;
            *transferred += len;
            pb.inc(len);
        };

        let flushed = writer
            .flush()
            .await
            .map_err(|e| Error::filesystem(part_path, e));
        result?;
        flushed?;
        Ok(written)
    }

    async fn finalize(&self, part_path: &Path, final_path: &Path) -> Result<()> {
        debug!("Moving {:?} into place", final_path);
        rename(part_path, final_path).await
    }
}

async fn rename(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to)
        .await
        .map_err(|e| Error::filesystem(to, e))
}

/// Size of the regular file at `path`, `None` when nothing is there.
async fn file_len(path: &Path) -> Result<Option<u64>> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
        Ok(_) => Err(Error::filesystem(
            path,
            io::Error::other("a directory is in the way"),
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::filesystem(path, e)),
    }
}
