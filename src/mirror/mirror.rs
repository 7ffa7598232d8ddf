//! Orchestration of a mirroring run.
//!
//! ```rust,no_run
//! use dirmirror::mirror::MirrorBuilder;
//!
//! # async fn example() -> Result<(), dirmirror::Error> {
//! let mirror = MirrorBuilder::new().url("http://mirror.local/pub/").build()?;
//! let summary = mirror.run().await?;
//! println!("{}", summary);
//! # Ok(())
//! # }
//! ```

use super::config::MirrorConfig;
use super::reporter::Reporter;
use super::scheduler::Scheduler;
use crate::download::{sanitize_segment, DownloadUnit};
use crate::error::{Error, Result};
use crate::http::{strip_credentials, Credentials, HttpClientConfig, ProxyConfig, Transport};
use crate::progress::ProgressDisplay;
use crate::stats::{MirrorSummary, Stats};
use crate::walker::TreeWalker;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;

/// A configured mirroring run.
///
/// Created via [`MirrorBuilder`](super::MirrorBuilder). Credentials and proxy
/// settings are resolved once, when the mirror is built.
pub struct Mirror {
    config: MirrorConfig,
    root: Url,
    credentials: Option<Credentials>,
    proxy: Option<ProxyConfig>,
    output_dir: PathBuf,
    cancel: CancellationToken,
}

impl fmt::Debug for Mirror {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mirror")
            .field("root", &self.root.as_str())
            .field("credentials", &self.credentials)
            .field("proxy", &self.proxy)
            .field("output_dir", &self.output_dir)
            .field("config", &self.config)
            .finish()
    }
}

impl Mirror {
    pub(crate) fn new(config: MirrorConfig) -> Result<Self> {
        let raw = config
            .url
            .as_deref()
            .ok_or_else(|| Error::Config("no URL to mirror".into()))?;
        let url =
            Url::parse(raw).map_err(|e| Error::InvalidUrl(format!("\"{}\": {}", raw, e)))?;
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(Error::InvalidUrl(format!(
                    "unsupported scheme \"{}\", expected http or https",
                    other
                )))
            }
        }
        if url.host_str().is_none() {
            return Err(Error::InvalidUrl(format!("\"{}\" has no host", raw)));
        }

        let credentials = Credentials::resolve(
            &url,
            config.username.as_deref(),
            config.password.as_deref(),
        );
        let proxy = config.proxy.as_deref().map(ProxyConfig::parse).transpose()?;

        let mut root = strip_credentials(&url);
        root.set_query(None);
        root.set_fragment(None);

        let output_dir = if config.nest_under_root {
            config.directory.join(root_dir_name(&root))
        } else {
            config.directory.clone()
        };

        Ok(Self {
            config,
            root,
            credentials,
            proxy,
            output_dir,
            cancel: CancellationToken::new(),
        })
    }

    /// The listing being mirrored, without credentials.
    pub fn root(&self) -> &Url {
        &self.root
    }

    /// Directory the tree is reproduced in.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn threads(&self) -> usize {
        self.config.threads
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Cancelling this token stops the run: no new listing is fetched, no new
    /// transfer starts and running transfers stop at their next chunk.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            retries: self.config.retries,
            backoff: self.config.backoff,
            proxy: self.proxy.clone(),
            connect_timeout: self.config.connect_timeout,
            read_timeout: self.config.read_timeout,
            headers: self.config.headers.clone(),
        }
    }

    /// Mirror the whole tree.
    ///
    /// Fails only when the root listing cannot be fetched or interpreted.
    /// Everything that goes wrong below the root is reported in the summary.
    pub async fn run(&self) -> Result<MirrorSummary> {
        let transport = Transport::new(&self.http_config(), self.credentials.clone())?;
        let stats = Arc::new(Stats::new());
        let progress = ProgressDisplay::new(self.config.style_options.clone());
        let reporter = Reporter::new(stats.clone(), progress.clone())
            .with_callback(self.config.on_event.clone())
            .verbose(self.config.verbose);

        info!("Mirroring {} into {:?}", self.root, self.output_dir);
        progress.set_message(format!("listing {}", self.root));

        let walker = match TreeWalker::start(
            transport.clone(),
            &self.root,
            reporter.clone(),
            self.cancel.clone(),
        )
        .await
        {
            Ok(walker) => walker,
            Err(e) => {
                progress.finish();
                return Err(e);
            }
        };
        progress.set_message("");

        let (tx, rx) = mpsc::channel(self.config.queue_capacity);
        let unit = DownloadUnit::new(transport, self.output_dir.clone(), self.cancel.clone());
        let scheduler = Scheduler::new(unit, self.config.threads, reporter, self.cancel.clone());

        let (failed_listings, failed_transfers) =
            tokio::join!(walker.walk(tx), scheduler.run(rx));
        progress.finish();

        let summary = MirrorSummary {
            stats: stats.snapshot(),
            elapsed: stats.elapsed(),
            cancelled: self.cancel.is_cancelled(),
            failed_transfers,
            failed_listings,
        };
        info!(
            "Mirror of {} done: {} downloaded, {} skipped, {} failed, {} listing failures",
            self.root,
            summary.stats.succeeded,
            summary.stats.skipped,
            summary.stats.failed,
            summary.stats.listing_failures
        );
        Ok(summary)
    }
}

/// Name of the directory a nested mirror lands in.
fn root_dir_name(root: &Url) -> String {
    root.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .and_then(sanitize_segment)
        .or_else(|| root.host_str().map(String::from))
        .unwrap_or_else(|| "root".to_string())
}
