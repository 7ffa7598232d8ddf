//! HTTP client setup and middleware configuration.
//!
//! The client is a `reqwest` client wrapped in the `reqwest-middleware` stack:
//!
//! - **Tracing**: every request is traced through [`TracingMiddleware`]
//! - **Retry Logic**: transient failures (connect errors, timeouts, 5xx) are
//!   retried with an exponential backoff bounded by the configured attempts
//! - **Proxy Support**: optional HTTP/HTTPS proxy, with its own credentials
//! - **Timeouts**: connect and read timeouts so a stalled peer is eventually
//!   noticed
//!
//! # Example
//!
//! ```rust
//! use dirmirror::http::{create_http_client, HttpClientConfig};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpClientConfig::default();
//! let client = create_http_client(&config)?;
//! # Ok(())
//! # }
//! ```

use super::auth::ProxyConfig;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use reqwest_tracing::TracingMiddleware;
use std::time::Duration;

/// Browser-like agent; some index servers refuse unknown clients.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Configuration for HTTP client setup.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Number of retries for transient request failures.
    pub retries: u32,
    /// Smallest and largest delay between two retries.
    pub backoff: (Duration, Duration),
    /// Optional proxy configuration.
    pub proxy: Option<ProxyConfig>,
    /// Time allowed to establish a connection.
    pub connect_timeout: Duration,
    /// Time allowed between two reads on an open connection.
    pub read_timeout: Duration,
    /// Headers sent with every request, merged over the defaults.
    pub headers: Option<HeaderMap>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            backoff: (Duration::from_secs(1), Duration::from_secs(30)),
            proxy: None,
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(30),
            headers: None,
        }
    }
}

impl HttpClientConfig {
    /// The backoff policy shared by the middleware and by callers retrying
    /// interrupted body transfers.
    pub fn retry_policy(&self) -> ExponentialBackoff {
        let (min, max) = self.backoff;
        ExponentialBackoff::builder()
            .retry_bounds(min, max.max(min))
            .build_with_max_retries(self.retries)
    }

    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        if let Some(ref extra) = self.headers {
            headers.extend(extra.clone());
        }
        headers
    }
}

/// Creates an HTTP client with middleware configuration.
pub fn create_http_client(
    config: &HttpClientConfig,
) -> Result<ClientWithMiddleware, reqwest::Error> {
    let mut inner_client_builder = reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .read_timeout(config.read_timeout)
        .default_headers(config.default_headers());

    if let Some(ref proxy) = config.proxy {
        inner_client_builder = inner_client_builder.proxy(proxy.to_proxy()?);
    }

    let inner_client = inner_client_builder.build()?;

    let client = ClientBuilder::new(inner_client)
        .with(TracingMiddleware::default())
        .with(RetryTransientMiddleware::new_with_policy(
            config.retry_policy(),
        ))
        .build();

    Ok(client)
}
