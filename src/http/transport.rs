//! Request execution with authentication and failure classification.
//!
//! [`Transport`] is the only place that talks to the network. It exposes two
//! operations: [`Transport::fetch`] reads a listing page into memory and
//! [`Transport::fetch_range`] opens a (possibly partial) file transfer.
//! Non-success statuses are turned into the matching [`Error`] variant so the
//! callers can pick a retry policy per failure kind.

use super::auth::Credentials;
use super::client::{create_http_client, HttpClientConfig};
use crate::error::{Error, Result};
use crate::utils::content_range::{parse_content_range, total_size};

use reqwest::{
    header::{CONTENT_RANGE, CONTENT_TYPE, RANGE},
    Response, StatusCode,
};
use reqwest_middleware::{ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{policies::ExponentialBackoff, RetryDecision, RetryPolicy};
use std::time::{Duration, SystemTime};
use tracing::debug;
use url::Url;

/// A fetched listing page.
#[derive(Debug, Clone)]
pub struct ListingPage {
    /// URL the body was served from, after redirects.
    pub url: Url,
    pub content_type: Option<String>,
    pub body: String,
}

impl ListingPage {
    /// Pages without a `Content-Type` are given the benefit of the doubt.
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| {
                let ct = ct.to_ascii_lowercase();
                ct.contains("text/html") || ct.contains("application/xhtml")
            })
            .unwrap_or(true)
    }
}

/// How the server answered a range request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSupport {
    /// 206: the body starts at `start`.
    Honored { start: u64 },
    /// 200: the body is the whole resource, from byte zero.
    Ignored,
    /// 416: nothing exists at or after the requested offset.
    Unsatisfiable,
}

/// What a response tells about the remote file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerCapabilities {
    pub range: RangeSupport,
    /// Complete size of the remote file, when announced.
    pub total_size: Option<u64>,
}

impl ServerCapabilities {
    /// Whether the body of this response can be written from offset zero.
    pub fn body_starts_at_zero(&self) -> bool {
        match self.range {
            RangeSupport::Ignored => true,
            RangeSupport::Honored { start } => start == 0,
            RangeSupport::Unsatisfiable => false,
        }
    }

    fn from_response(response: &Response, from: u64) -> Self {
        let range = match response.status() {
            StatusCode::PARTIAL_CONTENT => {
                let start = response
                    .headers()
                    .get(CONTENT_RANGE)
                    .and_then(|v| v.to_str().ok())
                    .and_then(parse_content_range)
                    .and_then(|r| r.start)
                    .unwrap_or(from);
                RangeSupport::Honored { start }
            }
            StatusCode::RANGE_NOT_SATISFIABLE => RangeSupport::Unsatisfiable,
            _ => RangeSupport::Ignored,
        };
        Self {
            range,
            total_size: total_size(response),
        }
    }
}

/// An open file transfer.
#[derive(Debug)]
pub struct RangeResponse {
    pub capabilities: ServerCapabilities,
    response: Response,
}

impl RangeResponse {
    /// Give up the response to stream its body.
    pub fn into_response(self) -> Response {
        self.response
    }
}

/// Authenticated access to the mirrored server.
#[derive(Debug, Clone)]
pub struct Transport {
    client: ClientWithMiddleware,
    credentials: Option<Credentials>,
    retry_policy: ExponentialBackoff,
}

impl Transport {
    /// Build the client described by `config`.
    pub fn new(config: &HttpClientConfig, credentials: Option<Credentials>) -> Result<Self> {
        let client = create_http_client(config)
            .map_err(|e| Error::Config(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            credentials,
            retry_policy: config.retry_policy(),
        })
    }

    /// Delay before retry number `past_retries + 1` of an operation started at
    /// `started_at`, or `None` once the retries are used up.
    pub fn backoff_delay(&self, started_at: SystemTime, past_retries: u32) -> Option<Duration> {
        match self.retry_policy.should_retry(started_at, past_retries) {
            RetryDecision::Retry { execute_after } => Some(
                execute_after
                    .duration_since(SystemTime::now())
                    .unwrap_or_default(),
            ),
            RetryDecision::DoNotRetry => None,
        }
    }

    fn get(&self, url: &Url) -> RequestBuilder {
        let req = self.client.get(url.as_str());
        match self.credentials {
            Some(ref creds) => req.basic_auth(&creds.username, creds.password.as_ref()),
            None => req,
        }
    }

    async fn send(&self, url: &Url, req: RequestBuilder) -> Result<Response> {
        req.send().await.map_err(|source| Error::Network {
            url: url.to_string(),
            source,
        })
    }

    /// Fetch a listing page.
    pub async fn fetch(&self, url: &Url) -> Result<ListingPage> {
        debug!("Fetching listing {}", url);
        let res = self.send(url, self.get(url)).await?;
        if !res.status().is_success() {
            return Err(Error::from_status(url.as_str(), res.status()));
        }

        let final_url = res.url().clone();
        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = res.text().await.map_err(|source| Error::Interrupted {
            url: url.to_string(),
            source,
        })?;

        Ok(ListingPage {
            url: final_url,
            content_type,
            body,
        })
    }

    /// Request `url` starting at byte `from`.
    ///
    /// No `Range` header is sent for `from == 0`. A 416 answer is returned as
    /// [`RangeSupport::Unsatisfiable`] rather than as an error.
    pub async fn fetch_range(&self, url: &Url, from: u64) -> Result<RangeResponse> {
        let mut req = self.get(url);
        if from > 0 {
            req = req.header(RANGE, format!("bytes={}-", from));
        }

        debug!("Fetching {} from byte {}", url, from);
        let res = self.send(url, req).await?;
        let status = res.status();
        if !status.is_success() && status != StatusCode::RANGE_NOT_SATISFIABLE {
            return Err(Error::from_status(url.as_str(), status));
        }

        Ok(RangeResponse {
            capabilities: ServerCapabilities::from_response(&res, from),
            response: res,
        })
    }
}
