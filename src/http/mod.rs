//! HTTP module containing the transport used by the crawler and the download unit.
//!
//! - [`auth`] - credential precedence and proxy parsing
//! - [`client`] - HTTP client creation and middleware configuration
//! - [`transport`] - authenticated requests, range requests and status
//!   classification
//!
//! # Example
//!
//! ```rust,no_run
//! use dirmirror::http::{HttpClientConfig, Transport};
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Transport::new(&HttpClientConfig::default(), None)?;
//! let page = transport.fetch(&Url::parse("http://mirror.local/pub/")?).await?;
//! println!("{} bytes of listing", page.body.len());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod transport;

pub use auth::{strip_credentials, Credentials, ProxyConfig};
pub use client::{create_http_client, HttpClientConfig};
pub use transport::{ListingPage, RangeResponse, RangeSupport, ServerCapabilities, Transport};
