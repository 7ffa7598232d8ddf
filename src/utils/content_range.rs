//! Content-Range parsing utilities.
//!
//! Range responses describe which part of the resource they carry with a
//! `Content-Range` header: `bytes 200-1023/1024` for a 206, or `bytes */1024`
//! for a 416. These helpers turn that header into numbers the resume logic can
//! reason about.

use reqwest::{header::CONTENT_RANGE, Response, StatusCode};

/// A parsed `Content-Range` header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    /// First byte carried by the response, `None` for `bytes */total`.
    pub start: Option<u64>,
    /// Last byte carried by the response (inclusive).
    pub end: Option<u64>,
    /// Complete size of the resource, `None` when the server sent `*`.
    pub total: Option<u64>,
}

/// Parse a `Content-Range` header value.
///
/// Returns `None` when the unit is not `bytes` or the value is malformed.
///
/// ```rust
/// use dirmirror::utils::parse_content_range;
///
/// let range = parse_content_range("bytes 200-1023/2048").unwrap();
/// assert_eq!(range.start, Some(200));
/// assert_eq!(range.total, Some(2048));
/// ```
pub fn parse_content_range(value: &str) -> Option<ContentRange> {
    let rest = value.trim().strip_prefix("bytes")?.trim_start();
    let (range, total) = rest.split_once('/')?;

    let total = match total.trim() {
        "*" => None,
        t => Some(t.parse::<u64>().ok()?),
    };

    let (start, end) = match range.trim() {
        "*" => (None, None),
        r => {
            let (s, e) = r.split_once('-')?;
            let start = s.trim().parse::<u64>().ok()?;
            let end = e.trim().parse::<u64>().ok()?;
            if end < start {
                return None;
            }
            (Some(start), Some(end))
        }
    };

    Some(ContentRange { start, end, total })
}

/// Size of the complete resource as far as the response tells.
///
/// Range responses carry it in `Content-Range`; a plain 200 carries the whole
/// body, so its `Content-Length` is the total.
pub fn total_size(response: &Response) -> Option<u64> {
    let range = response
        .headers()
        .get(CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_content_range);

    match (response.status(), range) {
        (_, Some(range)) if range.total.is_some() => range.total,
        (StatusCode::OK, _) => response.content_length(),
        _ => None,
    }
}
