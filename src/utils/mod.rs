//! Shared utility functions.
//!
//! - [`content_range`] - parsing of `Content-Range` headers and total size
//!   extraction from range responses

pub mod content_range;

pub use content_range::{parse_content_range, total_size, ContentRange};
