//! Directory index parsing.
//!
//! - [`entry`] - [`RemoteEntry`] and the strict-descendant rule
//! - [`parser`] - [`parse_listing`], which turns a page body into entries

pub mod entry;
pub mod parser;

pub use entry::{as_directory, is_strict_descendant, EntryKind, RemoteEntry};
pub use parser::parse_listing;
