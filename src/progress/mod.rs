//! Terminal progress reporting.
//!
//! - `style` - templates and on/off switches for the bars
//! - `display` - the [`ProgressDisplay`] shared by the walker and the workers
//!
//! The main bar counts finished files against files discovered so far, so its
//! length grows while the crawl is still running. Each active transfer gets a
//! child bar showing bytes.
//!
//! ```rust
//! use dirmirror::progress::{ProgressBarOpts, StyleOptions};
//!
//! let quiet = StyleOptions::new(ProgressBarOpts::hidden(), ProgressBarOpts::hidden());
//! assert!(!quiet.is_enabled());
//! ```

pub(crate) mod display;
pub(crate) mod style;

pub use display::ProgressDisplay;
pub use style::{ProgressBarOpts, StyleOptions};
