//! Progress bar coordination.

use super::style::StyleOptions;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget};

/// Coordinates the main bar and the per-transfer bars.
#[derive(Debug, Clone)]
pub struct ProgressDisplay {
    multi: MultiProgress,
    main: ProgressBar,
    style_options: StyleOptions,
}

impl ProgressDisplay {
    /// The main bar starts empty and grows with [`ProgressDisplay::add_discovered`].
    pub fn new(style_options: StyleOptions) -> Self {
        let multi = if style_options.is_enabled() {
            MultiProgress::new()
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };
        let main = style_options.main().to_progress_bar(0);
        let main = if style_options.main().enabled {
            multi.add(main)
        } else {
            main
        };
        main.tick();

        Self {
            multi,
            main,
            style_options,
        }
    }

    /// A display that draws nothing.
    pub fn hidden() -> Self {
        Self::new(StyleOptions::new(
            super::ProgressBarOpts::hidden(),
            super::ProgressBarOpts::hidden(),
        ))
    }

    /// Account for newly discovered files.
    pub fn add_discovered(&self, count: u64) {
        self.main.inc_length(count);
    }

    /// Show a status line under the main bar.
    pub fn set_message(&self, msg: impl Into<String>) {
        self.main.set_message(msg.into());
    }

    /// Create a bar for one transfer, starting at `position` when resuming.
    ///
    /// Transfers of unknown size get a bar of length zero, which indicatif
    /// draws as a byte counter.
    pub fn create_child_progress(&self, size: Option<u64>, position: u64) -> ProgressBar {
        let opts = self.style_options.child();
        let pb = opts.to_progress_bar(size.unwrap_or(0)).with_position(position);
        if opts.enabled {
            self.multi.add(pb)
        } else {
            pb
        }
    }

    /// Finish a child bar, clearing it if configured.
    pub fn finish_child(&self, pb: ProgressBar) {
        if self.style_options.child().clear {
            pb.finish_and_clear();
        } else {
            pb.finish();
        }
        self.multi.remove(&pb);
    }

    pub fn increment_main(&self) {
        self.main.inc(1);
    }

    pub fn position(&self) -> u64 {
        self.main.position()
    }

    pub fn length(&self) -> Option<u64> {
        self.main.length()
    }

    /// Finish the main bar, clearing it if configured.
    pub fn finish(&self) {
        if self.style_options.main().clear {
            self.main.finish_and_clear();
        } else {
            self.main.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_bar_grows_with_discovery() {
        let display = ProgressDisplay::hidden();
        display.add_discovered(2);
        display.add_discovered(1);
        display.increment_main();
        assert_eq!(display.length(), Some(3));
        assert_eq!(display.position(), 1);
    }

    #[test]
    fn test_child_progress_resumes_at_position() {
        let display = ProgressDisplay::hidden();
        let pb = display.create_child_progress(Some(100), 40);
        assert_eq!(pb.position(), 40);
        display.finish_child(pb);
    }
}
