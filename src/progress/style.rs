//! Progress bar styling.
//!
//! By default the main bar stays on screen when the run ends and the per-file
//! bars disappear as soon as their transfer is over.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Style of the main bar and of the per-file bars.
#[derive(Debug, Clone)]
pub struct StyleOptions {
    pub(crate) main: ProgressBarOpts,
    pub(crate) child: ProgressBarOpts,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            main: ProgressBarOpts {
                template: Some(ProgressBarOpts::TEMPLATE_FILES.into()),
                progress_chars: Some(ProgressBarOpts::CHARS_FINE.into()),
                enabled: true,
                clear: false,
            },
            child: ProgressBarOpts::bytes(),
        }
    }
}

impl StyleOptions {
    pub fn new(main: ProgressBarOpts, child: ProgressBarOpts) -> Self {
        Self { main, child }
    }

    /// Return `false` if neither the main nor the child bar is enabled.
    pub fn is_enabled(&self) -> bool {
        self.main.enabled || self.child.enabled
    }

    pub fn main(&self) -> &ProgressBarOpts {
        &self.main
    }

    pub fn child(&self) -> &ProgressBarOpts {
        &self.child
    }
}

/// Options of a single progress bar.
#[derive(Debug, Clone)]
pub struct ProgressBarOpts {
    template: Option<String>,
    /// At least 3 characters: filled, current, to do.
    progress_chars: Option<String>,
    pub(crate) enabled: bool,
    /// Clear the bar once it is finished.
    pub(crate) clear: bool,
}

impl Default for ProgressBarOpts {
    fn default() -> Self {
        Self {
            template: None,
            progress_chars: None,
            enabled: true,
            clear: true,
        }
    }
}

impl ProgressBarOpts {
    /// Files done out of files discovered: `████▋     12/40 files (30%) 00:00:07`
    pub const TEMPLATE_FILES: &'static str =
        "{bar:40.blue} {pos:>}/{len} files ({percent}%) {elapsed_precise:.blue} {msg}";
    /// Bytes of one transfer: `━━━━━╾──── 1.20 MiB/4.00 MiB 3.10 MiB/s eta 1s`
    pub const TEMPLATE_BYTES: &'static str =
        "{bar:40.green/black} {bytes:>11.green}/{total_bytes:<11.green} {bytes_per_sec:>13.red} eta {eta:.blue} {msg}";
    pub const CHARS_FINE: &'static str = "█▉▊▋▌▍▎▏  ";
    pub const CHARS_LINE: &'static str = "━╾╴─";

    pub fn new(
        template: Option<String>,
        progress_chars: Option<String>,
        enabled: bool,
        clear: bool,
    ) -> Self {
        Self {
            template,
            progress_chars,
            enabled,
            clear,
        }
    }

    /// Byte counter used for individual transfers.
    pub fn bytes() -> Self {
        Self {
            template: Some(Self::TEMPLATE_BYTES.into()),
            progress_chars: Some(Self::CHARS_LINE.into()),
            enabled: true,
            clear: true,
        }
    }

    /// A bar that is never drawn.
    pub fn hidden() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Falls back to the default bar when the template does not parse.
    pub fn to_progress_style(&self) -> ProgressStyle {
        let mut style = match self.template {
            Some(ref template) => {
                ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_bar())
            }
            None => ProgressStyle::default_bar(),
        };
        if let Some(ref chars) = self.progress_chars {
            style = style.progress_chars(chars);
        }
        style
    }

    pub fn to_progress_bar(&self, len: u64) -> ProgressBar {
        if !self.enabled {
            // Keeps counting so totals stay available when nothing is drawn.
            return ProgressBar::with_draw_target(Some(len), ProgressDrawTarget::hidden());
        }
        ProgressBar::new(len).with_style(self.to_progress_style())
    }
}
