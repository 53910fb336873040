//! Progress bar styling options.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

/// Style options for the catalog and orchestration progress bars.
///
/// The main bar counts pages or titles and stays on screen once finished;
/// the per-title spinners are cleared as soon as their title settles.
#[derive(Debug, Clone)]
pub struct StyleOptions {
    pub(crate) main: ProgressBarOpts,
    pub(crate) child: ProgressBarOpts,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            main: ProgressBarOpts {
                template: Some(ProgressBarOpts::TEMPLATE_BAR_WITH_POSITION.into()),
                progress_chars: Some(ProgressBarOpts::CHARS_FINE.into()),
                enabled: true,
                clear: false,
            },
            child: ProgressBarOpts::spinner(),
        }
    }
}

impl StyleOptions {
    pub fn new(main: ProgressBarOpts, child: ProgressBarOpts) -> Self {
        Self { main, child }
    }

    /// No bars at all; what a GUI front end wants.
    pub fn hidden() -> Self {
        Self::new(ProgressBarOpts::hidden(), ProgressBarOpts::hidden())
    }

    pub fn set_main(&mut self, main: ProgressBarOpts) {
        self.main = main;
    }

    pub fn set_child(&mut self, child: ProgressBarOpts) {
        self.child = child;
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

/// Options for a single progress bar.
#[derive(Debug, Clone)]
pub struct ProgressBarOpts {
    template: Option<String>,
    /// At least 3 characters: "filled", "current" and "to do".
    progress_chars: Option<String>,
    pub(crate) enabled: bool,
    /// Clear the bar once completed.
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
    /// `███████████████████████████████████████ 11/12 (99%) eta 00:00:02 Super Game`
    pub const TEMPLATE_BAR_WITH_POSITION: &'static str =
        "{bar:40.blue} {pos:>}/{len} ({percent}%) eta {eta_precise:.blue} {msg}";
    /// `⠋ [00:01:12] Super Game`
    pub const TEMPLATE_SPINNER: &'static str = "{spinner:.green} [{elapsed_precise}] {msg}";
    /// `"█▉▊▋▌▍▎▏  "`
    pub const CHARS_FINE: &'static str = "█▉▊▋▌▍▎▏  ";

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

    /// Build the [`ProgressStyle`].
    ///
    /// An invalid template falls back to the default bar with a warning.
    pub fn to_progress_style(self) -> ProgressStyle {
        let mut style = ProgressStyle::default_bar();
        if let Some(template) = self.template {
            match ProgressStyle::default_bar().template(&template) {
                Ok(s) => style = s,
                Err(e) => warn!(%template, error = %e, "Invalid progress template"),
            }
        }
        if let Some(progress_chars) = self.progress_chars {
            style = style.progress_chars(&progress_chars);
        }
        style
    }

    /// Build a [`ProgressBar`] of length `len`, hidden if disabled.
    pub fn to_progress_bar(self, len: u64) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }
        let style = self.to_progress_style();
        ProgressBar::new(len).with_style(style)
    }

    /// A spinner for a title whose job is in flight.
    pub fn spinner() -> Self {
        Self {
            template: Some(ProgressBarOpts::TEMPLATE_SPINNER.into()),
            progress_chars: None,
            enabled: true,
            clear: true,
        }
    }

    pub fn set_clear(&mut self, clear: bool) {
        self.clear = clear;
    }

    pub fn hidden() -> Self {
        Self {
            enabled: false,
            ..ProgressBarOpts::default()
        }
    }
}
