//! Coordination of the main progress bar and per-title spinners.

use crate::progress::StyleOptions;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget};
use std::sync::Arc;
use std::time::Duration;

const SPINNER_TICK: Duration = Duration::from_millis(120);

/// Owns the progress bars of one catalog build or orchestration run.
pub struct ProgressDisplay {
    multi: Arc<MultiProgress>,
    main: Arc<ProgressBar>,
    style_options: StyleOptions,
}

impl ProgressDisplay {
    /// Create a display whose main bar counts `total` steps.
    pub fn new(style_options: StyleOptions, total: usize) -> Self {
        let multi = match style_options.is_enabled() {
            true => Arc::new(MultiProgress::new()),
            false => Arc::new(MultiProgress::with_draw_target(ProgressDrawTarget::hidden())),
        };
        let main = Arc::new(
            multi.add(
                style_options
                    .main()
                    .clone()
                    .to_progress_bar(total as u64),
            ),
        );
        main.tick();

        Self {
            multi,
            main,
            style_options,
        }
    }

    pub fn main(&self) -> Arc<ProgressBar> {
        self.main.clone()
    }

    /// Add a spinner showing `message`.
    pub fn create_child_spinner(&self, message: impl Into<String>) -> ProgressBar {
        let pb = self
            .multi
            .add(self.style_options.child().clone().to_progress_bar(0));
        pb.set_message(message.into());
        pb.enable_steady_tick(SPINNER_TICK);
        pb
    }

    /// Advance the main bar by one step, labelled with `message`.
    pub fn increment_main(&self, message: impl Into<String>) {
        self.main.set_message(message.into());
        self.main.inc(1);
    }

    pub fn finish(self) {
        if self.style_options.main().clear {
            self.main.finish_and_clear();
        } else {
            self.main.finish();
        }
    }

    pub fn finish_child(&self, pb: ProgressBar) {
        if self.style_options.child().clear {
            pb.finish_and_clear();
        } else {
            pb.finish();
        }
    }
}
