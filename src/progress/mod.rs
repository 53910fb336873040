//! Terminal progress reporting.
//!
//! Both the catalog build and the orchestrator report through a
//! [`ProgressDisplay`]: a main bar counting detail pages or titles, and a
//! spinner per title while its download job is in flight. Pass
//! [`StyleOptions::hidden`] to run without any terminal output.

pub(crate) mod display;
pub(crate) mod style;

pub use display::ProgressDisplay;
pub use style::{ProgressBarOpts, StyleOptions};
