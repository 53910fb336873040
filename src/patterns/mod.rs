//! Pattern rules used to classify titles and download links.
//!
//! A [`PatternConfig`] is loaded once (from a JSON document, or the bundled
//! default) and is read-only afterwards. It holds one ordered [`RuleSet`] per
//! [`SignalKind`], plus the CSS selectors used for the structural pass over
//! the index and detail pages.
//!
//! # Examples
//!
//! ```rust
//! use nxbrew_dl::patterns::PatternConfig;
//! use nxbrew_dl::FileType;
//!
//! let patterns = PatternConfig::bundled()?;
//! let signals = patterns.classify("Update v1.0.2 (NSP)");
//! assert!(signals.is_update);
//! assert_eq!(signals.file_type, Some(FileType::Nsp));
//! # Ok::<(), nxbrew_dl::Error>(())
//! ```

pub mod classify;
pub mod rules;

pub use classify::Signals;
pub use rules::{PatternConfig, Rule, RuleSet, SignalKind};

use crate::error::Result;

/// The pattern document shipped with the crate.
pub const BUNDLED_PATTERNS: &str = include_str!("../../assets/patterns.json");

impl PatternConfig {
    /// Load the bundled pattern document.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_PATTERNS)
    }
}
