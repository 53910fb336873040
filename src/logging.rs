//! Tracing subscriber setup for front ends.

use tracing_subscriber::{fmt, EnvFilter};

/// Install a formatted subscriber filtering at `level` (e.g. `"info"`).
///
/// `RUST_LOG`, when set, takes precedence. Calling this more than once is
/// harmless; only the first call installs a subscriber, and the return value
/// tells whether this call did.
pub fn init(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).try_init().is_ok()
}
