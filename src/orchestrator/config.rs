//! Orchestrator configuration and defaults.

use super::outcome::Outcome;
use crate::config::Settings;
use crate::progress::StyleOptions;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Called once per selected title as soon as its outcome is known.
pub type OutcomeCallback = Box<dyn Fn(&str, &Outcome) + Send + Sync>;

#[derive(Clone)]
pub struct OrchestratorConfig {
    /// Extra attempts per title after the first failure.
    pub retries: u32,
    /// Backoff bounds between attempts.
    pub min_backoff: Duration,
    pub max_backoff: Duration,
    /// Delay between two status polls of a running job.
    pub poll_interval: Duration,
    /// Bound on every submit and status call.
    pub call_timeout: Duration,
    /// Bound on a whole job, from submission to a terminal state.
    pub job_timeout: Option<Duration>,
    pub preferred_region: Option<String>,
    /// Where to persist the download cache after each download.
    pub cache_path: Option<PathBuf>,
    pub style_options: StyleOptions,
    pub on_outcome: Option<Arc<OutcomeCallback>>,
}

impl std::fmt::Debug for OrchestratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestratorConfig")
            .field("retries", &self.retries)
            .field("min_backoff", &self.min_backoff)
            .field("max_backoff", &self.max_backoff)
            .field("poll_interval", &self.poll_interval)
            .field("call_timeout", &self.call_timeout)
            .field("job_timeout", &self.job_timeout)
            .field("preferred_region", &self.preferred_region)
            .field("cache_path", &self.cache_path)
            .field("style_options", &self.style_options)
            .field("on_outcome", &self.on_outcome.is_some())
            .finish()
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            retries: 2,
            min_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            poll_interval: Duration::from_secs(2),
            call_timeout: Duration::from_secs(30),
            job_timeout: None,
            preferred_region: None,
            cache_path: None,
            style_options: StyleOptions::default(),
            on_outcome: None,
        }
    }
}

impl OrchestratorConfig {
    /// Apply the user's settings on top of the defaults.
    pub fn from_settings(settings: &Settings) -> Self {
        let o = &settings.orchestrator;
        Self {
            retries: o.retries,
            poll_interval: Duration::from_millis(o.poll_interval_ms),
            call_timeout: Duration::from_secs(o.call_timeout_secs),
            job_timeout: o.job_timeout_secs.map(Duration::from_secs),
            preferred_region: settings.preferred_region.clone(),
            ..Self::default()
        }
    }
}
