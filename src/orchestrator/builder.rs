//! Builder for [`Orchestrator`] instances.
//!
//! ```rust
//! use nxbrew_dl::client::HttpControlClient;
//! use nxbrew_dl::http::HttpClientConfig;
//! use nxbrew_dl::orchestrator::OrchestratorBuilder;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), nxbrew_dl::Error> {
//! let client = HttpControlClient::new("http://127.0.0.1:3128", HttpClientConfig::default())?;
//! let orchestrator = OrchestratorBuilder::new(Arc::new(client))
//!     .retries(3)
//!     .poll_interval(Duration::from_secs(5))
//!     .cache_path("cache.json".into())
//!     .on_outcome(|short_name, outcome| println!("{}: {}", short_name, outcome))
//!     .build();
//! # Ok(())
//! # }
//! ```

use super::config::OrchestratorConfig;
use super::orchestrator::Orchestrator;
use super::outcome::Outcome;
use crate::client::DownloadClient;
use crate::config::Settings;
use crate::notify::DiscordNotifier;
use crate::progress::StyleOptions;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A builder used to create an [`Orchestrator`].
pub struct OrchestratorBuilder {
    client: Arc<dyn DownloadClient>,
    config: OrchestratorConfig,
    notifier: Option<DiscordNotifier>,
    cancel: CancellationToken,
}

impl OrchestratorBuilder {
    /// Creates a builder with the default options.
    pub fn new(client: Arc<dyn DownloadClient>) -> Self {
        Self {
            client,
            config: OrchestratorConfig::default(),
            notifier: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Start from the user's settings instead of the defaults.
    pub fn settings(mut self, settings: &Settings) -> Self {
        let OrchestratorConfig {
            cache_path,
            style_options,
            on_outcome,
            ..
        } = self.config;
        self.config = OrchestratorConfig {
            cache_path,
            style_options,
            on_outcome,
            ..OrchestratorConfig::from_settings(settings)
        };
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    /// Bounds of the exponential backoff between attempts.
    pub fn backoff(mut self, min: Duration, max: Duration) -> Self {
        self.config.min_backoff = min;
        self.config.max_backoff = max.max(min);
        self
    }

    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.config.poll_interval = poll_interval;
        self
    }

    pub fn call_timeout(mut self, call_timeout: Duration) -> Self {
        self.config.call_timeout = call_timeout;
        self
    }

    pub fn job_timeout(mut self, job_timeout: Option<Duration>) -> Self {
        self.config.job_timeout = job_timeout;
        self
    }

    pub fn preferred_region(mut self, region: Option<String>) -> Self {
        self.config.preferred_region = region;
        self
    }

    /// Persist the download cache to `path` after every download.
    pub fn cache_path(mut self, path: PathBuf) -> Self {
        self.config.cache_path = Some(path);
        self
    }

    pub fn style_options(mut self, style_options: StyleOptions) -> Self {
        self.config.style_options = style_options;
        self
    }

    /// Hide all progress bars.
    pub fn hidden(self) -> Self {
        self.style_options(StyleOptions::hidden())
    }

    pub fn notifier(mut self, notifier: DiscordNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Use `token` to cancel the run from elsewhere.
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Set a callback invoked as soon as each title's outcome is known.
    pub fn on_outcome<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, &Outcome) + Send + Sync + 'static,
    {
        self.config.on_outcome = Some(Arc::new(Box::new(callback)));
        self
    }

    /// Create the [`Orchestrator`] with the specified options.
    pub fn build(self) -> Orchestrator {
        Orchestrator::new(self.client, self.config, self.notifier, self.cancel)
    }
}
