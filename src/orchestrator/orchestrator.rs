//! Driving the download client for a selection of titles.
//!
//! Titles are processed one at a time, in the order they were selected.
//! Every call to the download client is bounded by the call timeout and by
//! the cancellation token, so a hung client can neither stall the run nor
//! outlive a cancel request. A title that fails never stops the titles after
//! it.

use super::config::OrchestratorConfig;
use super::outcome::{Outcome, Report};
use super::select::{select_variants, Selection};
use crate::cache::DownloadCache;
use crate::catalog::{short_name, Catalog, CatalogEntry};
use crate::client::{DownloadClient, JobId, JobState};
use crate::config::Preferences;
use crate::error::{Error, Result};
use crate::notify::DiscordNotifier;
use crate::progress::ProgressDisplay;

use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::{RetryDecision, RetryPolicy};
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

const CANCELLED: &str = "cancelled";

/// Hands selected titles to a [`DownloadClient`] and tracks their outcome.
///
/// ```rust,no_run
/// use nxbrew_dl::cache::DownloadCache;
/// use nxbrew_dl::catalog::Catalog;
/// use nxbrew_dl::client::HttpControlClient;
/// use nxbrew_dl::config::Preferences;
/// use nxbrew_dl::http::HttpClientConfig;
/// use nxbrew_dl::orchestrator::OrchestratorBuilder;
/// use std::sync::Arc;
///
/// # async fn example(catalog: Catalog) -> Result<(), nxbrew_dl::Error> {
/// let client = HttpControlClient::new("http://127.0.0.1:3128", HttpClientConfig::default())?;
/// let orchestrator = OrchestratorBuilder::new(Arc::new(client)).build();
/// let preferences = Preferences {
///     target_directory: "/downloads".into(),
///     ..Preferences::default()
/// };
/// let mut cache = DownloadCache::new();
/// let report = orchestrator
///     .run(["super game"], &catalog, &preferences, &mut cache)
///     .await?;
/// println!("{} downloaded, {} failed", report.downloaded(), report.failed());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Orchestrator {
    client: Arc<dyn DownloadClient>,
    config: OrchestratorConfig,
    notifier: Option<DiscordNotifier>,
    cancel: CancellationToken,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("notifier", &self.notifier.is_some())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl Orchestrator {
    pub(crate) fn new(
        client: Arc<dyn DownloadClient>,
        config: OrchestratorConfig,
        notifier: Option<DiscordNotifier>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            config,
            notifier,
            cancel,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// A handle that cancels this orchestrator when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop the current run.
    ///
    /// The title in flight ends as `Failed("cancelled")`, titles not yet
    /// started as `Skipped("cancelled")`. The cache keeps every download that
    /// completed before the cancel.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Download every title in `selected` that is not already satisfied by
    /// `cache`.
    ///
    /// Fails only when `preferences` are unusable; everything else ends up
    /// as a per-title [`Outcome`] in the report. Duplicate names are
    /// processed once.
    #[instrument(skip_all)]
    pub async fn run<I, S>(
        &self,
        selected: I,
        catalog: &Catalog,
        preferences: &Preferences,
        cache: &mut DownloadCache,
    ) -> Result<Report>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        preferences.validate()?;

        let mut seen = HashSet::new();
        let titles: Vec<String> = selected
            .into_iter()
            .map(|name| name.as_ref().to_string())
            .filter(|name| seen.insert(name.clone()))
            .collect();
        info!(titles = titles.len(), "Starting downloads");

        let progress_display = ProgressDisplay::new(self.config.style_options.clone(), titles.len());
        let mut report = Report::default();

        for name in titles {
            let outcome = if self.cancel.is_cancelled() {
                Outcome::skipped(CANCELLED)
            } else {
                self.process(&name, catalog, preferences, cache, &mut report.warnings, &progress_display)
                    .await
            };

            info!(title = %name, %outcome, "Title finished");
            if let Some(callback) = &self.config.on_outcome {
                callback(&name, &outcome);
            }
            progress_display.increment_main(name.clone());
            report.outcomes.insert(name, outcome);
        }

        progress_display.finish();
        info!(
            downloaded = report.downloaded(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Downloads finished"
        );
        Ok(report)
    }

    async fn process(
        &self,
        name: &str,
        catalog: &Catalog,
        preferences: &Preferences,
        cache: &mut DownloadCache,
        warnings: &mut Vec<String>,
        progress_display: &ProgressDisplay,
    ) -> Outcome {
        let Some(entry) = catalog.get(name).or_else(|| catalog.get(&short_name(name))) else {
            return Outcome::skipped("not in catalog");
        };
        let Some(selection) =
            select_variants(entry, preferences, self.config.preferred_region.as_deref())
        else {
            return Outcome::skipped("no eligible variant");
        };
        if cache.is_satisfied(&entry.short_name, &selection.key) {
            debug!(title = %entry.short_name, "Selection already downloaded");
            return Outcome::skipped("already downloaded");
        }

        let spinner = progress_display.create_child_spinner(entry.display_name.clone());
        let result = self.download(entry, &selection, preferences).await;
        progress_display.finish_child(spinner);

        if let Err(e) = result {
            if self.cancel.is_cancelled() {
                return Outcome::failed(CANCELLED);
            }
            warn!(title = %entry.short_name, error = %e, "Download failed");
            return Outcome::failed(e);
        }

        cache.record(&entry.short_name, &selection.key);
        if let Some(path) = &self.config.cache_path {
            if let Err(e) = cache.save(path) {
                warn!(error = %e, "Could not persist download cache");
                warnings.push(e.to_string());
            }
        }
        if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier
                .notify_downloaded(&entry.display_name, selection.variants.len())
                .await
            {
                warn!(error = %e, "Could not send notification");
                warnings.push(format!("notification for {}: {}", entry.display_name, e));
            }
        }
        Outcome::Downloaded
    }

    /// Submit every link of `selection`, retrying transient failures with
    /// exponential backoff. Links that completed in an earlier attempt are
    /// not submitted again.
    async fn download(
        &self,
        entry: &CatalogEntry,
        selection: &Selection,
        preferences: &Preferences,
    ) -> Result<()> {
        let policy = ExponentialBackoff::builder()
            .retry_bounds(
                self.config.min_backoff,
                self.config.max_backoff.max(self.config.min_backoff),
            )
            .build_with_max_retries(self.config.retries);
        let started = SystemTime::now();
        let mut completed = HashSet::new();
        let mut past_retries = 0;

        loop {
            let error = match self.attempt(selection, preferences, &mut completed).await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };
            if self.cancel.is_cancelled() || !error.is_transient() {
                return Err(error);
            }

            match policy.should_retry(started, past_retries) {
                RetryDecision::Retry { execute_after } => {
                    let delay = execute_after
                        .duration_since(SystemTime::now())
                        .unwrap_or_default();
                    past_retries += 1;
                    warn!(
                        title = %entry.short_name,
                        attempt = past_retries,
                        ?delay,
                        error = %error,
                        "Retrying download"
                    );
                    self.pause(delay).await?;
                }
                RetryDecision::DoNotRetry => return Err(error),
            }
        }
    }

    async fn attempt(
        &self,
        selection: &Selection,
        preferences: &Preferences,
        completed: &mut HashSet<String>,
    ) -> Result<()> {
        for variant in &selection.variants {
            if completed.contains(&variant.link) {
                continue;
            }
            let job = self
                .bounded(self.client.submit(
                    &variant.link,
                    &preferences.target_directory,
                    &preferences.client_credentials,
                ))
                .await?;
            debug!(link = %variant.link, job = %job, kind = %variant.kind(), "Job submitted");
            self.wait_for(&job).await?;
            completed.insert(variant.link.clone());
        }
        Ok(())
    }

    /// Poll `job` until it settles or exceeds the job timeout.
    async fn wait_for(&self, job: &JobId) -> Result<()> {
        let submitted = Instant::now();
        loop {
            match self.bounded(self.client.status(job)).await? {
                JobState::Done => return Ok(()),
                JobState::Error(message) => {
                    return Err(Error::Client(format!("job {} failed: {}", job, message)))
                }
                JobState::Pending | JobState::Running => {}
            }
            if let Some(limit) = self.config.job_timeout {
                if submitted.elapsed() >= limit {
                    return Err(Error::Client(format!(
                        "job {} did not finish within {:?}",
                        job, limit
                    )));
                }
            }
            self.pause(self.config.poll_interval).await?;
        }
    }

    /// Run one client call under the call timeout, giving up on cancel.
    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(Error::Client(CANCELLED.into())),
            result = tokio::time::timeout(self.config.call_timeout, call) => match result {
                Ok(result) => result,
                Err(_) => Err(Error::transient(format!(
                    "download client did not answer within {:?}",
                    self.config.call_timeout
                ))),
            },
        }
    }

    async fn pause(&self, delay: Duration) -> Result<()> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(Error::Client(CANCELLED.into())),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}
