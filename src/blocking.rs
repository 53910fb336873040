//! Synchronous entry points for callers without an async runtime.
//!
//! Each call builds a private current-thread runtime, runs the async core on
//! it and drops it before returning. Nothing is shared between calls, so a
//! GUI may call these from any worker thread, one call at a time or several
//! in parallel. They must not be called from inside an async runtime.

use crate::cache::DownloadCache;
use crate::catalog::{Catalog, CatalogBuilder};
use crate::client::HttpControlClient;
use crate::config::Settings;
use crate::error::Result;
use crate::http::{HttpClientConfig, HttpFetcher};
use crate::notify::DiscordNotifier;
use crate::orchestrator::{OrchestratorBuilder, Report};
use crate::patterns::PatternConfig;
use crate::progress::StyleOptions;

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}

/// Fetch the index page named in `settings` and build the catalog.
pub fn build_catalog(settings: &Settings, patterns: Arc<PatternConfig>) -> Result<Catalog> {
    settings.validate()?;
    let fetcher = HttpFetcher::new(HttpClientConfig::from(&settings.http))?;
    let builder = CatalogBuilder::new(patterns)
        .concurrency(settings.build_concurrency())
        .style_options(StyleOptions::hidden());
    block_on(builder.build(&fetcher, &settings.site_url))?
}

/// Download the `selected` titles of `catalog` with the preferences in
/// `settings`.
///
/// The cache at `cache_path` is loaded first and written back after every
/// completed download. A malformed cache is moved aside, reported in the
/// returned warnings and replaced by an empty one. `cancel` stops the run
/// from another thread.
pub fn run_orchestration<I, S>(
    settings: &Settings,
    catalog: &Catalog,
    selected: I,
    cache_path: &Path,
    cancel: Option<CancellationToken>,
) -> Result<Report>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    settings.validate_orchestration()?;
    let http_config = HttpClientConfig::from(&settings.http);

    let (mut cache, recovered) = DownloadCache::load_or_recover(cache_path)?;
    let mut warnings: Vec<String> = recovered.into_iter().collect();

    let client = HttpControlClient::new(&settings.orchestrator.client_url, http_config.clone())?;
    let mut builder = OrchestratorBuilder::new(Arc::new(client))
        .settings(settings)
        .cache_path(cache_path.to_path_buf())
        .hidden();
    if let Some(url) = settings.discord_url.as_deref().filter(|url| !url.is_empty()) {
        builder = builder.notifier(DiscordNotifier::new(url, http_config)?);
    }
    if let Some(token) = cancel {
        builder = builder.cancellation_token(token);
    }
    let orchestrator = builder.build();

    let mut report = block_on(orchestrator.run(
        selected,
        catalog,
        &settings.preferences,
        &mut cache,
    ))??;
    warnings.append(&mut report.warnings);
    report.warnings = warnings;
    Ok(report)
}
