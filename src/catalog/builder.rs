//! Building a catalog from the index page and every detail page.

use super::detail::parse_detail;
use super::entry::{short_name, strip_tags, Catalog, CatalogEntry, DownloadVariant, TitleStub};
use super::index::parse_index;
use crate::config::{DEFAULT_BUILD_CONCURRENCY, MAX_BUILD_CONCURRENCY};
use crate::error::{Error, Result};
use crate::http::PageSource;
use crate::patterns::PatternConfig;
use crate::progress::{ProgressDisplay, StyleOptions};

use futures::stream::{self, StreamExt};
use reqwest::Url;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Builds a [`Catalog`] from a listing site.
///
/// ```rust,no_run
/// use nxbrew_dl::catalog::CatalogBuilder;
/// use nxbrew_dl::http::{HttpClientConfig, HttpFetcher};
/// use nxbrew_dl::patterns::PatternConfig;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), nxbrew_dl::Error> {
/// let patterns = Arc::new(PatternConfig::bundled()?);
/// let fetcher = HttpFetcher::new(HttpClientConfig::default())?;
/// let catalog = CatalogBuilder::new(patterns)
///     .concurrency(6)
///     .build(&fetcher, "https://nxbrew.example/index/")
///     .await?;
/// println!("{} titles", catalog.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CatalogBuilder {
    patterns: Arc<PatternConfig>,
    concurrency: usize,
    style_options: StyleOptions,
}

struct FetchedTitle {
    position: usize,
    stub: TitleStub,
    variants: Vec<DownloadVariant>,
}

impl CatalogBuilder {
    pub fn new(patterns: Arc<PatternConfig>) -> Self {
        Self {
            patterns,
            concurrency: DEFAULT_BUILD_CONCURRENCY,
            style_options: StyleOptions::default(),
        }
    }

    /// Number of detail pages fetched at once, clamped to `1..=8`.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, MAX_BUILD_CONCURRENCY);
        self
    }

    pub fn style_options(mut self, style_options: StyleOptions) -> Self {
        self.style_options = style_options;
        self
    }

    /// Hide all progress bars.
    pub fn hidden(self) -> Self {
        self.style_options(StyleOptions::hidden())
    }

    pub fn patterns(&self) -> &PatternConfig {
        &self.patterns
    }

    pub fn get_concurrency(&self) -> usize {
        self.concurrency
    }

    /// Fetch the index page and every detail page, and assemble the catalog.
    ///
    /// Only an unusable index URL or an index fetch failure aborts the
    /// build. A detail page that cannot be fetched leaves its title in the
    /// catalog without variants.
    #[instrument(skip(self, source))]
    pub async fn build<S>(&self, source: &S, index_url: &str) -> Result<Catalog>
    where
        S: PageSource + ?Sized,
    {
        let index = Url::parse(index_url)
            .map_err(|e| Error::permanent(format!("invalid index URL \"{}\": {}", index_url, e)))?;

        let html = source.fetch(index.as_str()).await?;
        let stubs = parse_index(&html, &index, &self.patterns);
        if stubs.is_empty() {
            warn!("Index page lists no titles");
        }

        let progress_display = ProgressDisplay::new(self.style_options.clone(), stubs.len());

        let mut fetched = stream::iter(stubs.into_iter().enumerate())
            .map(|(position, stub)| self.fetch_title(source, position, stub, &progress_display))
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        progress_display.finish();

        // Merge in index order so the result does not depend on fetch timing.
        fetched.sort_by_key(|title| title.position);
        let catalog = merge(fetched);
        info!(titles = catalog.len(), "Catalog built");
        Ok(catalog)
    }

    async fn fetch_title<S>(
        &self,
        source: &S,
        position: usize,
        stub: TitleStub,
        progress_display: &ProgressDisplay,
    ) -> FetchedTitle
    where
        S: PageSource + ?Sized,
    {
        let variants = match source.fetch(&stub.detail_url).await {
            Ok(html) => match Url::parse(&stub.detail_url) {
                Ok(page_url) => parse_detail(&html, &page_url, &stub, &self.patterns),
                Err(e) => {
                    warn!(title = %stub.name, error = %e, "Unusable detail URL");
                    Vec::new()
                }
            },
            Err(e) => {
                warn!(title = %stub.name, url = %stub.detail_url, error = %e, "Could not fetch detail page");
                Vec::new()
            }
        };
        progress_display.increment_main(stub.name.clone());

        FetchedTitle {
            position,
            stub,
            variants,
        }
    }
}

fn merge(fetched: Vec<FetchedTitle>) -> Catalog {
    let mut entries: BTreeMap<String, CatalogEntry> = BTreeMap::new();

    for FetchedTitle { stub, variants, .. } in fetched {
        let key = short_name(&stub.name);
        let entry = entries.entry(key.clone()).or_insert_with(|| CatalogEntry {
            short_name: key,
            display_name: strip_tags(&stub.name),
            url: stub.detail_url.clone(),
            variants: Vec::new(),
        });
        if entry.url != stub.detail_url {
            debug!(title = %entry.short_name, url = %stub.detail_url, "Merging listing into existing title");
        }
        for variant in variants {
            if entry.variants.iter().all(|v| v.key() != variant.key()) {
                entry.variants.push(variant);
            }
        }
    }

    Catalog::from_entries(entries)
}
