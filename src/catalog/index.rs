//! Structural extraction of title stubs from the index page.

use super::entry::TitleStub;
use crate::patterns::PatternConfig;

use reqwest::Url;
use scraper::Html;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Collapse runs of whitespace into single spaces.
pub(crate) fn collapse_whitespace<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve `href` against `base`, keeping only http(s) targets.
pub(crate) fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let mut url = base.join(href.trim()).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

/// Extract the list of title stubs from the index page.
///
/// Anchors matched by the index selector become stubs, in document order.
/// Repeated URLs are ignored; a repeated name replaces the earlier stub in
/// place.
pub fn parse_index(html: &str, index_url: &Url, patterns: &PatternConfig) -> Vec<TitleStub> {
    let document = Html::parse_document(html);

    let mut stubs: Vec<TitleStub> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();
    let mut seen_urls: HashSet<String> = HashSet::new();

    for anchor in document.select(patterns.index_selector()) {
        let name = collapse_whitespace(anchor.text());
        if name.is_empty() {
            continue;
        }
        let Some(url) = anchor
            .value()
            .attr("href")
            .and_then(|href| resolve_link(index_url, href))
        else {
            debug!(%name, "Ignoring index entry without an http(s) link");
            continue;
        };
        let detail_url = url.to_string();
        if !seen_urls.insert(detail_url.clone()) {
            debug!(%name, %detail_url, "Ignoring repeated index link");
            continue;
        }

        let stub = TitleStub { name, detail_url };
        match by_name.get(&stub.name) {
            Some(&idx) => {
                warn!(
                    name = %stub.name,
                    previous = %stubs[idx].detail_url,
                    replacement = %stub.detail_url,
                    "Duplicate title on index page, keeping the later link"
                );
                stubs[idx] = stub;
            }
            None => {
                by_name.insert(stub.name.clone(), stubs.len());
                stubs.push(stub);
            }
        }
    }

    debug!(count = stubs.len(), "Parsed index page");
    stubs
}
