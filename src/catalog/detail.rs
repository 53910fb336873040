//! Classification of download links on a title's detail page.

use super::entry::{DownloadVariant, TitleStub};
use super::index::{collapse_whitespace, resolve_link};
use crate::error::{Error, Result};
use crate::patterns::{PatternConfig, Signals};

use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static SIZE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*(KB|MB|GB|TB)\b").unwrap());

const BLOCK_TAGS: &[&str] = &[
    "p", "li", "td", "th", "div", "h1", "h2", "h3", "h4", "h5", "h6", "section",
];

/// Parse a size such as `4.5 GB` out of free text.
pub fn parse_size(text: &str) -> Option<u64> {
    let captures = SIZE_REGEX.captures(text)?;
    let value: f64 = captures.get(1)?.as_str().parse().ok()?;
    let multiplier: u64 = match captures.get(2)?.as_str().to_ascii_uppercase().as_str() {
        "KB" => 1 << 10,
        "MB" => 1 << 20,
        "GB" => 1 << 30,
        "TB" => 1 << 40,
        _ => return None,
    };
    Some((value * multiplier as f64).round() as u64)
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(element.text())
}

fn is_block(element: &ElementRef<'_>) -> bool {
    BLOCK_TAGS.contains(&element.value().name())
}

/// The text describing a link: the anchor itself, its enclosing block below
/// `scope`, and the closest preceding sibling block carrying text, unless
/// that sibling holds links of its own.
fn link_context(anchor: ElementRef<'_>, scope: ElementRef<'_>) -> String {
    let block = anchor
        .ancestors()
        .take_while(|node| node.id() != scope.id())
        .filter_map(ElementRef::wrap)
        .find(is_block)
        .unwrap_or(anchor);

    let previous = block
        .prev_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sibling| !element_text(*sibling).is_empty())
        .filter(|sibling| sibling.select(&ANCHOR_SELECTOR).next().is_none())
        .map(element_text);

    let mut parts = vec![element_text(anchor)];
    if block.id() != anchor.id() {
        parts.push(element_text(block));
    }
    if let Some(previous) = previous {
        parts.push(previous);
    }
    parts.join(" ")
}

/// Turn one link and its context into a variant.
///
/// Fails with [`Error::Parse`] when the context names no file type.
pub fn classify_link(
    link: &Url,
    context: &str,
    stub: &TitleStub,
    title_signals: &Signals,
    patterns: &PatternConfig,
) -> Result<DownloadVariant> {
    let signals = patterns.classify(context);
    let file_type = signals.file_type.ok_or_else(|| {
        Error::Parse(format!("no file type for {} in \"{}\"", link, context))
    })?;

    Ok(DownloadVariant {
        title_name: stub.name.clone(),
        region: signals.region.or_else(|| title_signals.region.clone()),
        revision: signals.revision.or_else(|| title_signals.revision.clone()),
        file_type,
        is_update: signals.is_update,
        is_dlc: signals.is_dlc,
        languages: if signals.languages.is_empty() {
            title_signals.languages.clone()
        } else {
            signals.languages
        },
        size_bytes: parse_size(context),
        link: link.to_string(),
    })
}

/// Extract every classifiable download variant from a detail page.
///
/// Only links leaving the site (and, when configured, pointing at an
/// accepted download host) are candidates. Links that fail classification
/// are logged and dropped.
pub fn parse_detail(
    html: &str,
    page_url: &Url,
    stub: &TitleStub,
    patterns: &PatternConfig,
) -> Vec<DownloadVariant> {
    let document = Html::parse_document(html);
    let scope = patterns
        .content_selectors()
        .iter()
        .find_map(|selector| document.select(selector).next())
        .unwrap_or_else(|| document.root_element());

    let title_signals = patterns.classify(&stub.name);
    let mut variants: Vec<DownloadVariant> = Vec::new();

    for anchor in scope.select(&ANCHOR_SELECTOR) {
        let Some(link) = anchor
            .value()
            .attr("href")
            .and_then(|href| resolve_link(page_url, href))
        else {
            continue;
        };
        let Some(host) = link.host_str() else {
            continue;
        };
        if Some(host) == page_url.host_str() || !patterns.accepts_host(host) {
            continue;
        }

        let context = link_context(anchor, scope);
        match classify_link(&link, &context, stub, &title_signals, patterns) {
            Ok(variant) => {
                if variants.iter().all(|v| v.key() != variant.key()) {
                    variants.push(variant);
                }
            }
            Err(e) => debug!(title = %stub.name, error = %e, "Dropping link"),
        }
    }

    debug!(title = %stub.name, count = variants.len(), "Parsed detail page");
    variants
}
