//! Loading and compiling pattern rules.
//!
//! A pattern document is JSON of the form:
//!
//! ```json
//! {
//!   "index_selector": ".entry-content li a[href]",
//!   "content_selectors": [".entry-content", "body"],
//!   "download_hosts": ["1fichier.com"],
//!   "rules": {
//!     "file_type": [{ "label": "NSP", "matcher": "(?i)\\bNSP\\b" }],
//!     "is_update": [{ "label": "Update", "matcher": "(?i)\\bupdate\\b" }]
//!   }
//! }
//! ```
//!
//! Only `rules.file_type` is required. Matchers are regular expressions,
//! matched case-insensitively. A matcher opts a part of itself back into
//! exact case with `(?-i:...)`, as the bundled rules do for short region
//! codes such as `US` that are also ordinary words.

use crate::catalog::FileType;
use crate::error::{Error, Result};

use regex::{Regex, RegexBuilder};
use scraper::Selector;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

const DEFAULT_INDEX_SELECTOR: &str = "li a[href]";

/// The kinds of signal extracted from link-surrounding text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Region,
    Revision,
    FileType,
    IsUpdate,
    IsDlc,
    Language,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignalKind::Region => "region",
            SignalKind::Revision => "revision",
            SignalKind::FileType => "file_type",
            SignalKind::IsUpdate => "is_update",
            SignalKind::IsDlc => "is_dlc",
            SignalKind::Language => "language",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Deserialize)]
struct RawRule {
    label: String,
    matcher: String,
}

#[derive(Debug, Deserialize)]
struct PatternDocument {
    #[serde(default)]
    index_selector: Option<String>,
    #[serde(default)]
    content_selectors: Vec<String>,
    #[serde(default)]
    download_hosts: Vec<String>,
    rules: BTreeMap<SignalKind, Vec<RawRule>>,
}

/// A single named matcher.
#[derive(Debug, Clone)]
pub struct Rule {
    label: String,
    matcher: Regex,
}

impl Rule {
    /// Compile a case-insensitive rule, failing with [`Error::Config`] on an
    /// invalid matcher.
    pub fn new(label: &str, matcher: &str) -> Result<Self> {
        let matcher = RegexBuilder::new(matcher)
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::Config(format!("rule \"{}\" does not compile: {}", label, e)))?;
        Ok(Self {
            label: label.to_string(),
            matcher,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the matched text, if any.
    pub fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.matcher.find(text).map(|m| m.as_str())
    }
}

/// An ordered set of rules for one signal kind.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// First rule, in document order, matching `text`.
    pub fn first_match(&self, text: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.matcher.is_match(text))
    }

    /// Text matched by the first matching rule.
    pub fn first_matched_text<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.rules.iter().find_map(|r| r.find(text))
    }

    /// Labels of every matching rule, in document order.
    pub fn matching_labels(&self, text: &str) -> Vec<String> {
        self.rules
            .iter()
            .filter(|r| r.matcher.is_match(text))
            .map(|r| r.label.clone())
            .collect()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.rules.iter().any(|r| r.matcher.is_match(text))
    }
}

/// Immutable, validated pattern configuration.
///
/// Loaded once per process and shared read-only (typically behind an
/// [`Arc`](std::sync::Arc)).
#[derive(Debug, Clone)]
pub struct PatternConfig {
    pub(crate) region: RuleSet,
    pub(crate) revision: RuleSet,
    pub(crate) file_type: RuleSet,
    pub(crate) is_update: RuleSet,
    pub(crate) is_dlc: RuleSet,
    pub(crate) language: RuleSet,
    pub(crate) index_selector: Selector,
    pub(crate) content_selectors: Vec<Selector>,
    pub(crate) download_hosts: Vec<String>,
}

impl PatternConfig {
    /// Parse and validate a pattern document.
    pub fn from_json(source: &str) -> Result<Self> {
        let document: PatternDocument = serde_json::from_str(source)
            .map_err(|e| Error::Config(format!("invalid pattern document: {}", e)))?;
        Self::from_document(document)
    }

    /// Read, parse and validate a pattern document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read patterns {}: {}", path.display(), e))
        })?;
        Self::from_json(&source)
    }

    fn from_document(mut document: PatternDocument) -> Result<Self> {
        let mut compile = |kind: SignalKind| -> Result<RuleSet> {
            document
                .rules
                .remove(&kind)
                .unwrap_or_default()
                .iter()
                .map(|raw| Rule::new(&raw.label, &raw.matcher))
                .collect::<Result<Vec<_>>>()
                .map(RuleSet::new)
        };

        let file_type = compile(SignalKind::FileType)?;
        if file_type.is_empty() {
            return Err(Error::Config(
                "the file_type rule set must not be empty".into(),
            ));
        }
        for rule in file_type.rules() {
            FileType::from_str(rule.label()).map_err(|_| {
                Error::Config(format!(
                    "file_type label \"{}\" is not NSP or XCI",
                    rule.label()
                ))
            })?;
        }

        let region = compile(SignalKind::Region)?;
        let revision = compile(SignalKind::Revision)?;
        let is_update = compile(SignalKind::IsUpdate)?;
        let is_dlc = compile(SignalKind::IsDlc)?;
        let language = compile(SignalKind::Language)?;

        let index_selector = parse_selector(
            document
                .index_selector
                .as_deref()
                .unwrap_or(DEFAULT_INDEX_SELECTOR),
        )?;
        let content_selectors = document
            .content_selectors
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            file_type = file_type.len(),
            region = region.len(),
            revision = revision.len(),
            "Compiled pattern rules"
        );

        Ok(Self {
            region,
            revision,
            file_type,
            is_update,
            is_dlc,
            language,
            index_selector,
            content_selectors,
            download_hosts: document
                .download_hosts
                .into_iter()
                .map(|h| h.to_lowercase())
                .collect(),
        })
    }

    /// The rule set for one signal kind.
    pub fn rules(&self, kind: SignalKind) -> &RuleSet {
        match kind {
            SignalKind::Region => &self.region,
            SignalKind::Revision => &self.revision,
            SignalKind::FileType => &self.file_type,
            SignalKind::IsUpdate => &self.is_update,
            SignalKind::IsDlc => &self.is_dlc,
            SignalKind::Language => &self.language,
        }
    }

    pub fn index_selector(&self) -> &Selector {
        &self.index_selector
    }

    pub fn content_selectors(&self) -> &[Selector] {
        &self.content_selectors
    }

    /// Returns `true` if `host` is an accepted download host.
    ///
    /// An empty allow-list accepts every host.
    pub fn accepts_host(&self, host: &str) -> bool {
        if self.download_hosts.is_empty() {
            return true;
        }
        let host = host.to_lowercase();
        self.download_hosts
            .iter()
            .any(|allowed| host == *allowed || host.ends_with(&format!(".{}", allowed)))
    }
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| Error::Config(format!("invalid CSS selector \"{}\": {}", css, e)))
}
