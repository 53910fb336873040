//! Catalog data types.

use crate::cache::DownloadCache;
use crate::error::Error;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)|\[[^\]]*\]").unwrap());
static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{Alphabetic}\p{N}]+").unwrap());
static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Switch package formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FileType {
    #[serde(rename = "NSP")]
    Nsp,
    #[serde(rename = "XCI")]
    Xci,
}

impl FileType {
    /// The other format, used when the preferred one is unavailable.
    pub fn other(self) -> Self {
        match self {
            FileType::Nsp => FileType::Xci,
            FileType::Xci => FileType::Nsp,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::Nsp => f.write_str("NSP"),
            FileType::Xci => f.write_str("XCI"),
        }
    }
}

impl FromStr for FileType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NSP" => Ok(FileType::Nsp),
            "XCI" => Ok(FileType::Xci),
            other => Err(Error::Parse(format!("unknown file type \"{}\"", other))),
        }
    }
}

/// A title listed on the index page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleStub {
    pub name: String,
    /// Absolute URL of the title's detail page.
    pub detail_url: String,
}

/// Whether a variant is the base game, an update or a DLC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantKind {
    Base,
    Update,
    Dlc,
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariantKind::Base => f.write_str("base"),
            VariantKind::Update => f.write_str("update"),
            VariantKind::Dlc => f.write_str("dlc"),
        }
    }
}

/// One concrete downloadable artifact of a title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadVariant {
    pub title_name: String,
    pub region: Option<String>,
    pub revision: Option<String>,
    pub file_type: FileType,
    pub is_update: bool,
    pub is_dlc: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,
    pub size_bytes: Option<u64>,
    pub link: String,
}

impl DownloadVariant {
    pub fn kind(&self) -> VariantKind {
        if self.is_update {
            VariantKind::Update
        } else if self.is_dlc {
            VariantKind::Dlc
        } else {
            VariantKind::Base
        }
    }

    /// Stable identity of this variant, as stored in the download cache.
    pub fn key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.file_type,
            self.kind(),
            self.region.as_deref().unwrap_or("-"),
            self.revision.as_deref().unwrap_or("-"),
            self.link
        )
    }

    /// Numeric components of the revision, for ordering.
    ///
    /// `"Rev 2"` yields `[2]`, `"v1.0.10"` yields `[1, 0, 10]`, and a missing
    /// revision yields `[]`, which sorts below everything else.
    pub fn revision_number(&self) -> Vec<u64> {
        self.revision
            .as_deref()
            .map(|rev| {
                DIGITS
                    .find_iter(rev)
                    .filter_map(|m| m.as_str().parse::<u64>().ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A title in the catalog with all of its variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stable identity key, see [`short_name`].
    pub short_name: String,
    pub display_name: String,
    pub url: String,
    pub variants: Vec<DownloadVariant>,
}

impl CatalogEntry {
    /// Entries without any variant are listed but never orchestrated.
    pub fn is_eligible(&self) -> bool {
        !self.variants.is_empty()
    }
}

/// Strip bracketed tags such as `(Europe)` or `[Rev 1]` from a title.
///
/// A name made only of tags is returned with its whitespace collapsed.
pub fn strip_tags(name: &str) -> String {
    let stripped = collapse(&BRACKETED.replace_all(name, " "));
    if stripped.is_empty() {
        collapse(name)
    } else {
        stripped
    }
}

/// Derive the stable identity key of a title.
///
/// Bracketed tags are dropped, then the name is lowercased, every run of
/// characters that are neither letters nor digits (in any script) becomes a
/// single space, and the result is trimmed. `"Super Game (Europe)"` and
/// `"Super  Game: (USA) (Rev 1)"` both become `"super game"`.
///
/// A name with nothing left after that, such as `"[NSP]"` or `"!!!"`, keys
/// on its lowercased text with whitespace collapsed, so every listed title
/// keeps an identity.
pub fn short_name(name: &str) -> String {
    let stripped = BRACKETED.replace_all(name, " ").to_lowercase();
    let normalized = collapse(&NON_ALPHANUMERIC.replace_all(&stripped, " "));
    if normalized.is_empty() {
        collapse(&name.to_lowercase())
    } else {
        normalized
    }
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The full set of titles from one catalog build, keyed by short name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_entries(entries: BTreeMap<String, CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn get(&self, short_name: &str) -> Option<&CatalogEntry> {
        self.entries.get(short_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    pub fn short_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries whose display name contains `text`, ignoring case.
    pub fn search(&self, text: &str) -> Vec<&CatalogEntry> {
        let needle = text.to_lowercase();
        self.entries
            .values()
            .filter(|e| e.display_name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Entries that already have a download cache record.
    pub fn entries_in_cache<'a>(&'a self, cache: &DownloadCache) -> Vec<&'a CatalogEntry> {
        self.entries
            .values()
            .filter(|e| cache.get(&e.short_name).is_some())
            .collect()
    }

    pub fn into_inner(self) -> BTreeMap<String, CatalogEntry> {
        self.entries
    }
}

impl FromIterator<CatalogEntry> for Catalog {
    fn from_iter<T: IntoIterator<Item = CatalogEntry>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|e| (e.short_name.clone(), e))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(revision: Option<&str>) -> DownloadVariant {
        DownloadVariant {
            title_name: "Super Game".into(),
            region: None,
            revision: revision.map(String::from),
            file_type: FileType::Nsp,
            is_update: false,
            is_dlc: false,
            languages: vec![],
            size_bytes: None,
            link: "https://host.example/a".into(),
        }
    }

    #[test]
    fn test_short_name_strips_tags_and_punctuation() {
        assert_eq!(short_name("Super Game (Europe)"), "super game");
        assert_eq!(short_name("Super  Game: (USA) (Rev 1)"), "super game");
        assert_eq!(short_name("Pokémon™ Legends – Arceus!"), "pokémon legends arceus");
        assert_eq!(short_name("  [NSP] Zelda  "), "zelda");
    }

    #[test]
    fn test_short_name_keeps_non_latin_letters() {
        assert_eq!(short_name("ゼルダの伝説 (Japan)"), "ゼルダの伝説");
        assert_eq!(short_name("Ōkami HD"), "ōkami hd");
        assert_ne!(short_name("Café Story"), short_name("Caf Story"));
    }

    #[test]
    fn test_short_name_never_empty_for_listed_names() {
        assert_eq!(short_name("!!!"), "!!!");
        assert_eq!(short_name("  [NSP]  "), "[nsp]");
        assert_eq!(strip_tags("[NSP]"), "[NSP]");
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("Super Game (USA) (Rev 1)"), "Super Game");
    }

    #[test]
    fn test_file_type_parsing() {
        assert_eq!("nsp".parse::<FileType>().unwrap(), FileType::Nsp);
        assert_eq!(" XCI ".parse::<FileType>().unwrap(), FileType::Xci);
        assert!("iso".parse::<FileType>().is_err());
        assert_eq!(FileType::Nsp.other(), FileType::Xci);
    }

    #[test]
    fn test_revision_number() {
        assert_eq!(variant(Some("Rev 2")).revision_number(), vec![2]);
        assert_eq!(variant(Some("v1.0.10")).revision_number(), vec![1, 0, 10]);
        assert!(variant(None).revision_number().is_empty());
        assert!(variant(Some("v1.0.10")).revision_number() > variant(Some("v1.0.9")).revision_number());
    }

    #[test]
    fn test_variant_key_changes_with_revision() {
        assert_ne!(variant(Some("Rev 1")).key(), variant(Some("Rev 2")).key());
        assert_eq!(variant(None).key(), "NSP|base|-|-|https://host.example/a");
    }

    #[test]
    fn test_kind() {
        let mut v = variant(None);
        assert_eq!(v.kind(), VariantKind::Base);
        v.is_dlc = true;
        assert_eq!(v.kind(), VariantKind::Dlc);
        v.is_update = true;
        assert_eq!(v.kind(), VariantKind::Update);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let catalog: Catalog = vec![
            CatalogEntry {
                short_name: "super game".into(),
                display_name: "Super Game".into(),
                url: "https://site.example/super-game".into(),
                variants: vec![],
            },
            CatalogEntry {
                short_name: "other".into(),
                display_name: "Other".into(),
                url: "https://site.example/other".into(),
                variants: vec![],
            },
        ]
        .into_iter()
        .collect();

        let found = catalog.search("SUPER");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].short_name, "super game");
        assert_eq!(catalog.search("").len(), 2);
    }
}
