//! Choosing which variants of a title to download.

use crate::catalog::{CatalogEntry, DownloadVariant, FileType, VariantKind};
use crate::config::Preferences;

/// The variants chosen for one title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Base game first, then the update, then DLCs.
    pub variants: Vec<DownloadVariant>,
    /// Combined key of every chosen variant, as stored in the cache.
    pub key: String,
}

impl Selection {
    pub fn links(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|v| v.link.as_str())
    }
}

/// Variants of `kind` in the preferred file type, or in the other file type
/// when the preferred one has none.
fn candidates(
    entry: &CatalogEntry,
    kind: VariantKind,
    preferred: FileType,
) -> Vec<&DownloadVariant> {
    let of_kind = |file_type: FileType| -> Vec<&DownloadVariant> {
        entry
            .variants
            .iter()
            .filter(|v| v.kind() == kind && v.file_type == file_type)
            .collect()
    };
    let preferred_variants = of_kind(preferred);
    if preferred_variants.is_empty() {
        of_kind(preferred.other())
    } else {
        preferred_variants
    }
}

/// Highest revision wins; among equal revisions a variant in
/// `preferred_region` wins; remaining ties go to the earliest variant.
pub fn best<'a>(
    variants: &[&'a DownloadVariant],
    preferred_region: Option<&str>,
) -> Option<&'a DownloadVariant> {
    let rank = |v: &DownloadVariant| {
        let in_region = preferred_region.is_some_and(|preferred| {
            v.region
                .as_deref()
                .is_some_and(|r| r.eq_ignore_ascii_case(preferred))
        });
        (v.revision_number(), in_region)
    };

    let mut best: Option<(&DownloadVariant, _)> = None;
    for &variant in variants {
        let variant_rank = rank(variant);
        let better = match &best {
            Some((_, best_rank)) => variant_rank > *best_rank,
            None => true,
        };
        if better {
            best = Some((variant, variant_rank));
        }
    }
    best.map(|(v, _)| v)
}

/// Pick the variants of `entry` to download under `preferences`.
///
/// The preferred file type is used when the title offers it, otherwise the
/// other one; this is decided separately for the base game, updates and
/// DLC. Returns `None` when the title has no base game variant at all.
pub fn select_variants(
    entry: &CatalogEntry,
    preferences: &Preferences,
    preferred_region: Option<&str>,
) -> Option<Selection> {
    let preferred = preferences.preferred_file_type;

    let base = best(&candidates(entry, VariantKind::Base, preferred), preferred_region)?;
    let mut variants = vec![base.clone()];

    if preferences.include_updates {
        if let Some(update) = best(
            &candidates(entry, VariantKind::Update, preferred),
            preferred_region,
        ) {
            variants.push(update.clone());
        }
    }
    if preferences.include_dlc {
        variants.extend(
            candidates(entry, VariantKind::Dlc, preferred)
                .into_iter()
                .cloned(),
        );
    }

    let key = variants
        .iter()
        .map(DownloadVariant::key)
        .collect::<Vec<_>>()
        .join("+");
    Some(Selection { variants, key })
}
