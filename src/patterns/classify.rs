//! Classification of link-surrounding text against the pattern rules.

use super::rules::PatternConfig;
use crate::catalog::FileType;

use std::str::FromStr;

/// Signals extracted from one piece of text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signals {
    pub file_type: Option<FileType>,
    pub region: Option<String>,
    pub revision: Option<String>,
    pub is_update: bool,
    pub is_dlc: bool,
    pub languages: Vec<String>,
}

impl PatternConfig {
    /// Classify `text`.
    ///
    /// Rule sets are evaluated in the fixed order file type, region,
    /// revision, update, DLC. Text matching both the update and the DLC rules
    /// is an update.
    pub fn classify(&self, text: &str) -> Signals {
        let file_type = self
            .file_type
            .first_match(text)
            .and_then(|rule| FileType::from_str(rule.label()).ok());
        let region = self.region.first_match(text).map(|r| r.label().to_string());
        let revision = self
            .revision
            .first_matched_text(text)
            .map(|m| m.trim().to_string());
        let is_update = self.is_update.is_match(text);
        let is_dlc = !is_update && self.is_dlc.is_match(text);

        Signals {
            file_type,
            region,
            revision,
            is_update,
            is_dlc,
            languages: self.language.matching_labels(text),
        }
    }
}
