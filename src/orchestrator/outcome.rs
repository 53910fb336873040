//! Per-title results of an orchestration run.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// What happened to one selected title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "lowercase")]
pub enum Outcome {
    /// Every chosen variant was fetched by the download client.
    Downloaded,
    /// Nothing was submitted, for the given reason.
    Skipped(String),
    /// The download client failed, or the title was interrupted.
    Failed(String),
}

impl Outcome {
    pub fn skipped(reason: impl fmt::Display) -> Self {
        Outcome::Skipped(reason.to_string())
    }

    pub fn failed(reason: impl fmt::Display) -> Self {
        Outcome::Failed(reason.to_string())
    }

    pub fn is_downloaded(&self) -> bool {
        matches!(self, Outcome::Downloaded)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Downloaded => f.write_str("downloaded"),
            Outcome::Skipped(reason) => write!(f, "skipped: {}", reason),
            Outcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Result of one orchestration run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Outcome per selected short name.
    pub outcomes: BTreeMap<String, Outcome>,
    /// Problems that did not change any outcome, e.g. a failed cache save.
    pub warnings: Vec<String>,
}

impl Report {
    pub fn get(&self, short_name: &str) -> Option<&Outcome> {
        self.outcomes.get(short_name)
    }

    pub fn downloaded(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_downloaded()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_failed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.downloaded() - self.failed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display() {
        assert_eq!(Outcome::Downloaded.to_string(), "downloaded");
        assert_eq!(
            Outcome::skipped("already downloaded").to_string(),
            "skipped: already downloaded"
        );
        assert_eq!(Outcome::failed("cancelled").to_string(), "failed: cancelled");
    }

    #[test]
    fn test_report_counts() {
        let mut report = Report::default();
        report.outcomes.insert("a".into(), Outcome::Downloaded);
        report.outcomes.insert("b".into(), Outcome::failed("boom"));
        report.outcomes.insert("c".into(), Outcome::skipped("already downloaded"));
        report.outcomes.insert("d".into(), Outcome::Downloaded);
        assert_eq!(report.downloaded(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.skipped(), 1);
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(Outcome::failed("cancelled")).unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["reason"], "cancelled");
    }
}
