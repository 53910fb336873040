//! Persistent record of titles already downloaded.
//!
//! The cache maps a title's short name to the key of the variant selection
//! that was last downloaded for it. A title counts as satisfied only while
//! the selection the orchestrator would make today has exactly that key, so
//! a newly published update makes the title eligible again.
//!
//! On disk the cache is a JSON object:
//!
//! ```json
//! {
//!   "super game": {
//!     "downloaded": true,
//!     "last_variant_key": "NSP|base|USA|Rev 1|https://host.example/a",
//!     "timestamp": "2026-10-16T12:00:00Z"
//!   }
//! }
//! ```

use crate::error::{Error, Result};
use crate::persist::{sibling_path, write_atomic};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

/// What is known about one downloaded title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub downloaded: bool,
    pub last_variant_key: String,
    pub timestamp: DateTime<Utc>,
}

/// In-memory view of the download cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DownloadCache {
    records: BTreeMap<String, CacheRecord>,
}

impl DownloadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the cache at `path`. A missing file is an empty cache.
    pub fn load(path: &Path) -> Result<Self> {
        match read(path)? {
            Some(contents) => serde_json::from_str(&contents)
                .map_err(|e| Error::Cache(format!("malformed {}: {}", path.display(), e))),
            None => Ok(Self::new()),
        }
    }

    /// Like [`load`](Self::load), but a malformed file is renamed aside
    /// and an empty cache is returned with a warning naming where the old
    /// file went.
    ///
    /// A file that cannot be read or moved is still an error, since saving
    /// an empty cache over it would lose its records.
    pub fn load_or_recover(path: &Path) -> Result<(Self, Option<String>)> {
        let Some(contents) = read(path)? else {
            return Ok((Self::new(), None));
        };
        match serde_json::from_str(&contents) {
            Ok(cache) => Ok((cache, None)),
            Err(e) => {
                let stamp = Utc::now().format("%Y%m%dT%H%M%SZ");
                let aside = sibling_path(path, &format!("corrupt-{}", stamp));
                fs::rename(path, &aside).map_err(|re| {
                    Error::Cache(format!(
                        "malformed {} ({}) could not be moved aside: {}",
                        path.display(),
                        e,
                        re
                    ))
                })?;
                let warning = format!(
                    "malformed download cache {} ({}), moved to {}",
                    path.display(),
                    e,
                    aside.display()
                );
                warn!("{}", warning);
                Ok((Self::new(), Some(warning)))
            }
        }
    }

    /// Write the cache to `path`.
    ///
    /// The data goes to a sibling temporary file that is then renamed over
    /// `path`, so a failed save leaves the previous cache intact.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        write_atomic(path, &json)
            .map_err(|e| Error::Cache(format!("cannot write {}: {}", path.display(), e)))?;
        debug!(path = %path.display(), records = self.records.len(), "Saved download cache");
        Ok(())
    }

    /// `true` only if `short_name` was downloaded with exactly
    /// `chosen_variant_key`.
    pub fn is_satisfied(&self, short_name: &str, chosen_variant_key: &str) -> bool {
        self.records
            .get(short_name)
            .is_some_and(|r| r.downloaded && r.last_variant_key == chosen_variant_key)
    }

    /// Record a successful download, creating or updating the record.
    pub fn record(&mut self, short_name: &str, variant_key: &str) {
        self.records.insert(
            short_name.to_string(),
            CacheRecord {
                downloaded: true,
                last_variant_key: variant_key.to_string(),
                timestamp: Utc::now(),
            },
        );
    }

    pub fn get(&self, short_name: &str) -> Option<&CacheRecord> {
        self.records.get(short_name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CacheRecord)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn read(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No download cache yet");
            Ok(None)
        }
        Err(e) => Err(Error::Cache(format!(
            "cannot read {}: {}",
            path.display(),
            e
        ))),
    }
}
