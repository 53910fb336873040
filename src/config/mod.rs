//! User settings and download preferences.
//!
//! Settings are a JSON document that the GUI front end edits and writes
//! back; the core only reads it. Validation happens once, when settings
//! reach a core call, and reports [`Error::Config`].
//!
//! ```rust
//! use nxbrew_dl::config::Settings;
//! use nxbrew_dl::FileType;
//!
//! let settings: Settings = serde_json::from_str(r#"{
//!     "site_url": "https://nxbrew.example/index/",
//!     "preferences": {
//!         "preferred_file_type": "XCI",
//!         "include_updates": true,
//!         "target_directory": "/downloads"
//!     }
//! }"#)?;
//! assert_eq!(settings.preferences.preferred_file_type, FileType::Xci);
//! assert!(!settings.preferences.include_dlc);
//! # Ok::<(), serde_json::Error>(())
//! ```

use crate::catalog::FileType;
use crate::error::{Error, Result};
use crate::http::HttpClientConfig;
use crate::persist::write_atomic;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BUILD_CONCURRENCY: usize = 4;
pub const MAX_BUILD_CONCURRENCY: usize = 8;

/// Login for the external download client.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub device: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("device", &self.device)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// What to download and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_file_type")]
    pub preferred_file_type: FileType,
    #[serde(default)]
    pub include_updates: bool,
    #[serde(default)]
    pub include_dlc: bool,
    #[serde(default)]
    pub target_directory: PathBuf,
    #[serde(default)]
    pub client_credentials: Credentials,
}

fn default_file_type() -> FileType {
    FileType::Nsp
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            preferred_file_type: default_file_type(),
            include_updates: false,
            include_dlc: false,
            target_directory: PathBuf::new(),
            client_credentials: Credentials::default(),
        }
    }
}

impl Preferences {
    /// Check the preferences before orchestration starts.
    pub fn validate(&self) -> Result<()> {
        if self.target_directory.as_os_str().is_empty() {
            return Err(Error::Config("no target directory configured".into()));
        }
        Ok(())
    }
}

/// HTTP settings for page fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub retries: u32,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        let defaults = HttpClientConfig::default();
        Self {
            retries: defaults.retries,
            timeout_secs: defaults.timeout.as_secs(),
            connect_timeout_secs: defaults.connect_timeout.as_secs(),
            user_agent: None,
        }
    }
}

impl From<&HttpSettings> for HttpClientConfig {
    fn from(settings: &HttpSettings) -> Self {
        let defaults = HttpClientConfig::default();
        Self {
            retries: settings.retries,
            timeout: Duration::from_secs(settings.timeout_secs),
            connect_timeout: Duration::from_secs(settings.connect_timeout_secs),
            user_agent: settings
                .user_agent
                .clone()
                .unwrap_or(defaults.user_agent),
            ..defaults
        }
    }
}

/// Tunables for the orchestrator's use of the download client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    /// Base URL of the download client's control endpoint.
    pub client_url: String,
    /// Extra attempts per title after the first failure.
    pub retries: u32,
    pub poll_interval_ms: u64,
    /// Bound on each submit or status call.
    pub call_timeout_secs: u64,
    /// Bound on a whole job, if any.
    pub job_timeout_secs: Option<u64>,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            client_url: "http://127.0.0.1:3128".into(),
            retries: 2,
            poll_interval_ms: 2_000,
            call_timeout_secs: 30,
            job_timeout_secs: None,
        }
    }
}

/// Everything the user can configure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// URL of the catalog index page.
    #[serde(default)]
    pub site_url: String,
    #[serde(default)]
    pub preferences: Preferences,
    /// Region preferred when choosing between otherwise equal variants.
    #[serde(default)]
    pub preferred_region: Option<String>,
    /// Discord webhook notified of completed downloads.
    #[serde(default)]
    pub discord_url: Option<String>,
    #[serde(default = "default_build_concurrency")]
    pub build_concurrency: usize,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub orchestrator: OrchestratorSettings,
}

fn default_build_concurrency() -> usize {
    DEFAULT_BUILD_CONCURRENCY
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            site_url: String::new(),
            preferences: Preferences::default(),
            preferred_region: None,
            discord_url: None,
            build_concurrency: DEFAULT_BUILD_CONCURRENCY,
            http: HttpSettings::default(),
            orchestrator: OrchestratorSettings::default(),
        }
    }
}

impl Settings {
    /// Read settings from `path`, or defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                Error::Config(format!("invalid settings {}: {}", path.display(), e))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No settings file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(Error::Config(format!(
                "cannot read settings {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Write settings to `path` through a synced temporary file, creating
    /// missing parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        write_atomic(path, &json).map_err(|e| {
            Error::Config(format!("cannot write settings {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Saved settings");
        Ok(())
    }

    /// Check the parts of the settings needed to build a catalog.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.site_url)
            .map_err(|e| Error::Config(format!("invalid site URL \"{}\": {}", self.site_url, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::Config(format!(
                "site URL \"{}\" is not http(s)",
                self.site_url
            )));
        }
        self.check_timeouts()
    }

    /// Check the parts of the settings needed to run downloads.
    pub fn validate_orchestration(&self) -> Result<()> {
        self.preferences.validate()?;
        self.check_timeouts()?;
        if self.orchestrator.poll_interval_ms == 0 {
            return Err(Error::Config("poll interval must be greater than zero".into()));
        }
        if self.orchestrator.job_timeout_secs == Some(0) {
            return Err(Error::Config("job timeout must be greater than zero".into()));
        }
        Ok(())
    }

    fn check_timeouts(&self) -> Result<()> {
        if self.http.timeout_secs == 0 || self.orchestrator.call_timeout_secs == 0 {
            return Err(Error::Config("timeouts must be greater than zero".into()));
        }
        Ok(())
    }

    /// Catalog build concurrency, clamped to `1..=8`.
    pub fn build_concurrency(&self) -> usize {
        self.build_concurrency.clamp(1, MAX_BUILD_CONCURRENCY)
    }
}
