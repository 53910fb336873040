#![allow(dead_code)]

use async_trait::async_trait;
use nxbrew_dl::catalog::{Catalog, CatalogBuilder};
use nxbrew_dl::client::{DownloadClient, JobId, JobState};
use nxbrew_dl::config::{Credentials, Preferences};
use nxbrew_dl::orchestrator::OrchestratorBuilder;
use nxbrew_dl::patterns::PatternConfig;
use nxbrew_dl::{Error, FileType, PageSource, Result};

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

// Common test constants
pub const INDEX_URL: &str = "https://site.example/index/";
pub const SUPER_GAME_EU_LINK: &str = "https://dl.example/super-game-eu";
pub const SUPER_GAME_US_LINK: &str = "https://dl.example/super-game-us";
pub const SUPER_GAME_UPDATE_LINK: &str = "https://dl.example/super-game-update";
pub const OTHER_GAME_LINK: &str = "https://dl.example/other-game-xci";
pub const THIRD_GAME_LINK: &str = "https://dl.example/third-game";
pub const THIRD_GAME_BUNDLE_LINK: &str = "https://dl.example/third-game-bundle";

/// Creates a temporary directory for testing purposes
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// An index page listing `titles` as `(name, relative href)`.
pub fn index_page(titles: &[(&str, &str)]) -> String {
    let items: String = titles
        .iter()
        .map(|(name, href)| format!("<li><a href=\"{}\">{}</a></li>\n", href, name))
        .collect();
    format!(
        "<html><body><nav><a href=\"/about/\">About</a></nav>\
         <div class=\"entry-content\"><ul>\n{}</ul></div></body></html>",
        items
    )
}

/// A detail page with one labelled paragraph per `(label, link)`.
pub fn detail_page(sections: &[(&str, &str)]) -> String {
    let body: String = sections
        .iter()
        .map(|(label, link)| {
            format!(
                "<p>{}</p>\n<p><a href=\"{}\">Download</a></p>\n",
                label, link
            )
        })
        .collect();
    format!(
        "<html><body><header><a href=\"/\">Home</a></header>\
         <div class=\"entry-content\">\n{}</div></body></html>",
        body
    )
}

/// In-memory site served through [`PageSource`].
#[derive(Default)]
pub struct FakeSite {
    pages: HashMap<String, String>,
    failing: HashSet<String>,
    fetches: AtomicUsize,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    /// Fetching `url` fails with a transient network error.
    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSource for FakeSite {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(url) {
            return Err(Error::transient(format!("{}: connection reset", url)));
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| Error::permanent(format!("{}: HTTP 404 Not Found", url)))
    }
}

/// The site used by most integration tests.
///
/// - "Super Game" is listed twice (Europe, and USA Rev 1), the USA page also
///   offers an update.
/// - "Other Game" only comes as XCI.
/// - "Broken Game" cannot be fetched.
/// - "Third Game" has a base game and an update bundle mentioning DLC.
pub fn fixture_site() -> FakeSite {
    FakeSite::new()
        .page(
            INDEX_URL,
            index_page(&[
                ("Super Game (Europe)", "/super-game-europe/"),
                ("Super Game (USA) (Rev 1)", "/super-game-usa/"),
                ("Other Game", "/other-game/"),
                ("Broken Game", "/broken-game/"),
                ("Third Game", "/third-game/"),
            ]),
        )
        .page(
            "https://site.example/super-game-europe/",
            detail_page(&[("Base Game NSP (4.5 GB)", SUPER_GAME_EU_LINK)]),
        )
        .page(
            "https://site.example/super-game-usa/",
            detail_page(&[
                ("Base Game NSP", SUPER_GAME_US_LINK),
                ("Update v1.0.2 NSP", SUPER_GAME_UPDATE_LINK),
            ]),
        )
        .page(
            "https://site.example/other-game/",
            detail_page(&[("Base Game XCI", OTHER_GAME_LINK)]),
        )
        .failing("https://site.example/broken-game/")
        .page(
            "https://site.example/third-game/",
            detail_page(&[
                ("Base Game NSP", THIRD_GAME_LINK),
                ("Update + DLC bundle NSP", THIRD_GAME_BUNDLE_LINK),
            ]),
        )
}

pub fn bundled_patterns() -> Arc<PatternConfig> {
    Arc::new(PatternConfig::bundled().expect("Bundled patterns must load"))
}

/// Builds the catalog of [`fixture_site`].
pub async fn fixture_catalog() -> Catalog {
    CatalogBuilder::new(bundled_patterns())
        .hidden()
        .build(&fixture_site(), INDEX_URL)
        .await
        .expect("Failed to build fixture catalog")
}

pub fn preferences(file_type: FileType, dir: &Path) -> Preferences {
    Preferences {
        preferred_file_type: file_type,
        target_directory: dir.to_path_buf(),
        ..Preferences::default()
    }
}

/// Download client that completes every job unless told otherwise.
#[derive(Default)]
pub struct FakeClient {
    /// Jobs for these links always end in an error.
    broken_links: HashSet<String>,
    /// Submissions of these links are rejected this many times first.
    flaky_links: Mutex<HashMap<String, usize>>,
    submissions: Mutex<Vec<String>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn broken(mut self, link: &str) -> Self {
        self.broken_links.insert(link.to_string());
        self
    }

    pub fn flaky(self, link: &str, failures: usize) -> Self {
        self.flaky_links
            .lock()
            .unwrap()
            .insert(link.to_string(), failures);
        self
    }

    /// Every link submitted so far, in order.
    pub fn submissions(&self) -> Vec<String> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn submission_count(&self, link: &str) -> usize {
        self.submissions().iter().filter(|l| *l == link).count()
    }
}

#[async_trait]
impl DownloadClient for FakeClient {
    async fn submit(
        &self,
        link: &str,
        _target_directory: &Path,
        _credentials: &Credentials,
    ) -> Result<JobId> {
        self.submissions.lock().unwrap().push(link.to_string());
        if let Some(remaining) = self.flaky_links.lock().unwrap().get_mut(link) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::Client("client busy".into()));
            }
        }
        Ok(JobId(link.to_string()))
    }

    async fn status(&self, job_id: &JobId) -> Result<JobState> {
        if self.broken_links.contains(&job_id.0) {
            Ok(JobState::Error("link offline".into()))
        } else {
            Ok(JobState::Done)
        }
    }
}

/// Orchestrator builder with tiny delays and no progress bars.
pub fn fast_orchestrator(client: Arc<FakeClient>) -> OrchestratorBuilder {
    OrchestratorBuilder::new(client)
        .hidden()
        .retries(2)
        .backoff(Duration::from_millis(1), Duration::from_millis(5))
        .poll_interval(Duration::from_millis(1))
        .call_timeout(Duration::from_secs(5))
}
