//! nxbrew-dl mirrors the catalog of an NXBrew-style game listing site and
//! drives an external download client to fetch a selection of its titles
//! exactly once.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use nxbrew_dl::{blocking, config::Settings, patterns::PatternConfig, Error};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Error> {
//! nxbrew_dl::logging::init("info");
//! let settings = Settings::load(Path::new("settings.json"))?;
//! let patterns = Arc::new(PatternConfig::bundled()?);
//!
//! let catalog = blocking::build_catalog(&settings, patterns)?;
//! let selected: Vec<&str> = catalog
//!     .search("zelda")
//!     .into_iter()
//!     .map(|entry| entry.short_name.as_str())
//!     .collect();
//!
//! let report = blocking::run_orchestration(
//!     &settings,
//!     &catalog,
//!     selected,
//!     Path::new("cache.json"),
//!     None,
//! )?;
//! println!("{} downloaded, {} failed", report.downloaded(), report.failed());
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`patterns`] - Pattern rules that classify titles and download links
//! - [`http`] - The shared HTTP client and the page fetcher
//! - [`catalog`] - Index and detail page parsing, and the [`Catalog`] itself
//! - [`cache`] - The persistent record of downloaded titles
//! - [`client`] - The external download client and its control protocol
//! - [`orchestrator`] - Variant selection and download orchestration
//! - [`config`] - User settings and preferences
//! - [`notify`] - Discord notifications for completed downloads
//! - [`blocking`] - Synchronous wrappers around the async core
//! - [`progress`] - Progress bar styling and display management
//! - [`logging`] - Tracing subscriber setup
//! - [`error`] - Centralized error handling with the `Error` enum

pub mod blocking;
pub mod cache;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod notify;
pub mod orchestrator;
pub mod patterns;
mod persist;
pub mod progress;

pub use cache::{CacheRecord, DownloadCache};
pub use catalog::{Catalog, CatalogBuilder, CatalogEntry, DownloadVariant, FileType, TitleStub};
pub use client::{DownloadClient, HttpControlClient, JobId, JobState};
pub use config::{Credentials, Preferences, Settings};
pub use error::{Error, NetworkErrorKind, Result};
pub use http::{create_http_client, HttpClientConfig, HttpFetcher, PageSource};
pub use orchestrator::{Orchestrator, OrchestratorBuilder, Outcome, Report};
pub use patterns::PatternConfig;
pub use progress::{ProgressBarOpts, StyleOptions};
