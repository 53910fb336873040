//! Download orchestration.
//!
//! The orchestrator turns a user's selection of titles into jobs on the
//! external download client:
//!
//! - `select` picks the variants of a title that satisfy the preferences
//! - `orchestrator` submits them, polls the jobs and retries failures
//! - `builder` and `config` configure retries, timeouts and callbacks
//! - `outcome` holds the per-title results
//!
//! # Examples
//!
//! ```rust,no_run
//! use nxbrew_dl::cache::DownloadCache;
//! use nxbrew_dl::client::HttpControlClient;
//! use nxbrew_dl::config::Settings;
//! use nxbrew_dl::orchestrator::OrchestratorBuilder;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example(catalog: nxbrew_dl::Catalog) -> Result<(), nxbrew_dl::Error> {
//! let settings = Settings::load(Path::new("settings.json"))?;
//! let client = HttpControlClient::new(&settings.orchestrator.client_url, (&settings.http).into())?;
//! let orchestrator = OrchestratorBuilder::new(Arc::new(client))
//!     .settings(&settings)
//!     .cache_path("cache.json".into())
//!     .build();
//!
//! let mut cache = DownloadCache::load(Path::new("cache.json"))?;
//! let report = orchestrator
//!     .run(["super game"], &catalog, &settings.preferences, &mut cache)
//!     .await?;
//! for (title, outcome) in &report.outcomes {
//!     println!("{}: {}", title, outcome);
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod orchestrator;
pub mod outcome;
pub mod select;

pub use builder::OrchestratorBuilder;
pub use config::{OrchestratorConfig, OutcomeCallback};
pub use orchestrator::Orchestrator;
pub use outcome::{Outcome, Report};
pub use select::{select_variants, Selection};
