//! The external download client.
//!
//! The crate never transfers game files itself. It hands links to a download
//! client over that client's control protocol and waits for the job to
//! settle. [`DownloadClient`] is the seam; [`HttpControlClient`] speaks a
//! JSON-over-HTTP control protocol.

pub mod http;

pub use self::http::HttpControlClient;

use crate::config::Credentials;
use crate::error::Result;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Identifier of a job as assigned by the download client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// State of a submitted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Done,
    Error(String),
}

impl JobState {
    /// `Done` and `Error` are terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Error(_))
    }
}

/// A download client reachable over its own control protocol.
#[async_trait]
pub trait DownloadClient: Send + Sync {
    /// Queue `link` for download into `target_directory`.
    async fn submit(
        &self,
        link: &str,
        target_directory: &Path,
        credentials: &Credentials,
    ) -> Result<JobId>;

    /// Current state of a previously submitted job.
    async fn status(&self, job_id: &JobId) -> Result<JobState>;
}
