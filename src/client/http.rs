//! JSON-over-HTTP control protocol.
//!
//! - `POST {base}/jobs` with `{"link", "target_directory", "device"}` and
//!   basic auth answers `{"job_id": "..."}`.
//! - `GET {base}/jobs/{job_id}` answers
//!   `{"state": "pending|running|done|error", "message": "..."}`.

use super::{DownloadClient, JobId, JobState};
use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::http::{create_http_client, status_error, HttpClientConfig};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, instrument};

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    link: &'a str,
    target_directory: &'a Path,
    device: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    job_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum WireState {
    Pending,
    Running,
    Done,
    Error,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    state: WireState,
    #[serde(default)]
    message: Option<String>,
}

impl From<StatusResponse> for JobState {
    fn from(res: StatusResponse) -> Self {
        match res.state {
            WireState::Pending => JobState::Pending,
            WireState::Running => JobState::Running,
            WireState::Done => JobState::Done,
            WireState::Error => {
                JobState::Error(res.message.unwrap_or_else(|| "unknown error".into()))
            }
        }
    }
}

/// [`DownloadClient`] over the JSON control protocol.
///
/// Status polls go through the retrying middleware. Submissions do not:
/// a submit that timed out may still have queued the job, and the
/// orchestrator decides whether to send it again.
#[derive(Debug, Clone)]
pub struct HttpControlClient {
    base: Url,
    client: ClientWithMiddleware,
    submit_client: ClientWithMiddleware,
}

impl HttpControlClient {
    pub fn new(base_url: &str, config: HttpClientConfig) -> Result<Self> {
        let mut base = Url::parse(base_url).map_err(|e| {
            Error::Config(format!("invalid download client URL \"{}\": {}", base_url, e))
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let submit_client = create_http_client(HttpClientConfig {
            retries: 0,
            ..config.clone()
        })?;
        Ok(Self {
            base,
            client: create_http_client(config)?,
            submit_client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| Error::permanent(format!("invalid endpoint {}: {}", path, e)))
    }

    async fn decode<T: for<'de> Deserialize<'de>>(res: reqwest::Response) -> Result<T> {
        let url = res.url().to_string();
        let status = res.status();
        if !status.is_success() {
            return Err(status_error(&url, status));
        }
        let body = res.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| Error::Client(format!("unexpected reply from {}: {}", url, e)))
    }
}

#[async_trait]
impl DownloadClient for HttpControlClient {
    #[instrument(skip(self, credentials))]
    async fn submit(
        &self,
        link: &str,
        target_directory: &Path,
        credentials: &Credentials,
    ) -> Result<JobId> {
        let body = serde_json::to_vec(&SubmitRequest {
            link,
            target_directory,
            device: &credentials.device,
        })?;
        let mut req = self
            .submit_client
            .post(self.endpoint("jobs")?)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if !credentials.user.is_empty() {
            req = req.basic_auth(&credentials.user, Some(&credentials.password));
        }

        let res = req.send().await?;
        let reply: SubmitResponse = Self::decode(res).await?;
        debug!(job_id = %reply.job_id, "Job submitted");
        Ok(JobId(reply.job_id))
    }

    async fn status(&self, job_id: &JobId) -> Result<JobState> {
        let res = self
            .client
            .get(self.endpoint(&format!("jobs/{}", job_id))?)
            .send()
            .await?;
        let reply: StatusResponse = Self::decode(res).await?;
        Ok(reply.into())
    }
}
