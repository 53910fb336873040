//! Retrieval of raw page HTML.

use super::client::{create_http_client, HttpClientConfig};
use crate::error::{Error, Result};

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use reqwest_middleware::ClientWithMiddleware;
use tracing::{debug, instrument};

/// Something that can return the HTML behind a URL.
///
/// Implementations report failures as [`Error::Network`] with the right
/// [`NetworkErrorKind`](crate::error::NetworkErrorKind); they do not cache
/// page content between calls.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Map an unsuccessful HTTP status onto the error taxonomy.
pub fn status_error(url: &str, status: StatusCode) -> Error {
    let message = format!("GET {} returned {}", url, status);
    if status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
    {
        Error::transient(message)
    } else {
        Error::permanent(message)
    }
}

/// [`PageSource`] over HTTP(S).
///
/// Transient failures are retried inside the client middleware before the
/// error reaches the caller.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: ClientWithMiddleware,
}

impl HttpFetcher {
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let client = create_http_client(config)?;
        Ok(Self { client })
    }

    pub fn with_client(client: ClientWithMiddleware) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url)
            .map_err(|e| Error::permanent(format!("invalid URL \"{}\": {}", url, e)))?;

        debug!("Fetching page");
        let res = self.client.get(parsed).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(status_error(url, status));
        }
        Ok(res.text().await?)
    }
}
