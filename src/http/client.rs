//! HTTP client setup and middleware configuration.
//!
//! Every request made by the crate goes through one client built here:
//!
//! - **Tracing**: requests and responses are recorded as `tracing` spans.
//! - **Retry**: transient failures (timeouts, connection errors, 5xx, 408,
//!   429) are retried with exponential backoff; other 4xx are not. With
//!   `retries: 0` the retry middleware is left out entirely, which is what
//!   callers sending non-idempotent requests use.
//! - **Timeouts**: every request carries a total and a connect timeout.
//!
//! # Examples
//!
//! ```rust
//! use nxbrew_dl::http::{create_http_client, HttpClientConfig};
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpClientConfig {
//!     retries: 5,
//!     timeout: Duration::from_secs(20),
//!     ..HttpClientConfig::default()
//! };
//! let client = create_http_client(config)?;
//! # Ok(())
//! # }
//! ```

use reqwest::{header::HeaderMap, Proxy};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use reqwest_tracing::TracingMiddleware;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!("nxbrew-dl/", env!("CARGO_PKG_VERSION"));

/// Configuration for HTTP client setup.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Number of retries for transient failures. Zero disables retrying.
    pub retries: u32,
    /// Total time allowed for one request attempt.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    pub proxy: Option<Proxy>,
    /// Default headers to include with all requests.
    pub headers: Option<HeaderMap>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
            headers: None,
        }
    }
}

/// Creates the shared HTTP client with tracing and retry middleware.
pub fn create_http_client(
    config: HttpClientConfig,
) -> Result<ClientWithMiddleware, reqwest::Error> {
    let retries = config.retries;

    let mut inner_client_builder = reqwest::Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .user_agent(config.user_agent);

    if let Some(proxy) = config.proxy {
        inner_client_builder = inner_client_builder.proxy(proxy);
    }
    if let Some(headers) = config.headers {
        inner_client_builder = inner_client_builder.default_headers(headers);
    }

    let inner_client = inner_client_builder.build()?;

    let mut client_builder = ClientBuilder::new(inner_client).with(TracingMiddleware::default());
    if retries > 0 {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(retries);
        client_builder =
            client_builder.with(RetryTransientMiddleware::new_with_policy(retry_policy));
    }

    Ok(client_builder.build())
}
