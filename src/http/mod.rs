//! HTTP plumbing: the shared middleware client and the page fetcher.
//!
//! - [`client`] builds the `reqwest` client with tracing, retry and timeouts.
//! - [`fetcher`] defines [`PageSource`] and its HTTP implementation,
//!   [`HttpFetcher`], used by the catalog builder.

pub mod client;
pub mod fetcher;

pub use client::{create_http_client, HttpClientConfig};
pub use fetcher::{status_error, HttpFetcher, PageSource};
