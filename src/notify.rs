//! Discord webhook notifications for completed downloads.

use crate::error::{Error, Result};
use crate::http::{create_http_client, status_error, HttpClientConfig};

use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use reqwest_middleware::ClientWithMiddleware;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    username: &'a str,
    content: String,
}

/// Posts a message to a Discord webhook for every downloaded title.
///
/// Webhook posts are never retried, so a slow reply cannot turn into a
/// duplicate message.
#[derive(Debug, Clone)]
pub struct DiscordNotifier {
    url: Url,
    client: ClientWithMiddleware,
}

impl DiscordNotifier {
    pub fn new(webhook_url: &str, config: HttpClientConfig) -> Result<Self> {
        let url = Url::parse(webhook_url).map_err(|e| {
            Error::Config(format!("invalid webhook URL \"{}\": {}", webhook_url, e))
        })?;
        Ok(Self {
            url,
            client: create_http_client(HttpClientConfig {
                retries: 0,
                ..config
            })?,
        })
    }

    /// Announce that `display_name` was downloaded with `files` files.
    pub async fn notify_downloaded(&self, display_name: &str, files: usize) -> Result<()> {
        let body = serde_json::to_vec(&message(display_name, files))?;
        let res = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(status_error(self.url.as_str(), res.status()));
        }
        debug!(title = %display_name, "Sent download notification");
        Ok(())
    }
}

fn message(display_name: &str, files: usize) -> WebhookMessage<'static> {
    let noun = if files == 1 { "file" } else { "files" };
    WebhookMessage {
        username: "NXBrew-dl",
        content: format!("Downloaded **{}** ({} {})", display_name, files, noun),
    }
}
