use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Why a chat message was not delivered.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("chat API rejected message: {0}")]
    Rejected(String),
}

/// Delivers text messages to a chat channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, channel: &str, text: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
}

/// Slack answers 200 even on failure; `ok` carries the real outcome.
#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Slack `chat.postMessage` client authenticated with a bot token.
pub struct SlackNotifier {
    client: reqwest::Client,
    endpoint: Url,
}

impl SlackNotifier {
    pub fn new(base_url: &Url, token: &str, timeout: Duration) -> anyhow::Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| anyhow::anyhow!("chat token contains invalid header characters"))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let mut endpoint = base_url.clone();
        endpoint
            .path_segments_mut()
            .map_err(|_| anyhow::anyhow!("chat API base {base_url} cannot carry a path"))?
            .pop_if_empty()
            .push("chat.postMessage");

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn send(&self, channel: &str, text: &str) -> Result<(), NotifyError> {
        debug!("Posting {} chars to {channel}", text.len());
        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(&PostMessage { channel, text })
            .send()
            .await
            .map_err(NotifyError::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Status { status, body });
        }

        let reply: PostMessageResponse = resp.json().await.map_err(NotifyError::Transport)?;
        if !reply.ok {
            return Err(NotifyError::Rejected(
                reply.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(())
    }
}
