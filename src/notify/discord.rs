//! Error alerts to a Discord webhook.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tokio_retry::strategy::jitter;
use tokio_retry::{Retry, strategy::ExponentialBackoff};

use crate::errors::MailError;

pub const ALERT_TITLE: &str = "New Error from basemail";
pub const ALERT_FOOTER: &str = "basemail SQS to Discord Hook";
pub const ALERT_COLOR: u32 = 0x0099ff;

/// Discord rejects embed descriptions above this many characters.
pub const MAX_DESCRIPTION_CHARS: usize = 4096;

/// Builds the webhook body for one dead-lettered message.
#[must_use]
pub fn format_alert(message: &str, timestamp: DateTime<Utc>) -> Value {
    let description: String = message.chars().take(MAX_DESCRIPTION_CHARS).collect();
    json!({
        "embeds": [
            {
                "title": ALERT_TITLE,
                "description": description,
                "color": ALERT_COLOR,
                "timestamp": timestamp.to_rfc3339(),
                "footer": { "text": ALERT_FOOTER },
            }
        ]
    })
}

#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, body: &Value) -> Result<(), MailError>;
}

pub struct DiscordWebhook {
    url: String,
    http: Client,
}

impl DiscordWebhook {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: &str) -> Result<Self, MailError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| MailError::HttpError(format!("Failed to build webhook client: {e}")))?;
        Ok(Self {
            url: url.to_string(),
            http,
        })
    }
}

#[async_trait]
impl AlertSink for DiscordWebhook {
    /// Fails once every attempt fails or Discord keeps answering non-2xx.
    async fn send(&self, body: &Value) -> Result<(), MailError> {
        let strategy = ExponentialBackoff::from_millis(200).map(jitter).take(3);

        Retry::spawn(strategy, || async {
            let resp = self.http.post(&self.url).json(body).send().await?;
            let status = resp.status();
            if status.is_success() {
                Ok(())
            } else {
                let text = resp
                    .text()
                    .await
                    .unwrap_or_else(|_| "<failed to read body>".to_string());
                Err(MailError::HttpError(format!(
                    "Discord webhook returned {status}: {text}"
                )))
            }
        })
        .await
    }
}
