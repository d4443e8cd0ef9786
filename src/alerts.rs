//! Alerts Lambda: forwards dead-lettered SQS messages to Discord.

use chrono::Utc;
use futures::future::join_all;
use lambda_runtime::{Error, LambdaEvent};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use crate::core::config::AppConfig;
use crate::errors::MailError;
use crate::notify::{AlertSink, DiscordWebhook, format_alert};

#[derive(Debug, Clone, Deserialize)]
pub struct SqsEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<SqsRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SqsRecord {
    #[serde(rename = "messageId", default)]
    pub message_id: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertReport {
    pub sent: usize,
    pub failed: usize,
}

/// Posts one embed per record concurrently. Failures are logged and counted,
/// never returned.
///
/// # Errors
///
/// Returns a `ParseError` only when the payload is not an SQS event.
pub async fn forward_records(sink: &dyn AlertSink, payload: Value) -> Result<AlertReport, MailError> {
    let event: SqsEvent = serde_json::from_value(payload)?;

    let sends = event.records.iter().map(|record| async move {
        let body = format_alert(&record.body, Utc::now());
        let result = sink.send(&body).await;
        if let Err(e) = &result {
            error!(message_id = %record.message_id, "Error sending message to Discord: {}", e);
        }
        result.is_ok()
    });

    let results = join_all(sends).await;
    let sent = results.iter().filter(|ok| **ok).count();
    let report = AlertReport {
        sent,
        failed: results.len() - sent,
    };
    info!(sent = report.sent, failed = report.failed, "Forwarded alerts");
    Ok(report)
}

/// Lambda handler for the alerts entrypoint.
///
/// # Errors
///
/// Returns an error when the webhook URL is not configured.
pub async fn function_handler(event: LambdaEvent<Value>) -> Result<(), Error> {
    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        Error::from(e)
    })?;
    let webhook = DiscordWebhook::new(config.discord_webhook()?)?;

    match forward_records(&webhook, event.payload).await {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("Unreadable alert event: {}", e);
            Ok(())
        }
    }
}

pub use self::function_handler as handler;
