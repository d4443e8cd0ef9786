use async_trait::async_trait;
use aws_sdk_sqs::Client as SqsClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::config::AppConfig;
use crate::errors::MailError;

/// A `sendMessage` frame from the browser.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IncomingMessage {
    pub data: Value,
    pub template: Option<String>,
    pub filters: Vec<String>,
    pub case_id: Option<String>,
    pub created_by: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<Value>,
    pub max_length: Option<Value>,
    pub top_p: Option<Value>,
}

/// The queued chat request, carrying enough to post a reply back to the
/// originating connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub connection_id: String,
    pub domain_name: String,
    pub stage: String,
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    pub filters: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Value>,
    #[serde(rename = "max_tokens", skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<Value>,
    #[serde(rename = "top_p", skip_serializing_if = "Option::is_none")]
    pub top_p: Option<Value>,
}

impl ChatRequest {
    #[must_use]
    pub fn new(connection_id: &str, domain_name: &str, stage: &str, message: IncomingMessage) -> Self {
        Self {
            connection_id: connection_id.to_string(),
            domain_name: domain_name.to_string(),
            stage: stage.to_string(),
            data: message.data,
            template: message.template,
            filters: message.filters,
            case_id: message.case_id,
            created_by: message.created_by,
            model: message.model,
            temperature: message.temperature,
            max_tokens: message.max_length,
            top_p: message.top_p,
        }
    }
}

#[async_trait]
pub trait ChatQueue: Send + Sync {
    /// Enqueues the request and returns the queue's message id.
    async fn enqueue(&self, request: &ChatRequest) -> Result<Option<String>, MailError>;
}

pub struct SqsChatQueue {
    client: SqsClient,
    queue_url: String,
}

impl SqsChatQueue {
    #[must_use]
    pub fn new(client: SqsClient, queue_url: &str) -> Self {
        Self {
            client,
            queue_url: queue_url.to_string(),
        }
    }

    /// # Errors
    ///
    /// Returns an error if `SQS_QUEUE_URL` is not set.
    pub async fn from_config(config: &AppConfig) -> Result<Self, MailError> {
        let queue_url = config.chat_queue()?;
        let shared_config = aws_config::from_env().load().await;
        Ok(Self::new(SqsClient::new(&shared_config), queue_url))
    }
}

#[async_trait]
impl ChatQueue for SqsChatQueue {
    async fn enqueue(&self, request: &ChatRequest) -> Result<Option<String>, MailError> {
        let message_body = serde_json::to_string(request)
            .map_err(|e| MailError::ParseError(format!("Failed to serialize chat request: {e}")))?;

        let output = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(message_body)
            .send()
            .await
            .map_err(|e| {
                MailError::AwsError(format!(
                    "Failed to send message to SQS: {}",
                    aws_sdk_sqs::error::DisplayErrorContext(e)
                ))
            })?;
        Ok(output.message_id().map(ToString::to_string))
    }
}
