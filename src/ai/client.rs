//! Bedrock client for the summarization step.

use async_trait::async_trait;
use aws_sdk_bedrockruntime::Client as BedrockClient;
use aws_sdk_bedrockruntime::primitives::Blob;
use tracing::info;

use super::prompt::{build_summary_request, estimate_tokens, resolve_model_id};
use super::response::{EmailSummary, extract_model_text, parse_summary};
use crate::core::config::AppConfig;
use crate::core::models::User;
use crate::errors::MailError;

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarizes one email for its owner.
    async fn summarize(
        &self,
        email_content: &str,
        sent_from: &str,
        owner: Option<&User>,
    ) -> Result<EmailSummary, MailError>;
}

pub struct BedrockSummarizer {
    client: BedrockClient,
    model_id: String,
}

impl BedrockSummarizer {
    #[must_use]
    pub fn new(client: BedrockClient, model_alias: &str) -> Self {
        Self {
            client,
            model_id: resolve_model_id(model_alias).to_string(),
        }
    }

    /// Builds a client in the configured model region.
    pub async fn from_config(config: &AppConfig) -> Self {
        let shared = aws_config::from_env()
            .region(aws_config::Region::new(config.bedrock_region.clone()))
            .load()
            .await;
        Self::new(BedrockClient::new(&shared), &config.bedrock_model)
    }

    #[must_use]
    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[async_trait]
impl Summarizer for BedrockSummarizer {
    async fn summarize(
        &self,
        email_content: &str,
        sent_from: &str,
        owner: Option<&User>,
    ) -> Result<EmailSummary, MailError> {
        let payload = build_summary_request(email_content, sent_from, owner);

        #[cfg(feature = "debug-logs")]
        info!(
            estimated_input_tokens = estimate_tokens(email_content),
            "Using summarizer payload:\n{}", payload
        );

        #[cfg(not(feature = "debug-logs"))]
        info!(
            model_id = %self.model_id,
            estimated_input_tokens = estimate_tokens(email_content),
            "Invoking model for email summary"
        );

        let body = serde_json::to_vec(&payload)?;

        let output = self
            .client
            .invoke_model()
            .model_id(&self.model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(body))
            .send()
            .await
            .map_err(|e| {
                MailError::ModelError(format!(
                    "InvokeModel failed: {}",
                    aws_sdk_bedrockruntime::error::DisplayErrorContext(e)
                ))
            })?;

        let text = extract_model_text(output.body().as_ref())?;
        let summary = parse_summary(&text)?;
        info!(tags = summary.tags.len(), links = summary.links.len(), "Model summary parsed");
        Ok(summary)
    }
}
