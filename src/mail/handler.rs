//! Mail Lambda: S3 `ObjectCreated` events for raw messages written by SES.

use lambda_runtime::{Error, LambdaEvent};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use super::parse::parse_raw_email;
use super::pipeline::{MailPipeline, PipelineOptions, ProcessOutcome};
use super::send::SesMailSender;
use crate::ai::BedrockSummarizer;
use crate::core::config::AppConfig;
use crate::errors::MailError;
use crate::notify::ApiGatewayNotifier;
use crate::store::{DynamoMailStore, S3ObjectStore};

#[derive(Debug, Clone, Deserialize)]
pub struct S3Event {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3EventRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Object {
    pub key: String,
}

/// S3 event keys are form-encoded: `+` is a space, the rest is percent-encoded.
///
/// # Errors
///
/// Returns a `ParseError` when the decoded key is not UTF-8.
pub fn decode_object_key(raw: &str) -> Result<String, MailError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| MailError::ParseError(format!("Invalid object key {raw}: {e}")))
}

/// Runs every record of an S3 event through the pipeline, stopping at the
/// first failure so the invocation is retried.
///
/// # Errors
///
/// Returns the first fetch, parse or pipeline error.
pub async fn process_s3_event(
    pipeline: &MailPipeline,
    payload: Value,
) -> Result<Vec<ProcessOutcome>, MailError> {
    let event: S3Event = serde_json::from_value(payload)?;
    let mut outcomes = Vec::with_capacity(event.records.len());

    for record in &event.records {
        let bucket = &record.s3.bucket.name;
        let key = decode_object_key(&record.s3.object.key)?;
        info!(bucket = %bucket, key = %key, "Processing email object");

        let raw = pipeline.objects().get_object(bucket, &key).await?;
        let parsed = parse_raw_email(&raw)?;
        info!(
            subject = ?parsed.subject,
            from = %parsed.from_text(),
            to = %parsed.to_text(),
            attachments = parsed.attachments.len(),
            "Parsed email"
        );

        let owner = pipeline.find_owner(&parsed).await;
        outcomes.push(pipeline.process(&parsed, owner.as_ref()).await?);
    }

    Ok(outcomes)
}

async fn build_pipeline(config: &AppConfig) -> Result<MailPipeline, MailError> {
    config.core_table()?;
    let store = DynamoMailStore::from_config(config).await;
    let objects = S3ObjectStore::from_config(config).await?;
    let summarizer = BedrockSummarizer::from_config(config).await;
    let notifier = ApiGatewayNotifier::from_config(config).await?;
    let sender = SesMailSender::from_env().await;

    Ok(MailPipeline::new(
        Arc::new(store),
        Arc::new(objects),
        Arc::new(summarizer),
        Arc::new(notifier),
        Arc::new(sender),
        PipelineOptions {
            mail_domain: config.mail_domain.clone(),
            send_rejection_notices: config.send_rejection_notices,
        },
    ))
}

/// Lambda handler for the mail entrypoint.
///
/// # Errors
///
/// Returns an error when configuration is incomplete or any record fails.
pub async fn function_handler(event: LambdaEvent<Value>) -> Result<(), Error> {
    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        Error::from(e)
    })?;

    let pipeline = build_pipeline(&config).await.map_err(|e| {
        error!("Failed to initialize pipeline: {}", e);
        Error::from(e)
    })?;

    match process_s3_event(&pipeline, event.payload).await {
        Ok(outcomes) => {
            info!(processed = outcomes.len(), "Mail event handled");
            Ok(())
        }
        Err(e) => {
            error!("Error processing email: {}", e);
            Err(Error::from(e))
        }
    }
}

pub use self::function_handler as handler;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_form_encoded_keys() {
        assert_eq!(
            decode_object_key("inbound/My+Mail%3A1").unwrap(),
            "inbound/My Mail:1"
        );
        assert_eq!(decode_object_key("plain").unwrap(), "plain");
    }

    #[test]
    fn test_deserializes_s3_notification() {
        let event: S3Event = serde_json::from_value(serde_json::json!({
            "Records": [{
                "eventName": "ObjectCreated:Put",
                "s3": { "bucket": { "name": "mail-in" }, "object": { "key": "abc", "size": 10 } }
            }]
        }))
        .unwrap();
        assert_eq!(event.records.len(), 1);
        assert_eq!(event.records[0].s3.bucket.name, "mail-in");
    }
}
