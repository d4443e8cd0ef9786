use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::primitives::ByteStream;
use tracing::info;

use super::ObjectStore;
use crate::core::config::AppConfig;
use crate::errors::MailError;

/// S3 access for inbound mail and the knowledge-base bucket, which may live
/// in different regions.
pub struct S3ObjectStore {
    inbound: S3Client,
    knowledge_base: S3Client,
    knowledge_base_bucket: String,
}

impl S3ObjectStore {
    #[must_use]
    pub fn new(inbound: S3Client, knowledge_base: S3Client, knowledge_base_bucket: String) -> Self {
        Self {
            inbound,
            knowledge_base,
            knowledge_base_bucket,
        }
    }

    /// # Errors
    ///
    /// Returns an error if `KNOWLEDGE_BASE_BUCKET` is not configured.
    pub async fn from_config(config: &AppConfig) -> Result<Self, MailError> {
        let bucket = config.knowledge_base()?.to_string();
        let shared = aws_config::from_env().load().await;
        let kb_shared = aws_config::from_env()
            .region(aws_config::Region::new(config.knowledge_base_region.clone()))
            .load()
            .await;
        Ok(Self::new(
            S3Client::new(&shared),
            S3Client::new(&kb_shared),
            bucket,
        ))
    }
}

fn object_error(operation: &str, error: impl std::error::Error + 'static) -> MailError {
    MailError::ObjectStoreError(format!(
        "{operation}: {}",
        aws_sdk_s3::error::DisplayErrorContext(error)
    ))
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, MailError> {
        info!(bucket = %bucket, key = %key, "Fetching object");
        let output = self
            .inbound
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| object_error("get_object", e))?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| object_error("read object body", e))?
            .into_bytes();
        Ok(bytes.to_vec())
    }

    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), MailError> {
        info!(
            bucket = %self.knowledge_base_bucket,
            key = %key,
            bytes = body.len(),
            content_type = %content_type,
            "Uploading object"
        );
        self.knowledge_base
            .put_object()
            .bucket(&self.knowledge_base_bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| object_error("put_object", e))?;
        Ok(())
    }
}
