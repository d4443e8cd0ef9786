use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Failed to parse email: {0}")]
    ParseError(String),

    #[error("Missing or invalid configuration: {0}")]
    ConfigError(String),

    #[error("Failed to access the core table: {0}")]
    StoreError(String),

    #[error("Failed to access object storage: {0}")]
    ObjectStoreError(String),

    #[error("Failed to summarize with the model: {0}")]
    ModelError(String),

    #[error("Failed to notify connection: {0}")]
    NotifyError(String),

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),

    #[error("Failed to interact with AWS services: {0}")]
    AwsError(String),

    #[error("{0}")]
    GeneralError(String),
}

impl From<reqwest::Error> for MailError {
    fn from(error: reqwest::Error) -> Self {
        MailError::HttpError(error.to_string())
    }
}

impl From<anyhow::Error> for MailError {
    fn from(error: anyhow::Error) -> Self {
        MailError::GeneralError(error.to_string())
    }
}

impl From<serde_json::Error> for MailError {
    fn from(error: serde_json::Error) -> Self {
        MailError::ParseError(error.to_string())
    }
}

// Every AWS SDK crate re-exports the same smithy SdkError
impl<E> From<aws_sdk_dynamodb::error::SdkError<E>> for MailError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: aws_sdk_dynamodb::error::SdkError<E>) -> Self {
        MailError::AwsError(aws_sdk_dynamodb::error::DisplayErrorContext(error).to_string())
    }
}
