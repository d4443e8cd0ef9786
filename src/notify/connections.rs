//! Best-effort push to a mailbox owner's live WebSocket connection.

use async_trait::async_trait;
use aws_sdk_apigatewaymanagement::Client as ManagementClient;
use aws_sdk_apigatewaymanagement::primitives::Blob;
use tracing::{error, info, warn};

use crate::core::config::AppConfig;
use crate::errors::MailError;
use crate::store::MailStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    Delivered,
    /// The client disconnected; the connection row is stale.
    Gone,
}

/// Result of [`push_to_owner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanOut {
    Delivered,
    NoConnection,
    StaleConnection,
    Failed,
}

#[async_trait]
pub trait ConnectionNotifier: Send + Sync {
    async fn post(&self, socket_id: &str, payload: &str) -> Result<PostOutcome, MailError>;
}

pub struct ApiGatewayNotifier {
    client: ManagementClient,
}

impl ApiGatewayNotifier {
    #[must_use]
    pub fn new(client: ManagementClient) -> Self {
        Self { client }
    }

    /// # Errors
    ///
    /// Returns an error if the API Gateway domain or stage is not configured.
    pub async fn from_config(config: &AppConfig) -> Result<Self, MailError> {
        let endpoint = config.websocket_endpoint()?;
        let shared = aws_config::from_env().load().await;
        let conf = aws_sdk_apigatewaymanagement::config::Builder::from(&shared)
            .endpoint_url(endpoint)
            .build();
        Ok(Self::new(ManagementClient::from_conf(conf)))
    }
}

#[async_trait]
impl ConnectionNotifier for ApiGatewayNotifier {
    async fn post(&self, socket_id: &str, payload: &str) -> Result<PostOutcome, MailError> {
        match self
            .client
            .post_to_connection()
            .connection_id(socket_id)
            .data(Blob::new(payload.as_bytes().to_vec()))
            .send()
            .await
        {
            Ok(_) => Ok(PostOutcome::Delivered),
            Err(e) => {
                if e.as_service_error().is_some_and(|se| se.is_gone_exception()) {
                    return Ok(PostOutcome::Gone);
                }
                Err(MailError::NotifyError(format!(
                    "post_to_connection {socket_id}: {}",
                    aws_sdk_apigatewaymanagement::error::DisplayErrorContext(e)
                )))
            }
        }
    }
}

/// Pushes `payload` to the mailbox owner's connection if one is registered.
///
/// Never fails: a missing connection means the client picks the update up on
/// its next query, and stale connections are removed.
pub async fn push_to_owner(
    store: &dyn MailStore,
    notifier: &dyn ConnectionNotifier,
    inbox_id: &str,
    payload: &str,
) -> FanOut {
    let connection = match store.get_connection(inbox_id).await {
        Ok(Some(connection)) => connection,
        Ok(None) => {
            info!(inbox_id = %inbox_id, "No connection found");
            return FanOut::NoConnection;
        }
        Err(e) => {
            error!(inbox_id = %inbox_id, "Connection lookup failed: {}", e);
            return FanOut::Failed;
        }
    };

    match notifier.post(&connection.socket_id, payload).await {
        Ok(PostOutcome::Delivered) => {
            info!(inbox_id = %inbox_id, socket_id = %connection.socket_id, "Pushed update to client");
            FanOut::Delivered
        }
        Ok(PostOutcome::Gone) => {
            warn!(inbox_id = %inbox_id, socket_id = %connection.socket_id, "Connection gone, removing");
            if let Err(e) = store.delete_connection(inbox_id).await {
                error!("Failed to remove stale connection: {}", e);
            }
            FanOut::StaleConnection
        }
        Err(e) => {
            error!("Failed to send message to {}: {}", connection.socket_id, e);
            FanOut::Failed
        }
    }
}
