//! WebSocket Lambda: connection bookkeeping and chat requests.

use chrono::{Duration, Utc};
use lambda_runtime::{Error, LambdaEvent};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{error, info};

use super::queue::{ChatQueue, ChatRequest, IncomingMessage, SqsChatQueue};
use crate::api::parsing::v_str;
use crate::core::config::AppConfig;
use crate::core::keys::connection_key;
use crate::core::models::{Connection, Typename};
use crate::errors::MailError;
use crate::store::{DynamoMailStore, MailStore};

pub use self::function_handler as handler;

pub const CONNECTION_TTL_DAYS: i64 = 30;
const FAILURE_BODY: &str = "Failed to process WebSocket event";

fn socket_response(status_code: u16, body: impl Into<String>) -> Value {
    json!({ "statusCode": status_code, "body": body.into() })
}

/// Connection row for `<inboxId>`, expiring [`CONNECTION_TTL_DAYS`] from now.
#[must_use]
pub fn connection_row(inbox_id: &str, socket_id: &str) -> Connection {
    Connection {
        connection_id: connection_key(inbox_id),
        socket_id: socket_id.to_string(),
        user_id: inbox_id.to_string(),
        ttl: (Utc::now() + Duration::days(CONNECTION_TTL_DAYS)).timestamp(),
        typename: Typename::Connection,
    }
}

pub struct SocketService {
    store: Arc<dyn MailStore>,
    queue: Arc<dyn ChatQueue>,
}

impl SocketService {
    #[must_use]
    pub fn new(store: Arc<dyn MailStore>, queue: Arc<dyn ChatQueue>) -> Self {
        Self { store, queue }
    }

    /// # Errors
    ///
    /// Returns an error if the connection table or the queue is not configured.
    pub async fn from_config(config: &AppConfig) -> Result<Self, MailError> {
        config.websocket_table()?;
        let queue = SqsChatQueue::from_config(config).await?;
        Ok(Self::new(
            Arc::new(DynamoMailStore::from_config(config).await),
            Arc::new(queue),
        ))
    }

    pub async fn handle(&self, event: &Value) -> Value {
        let route = v_str(event, &["requestContext", "routeKey"]).unwrap_or_default();
        let socket_id = v_str(event, &["requestContext", "connectionId"]).unwrap_or_default();
        info!(route = %route, socket_id = %socket_id, "WebSocket event");

        let result = match route {
            "$connect" => self.connect(event, socket_id).await,
            "$disconnect" => {
                info!("Disconnected: {}", socket_id);
                Ok(socket_response(200, "Disconnected"))
            }
            "sendMessage" => self.send_message(event, socket_id).await,
            _ => Ok(socket_response(400, "Unknown route")),
        };

        result.unwrap_or_else(|e| {
            error!(route = %route, "WebSocket event failed: {}", e);
            socket_response(500, FAILURE_BODY)
        })
    }

    async fn connect(&self, event: &Value, socket_id: &str) -> Result<Value, MailError> {
        let Some(inbox_id) =
            v_str(event, &["queryStringParameters", "userId"]).filter(|id| !id.is_empty())
        else {
            return Ok(socket_response(400, "User ID is required"));
        };

        self.store
            .put_connection(&connection_row(inbox_id, socket_id))
            .await?;
        info!(inbox_id = %inbox_id, socket_id = %socket_id, "Connection setup complete");
        Ok(socket_response(200, "Connected"))
    }

    async fn send_message(&self, event: &Value, socket_id: &str) -> Result<Value, MailError> {
        let body = v_str(event, &["body"]).filter(|b| !b.trim().is_empty()).unwrap_or("{}");
        let message: IncomingMessage = serde_json::from_str(body)?;

        let request = ChatRequest::new(
            socket_id,
            v_str(event, &["requestContext", "domainName"]).unwrap_or_default(),
            v_str(event, &["requestContext", "stage"]).unwrap_or_default(),
            message,
        );

        let message_id = self.queue.enqueue(&request).await?;
        info!(message_id = ?message_id, "Sent message to SQS");
        Ok(socket_response(
            200,
            json!({ "messageId": message_id }).to_string(),
        ))
    }
}

/// Lambda handler for the WebSocket entrypoint.
///
/// # Errors
///
/// Returns an error only when the service cannot be configured.
pub async fn function_handler(event: LambdaEvent<Value>) -> Result<impl Serialize, Error> {
    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        Error::from(e)
    })?;

    let service = SocketService::from_config(&config).await.map_err(|e| {
        error!("Failed to initialize socket service: {}", e);
        Error::from(e)
    })?;

    Ok(service.handle(&event.payload).await)
}
