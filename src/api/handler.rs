//! API Lambda handler - thin router that delegates to the mailbox and
//! webhook routes.

use lambda_runtime::{Error, LambdaEvent};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use super::clerk::{ClerkClient, IdentityProvider};
use super::helpers::{RouteError, RouteResult, message_response, reject};
use super::parsing::{http_method, raw_path};
use crate::core::config::AppConfig;
use crate::core::names::{HttpNameResolver, NameResolver};
use crate::errors::MailError;
use crate::mail::{MailSender, SesMailSender};
use crate::notify::{ApiGatewayNotifier, ConnectionNotifier};
use crate::store::{DynamoMailStore, MailStore};

pub use self::function_handler as handler;

pub const MAIL_ROUTE: &str = "/v1/mail";
pub const CLERK_ROUTE: &str = "/v1/clerk";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub mail_domain: String,
    /// Webhook signatures are only checked when this is set.
    pub signing_secret: Option<String>,
}

impl ApiSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            mail_domain: config.mail_domain.clone(),
            signing_secret: config.clerk_signing_secret.clone(),
        }
    }
}

pub struct ApiService {
    pub(super) store: Arc<dyn MailStore>,
    pub(super) names: Arc<dyn NameResolver>,
    pub(super) sender: Arc<dyn MailSender>,
    pub(super) notifier: Arc<dyn ConnectionNotifier>,
    pub(super) identity: Arc<dyn IdentityProvider>,
    pub(super) settings: ApiSettings,
}

impl ApiService {
    #[must_use]
    pub fn new(
        store: Arc<dyn MailStore>,
        names: Arc<dyn NameResolver>,
        sender: Arc<dyn MailSender>,
        notifier: Arc<dyn ConnectionNotifier>,
        identity: Arc<dyn IdentityProvider>,
        settings: ApiSettings,
    ) -> Self {
        Self {
            store,
            names,
            sender,
            notifier,
            identity,
            settings,
        }
    }

    /// # Errors
    ///
    /// Returns an error when a required table, endpoint or resolver URL is
    /// not configured.
    pub async fn from_config(config: &AppConfig) -> Result<Self, MailError> {
        config.core_table()?;
        let names = HttpNameResolver::new(config.name_resolver()?)?;
        let notifier = ApiGatewayNotifier::from_config(config).await?;
        let identity = ClerkClient::new(config.clerk_secret_key.clone())?;

        Ok(Self::new(
            Arc::new(DynamoMailStore::from_config(config).await),
            Arc::new(names),
            Arc::new(SesMailSender::from_env().await),
            Arc::new(notifier),
            Arc::new(identity),
            ApiSettings::from_config(config),
        ))
    }

    /// Routes one API Gateway event to a response. Never fails: errors become
    /// a 500 response.
    pub async fn handle(&self, event: &Value) -> Value {
        let path = raw_path(event).unwrap_or_default();
        let method = http_method(event).unwrap_or_default();
        info!(path = %path, method = %method, "API request");

        let result: RouteResult = match path {
            MAIL_ROUTE => match method {
                "GET" => self.list_mail(event).await,
                "POST" => self.send_mail(event).await,
                "PUT" => self.update_mail(event).await,
                "DELETE" => self.delete_mail(event).await,
                _ => Err(method_not_allowed(method)),
            },
            CLERK_ROUTE => match method {
                "POST" => self.clerk_webhook(event).await,
                _ => Err(method_not_allowed(method)),
            },
            _ => {
                info!("Route not found: {}", path);
                Err(reject(404, "Route not found"))
            }
        };

        match result {
            Ok(response) | Err(RouteError::Response(response)) => response,
            Err(RouteError::Internal(e)) => {
                error!(path = %path, method = %method, "Request failed: {}", e);
                message_response(500, "Internal server error")
            }
        }
    }
}

fn method_not_allowed(method: &str) -> RouteError {
    info!("Method not allowed: {}", method);
    reject(405, "Method not allowed")
}

/// Lambda handler for the API entrypoint.
///
/// # Errors
///
/// Returns an error only when the service cannot be configured; request
/// failures are answered with an error status.
#[tracing::instrument(level = "info", skip(event))]
pub async fn function_handler(event: LambdaEvent<Value>) -> Result<impl Serialize, Error> {
    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        Error::from(e)
    })?;

    let service = ApiService::from_config(&config).await.map_err(|e| {
        error!("Failed to initialize API service: {}", e);
        Error::from(e)
    })?;

    Ok(service.handle(&event.payload).await)
}
