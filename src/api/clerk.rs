//! Identity-provider webhook: provisions a mailbox when a user signs up with
//! a wallet that has a basename.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::handler::ApiService;
use super::helpers::{RouteError, RouteResult, message_response, reject};
use super::parsing::{get_header_value, request_body};
use super::signature::verify_svix_signature;
use crate::core::keys::{
    INBOX_PK, USER_PK, email_sk, encode_inbox_id, encode_sender, inbox_mapping_sk,
    mailbox_address, naked_basename, user_pk,
};
use crate::core::models::{Email, Inbox, Typename, User};
use crate::errors::MailError;
use crate::notify::push_to_owner;

pub const USER_CREATED: &str = "user.created";
const CLERK_API_BASE: &str = "https://api.clerk.com/v1";

#[derive(Debug, Clone, Deserialize)]
pub struct ClerkEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: ClerkUser,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClerkUser {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub web3_wallets: Vec<Web3Wallet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Web3Wallet {
    pub web3_wallet: String,
}

impl ClerkUser {
    #[must_use]
    pub fn first_wallet(&self) -> Option<&str> {
        self.web3_wallets
            .first()
            .map(|w| w.web3_wallet.as_str())
            .filter(|w| !w.is_empty())
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn delete_user(&self, user_id: &str) -> Result<(), MailError>;
}

pub struct ClerkClient {
    secret_key: Option<String>,
    http: Client,
}

impl ClerkClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(secret_key: Option<String>) -> Result<Self, MailError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| MailError::HttpError(format!("Failed to build Clerk client: {e}")))?;
        Ok(Self { secret_key, http })
    }
}

#[async_trait]
impl IdentityProvider for ClerkClient {
    async fn delete_user(&self, user_id: &str) -> Result<(), MailError> {
        let key = self
            .secret_key
            .as_deref()
            .ok_or_else(|| MailError::ConfigError("CLERK_SECRET_KEY is not set".to_string()))?;

        let resp = self
            .http
            .delete(format!("{CLERK_API_BASE}/users/{}", urlencoding::encode(user_id)))
            .bearer_auth(key)
            .send()
            .await?;

        match resp.status() {
            status if status.is_success() => {
                info!(user_id = %user_id, "Deleted identity-provider user");
                Ok(())
            }
            StatusCode::NOT_FOUND => {
                warn!(user_id = %user_id, "Identity-provider user already gone");
                Ok(())
            }
            status => Err(MailError::HttpError(format!(
                "Clerk delete user returned status {status}"
            ))),
        }
    }
}

/// Rows written for a new account: the user, its inbox mapping and a
/// welcome email.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub user: User,
    pub inbox: Inbox,
    pub welcome: Email,
}

#[must_use]
pub fn new_account(user_id: &str, wallet: &str, basename: &str, domain: &str) -> NewAccount {
    let naked = naked_basename(basename);
    let inbox_id = encode_inbox_id(naked);
    let mailbox = mailbox_address(naked, domain);
    let now = Utc::now().to_rfc3339();

    let user = User {
        pk: USER_PK.to_string(),
        sk: user_id.to_string(),
        id: user_id.to_string(),
        name: basename.to_string(),
        inbox_id: inbox_id.clone(),
        wallet: Some(wallet.to_string()),
        email: mailbox.clone(),
        context: String::new(),
        typename: Typename::User,
        created_at: Some(now.clone()),
        updated_at: Some(now.clone()),
    };

    let inbox = Inbox {
        pk: INBOX_PK.to_string(),
        sk: inbox_mapping_sk(&inbox_id),
        id: inbox_id.clone(),
        name: basename.to_string(),
        email: mailbox.clone(),
        created_by: user_id.to_string(),
        blocked_addresses: Vec::new(),
        company_id: None,
        typename: Typename::Inbox,
        created_at: now.clone(),
    };

    let welcome_from = format!("welcome@{domain}");
    let welcome = Email {
        pk: user_pk(&inbox_id),
        sk: email_sk(&encode_sender(&welcome_from), &Uuid::new_v4().to_string()),
        typename: Typename::Email,
        inbox_id,
        from: welcome_from.clone(),
        raw_address: welcome_from,
        to: mailbox,
        subject: format!("Welcome to Base Mail {basename}"),
        date: now.clone(),
        body: format!(
            "Welcome to Base Mail {basename}. Mail sent to this address arrives here, \
             summarized and ready for your voice agent."
        ),
        read: false,
        attachments: Vec::new(),
        tags: Vec::new(),
        links: Vec::new(),
        summarized_email: String::new(),
        agent_system_prompt: String::new(),
        first_message_from_agent: String::new(),
        optimized_content_key: None,
        replies: None,
        wallet: Some(wallet.to_string()),
        created_at: now.clone(),
        updated_at: now,
    };

    NewAccount {
        user,
        inbox,
        welcome,
    }
}

impl ApiService {
    fn verify_webhook(&self, event: &Value, body: &str) -> Result<(), RouteError> {
        let Some(secret) = self.settings.signing_secret.as_deref() else {
            return Ok(());
        };

        let headers = event.get("headers").cloned().unwrap_or(Value::Null);
        let (Some(id), Some(timestamp), Some(signature)) = (
            get_header_value(&headers, "svix-id"),
            get_header_value(&headers, "svix-timestamp"),
            get_header_value(&headers, "svix-signature"),
        ) else {
            error!("Missing svix signature headers");
            return Err(reject(401, "Missing signature headers"));
        };

        if verify_svix_signature(secret, id, timestamp, signature, body, Utc::now().timestamp()) {
            Ok(())
        } else {
            Err(reject(401, "Invalid signature"))
        }
    }

    pub(super) async fn clerk_webhook(&self, event: &Value) -> RouteResult {
        let body = request_body(event)?;
        self.verify_webhook(event, &body)?;

        let webhook: ClerkEvent = serde_json::from_str(&body).map_err(|e| {
            error!("Invalid webhook body: {}", e);
            reject(400, "Invalid request body")
        })?;

        if webhook.kind != USER_CREATED {
            info!(kind = %webhook.kind, "Not a user created event");
            return Ok(message_response(200, "Not a user created event"));
        }

        let Some(wallet) = webhook.data.first_wallet() else {
            info!(user_id = %webhook.data.id, "No wallet found");
            return Ok(message_response(200, "No wallet found"));
        };

        let Some(basename) = self.names.resolve(wallet).await? else {
            warn!(user_id = %webhook.data.id, "No base name found, deleting user");
            if let Err(e) = self.identity.delete_user(&webhook.data.id).await {
                error!("Failed to delete user without basename: {}", e);
            }
            return Err(reject(404, "No base name found"));
        };

        let account = new_account(&webhook.data.id, wallet, &basename, &self.settings.mail_domain);
        self.store.put_user(&account.user).await?;
        self.store.put_inbox(&account.inbox).await?;
        self.store.put_email(&account.welcome).await?;
        info!(
            user_id = %account.user.id,
            inbox_id = %account.inbox.id,
            "Provisioned mailbox"
        );

        let payload = serde_json::to_string(&account.welcome).map_err(MailError::from)?;
        let fan_out = push_to_owner(
            self.store.as_ref(),
            self.notifier.as_ref(),
            &account.inbox.id,
            &payload,
        )
        .await;
        info!(fan_out = ?fan_out, "Welcome email pushed");

        Ok(message_response(200, "User created"))
    }
}
