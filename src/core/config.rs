use std::env;

use crate::errors::MailError;

pub const DEFAULT_MAIL_DOMAIN: &str = "basemail.me";
pub const DEFAULT_MODEL_ALIAS: &str = "am-2";
pub const DEFAULT_MODEL_REGION: &str = "us-east-1";

/// Settings shared by every Basemail Lambda.
///
/// Each function only receives the variables its stack injects, so all
/// deployment-specific values are optional here and checked by the accessor
/// the handler actually calls.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub core_table_name: Option<String>,
    pub core_table_region: Option<String>,
    pub websocket_table_name: Option<String>,
    pub knowledge_base_bucket: Option<String>,
    pub knowledge_base_region: String,
    pub api_gateway_domain_name: Option<String>,
    pub api_gateway_stage: Option<String>,
    pub bedrock_region: String,
    pub bedrock_model: String,
    pub chat_queue_url: Option<String>,
    pub discord_webhook_url: Option<String>,
    pub clerk_secret_key: Option<String>,
    pub clerk_signing_secret: Option<String>,
    pub name_resolver_url: Option<String>,
    pub mail_domain: String,
    pub send_rejection_notices: bool,
}

impl AppConfig {
    /// # Errors
    ///
    /// Returns an error if a boolean flag holds something other than
    /// `true`/`false`/`1`/`0`.
    pub fn from_env() -> Result<Self, MailError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns an error if a boolean flag cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MailError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let send_rejection_notices = match get("SEND_REJECTION_NOTICES") {
            None => false,
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                MailError::ConfigError(format!("SEND_REJECTION_NOTICES: invalid flag '{raw}'"))
            })?,
        };

        Ok(Self {
            core_table_name: get("CORE_TABLE_NAME"),
            core_table_region: get("CORE_TABLE_REGION"),
            websocket_table_name: get("WEBSOCKET_TABLE_NAME"),
            knowledge_base_bucket: get("KNOWLEDGE_BASE_BUCKET"),
            knowledge_base_region: get("KNOWLEDGE_BASE_REGION")
                .unwrap_or_else(|| DEFAULT_MODEL_REGION.to_string()),
            api_gateway_domain_name: get("API_GATEWAY_DOMAIN_NAME"),
            api_gateway_stage: get("API_GATEWAY_STAGE"),
            bedrock_region: get("BEDROCK_REGION")
                .unwrap_or_else(|| DEFAULT_MODEL_REGION.to_string()),
            bedrock_model: get("BEDROCK_MODEL").unwrap_or_else(|| DEFAULT_MODEL_ALIAS.to_string()),
            chat_queue_url: get("SQS_QUEUE_URL"),
            discord_webhook_url: get("DISCORD_WEBHOOK_URL"),
            clerk_secret_key: get("CLERK_SECRET_KEY"),
            clerk_signing_secret: get("CLERK_SIGNING_SECRET"),
            name_resolver_url: get("NAME_RESOLVER_URL"),
            mail_domain: get("MAIL_DOMAIN").unwrap_or_else(|| DEFAULT_MAIL_DOMAIN.to_string()),
            send_rejection_notices,
        })
    }

    /// # Errors
    pub fn core_table(&self) -> Result<&str, MailError> {
        required(self.core_table_name.as_deref(), "CORE_TABLE_NAME")
    }

    /// # Errors
    pub fn websocket_table(&self) -> Result<&str, MailError> {
        required(self.websocket_table_name.as_deref(), "WEBSOCKET_TABLE_NAME")
    }

    /// # Errors
    pub fn knowledge_base(&self) -> Result<&str, MailError> {
        required(self.knowledge_base_bucket.as_deref(), "KNOWLEDGE_BASE_BUCKET")
    }

    /// # Errors
    pub fn chat_queue(&self) -> Result<&str, MailError> {
        required(self.chat_queue_url.as_deref(), "SQS_QUEUE_URL")
    }

    /// # Errors
    pub fn discord_webhook(&self) -> Result<&str, MailError> {
        required(self.discord_webhook_url.as_deref(), "DISCORD_WEBHOOK_URL")
    }

    /// # Errors
    pub fn name_resolver(&self) -> Result<&str, MailError> {
        required(self.name_resolver_url.as_deref(), "NAME_RESOLVER_URL")
    }

    /// The API Gateway management endpoint used to post to WebSocket clients.
    ///
    /// # Errors
    ///
    /// Returns an error if either the domain or the stage is unset.
    pub fn websocket_endpoint(&self) -> Result<String, MailError> {
        let domain = required(self.api_gateway_domain_name.as_deref(), "API_GATEWAY_DOMAIN_NAME")?;
        let stage = required(self.api_gateway_stage.as_deref(), "API_GATEWAY_STAGE")?;
        Ok(websocket_endpoint_url(domain, stage))
    }
}

#[must_use]
pub fn websocket_endpoint_url(domain: &str, stage: &str) -> String {
    let domain = domain.trim_end_matches('/');
    let stage = stage.trim_matches('/');
    if domain.starts_with("https://") || domain.starts_with("http://") {
        format!("{domain}/{stage}")
    } else {
        format!("https://{domain}/{stage}")
    }
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, MailError> {
    value.ok_or_else(|| MailError::ConfigError(format!("{name} is not set")))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
