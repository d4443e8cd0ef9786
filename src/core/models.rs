use serde::{Deserialize, Serialize};

/// Discriminator stored in the `typename` attribute of every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Typename {
    User,
    Inbox,
    Email,
    Document,
    Connection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub pk: String,
    pub sk: String,
    pub id: String,
    pub name: String,
    pub inbox_id: String,
    #[serde(default)]
    pub wallet: Option<String>,
    pub email: String,
    #[serde(default)]
    pub context: String,
    pub typename: Typename,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inbox {
    pub pk: String,
    pub sk: String,
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_by: String,
    #[serde(default)]
    pub blocked_addresses: Vec<String>,
    #[serde(default)]
    pub company_id: Option<String>,
    pub typename: Typename,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub size: usize,
    pub s3_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailReply {
    pub from: String,
    pub body: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    pub pk: String,
    pub sk: String,
    pub typename: Typename,
    pub inbox_id: String,
    pub from: String,
    #[serde(default)]
    pub raw_address: String,
    pub to: String,
    pub subject: String,
    pub date: String,
    pub body: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub attachments: Vec<EmailAttachment>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub summarized_email: String,
    #[serde(default)]
    pub agent_system_prompt: String,
    #[serde(default)]
    pub first_message_from_agent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimized_content_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replies: Option<Vec<EmailReply>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Email {
    /// The uuid segment at the end of the sort key.
    #[must_use]
    pub fn email_id(&self) -> &str {
        self.sk.rsplit('#').next().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub pk: String,
    pub sk: String,
    pub id: String,
    /// Base64 sender address.
    pub email: String,
    pub name: String,
    pub s3_key: String,
    pub created_by: String,
    pub created_at: String,
    #[serde(default)]
    pub read: bool,
    pub typename: Typename,
}

/// A live WebSocket connection, keyed by the owner's mailbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// `USER#<inboxId>`
    pub connection_id: String,
    /// The API Gateway connection id to post to.
    pub socket_id: String,
    pub user_id: String,
    /// Expiry in epoch seconds.
    pub ttl: i64,
    pub typename: Typename,
}
