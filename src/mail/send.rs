//! Outbound mail through SES.

use async_trait::async_trait;
use aws_sdk_sesv2::Client as SesClient;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{error, info};

use crate::errors::MailError;

/// Accepts either a single address or a list.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMail {
    #[serde(default, deserialize_with = "one_or_many")]
    pub to: Vec<String>,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub reply_to: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<String>,
}

impl OutgoingMail {
    /// # Errors
    ///
    /// Returns a `ParseError` naming the first missing requirement.
    pub fn validate(&self) -> Result<(), MailError> {
        if self.to.iter().all(|t| t.trim().is_empty()) {
            return Err(MailError::ParseError("At least one recipient is required".to_string()));
        }
        if self.subject.trim().is_empty() {
            return Err(MailError::ParseError("Subject is required".to_string()));
        }
        let has_html = self.html.as_deref().is_some_and(|h| !h.is_empty());
        let has_text = self.text.as_deref().is_some_and(|t| !t.is_empty());
        if !has_html && !has_text {
            return Err(MailError::ParseError(
                "Either HTML or text content must be provided".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
pub trait MailSender: Send + Sync {
    /// Sends the mail and returns the provider message id.
    async fn send(&self, mail: &OutgoingMail) -> Result<Option<String>, MailError>;
}

pub struct SesMailSender {
    client: SesClient,
}

impl SesMailSender {
    #[must_use]
    pub fn new(client: SesClient) -> Self {
        Self { client }
    }

    pub async fn from_env() -> Self {
        let shared = aws_config::from_env().load().await;
        Self::new(SesClient::new(&shared))
    }
}

fn utf8_content(data: &str) -> Result<Content, MailError> {
    Content::builder()
        .data(data)
        .charset("UTF-8")
        .build()
        .map_err(|e| MailError::AwsError(format!("Failed to build SES content: {e}")))
}

#[async_trait]
impl MailSender for SesMailSender {
    async fn send(&self, mail: &OutgoingMail) -> Result<Option<String>, MailError> {
        mail.validate()?;

        let mut body = Body::builder();
        if let Some(html) = mail.html.as_deref().filter(|h| !h.is_empty()) {
            body = body.html(utf8_content(html)?);
        }
        if let Some(text) = mail.text.as_deref().filter(|t| !t.is_empty()) {
            body = body.text(utf8_content(text)?);
        }

        let message = Message::builder()
            .subject(utf8_content(&mail.subject)?)
            .body(body.build())
            .build();

        let destination = Destination::builder()
            .set_to_addresses(Some(mail.to.clone()))
            .set_cc_addresses((!mail.cc.is_empty()).then(|| mail.cc.clone()))
            .set_bcc_addresses((!mail.bcc.is_empty()).then(|| mail.bcc.clone()))
            .build();

        let result = self
            .client
            .send_email()
            .from_email_address(&mail.from)
            .destination(destination)
            .set_reply_to_addresses((!mail.reply_to.is_empty()).then(|| mail.reply_to.clone()))
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await;

        match result {
            Ok(output) => {
                let message_id = output.message_id().map(ToString::to_string);
                info!(message_id = ?message_id, recipients = mail.to.len(), "Email sent");
                Ok(message_id)
            }
            Err(e) => {
                let detail = aws_sdk_sesv2::error::DisplayErrorContext(e).to_string();
                error!("Failed to send email: {}", detail);
                Err(MailError::AwsError(format!("send_email: {detail}")))
            }
        }
    }
}

/// Automated reply listing attachments that were not accepted.
#[must_use]
pub fn rejection_notice(
    owner_name: &str,
    domain: &str,
    recipient: &str,
    rejected: &[String],
) -> OutgoingMail {
    let mailbox = crate::core::keys::naked_basename(owner_name);
    OutgoingMail {
        to: vec![recipient.to_string()],
        from: format!("{owner_name} <{mailbox}@{domain}>"),
        subject: "Automated response".to_string(),
        text: Some(format!(
            "Automated response\n\nThe following attachments were not delivered because their \
             file type is not supported (PDF and Word documents only):\n{}",
            rejected
                .iter()
                .map(|name| format!("- {name}"))
                .collect::<Vec<_>>()
                .join("\n")
        )),
        ..OutgoingMail::default()
    }
}
