//! `/v1/mail`: the caller's mailbox, resolved from the wallet claim.

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info, warn};

use super::handler::ApiService;
use super::helpers::{RouteError, RouteResult, api_response, message_response, reject};
use super::parsing::{bare_address, mail_id, request_body, wallet_claim};
use crate::core::keys::{encode_inbox_id, naked_basename};
use crate::core::models::Inbox;
use crate::errors::MailError;
use crate::mail::OutgoingMail;
use crate::notify::{FanOut, push_to_owner};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadUpdate {
    #[serde(default = "default_read")]
    read: bool,
}

fn default_read() -> bool {
    true
}

fn parse_json_body(event: &Value) -> Result<Option<Value>, RouteError> {
    let body = request_body(event)?;
    if body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&body)
        .map(Some)
        .map_err(|_| reject(400, "Invalid request body"))
}

impl ApiService {
    /// Wallet claim → basename → inbox mapping row.
    async fn caller_inbox(&self, event: &Value) -> Result<Inbox, RouteError> {
        let Some(wallet) = wallet_claim(event) else {
            warn!("Request without wallet claim");
            return Err(reject(401, "Unauthorized"));
        };

        let Some(basename) = self.names.resolve(wallet).await? else {
            info!(wallet = %wallet, "No base name found");
            return Err(reject(404, "Inbox not found"));
        };

        let inbox_id = encode_inbox_id(naked_basename(&basename));
        match self.store.get_inbox(&inbox_id).await? {
            Some(inbox) => Ok(inbox),
            None => {
                info!(inbox_id = %inbox_id, "Inbox not found");
                Err(reject(404, "Inbox not found"))
            }
        }
    }

    pub(super) async fn list_mail(&self, event: &Value) -> RouteResult {
        let inbox = self.caller_inbox(event).await?;
        let emails = self.store.list_emails(&inbox.id).await?;
        info!(inbox_id = %inbox.id, count = emails.len(), "Listed mail");

        let body = serde_json::to_value(&emails).map_err(MailError::from)?;
        Ok(api_response(200, &body))
    }

    pub(super) async fn send_mail(&self, event: &Value) -> RouteResult {
        let inbox = self.caller_inbox(event).await?;
        let body = parse_json_body(event)?.ok_or_else(|| reject(400, "Invalid request body"))?;
        let mut mail: OutgoingMail =
            serde_json::from_value(body).map_err(|_| reject(400, "Invalid request body"))?;

        mail.from = format!("{} <{}>", inbox.name, inbox.email);
        if let Err(e) = mail.validate() {
            let message = match e {
                MailError::ParseError(m) => m,
                other => other.to_string(),
            };
            return Err(reject(400, &message));
        }

        let payload = serde_json::to_string(&mail).map_err(MailError::from)?;
        let message_id = self.sender.send(&mail).await?;

        // The mail is out; pushes below are best effort.
        let mut delivered = 0usize;
        let internal_suffix = format!("@{}", self.settings.mail_domain);
        for recipient in &mail.to {
            let address = bare_address(recipient);
            if !address.to_ascii_lowercase().ends_with(&internal_suffix) {
                continue;
            }
            let user = match self.store.find_user_by_email(address).await {
                Ok(Some(user)) => user,
                Ok(None) => {
                    info!(recipient = %address, "Recipient is not a Basemail user");
                    continue;
                }
                Err(e) => {
                    error!(recipient = %address, "Recipient lookup failed: {}", e);
                    continue;
                }
            };
            let fan_out =
                push_to_owner(self.store.as_ref(), self.notifier.as_ref(), &user.inbox_id, &payload)
                    .await;
            if fan_out == FanOut::Delivered {
                delivered += 1;
            }
        }

        info!(
            inbox_id = %inbox.id,
            recipients = mail.to.len(),
            pushed = delivered,
            "Mail sent"
        );
        Ok(api_response(
            200,
            &json!({ "message": "Mail created", "messageId": message_id }),
        ))
    }

    pub(super) async fn update_mail(&self, event: &Value) -> RouteResult {
        let inbox = self.caller_inbox(event).await?;
        let body = parse_json_body(event)?;
        let Some(id) = mail_id(event, body.as_ref()) else {
            return Err(reject(400, "Mail ID is required"));
        };
        let update: ReadUpdate = match body {
            Some(b) => serde_json::from_value(b).map_err(|_| reject(400, "Invalid request body"))?,
            None => ReadUpdate { read: true },
        };

        let Some(email) = self.store.find_email(&inbox.id, &id).await? else {
            return Err(reject(404, "Mail not found"));
        };

        self.store.set_read(&inbox.id, &email.sk, update.read).await?;
        info!(inbox_id = %inbox.id, mail_id = %id, read = update.read, "Mail updated");
        Ok(message_response(200, "Mail updated"))
    }

    pub(super) async fn delete_mail(&self, event: &Value) -> RouteResult {
        let inbox = self.caller_inbox(event).await?;
        let body = parse_json_body(event).ok().flatten();
        let Some(id) = mail_id(event, body.as_ref()) else {
            return Err(reject(400, "Mail ID is required"));
        };

        let Some(email) = self.store.find_email(&inbox.id, &id).await? else {
            return Err(reject(404, "Mail not found"));
        };

        self.store.delete_email(&inbox.id, &email.sk).await?;
        info!(inbox_id = %inbox.id, mail_id = %id, "Mail deleted");
        Ok(message_response(200, "Mail deleted"))
    }
}
