//! The inbound content pipeline: store plaintext and attachments, summarize,
//! persist the email row, fan out to the owner's live connection.

use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::attachments::{
    attachment_key, effective_content_type, knowledge_base_metadata, knowledge_base_metadata_key,
    knowledge_base_text_key, optimized_content_key, partition_attachments,
};
use super::content::{optimize_email_content, optimized_content_file_name, plain_body};
use super::parse::ParsedEmail;
use super::send::{MailSender, rejection_notice};
use crate::ai::{EmailSummary, Summarizer};
use crate::core::keys::{document_sk, email_sk, encode_inbox_id, encode_sender, local_part, user_pk};
use crate::core::models::{Document, Email, EmailAttachment, Typename, User};
use crate::errors::MailError;
use crate::notify::{ConnectionNotifier, FanOut, push_to_owner};
use crate::store::{MailStore, ObjectStore};
use crate::utils::links::{extract_links_from_text, normalize_and_dedupe_links};

/// Options the pipeline takes from [`AppConfig`](crate::core::config::AppConfig).
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub mail_domain: String,
    pub send_rejection_notices: bool,
}

/// Mailbox routing derived from the envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Display text of the first recipient.
    pub to_text: String,
    /// Base64 of the recipient local part.
    pub inbox_id: String,
    /// Base64 of the sender display text.
    pub sender_id: String,
}

impl Route {
    #[must_use]
    pub fn for_email(email: &ParsedEmail) -> Self {
        let to_address = email.primary_to_address();
        Self {
            to_text: email.primary_to_text(),
            inbox_id: encode_inbox_id(local_part(&to_address)),
            sender_id: encode_sender(&email.from_text()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub email: Email,
    pub summary: EmailSummary,
    pub stored_attachments: Vec<String>,
    pub rejected_attachments: Vec<String>,
    pub fan_out: FanOut,
}

pub struct MailPipeline {
    store: Arc<dyn MailStore>,
    objects: Arc<dyn ObjectStore>,
    summarizer: Arc<dyn Summarizer>,
    notifier: Arc<dyn ConnectionNotifier>,
    sender: Arc<dyn MailSender>,
    options: PipelineOptions,
}

impl MailPipeline {
    #[must_use]
    pub fn new(
        store: Arc<dyn MailStore>,
        objects: Arc<dyn ObjectStore>,
        summarizer: Arc<dyn Summarizer>,
        notifier: Arc<dyn ConnectionNotifier>,
        sender: Arc<dyn MailSender>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            store,
            objects,
            summarizer,
            notifier,
            sender,
            options,
        }
    }

    #[must_use]
    pub fn store(&self) -> &dyn MailStore {
        self.store.as_ref()
    }

    #[must_use]
    pub fn objects(&self) -> &dyn ObjectStore {
        self.objects.as_ref()
    }

    #[must_use]
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Looks up the mailbox owner by the recipient's mailbox address.
    /// A miss (or lookup failure) yields `None`; the mail is still stored.
    pub async fn find_owner(&self, email: &ParsedEmail) -> Option<User> {
        let to_address = email.primary_to_address();
        let mailbox = format!("{}@{}", local_part(&to_address), self.options.mail_domain);

        match self.store.find_user_by_email(&mailbox).await {
            Ok(Some(user)) => {
                info!(user_id = %user.id, "Found mailbox owner");
                Some(user)
            }
            Ok(None) => {
                info!(mailbox = %mailbox, "No user found for mailbox");
                None
            }
            Err(e) => {
                error!(mailbox = %mailbox, "User lookup failed: {}", e);
                None
            }
        }
    }

    /// # Errors
    ///
    /// Returns an error when an upload, the summarization call or the final
    /// row write fails, so the invocation retries.
    pub async fn process(
        &self,
        parsed: &ParsedEmail,
        owner: Option<&User>,
    ) -> Result<ProcessOutcome, MailError> {
        let route = Route::for_email(parsed);
        let email_id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        info!(
            inbox_id = %route.inbox_id,
            email_id = %email_id,
            owner = ?owner.map(|u| u.id.as_str()),
            "Processing email"
        );

        let mut email = Email {
            pk: user_pk(&route.inbox_id),
            sk: email_sk(&route.sender_id, &email_id),
            typename: Typename::Email,
            inbox_id: route.inbox_id.clone(),
            from: parsed.from_text(),
            raw_address: parsed.from_address(),
            to: route.to_text.clone(),
            subject: parsed.subject.clone().unwrap_or_default(),
            date: parsed.date.map_or_else(|| now.clone(), |d| d.to_rfc3339()),
            body: plain_body(parsed),
            read: false,
            attachments: Vec::new(),
            tags: Vec::new(),
            links: Vec::new(),
            summarized_email: String::new(),
            agent_system_prompt: String::new(),
            first_message_from_agent: String::new(),
            optimized_content_key: None,
            replies: None,
            wallet: owner.and_then(|u| u.wallet.clone()),
            created_at: now.clone(),
            updated_at: now.clone(),
        };

        // Plaintext rendering + knowledge-base sidecar
        let optimized = optimize_email_content(parsed);
        let file_name = optimized_content_file_name(&email.subject, &email.from);
        email.optimized_content_key = Some(optimized_content_key(
            &route.inbox_id,
            &email_id,
            &file_name,
        ));

        self.objects
            .put_object(
                &knowledge_base_text_key(&file_name, &route.inbox_id, "txt"),
                optimized.into_bytes(),
                "text/plain",
            )
            .await?;
        let metadata = knowledge_base_metadata(&route.inbox_id, &now);
        self.objects
            .put_object(
                &knowledge_base_metadata_key(&file_name, &route.inbox_id, "txt"),
                serde_json::to_vec(&metadata)?,
                "application/json",
            )
            .await?;

        // Attachments
        let (accepted, rejected) = partition_attachments(&parsed.attachments);
        let rejected_names: Vec<String> = rejected.iter().map(|a| a.filename.clone()).collect();
        for name in &rejected_names {
            warn!(filename = %name, "Rejecting attachment with unsupported content type");
        }

        let mut stored = Vec::with_capacity(accepted.len());
        for (position, attachment) in accepted.into_iter().enumerate() {
            let content_type = effective_content_type(attachment);
            let key = attachment_key(&route.inbox_id, &email_id, position, &attachment.filename);

            email.attachments.push(EmailAttachment {
                filename: attachment.filename.clone(),
                content_type: content_type.clone(),
                size: attachment.size(),
                s3_key: key.clone(),
            });

            self.store
                .put_document(&Document {
                    pk: user_pk(&route.inbox_id),
                    sk: document_sk(&route.sender_id, &email_id, position),
                    id: email_id.clone(),
                    email: route.sender_id.clone(),
                    name: attachment.filename.clone(),
                    s3_key: key.clone(),
                    created_by: route.inbox_id.clone(),
                    created_at: Utc::now().to_rfc3339(),
                    read: false,
                    typename: Typename::Document,
                })
                .await?;

            self.objects
                .put_object(&key, attachment.content.clone(), &content_type)
                .await?;
            info!(filename = %attachment.filename, key = %key, "Stored attachment");
            stored.push(attachment.filename.clone());
        }

        // Summarization
        let summary = self
            .summarizer
            .summarize(&email.body, &email.from, owner)
            .await?;
        merge_summary(&mut email, &summary);

        self.store.put_email(&email).await?;

        let payload = serde_json::to_string(&summary)?;
        let fan_out =
            push_to_owner(self.store.as_ref(), self.notifier.as_ref(), &route.inbox_id, &payload)
                .await;

        if !rejected_names.is_empty() {
            self.notify_rejections(parsed, owner, &rejected_names).await;
        }

        info!(
            stored = stored.len(),
            rejected = rejected_names.len(),
            fan_out = ?fan_out,
            "Email processing completed"
        );

        Ok(ProcessOutcome {
            email,
            summary,
            stored_attachments: stored,
            rejected_attachments: rejected_names,
            fan_out,
        })
    }

    async fn notify_rejections(&self, parsed: &ParsedEmail, owner: Option<&User>, rejected: &[String]) {
        if !self.options.send_rejection_notices {
            return;
        }
        let Some(owner) = owner else {
            return;
        };
        let sender = parsed.from_address();
        if sender.is_empty() {
            return;
        }

        let notice = rejection_notice(&owner.name, &self.options.mail_domain, &sender, rejected);
        if let Err(e) = self.sender.send(&notice).await {
            error!("Error sending rejection email: {}", e);
        }
    }
}

/// Copies model output onto the row; links are unioned with the ones found in
/// the body.
pub fn merge_summary(email: &mut Email, summary: &EmailSummary) {
    email.tags = summary.tags.clone();
    email.first_message_from_agent = summary.first_message_from_agent.clone();
    email.agent_system_prompt = summary.system_prompt.clone();
    email.summarized_email = summary.summarized_email.clone();

    let found = extract_links_from_text(&email.body);
    email.links = normalize_and_dedupe_links(summary.links.iter().cloned().chain(found));
}
