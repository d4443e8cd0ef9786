//! Persistence seams: the single-table store and object storage.

pub mod attributes;
pub mod dynamo;
pub mod objects;

use async_trait::async_trait;

use crate::core::models::{Connection, Document, Email, Inbox, User};
use crate::errors::MailError;

pub use dynamo::DynamoMailStore;
pub use objects::S3ObjectStore;

/// Rows of the core table plus the WebSocket connection table.
#[async_trait]
pub trait MailStore: Send + Sync {
    async fn put_user(&self, user: &User) -> Result<(), MailError>;

    async fn put_inbox(&self, inbox: &Inbox) -> Result<(), MailError>;

    async fn put_email(&self, email: &Email) -> Result<(), MailError>;

    async fn put_document(&self, document: &Document) -> Result<(), MailError>;

    /// The `INBOX` / `MAPPING#<inboxId>#` row.
    async fn get_inbox(&self, inbox_id: &str) -> Result<Option<Inbox>, MailError>;

    /// First `User` row on the `byUserEmail` index.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, MailError>;

    /// Every `EMAIL#` row of a mailbox.
    async fn list_emails(&self, inbox_id: &str) -> Result<Vec<Email>, MailError>;

    async fn set_read(&self, inbox_id: &str, sk: &str, read: bool) -> Result<(), MailError>;

    async fn delete_email(&self, inbox_id: &str, sk: &str) -> Result<(), MailError>;

    async fn get_connection(&self, inbox_id: &str) -> Result<Option<Connection>, MailError>;

    async fn put_connection(&self, connection: &Connection) -> Result<(), MailError>;

    async fn delete_connection(&self, inbox_id: &str) -> Result<(), MailError>;

    /// Finds a mailbox email by the uuid at the end of its sort key.
    async fn find_email(&self, inbox_id: &str, email_id: &str) -> Result<Option<Email>, MailError> {
        let emails = self.list_emails(inbox_id).await?;
        Ok(emails.into_iter().find(|e| e.email_id() == email_id))
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Reads an inbound object from the bucket that received it.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, MailError>;

    /// Writes an object to the knowledge-base bucket.
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), MailError>;
}
