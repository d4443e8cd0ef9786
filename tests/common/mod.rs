//! In-memory stand-ins for the AWS and HTTP collaborators.
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use basemail::MailError;
use basemail::ai::{EmailSummary, Summarizer};
use basemail::api::IdentityProvider;
use basemail::core::keys::{connection_key, user_pk};
use basemail::core::models::{Connection, Document, Email, Inbox, Typename, User};
use basemail::core::names::NameResolver;
use basemail::mail::{MailSender, OutgoingMail};
use basemail::notify::{AlertSink, ConnectionNotifier, PostOutcome};
use basemail::socket::{ChatQueue, ChatRequest};
use basemail::store::{MailStore, ObjectStore};

#[derive(Default)]
pub struct MemoryStore {
    pub users: Mutex<Vec<User>>,
    pub inboxes: Mutex<Vec<Inbox>>,
    pub emails: Mutex<Vec<Email>>,
    pub documents: Mutex<Vec<Document>>,
    pub connections: Mutex<HashMap<String, Connection>>,
    pub fail_writes: AtomicBool,
    pub fail_user_lookups: AtomicBool,
}

impl MemoryStore {
    fn check_writable(&self) -> Result<(), MailError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(MailError::StoreError("write rejected".to_string()));
        }
        Ok(())
    }

    pub fn emails(&self) -> Vec<Email> {
        self.emails.lock().unwrap().clone()
    }

    pub fn documents(&self) -> Vec<Document> {
        self.documents.lock().unwrap().clone()
    }

    pub fn connection(&self, inbox_id: &str) -> Option<Connection> {
        self.connections
            .lock()
            .unwrap()
            .get(&connection_key(inbox_id))
            .cloned()
    }
}

fn upsert<T: Clone>(rows: &Mutex<Vec<T>>, row: &T, same: impl Fn(&T) -> bool) {
    let mut rows = rows.lock().unwrap();
    rows.retain(|r| !same(r));
    rows.push(row.clone());
}

#[async_trait]
impl MailStore for MemoryStore {
    async fn put_user(&self, user: &User) -> Result<(), MailError> {
        self.check_writable()?;
        upsert(&self.users, user, |u| u.sk == user.sk);
        Ok(())
    }

    async fn put_inbox(&self, inbox: &Inbox) -> Result<(), MailError> {
        self.check_writable()?;
        upsert(&self.inboxes, inbox, |i| i.sk == inbox.sk);
        Ok(())
    }

    async fn put_email(&self, email: &Email) -> Result<(), MailError> {
        self.check_writable()?;
        upsert(&self.emails, email, |e| e.pk == email.pk && e.sk == email.sk);
        Ok(())
    }

    async fn put_document(&self, document: &Document) -> Result<(), MailError> {
        self.check_writable()?;
        upsert(&self.documents, document, |d| {
            d.pk == document.pk && d.sk == document.sk
        });
        Ok(())
    }

    async fn get_inbox(&self, inbox_id: &str) -> Result<Option<Inbox>, MailError> {
        Ok(self
            .inboxes
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == inbox_id)
            .cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, MailError> {
        if self.fail_user_lookups.load(Ordering::SeqCst) {
            return Err(MailError::StoreError("index unavailable".to_string()));
        }
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email && u.typename == Typename::User)
            .cloned())
    }

    async fn list_emails(&self, inbox_id: &str) -> Result<Vec<Email>, MailError> {
        let pk = user_pk(inbox_id);
        Ok(self
            .emails
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.pk == pk && e.sk.starts_with("EMAIL#"))
            .cloned()
            .collect())
    }

    async fn set_read(&self, inbox_id: &str, sk: &str, read: bool) -> Result<(), MailError> {
        self.check_writable()?;
        let pk = user_pk(inbox_id);
        let mut emails = self.emails.lock().unwrap();
        let email = emails
            .iter_mut()
            .find(|e| e.pk == pk && e.sk == sk)
            .ok_or_else(|| MailError::StoreError("conditional check failed".to_string()))?;
        email.read = read;
        Ok(())
    }

    async fn delete_email(&self, inbox_id: &str, sk: &str) -> Result<(), MailError> {
        self.check_writable()?;
        let pk = user_pk(inbox_id);
        self.emails
            .lock()
            .unwrap()
            .retain(|e| !(e.pk == pk && e.sk == sk));
        Ok(())
    }

    async fn get_connection(&self, inbox_id: &str) -> Result<Option<Connection>, MailError> {
        Ok(self.connection(inbox_id))
    }

    async fn put_connection(&self, connection: &Connection) -> Result<(), MailError> {
        self.check_writable()?;
        self.connections
            .lock()
            .unwrap()
            .insert(connection.connection_id.clone(), connection.clone());
        Ok(())
    }

    async fn delete_connection(&self, inbox_id: &str) -> Result<(), MailError> {
        self.connections
            .lock()
            .unwrap()
            .remove(&connection_key(inbox_id));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryObjects {
    /// Inbound objects keyed by `(bucket, key)`.
    pub inbound: Mutex<HashMap<(String, String), Vec<u8>>>,
    /// Knowledge-base writes: key, body, content type.
    pub written: Mutex<Vec<(String, Vec<u8>, String)>>,
}

impl MemoryObjects {
    pub fn with_object(bucket: &str, key: &str, body: &[u8]) -> Self {
        let objects = Self::default();
        objects
            .inbound
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), body.to_vec());
        objects
    }

    pub fn written_keys(&self) -> Vec<String> {
        self.written
            .lock()
            .unwrap()
            .iter()
            .map(|(k, _, _)| k.clone())
            .collect()
    }

    pub fn written_object(&self, key: &str) -> Option<(Vec<u8>, String)> {
        self.written
            .lock()
            .unwrap()
            .iter()
            .find(|(k, _, _)| k == key)
            .map(|(_, body, ct)| (body.clone(), ct.clone()))
    }
}

#[async_trait]
impl ObjectStore for MemoryObjects {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, MailError> {
        self.inbound
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| MailError::ObjectStoreError(format!("NoSuchKey: {bucket}/{key}")))
    }

    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), MailError> {
        self.written
            .lock()
            .unwrap()
            .push((key.to_string(), body, content_type.to_string()));
        Ok(())
    }
}

/// Returns a fixed summary, or fails when `summary` is `None`.
pub struct StubSummarizer {
    pub summary: Option<EmailSummary>,
    pub calls: Mutex<Vec<(String, String, Option<String>)>>,
}

impl StubSummarizer {
    pub fn returning(summary: EmailSummary) -> Self {
        Self {
            summary: Some(summary),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            summary: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Summarizer for StubSummarizer {
    async fn summarize(
        &self,
        email_content: &str,
        sent_from: &str,
        owner: Option<&User>,
    ) -> Result<EmailSummary, MailError> {
        self.calls.lock().unwrap().push((
            email_content.to_string(),
            sent_from.to_string(),
            owner.map(|u| u.id.clone()),
        ));
        self.summary
            .clone()
            .ok_or_else(|| MailError::ModelError("throttled".to_string()))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub posts: Mutex<Vec<(String, String)>>,
    pub gone: Mutex<HashSet<String>>,
}

impl RecordingNotifier {
    pub fn posts(&self) -> Vec<(String, String)> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConnectionNotifier for RecordingNotifier {
    async fn post(&self, socket_id: &str, payload: &str) -> Result<PostOutcome, MailError> {
        if self.gone.lock().unwrap().contains(socket_id) {
            return Ok(PostOutcome::Gone);
        }
        self.posts
            .lock()
            .unwrap()
            .push((socket_id.to_string(), payload.to_string()));
        Ok(PostOutcome::Delivered)
    }
}

#[derive(Default)]
pub struct RecordingSender {
    pub sent: Mutex<Vec<OutgoingMail>>,
}

impl RecordingSender {
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailSender for RecordingSender {
    async fn send(&self, mail: &OutgoingMail) -> Result<Option<String>, MailError> {
        mail.validate()?;
        let mut sent = self.sent.lock().unwrap();
        sent.push(mail.clone());
        Ok(Some(format!("ses-{}", sent.len())))
    }
}

/// Resolves wallets from a fixed table.
#[derive(Default)]
pub struct StaticResolver {
    pub names: HashMap<String, String>,
}

impl StaticResolver {
    pub fn with(wallet: &str, basename: &str) -> Self {
        let mut names = HashMap::new();
        names.insert(wallet.to_string(), basename.to_string());
        Self { names }
    }
}

#[async_trait]
impl NameResolver for StaticResolver {
    async fn resolve(&self, wallet: &str) -> Result<Option<String>, MailError> {
        Ok(self.names.get(wallet).cloned())
    }
}

#[derive(Default)]
pub struct RecordingIdentity {
    pub deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl IdentityProvider for RecordingIdentity {
    async fn delete_user(&self, user_id: &str) -> Result<(), MailError> {
        self.deleted.lock().unwrap().push(user_id.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingQueue {
    pub requests: Mutex<Vec<ChatRequest>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl ChatQueue for RecordingQueue {
    async fn enqueue(&self, request: &ChatRequest) -> Result<Option<String>, MailError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailError::AwsError("queue unavailable".to_string()));
        }
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        Ok(Some(format!("msg-{}", requests.len())))
    }
}

/// Fails for bodies whose description contains `fail_on`.
#[derive(Default)]
pub struct RecordingSink {
    pub bodies: Mutex<Vec<Value>>,
    pub fail_on: Option<String>,
}

#[async_trait]
impl AlertSink for RecordingSink {
    async fn send(&self, body: &Value) -> Result<(), MailError> {
        let description = body["embeds"][0]["description"].as_str().unwrap_or_default();
        if let Some(marker) = &self.fail_on
            && description.contains(marker.as_str())
        {
            return Err(MailError::HttpError("Discord webhook returned 500".to_string()));
        }
        self.bodies.lock().unwrap().push(body.clone());
        Ok(())
    }
}

pub fn user(id: &str, naked: &str, wallet: &str) -> User {
    User {
        pk: "USER".to_string(),
        sk: id.to_string(),
        id: id.to_string(),
        name: format!("{naked}.base.eth"),
        inbox_id: basemail::core::keys::encode_inbox_id(naked),
        wallet: Some(wallet.to_string()),
        email: format!("{naked}@basemail.me"),
        context: "Founder of a small design studio".to_string(),
        typename: Typename::User,
        created_at: None,
        updated_at: None,
    }
}

pub fn inbox_for(user: &User) -> Inbox {
    Inbox {
        pk: "INBOX".to_string(),
        sk: basemail::core::keys::inbox_mapping_sk(&user.inbox_id),
        id: user.inbox_id.clone(),
        name: user.name.clone(),
        email: user.email.clone(),
        created_by: user.id.clone(),
        blocked_addresses: Vec::new(),
        company_id: None,
        typename: Typename::Inbox,
        created_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

pub fn connection_for(inbox_id: &str, socket_id: &str) -> Connection {
    Connection {
        connection_id: connection_key(inbox_id),
        socket_id: socket_id.to_string(),
        user_id: inbox_id.to_string(),
        ttl: 4_102_444_800,
        typename: Typename::Connection,
    }
}

pub fn summary() -> EmailSummary {
    EmailSummary {
        from: "Bob Builder".to_string(),
        kind: "email".to_string(),
        first_message_from_agent: "Bob sent you the quote.".to_string(),
        system_prompt: "You are discussing a quote from Bob.".to_string(),
        summarized_email: "Bob quotes 1200 USD for the deck.".to_string(),
        tags: vec!["quote".to_string(), "construction".to_string()],
        links: vec!["https://quotes.example.com/123".to_string()],
    }
}
