//! Key construction for the single-table design.
//!
//! Mailboxes are identified by the standard base64 encoding of the naked
//! basename (`alice` for `alice.base.eth`), which is also the local part of
//! the mailbox address.

use base64::{Engine as _, engine::general_purpose::STANDARD};

pub const USER_PK: &str = "USER";
pub const INBOX_PK: &str = "INBOX";
pub const EMAIL_PREFIX: &str = "EMAIL#";
pub const DOCUMENT_PREFIX: &str = "DOCUMENT#";
pub const BASENAME_SUFFIX: &str = ".base.eth";
pub const USER_EMAIL_INDEX: &str = "byUserEmail";

#[must_use]
pub fn encode_inbox_id(naked_name: &str) -> String {
    STANDARD.encode(naked_name.as_bytes())
}

#[must_use]
pub fn decode_inbox_id(inbox_id: &str) -> Option<String> {
    STANDARD
        .decode(inbox_id)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
}

#[must_use]
pub fn encode_sender(from_text: &str) -> String {
    STANDARD.encode(from_text.as_bytes())
}

#[must_use]
pub fn user_pk(inbox_id: &str) -> String {
    format!("USER#{inbox_id}")
}

#[must_use]
pub fn email_sk(sender_b64: &str, email_id: &str) -> String {
    format!("{EMAIL_PREFIX}{sender_b64}#{email_id}")
}

/// Sort-key prefix for a mailbox's emails, optionally narrowed to one sender.
#[must_use]
pub fn email_sk_prefix(sender_b64: Option<&str>) -> String {
    match sender_b64 {
        Some(sender) => format!("{EMAIL_PREFIX}{sender}#"),
        None => EMAIL_PREFIX.to_string(),
    }
}

/// One document row per stored attachment, ordered by position in the mail.
#[must_use]
pub fn document_sk(sender_b64: &str, email_id: &str, position: usize) -> String {
    format!("{DOCUMENT_PREFIX}{sender_b64}#{email_id}#{position}")
}

#[must_use]
pub fn inbox_mapping_sk(inbox_id: &str) -> String {
    format!("MAPPING#{inbox_id}#")
}

/// Key of the connection row in the WebSocket table.
#[must_use]
pub fn connection_key(inbox_id: &str) -> String {
    user_pk(inbox_id)
}

/// Drops the `.base.eth` suffix from a resolved basename.
#[must_use]
pub fn naked_basename(basename: &str) -> &str {
    basename.strip_suffix(BASENAME_SUFFIX).unwrap_or(basename)
}

#[must_use]
pub fn mailbox_address(naked_name: &str, domain: &str) -> String {
    format!("{naked_name}@{domain}")
}

/// The trimmed local part of an address. Case is preserved.
#[must_use]
pub fn local_part(address: &str) -> &str {
    address.split('@').next().unwrap_or_default().trim()
}
