//! Attachment whitelisting and object-key layout.

use serde_json::{Value, json};

use super::content::sanitize_file_name;
use super::parse::ParsedAttachment;

pub const ALLOWED_ATTACHMENT_TYPES: [&str; 3] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

const GENERIC_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type to store and whitelist against; a missing or generic type is
/// guessed from the file extension.
#[must_use]
pub fn effective_content_type(attachment: &ParsedAttachment) -> String {
    let declared = attachment
        .content_type
        .as_deref()
        .map(|ct| ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty());

    match declared {
        Some(ct) if ct != GENERIC_CONTENT_TYPE => ct,
        _ => mime_guess::from_path(&attachment.filename)
            .first()
            .map_or_else(|| GENERIC_CONTENT_TYPE.to_string(), |m| m.essence_str().to_string()),
    }
}

#[must_use]
pub fn is_allowed_attachment(content_type: &str) -> bool {
    ALLOWED_ATTACHMENT_TYPES.contains(&content_type)
}

/// Splits attachments into (accepted, rejected), keeping the original order.
#[must_use]
pub fn partition_attachments(
    attachments: &[ParsedAttachment],
) -> (Vec<&ParsedAttachment>, Vec<&ParsedAttachment>) {
    attachments
        .iter()
        .partition(|a| is_allowed_attachment(&effective_content_type(a)))
}

/// Object key for the attachment at `position`; the position keeps keys
/// distinct when names repeat or sanitize to nothing.
#[must_use]
pub fn attachment_key(inbox_id: &str, email_id: &str, position: usize, filename: &str) -> String {
    let name = sanitize_file_name(filename);
    if name.is_empty() {
        format!("documents/{inbox_id}/{email_id}/{position}-attachment")
    } else {
        format!("documents/{inbox_id}/{email_id}/{position}-{name}")
    }
}

#[must_use]
pub fn optimized_content_key(inbox_id: &str, email_id: &str, file_name: &str) -> String {
    format!("emails/{inbox_id}/{email_id}/{file_name}")
}

#[must_use]
pub fn knowledge_base_text_key(file_name: &str, inbox_id: &str, extension: &str) -> String {
    format!("attachments/{file_name}_{inbox_id}.{extension}")
}

#[must_use]
pub fn knowledge_base_metadata_key(file_name: &str, inbox_id: &str, extension: &str) -> String {
    format!("attachments/{file_name}_{inbox_id}.{extension}.metadata.json")
}

/// Sidecar metadata the knowledge base uses to filter documents by owner.
#[must_use]
pub fn knowledge_base_metadata(created_by: &str, uploaded_at: &str) -> Value {
    json!({
        "metadataAttributes": {
            "documentType": "email",
            "createdBy": created_by,
            "uploadedAt": uploaded_at,
        }
    })
}
