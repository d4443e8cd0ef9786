//! Accessors over API Gateway HTTP API (payload v2) events.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::Value;

use crate::errors::MailError;

pub fn v_path<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut cur = root;
    for key in path {
        cur = cur.get(*key)?;
    }
    Some(cur)
}

pub fn v_str<'a>(root: &'a Value, path: &[&str]) -> Option<&'a str> {
    v_path(root, path).and_then(|v| v.as_str())
}

pub fn get_header_value<'a>(headers: &'a Value, name: &str) -> Option<&'a str> {
    if let Some(v) = headers.get(name).and_then(|s| s.as_str()) {
        return Some(v);
    }
    headers.as_object().and_then(|map| {
        map.iter().find_map(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                v.as_str()
            } else {
                None
            }
        })
    })
}

#[must_use]
pub fn raw_path(event: &Value) -> Option<&str> {
    v_str(event, &["rawPath"]).or_else(|| v_str(event, &["path"]))
}

#[must_use]
pub fn http_method(event: &Value) -> Option<&str> {
    v_str(event, &["requestContext", "http", "method"]).or_else(|| v_str(event, &["httpMethod"]))
}

/// The `wallet` claim placed by the JWT authorizer.
#[must_use]
pub fn wallet_claim(event: &Value) -> Option<&str> {
    v_str(event, &["requestContext", "authorizer", "jwt", "claims", "wallet"])
        .filter(|w| !w.is_empty())
}

/// The request body as text, decoding `isBase64Encoded` payloads. A missing
/// body is the empty string.
///
/// # Errors
///
/// Returns a `ParseError` when a base64 body does not decode to UTF-8.
pub fn request_body(event: &Value) -> Result<String, MailError> {
    let Some(body) = v_str(event, &["body"]) else {
        return Ok(String::new());
    };

    let encoded = event
        .get("isBase64Encoded")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !encoded {
        return Ok(body.to_string());
    }

    let bytes = STANDARD
        .decode(body)
        .map_err(|e| MailError::ParseError(format!("Invalid base64 body: {e}")))?;
    String::from_utf8(bytes).map_err(|e| MailError::ParseError(format!("Body is not UTF-8: {e}")))
}

/// `mailId` from the path parameters, then the query string, then the body.
#[must_use]
pub fn mail_id(event: &Value, body: Option<&Value>) -> Option<String> {
    v_str(event, &["pathParameters", "mailId"])
        .or_else(|| v_str(event, &["queryStringParameters", "mailId"]))
        .or_else(|| body.and_then(|b| v_str(b, &["mailId"])))
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
}

/// The bare address out of `Name <addr>`.
#[must_use]
pub fn bare_address(recipient: &str) -> &str {
    match (recipient.rfind('<'), recipient.rfind('>')) {
        (Some(start), Some(end)) if start < end => recipient[start + 1..end].trim(),
        _ => recipient.trim(),
    }
}
