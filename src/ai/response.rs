//! Extraction and repair of the model's JSON summary.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use tracing::warn;

use crate::errors::MailError;

/// Structured summary returned by the model and pushed to live clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailSummary {
    #[serde(deserialize_with = "null_as_default")]
    pub from: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub first_message_from_agent: String,
    #[serde(deserialize_with = "null_as_default")]
    pub system_prompt: String,
    #[serde(deserialize_with = "null_as_default")]
    pub summarized_email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub links: Vec<String>,
}

/// The model writes `null` for fields it has nothing for.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|_| Regex::new(r"$^").expect("fallback regex compiles"))
}

static CONTROL_RE: LazyLock<Regex> = LazyLock::new(|| regex(r"[\n\r\t\x08\x0C\x0B]"));
static SPACES_RE: LazyLock<Regex> = LazyLock::new(|| regex(r"\s+"));
static REPEATED_QUOTES_RE: LazyLock<Regex> = LazyLock::new(|| regex(r#""{2,}"#));
static BARE_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| regex(r#"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:"#));

/// Text of the first content block(s) in an Anthropic messages response.
///
/// # Errors
///
/// Returns a `ModelError` if the body is not JSON or carries no text.
pub fn extract_model_text(body: &[u8]) -> Result<String, MailError> {
    let response: Value = serde_json::from_slice(body)
        .map_err(|e| MailError::ModelError(format!("Failed to parse model response: {e}")))?;

    let collected: Vec<&str> = response
        .get("content")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter(|p| p.get("type").and_then(Value::as_str).is_none_or(|t| t == "text"))
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if collected.is_empty() {
        return Err(MailError::ModelError("No text in model response".to_string()));
    }
    Ok(collected.join(""))
}

/// Flattens the model text into a single line and trims it to the outermost
/// JSON object.
#[must_use]
pub fn sanitize_model_text(raw: &str) -> String {
    let flattened = CONTROL_RE.replace_all(raw, " ");
    let collapsed = SPACES_RE.replace_all(&flattened, " ");
    let unescaped = collapsed.replace("\\\"", "\"");
    let squashed = REPEATED_QUOTES_RE.replace_all(&unescaped, "\"");
    outermost_object(squashed.trim()).to_string()
}

fn outermost_object(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

/// Quotes bare object keys, the most common structural slip.
#[must_use]
pub fn repair_json(text: &str) -> String {
    BARE_KEY_RE.replace_all(text, "$1\"$2\":").into_owned()
}

/// # Errors
///
/// Returns a `ModelError` if neither the sanitized nor the repaired text is a
/// JSON summary.
pub fn parse_summary(raw: &str) -> Result<EmailSummary, MailError> {
    if let Ok(summary) = serde_json::from_str::<EmailSummary>(outermost_object(raw.trim())) {
        return Ok(summary);
    }

    let sanitized = sanitize_model_text(raw);

    match serde_json::from_str::<EmailSummary>(&sanitized) {
        Ok(summary) => Ok(summary),
        Err(first) => {
            warn!("Model output was not valid JSON ({}), attempting repair", first);
            let repaired = repair_json(&sanitized);
            serde_json::from_str::<EmailSummary>(&repaired).map_err(|e| {
                MailError::ModelError(format!("Model output is not a JSON summary: {e}"))
            })
        }
    }
}
