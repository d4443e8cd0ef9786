//! Plaintext rendering of inbound mail for the knowledge base and the model.

use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

use super::parse::ParsedEmail;

/// Longest sanitized component allowed in an object key.
pub const MAX_FILE_NAME_LEN: usize = 50;

const HTML_RENDER_WIDTH: usize = 10_000;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap_or_else(|_| never_matches()));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").unwrap_or_else(|_| never_matches()));
static FILE_NAME_DISALLOWED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9 \-_.]").unwrap_or_else(|_| never_matches()));
static FILE_NAME_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_]+").unwrap_or_else(|_| never_matches()));

fn never_matches() -> Regex {
    Regex::new(r"$^").expect("fallback regex compiles")
}

#[must_use]
pub fn strip_html_tags(input: &str) -> String {
    TAG_RE.replace_all(input, "").replace("&nbsp;", " ")
}

/// Renders an HTML body as readable text, falling back to tag stripping.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    match html2text::from_read(html.as_bytes(), HTML_RENDER_WIDTH) {
        Ok(text) => text,
        Err(e) => {
            warn!("html2text failed, stripping tags instead: {}", e);
            strip_html_tags(html)
        }
    }
}

#[must_use]
pub fn collapse_whitespace(input: &str) -> String {
    WHITESPACE_RE.replace_all(input, " ").trim().to_string()
}

/// The body used for storage and summarization: the text part, or the HTML
/// part rendered as text when there is no text.
#[must_use]
pub fn plain_body(email: &ParsedEmail) -> String {
    let text = email.text.as_deref().unwrap_or_default();
    if text.trim().is_empty() {
        email.html.as_deref().map(html_to_text).unwrap_or_default()
    } else {
        text.to_string()
    }
}

/// Header block, a blank line, then the whitespace-collapsed body.
#[must_use]
pub fn optimize_email_content(email: &ParsedEmail) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(subject) = email.subject.as_deref().filter(|s| !s.is_empty()) {
        parts.push(format!("Subject: {subject}"));
    }
    let from = email.from_text();
    if !from.is_empty() {
        parts.push(format!("From: {from}"));
    }
    if !email.to.is_empty() {
        parts.push(format!("To: {}", email.to_text()));
    }
    if let Some(date) = email.date {
        parts.push(format!("Date: {}", date.to_rfc3339()));
    }

    let attachment_names: Vec<&str> = email
        .attachments
        .iter()
        .map(|a| a.filename.as_str())
        .filter(|n| !n.is_empty())
        .collect();
    if !email.attachments.is_empty() {
        parts.push(format!("Attachments: {}", attachment_names.join(", ")));
    }

    parts.push(String::new());
    parts.push(collapse_whitespace(&strip_html_tags(&plain_body(email))));

    parts.join("\n")
}

#[must_use]
pub fn sanitize_file_name(input: &str) -> String {
    let kept = FILE_NAME_DISALLOWED_RE.replace_all(input, "");
    let hyphenated = FILE_NAME_SEPARATOR_RE.replace_all(&kept, "-");
    hyphenated
        .trim_matches('-')
        .chars()
        .take(MAX_FILE_NAME_LEN)
        .collect()
}

#[must_use]
pub fn optimized_content_file_name(subject: &str, from: &str) -> String {
    format!(
        "email-{}-{}",
        sanitize_file_name(subject),
        sanitize_file_name(from)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_tags_and_nbsp() {
        assert_eq!(strip_html_tags("<p>Hi&nbsp;there</p>"), "Hi there");
    }

    #[test]
    fn test_sanitizes_file_names() {
        assert_eq!(sanitize_file_name("  Re: Invoice #42 (final)_v2 "), "Re-Invoice-42-final-v2");
        assert_eq!(sanitize_file_name(&"x".repeat(80)).len(), MAX_FILE_NAME_LEN);
        assert_eq!(sanitize_file_name("---"), "");
    }
}
