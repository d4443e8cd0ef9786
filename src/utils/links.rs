use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static BRACKETED_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(https?://[^>\s]+)>")
        .unwrap_or_else(|_| Regex::new(r"$^").expect("fallback regex compiles"))
});

static RAW_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>()\[\]{}"']+"#)
        .unwrap_or_else(|_| Regex::new(r"$^").expect("fallback regex compiles"))
});

/// Extract HTTP(S) links from a plaintext mail body.
///
/// Supports raw URLs and the `<https://example.com>` form that plain-text
/// mail clients emit. Output is not deduplicated; pass it through
/// [`normalize_and_dedupe_links`].
#[must_use]
pub fn extract_links_from_text(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();

    for caps in BRACKETED_LINK_RE.captures_iter(text) {
        if let Some(m) = caps.get(1) {
            out.push(trim_trailing_punctuation(m.as_str()).to_string());
        }
    }

    for m in RAW_URL_RE.find_iter(text) {
        out.push(trim_trailing_punctuation(m.as_str()).to_string());
    }

    out
}

#[must_use]
pub fn normalize_and_dedupe_links<I>(raw_links: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<String> = Vec::new();

    for raw in raw_links {
        let trimmed = trim_trailing_punctuation(raw.trim());
        if let Some(norm) = normalize_link(trimmed)
            && seen.insert(norm.clone())
        {
            out.push(norm);
        }
    }

    out
}

#[must_use]
fn normalize_link(raw: &str) -> Option<String> {
    let raw = raw
        .trim()
        .trim_matches(|c: char| matches!(c, '<' | '>' | '"' | '\''));
    if !(raw.starts_with("http://") || raw.starts_with("https://")) {
        return None;
    }

    let mut url = Url::parse(raw).ok()?;
    url.set_fragment(None);

    // Tracking pixels and inline images are not useful as links.
    let path = url.path().to_ascii_lowercase();
    if [".png", ".gif", ".jpg", ".jpeg", ".webp"]
        .iter()
        .any(|ext| path.ends_with(ext))
    {
        return None;
    }

    let rendered = url.to_string();
    Some(rendered.trim_end_matches('/').to_string())
}

#[must_use]
fn trim_trailing_punctuation(s: &str) -> &str {
    s.trim_end_matches(&['.', ',', ';', ':', '!', '?', ')', ']', '}'][..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_bracketed_and_raw_urls() {
        let text = "See <https://www.example.com> and also https://foo.bar/baz).";
        let links = extract_links_from_text(text);
        assert!(links.contains(&"https://www.example.com".to_string()));
        assert!(links.contains(&"https://foo.bar/baz".to_string()));
    }

    #[test]
    fn test_normalize_and_dedupe_drops_images_and_duplicates() {
        let raw = vec![
            "https://example.com/a".to_string(),
            "https://example.com/a/".to_string(),
            "https://example.com/a#section".to_string(),
            "https://track.example.com/open.gif".to_string(),
            "mailto:bob@example.com".to_string(),
        ];
        let norm = normalize_and_dedupe_links(raw);
        assert_eq!(norm, vec!["https://example.com/a".to_string()]);
    }
}
