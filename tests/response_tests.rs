use basemail::ai::response::{extract_model_text, parse_summary, sanitize_model_text};
use serde_json::json;

#[test]
fn test_extract_model_text_joins_text_blocks() {
    let body = json!({
        "id": "msg_1",
        "content": [
            { "type": "text", "text": "{\"from\": " },
            { "type": "text", "text": "\"Bob\"}" }
        ],
        "stop_reason": "end_turn"
    });
    let text = extract_model_text(body.to_string().as_bytes()).unwrap();
    assert_eq!(text, "{\"from\": \"Bob\"}");
}

#[test]
fn test_extract_model_text_requires_text() {
    let body = json!({ "content": [] });
    assert!(extract_model_text(body.to_string().as_bytes()).is_err());
    assert!(extract_model_text(b"not json").is_err());
}

#[test]
fn test_parse_summary_strict_json() {
    let raw = r#"{
        "from": "Bob",
        "type": "email",
        "firstMessageFromAgent": "Bob says \"hi\".",
        "systemPrompt": "Discuss the quote.",
        "summarizedEmail": "A quote.",
        "tags": ["quote"],
        "links": ["https://example.com"]
    }"#;
    let summary = parse_summary(raw).unwrap();
    assert_eq!(summary.from, "Bob");
    assert_eq!(summary.kind, "email");
    assert_eq!(summary.first_message_from_agent, "Bob says \"hi\".");
    assert_eq!(summary.tags, vec!["quote"]);
}

#[test]
fn test_parse_summary_tolerates_prose_and_missing_fields() {
    let raw = "Here is the summary:\n{\"from\": \"Bob\", \"tags\": [\"a\"]}\nThanks!";
    let summary = parse_summary(raw).unwrap();
    assert_eq!(summary.from, "Bob");
    assert!(summary.links.is_empty());
    assert!(summary.summarized_email.is_empty());
}

#[test]
fn test_parse_summary_treats_null_fields_as_empty() {
    let raw = r#"{"from":"Bob","type":null,"summarizedEmail":"hi","tags":null,"links":null}"#;
    let summary = parse_summary(raw).unwrap();
    assert_eq!(summary.from, "Bob");
    assert_eq!(summary.summarized_email, "hi");
    assert!(summary.kind.is_empty());
    assert!(summary.tags.is_empty());
    assert!(summary.links.is_empty());
}

#[test]
fn test_parse_summary_repairs_bare_keys() {
    let raw = "{from: \"Bob\", tags: [\"x\"], summarizedEmail: \"ok\"}";
    let summary = parse_summary(raw).unwrap();
    assert_eq!(summary.from, "Bob");
    assert_eq!(summary.summarized_email, "ok");
}

#[test]
fn test_parse_summary_rejects_garbage() {
    assert!(parse_summary("no json here").is_err());
}

#[test]
fn test_sanitize_model_text_flattens_whitespace() {
    let raw = "  {\n\t\"from\":   \"Bob\"\r\n}  trailing";
    assert_eq!(sanitize_model_text(raw), "{ \"from\": \"Bob\" }");
}
