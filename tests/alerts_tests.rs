mod common;

use basemail::alerts::{AlertReport, forward_records};
use basemail::notify::discord::{ALERT_COLOR, ALERT_FOOTER, ALERT_TITLE, MAX_DESCRIPTION_CHARS};
use basemail::notify::format_alert;
use chrono::{TimeZone, Utc};
use common::RecordingSink;
use serde_json::json;

#[test]
fn test_format_alert_embed() {
    let at = Utc.with_ymd_and_hms(2024, 10, 1, 10, 0, 0).unwrap();
    let body = format_alert("Task timed out", at);
    let embed = &body["embeds"][0];
    assert_eq!(embed["title"], ALERT_TITLE);
    assert_eq!(embed["description"], "Task timed out");
    assert_eq!(embed["color"], ALERT_COLOR);
    assert_eq!(embed["color"], 0x0099ff);
    assert_eq!(embed["footer"]["text"], ALERT_FOOTER);
    assert_eq!(embed["timestamp"], "2024-10-01T10:00:00+00:00");
}

#[test]
fn test_format_alert_truncates_long_messages() {
    let body = format_alert(&"x".repeat(MAX_DESCRIPTION_CHARS + 10), Utc::now());
    let description = body["embeds"][0]["description"].as_str().unwrap();
    assert_eq!(description.chars().count(), MAX_DESCRIPTION_CHARS);
}

#[tokio::test]
async fn test_forwards_every_record() {
    let sink = RecordingSink::default();
    let event = json!({
        "Records": [
            { "messageId": "1", "body": "first failure" },
            { "messageId": "2", "body": "second failure" }
        ]
    });

    let report = forward_records(&sink, event).await.unwrap();

    assert_eq!(report, AlertReport { sent: 2, failed: 0 });
    let bodies = sink.bodies.lock().unwrap().clone();
    assert_eq!(bodies.len(), 2);
}

#[tokio::test]
async fn test_record_failures_are_counted_not_raised() {
    let sink = RecordingSink {
        fail_on: Some("poison".to_string()),
        ..RecordingSink::default()
    };
    let event = json!({
        "Records": [
            { "messageId": "1", "body": "poison message" },
            { "messageId": "2", "body": "fine" }
        ]
    });

    let report = forward_records(&sink, event).await.unwrap();

    assert_eq!(report, AlertReport { sent: 1, failed: 1 });
}

#[tokio::test]
async fn test_empty_event_sends_nothing() {
    let sink = RecordingSink::default();
    let report = forward_records(&sink, json!({})).await.unwrap();
    assert_eq!(report, AlertReport::default());
}
