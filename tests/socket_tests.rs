mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use basemail::socket::SocketService;
use chrono::Utc;
use common::{MemoryStore, RecordingQueue};
use serde_json::{Value, json};

fn service() -> (Arc<MemoryStore>, Arc<RecordingQueue>, SocketService) {
    let store = Arc::new(MemoryStore::default());
    let queue = Arc::new(RecordingQueue::default());
    let service = SocketService::new(store.clone(), queue.clone());
    (store, queue, service)
}

fn event(route: &str) -> Value {
    json!({
        "requestContext": {
            "routeKey": route,
            "connectionId": "abc123=",
            "domainName": "ws.basemail.me",
            "stage": "prod"
        }
    })
}

#[tokio::test]
async fn test_connect_stores_connection_with_ttl() {
    let (store, _, service) = service();
    let mut connect = event("$connect");
    connect["queryStringParameters"] = json!({ "userId": "YWxpY2U=" });

    let response = service.handle(&connect).await;

    assert_eq!(response["statusCode"], 200);
    assert_eq!(response["body"], "Connected");
    let connection = store.connection("YWxpY2U=").expect("connection row");
    assert_eq!(connection.connection_id, "USER#YWxpY2U=");
    assert_eq!(connection.socket_id, "abc123=");
    let thirty_days = 30 * 24 * 60 * 60;
    let remaining = connection.ttl - Utc::now().timestamp();
    assert!(remaining > thirty_days - 60 && remaining <= thirty_days);
}

#[tokio::test]
async fn test_connect_requires_user_id() {
    let (store, _, service) = service();
    let response = service.handle(&event("$connect")).await;
    assert_eq!(response["statusCode"], 400);
    assert_eq!(response["body"], "User ID is required");
    assert!(store.connections.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_connect_store_failure_is_500() {
    let (store, _, service) = service();
    store.fail_writes.store(true, Ordering::SeqCst);
    let mut connect = event("$connect");
    connect["queryStringParameters"] = json!({ "userId": "YWxpY2U=" });

    let response = service.handle(&connect).await;

    assert_eq!(response["statusCode"], 500);
    assert_eq!(response["body"], "Failed to process WebSocket event");
}

#[tokio::test]
async fn test_disconnect_is_acknowledged() {
    let (_, _, service) = service();
    let response = service.handle(&event("$disconnect")).await;
    assert_eq!(response["statusCode"], 200);
    assert_eq!(response["body"], "Disconnected");
}

#[tokio::test]
async fn test_send_message_enqueues_chat_request() {
    let (_, queue, service) = service();
    let mut send = event("sendMessage");
    send["body"] = Value::String(
        json!({
            "action": "sendMessage",
            "data": "What did Bob quote?",
            "model": "am-2",
            "maxLength": "512",
            "topP": "0.9",
            "caseId": "case-1"
        })
        .to_string(),
    );

    let response = service.handle(&send).await;

    assert_eq!(response["statusCode"], 200);
    let body: Value = serde_json::from_str(response["body"].as_str().unwrap()).unwrap();
    assert_eq!(body["messageId"], "msg-1");

    let requests = queue.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].connection_id, "abc123=");
    assert_eq!(requests[0].domain_name, "ws.basemail.me");
    assert_eq!(requests[0].stage, "prod");
    assert_eq!(requests[0].data, json!("What did Bob quote?"));

    let wire = serde_json::to_value(&requests[0]).unwrap();
    assert_eq!(wire["max_tokens"], "512");
    assert_eq!(wire["top_p"], "0.9");
    assert_eq!(wire["caseId"], "case-1");
}

#[tokio::test]
async fn test_queue_failure_is_500() {
    let (_, queue, service) = service();
    queue.fail.store(true, Ordering::SeqCst);

    let response = service.handle(&event("sendMessage")).await;

    assert_eq!(response["statusCode"], 500);
    assert_eq!(response["body"], "Failed to process WebSocket event");
}

#[tokio::test]
async fn test_unknown_route_is_400() {
    let (_, _, service) = service();
    let response = service.handle(&event("$default")).await;
    assert_eq!(response["statusCode"], 400);
    assert_eq!(response["body"], "Unknown route");
}
