//! Response builders shared by the API routes.

use serde_json::{Value, json};

use crate::errors::MailError;

const CORS_ALLOW_HEADERS: &str =
    "Content-Type,Cache-Control,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token";
const CORS_ALLOW_METHODS: &str = "GET,PUT,POST,DELETE,PATCH,OPTIONS";

/// Early exit from a route: a ready response, or a failure that becomes a 500.
#[derive(Debug)]
pub enum RouteError {
    Response(Value),
    Internal(MailError),
}

impl From<MailError> for RouteError {
    fn from(error: MailError) -> Self {
        RouteError::Internal(error)
    }
}

pub type RouteResult = Result<Value, RouteError>;

/// API Gateway proxy response with a JSON body and permissive CORS headers.
#[must_use]
pub fn api_response(status_code: u16, body: &Value) -> Value {
    json!({
        "isBase64Encoded": false,
        "statusCode": status_code,
        "body": body.to_string(),
        "headers": {
            "Content-Type": "application/json",
            "Access-Control-Allow-Origin": "*",
            "Access-Control-Allow-Credentials": true,
            "Access-Control-Allow-Headers": CORS_ALLOW_HEADERS,
            "Access-Control-Allow-Methods": CORS_ALLOW_METHODS,
        }
    })
}

/// `{"message": ...}` with the given status.
#[must_use]
pub fn message_response(status_code: u16, message: &str) -> Value {
    api_response(status_code, &json!({ "message": message }))
}

/// Convenience for early returns: `Err(reject(404, "Inbox not found"))?`.
#[must_use]
pub fn reject(status_code: u16, message: &str) -> RouteError {
    RouteError::Response(message_response(status_code, message))
}
