/// Basemail - wallet-identity email backend on AWS Lambda.
///
/// This crate implements the four Lambdas behind Basemail:
/// 1. A mail Lambda that parses raw MIME written to S3 by SES, stores the
///    plaintext and whitelisted attachments, summarizes the mail with Bedrock
///    and pushes the result to the owner's WebSocket connection
/// 2. An API Lambda serving the mailbox routes and the identity-provider webhook
/// 3. A WebSocket Lambda tracking connections and queueing chat requests
/// 4. An alerts Lambda forwarding dead-lettered messages to Discord
///
/// # Architecture
///
/// The system uses:
/// - DynamoDB single-table storage (`store`)
/// - S3 for raw mail, plaintext renderings and attachments
/// - Bedrock (Anthropic models) for summaries (`ai`)
/// - API Gateway WebSocket management for live pushes (`notify`)
/// - Tokio for async runtime
///
/// # Example
///
/// ```no_run
/// use basemail::mail::{parse_raw_email, content::optimize_email_content};
///
/// # fn main() -> Result<(), basemail::MailError> {
/// basemail::setup_logging();
///
/// let raw = b"From: Bob <bob@example.com>\r\nTo: alice@basemail.me\r\nSubject: Hi\r\n\r\nHello";
/// let parsed = parse_raw_email(raw)?;
/// println!("{}", optimize_email_content(&parsed));
/// # Ok(())
/// # }
/// ```
// Module declarations
pub mod ai;
pub mod alerts;
pub mod api;
pub mod core;
pub mod errors;
pub mod mail;
pub mod notify;
pub mod socket;
pub mod store;
pub mod utils;

pub use errors::MailError;

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// This function sets up tracing-subscriber with a JSON formatter suitable for
/// `CloudWatch` Logs integration. It should be called at the start of each Lambda
/// handler.
///
/// # Example
///
/// ```
/// // Initialize structured logging at the start of your Lambda handler
/// basemail::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    tracing_subscriber::registry().with(fmt_layer).init();
}
