//! Outbound notifications: live WebSocket pushes and operator alerts

pub mod connections;
pub mod discord;

pub use connections::{ApiGatewayNotifier, ConnectionNotifier, FanOut, PostOutcome, push_to_owner};
pub use discord::{AlertSink, DiscordWebhook, format_alert};
