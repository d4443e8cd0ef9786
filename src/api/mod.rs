//! HTTP API Lambda: mailbox routes and the identity-provider webhook

pub mod clerk;
pub mod handler;
pub mod helpers;
pub mod mailbox;
pub mod parsing;
pub mod signature;

pub use clerk::{ClerkClient, IdentityProvider};
pub use handler::{ApiService, ApiSettings, handler};
