//! WebSocket Lambda: `$connect`, `$disconnect` and `sendMessage`

pub mod handler;
pub mod queue;

pub use handler::{SocketService, handler};
pub use queue::{ChatQueue, ChatRequest, SqsChatQueue};
