//! All AI/LLM functionality

pub mod client;
pub mod prompt;
pub mod response;

// Re-export main types for convenience
pub use client::{BedrockSummarizer, Summarizer};
pub use response::EmailSummary;
