//! Inbound mail: MIME parsing, plaintext rendering, attachments, the
//! processing pipeline and outbound SES mail.

pub mod attachments;
pub mod content;
pub mod handler;
pub mod parse;
pub mod pipeline;
pub mod send;

pub use handler::handler;
pub use parse::{ParsedEmail, parse_raw_email};
pub use pipeline::{MailPipeline, PipelineOptions, ProcessOutcome};
pub use send::{MailSender, OutgoingMail, SesMailSender};
