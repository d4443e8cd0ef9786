//! Raw MIME → [`ParsedEmail`]

use chrono::{DateTime, Utc};
use mail_parser::{Address, MessageParser, MimeHeaders};

use crate::errors::MailError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailAddress {
    pub name: Option<String>,
    pub address: Option<String>,
}

impl MailAddress {
    /// Renders as `Name <addr>`, or whichever half is present.
    #[must_use]
    pub fn display_text(&self) -> String {
        match (self.name.as_deref(), self.address.as_deref()) {
            (Some(name), Some(addr)) => format!("{name} <{addr}>"),
            (Some(name), None) => name.to_string(),
            (None, Some(addr)) => addr.to_string(),
            (None, None) => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAttachment {
    pub filename: String,
    pub content_type: Option<String>,
    pub content: Vec<u8>,
}

impl ParsedAttachment {
    #[must_use]
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedEmail {
    pub subject: Option<String>,
    pub from: Option<MailAddress>,
    pub to: Vec<MailAddress>,
    pub date: Option<DateTime<Utc>>,
    pub text: Option<String>,
    pub html: Option<String>,
    pub attachments: Vec<ParsedAttachment>,
}

impl ParsedEmail {
    #[must_use]
    pub fn from_text(&self) -> String {
        self.from
            .as_ref()
            .map(MailAddress::display_text)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn from_address(&self) -> String {
        self.from
            .as_ref()
            .and_then(|a| a.address.clone())
            .unwrap_or_default()
    }

    /// Display text of the first recipient, which decides the mailbox.
    #[must_use]
    pub fn primary_to_text(&self) -> String {
        self.to
            .first()
            .map(MailAddress::display_text)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn primary_to_address(&self) -> String {
        self.to
            .first()
            .and_then(|a| a.address.clone().or_else(|| a.name.clone()))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn to_text(&self) -> String {
        self.to
            .iter()
            .map(MailAddress::display_text)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// # Errors
///
/// Returns a `ParseError` if the bytes are not a parseable RFC 5322 message.
pub fn parse_raw_email(raw: &[u8]) -> Result<ParsedEmail, MailError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Err(MailError::ParseError("email object is empty".to_string()));
    }

    let message = MessageParser::default()
        .parse(raw)
        .ok_or_else(|| MailError::ParseError("not a valid MIME message".to_string()))?;

    let from = message.from().and_then(|a| collect_addresses(a).into_iter().next());
    let to = message.to().map(collect_addresses).unwrap_or_default();
    let date = message
        .date()
        .and_then(|d| DateTime::<Utc>::from_timestamp(d.to_timestamp(), 0));

    let attachments = message
        .attachments()
        .map(|part| ParsedAttachment {
            filename: part.attachment_name().unwrap_or_default().to_string(),
            content_type: part.content_type().map(|ct| match ct.subtype() {
                Some(sub) => format!("{}/{}", ct.ctype(), sub).to_ascii_lowercase(),
                None => ct.ctype().to_ascii_lowercase(),
            }),
            content: part.contents().to_vec(),
        })
        .collect();

    Ok(ParsedEmail {
        subject: message.subject().map(ToString::to_string),
        from,
        to,
        date,
        text: message.body_text(0).map(|t| t.into_owned()),
        html: message.body_html(0).map(|h| h.into_owned()),
        attachments,
    })
}

fn collect_addresses(address: &Address<'_>) -> Vec<MailAddress> {
    let addrs: Vec<&mail_parser::Addr<'_>> = match address {
        Address::List(list) => list.iter().collect(),
        Address::Group(groups) => groups.iter().flat_map(|g| g.addresses.iter()).collect(),
    };

    addrs
        .into_iter()
        .map(|a| MailAddress {
            name: a.name.as_ref().map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            address: a.address.as_ref().map(|x| x.trim().to_string()).filter(|x| !x.is_empty()),
        })
        .filter(|a| a.name.is_some() || a.address.is_some())
        .collect()
}
