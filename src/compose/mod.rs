//! Message composition.
//!
//! [`compose`] turns a normalized send request plus its staged attachments
//! into a [`ComposedMessage`]; [`write_message`] replays a composed message
//! into a provider builder in the order batch transports require. Neither
//! performs I/O or logs.

pub mod headers;

use crate::error::{MailerError, Result};
use crate::model::address::{AddressEntry, AddressList};
use crate::model::attachment::{RawAttachment, StagedAttachment};
use crate::model::message::{ComposedMessage, Headers, SubmissionMode};
use crate::transport::{MessageBuilder, RecipientKind};

use self::headers::{split_headers, validate_custom_header, BATCH_MESSAGE_HEADER};

/// A generic "send an email" request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendRequest {
    /// Address list, e.g. `"Joe <joe@example.com>, jane@example.com"`.
    pub to: String,
    pub from: String,
    pub subject: String,
    /// Empty means no HTML body.
    pub html_content: String,
    /// Empty means no plain-text body.
    pub plain_content: String,
    pub attachments: Vec<RawAttachment>,
    /// Custom headers plus the reserved `Cc`, `Bcc` and batch keys.
    ///
    /// Folded values are accepted; any other line break in a value is a
    /// validation error.
    pub headers: Headers,
}

impl SendRequest {
    pub fn new(to: impl Into<String>, from: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            from: from.into(),
            subject: subject.into(),
            ..Self::default()
        }
    }

    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html_content = html.into();
        self
    }

    pub fn plain(mut self, plain: impl Into<String>) -> Self {
        self.plain_content = plain.into();
        self
    }

    pub fn attachment(mut self, attachment: RawAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Flag the request for batch submission.
    pub fn batch(self) -> Self {
        self.header(BATCH_MESSAGE_HEADER, "true")
    }
}

/// Build a [`ComposedMessage`] from `request` and already-staged attachments.
///
/// The request's own `attachments` are ignored here; stage them first and
/// pass the results as `attachments`.
pub fn compose(
    request: &SendRequest,
    attachments: &[StagedAttachment],
) -> Result<ComposedMessage> {
    let from = parse_sender(&request.from)?;

    let to = AddressList::parse(&request.to).into_entries();
    if to.is_empty() {
        return Err(MailerError::validation("no recipients in 'to'"));
    }

    let split = split_headers(&request.headers);
    for (name, value) in &split.custom {
        validate_custom_header(name, value)?;
    }

    for attachment in attachments {
        attachment.validate()?;
    }

    Ok(ComposedMessage {
        from,
        to,
        cc: AddressList::parse(&split.cc).into_entries(),
        bcc: AddressList::parse(&split.bcc).into_entries(),
        subject: request.subject.clone(),
        html_body: non_empty(&request.html_content),
        text_body: non_empty(&request.plain_content),
        attachments: attachments.to_vec(),
        custom_headers: split.custom,
        mode: if split.batch {
            SubmissionMode::Batch
        } else {
            SubmissionMode::Single
        },
    })
}

/// Write `message` into `builder`.
///
/// Recipients go in last: a batch builder may send a chunk as soon as enough
/// recipients are added, and that chunk must already carry every other field.
pub fn write_message<B>(message: &ComposedMessage, builder: &mut B) -> Result<()>
where
    B: MessageBuilder + ?Sized,
{
    builder.set_from_address(&message.from)?;
    builder.set_subject(&message.subject)?;
    if let Some(html) = &message.html_body {
        builder.set_html_body(html)?;
    }
    if let Some(text) = &message.text_body {
        builder.set_text_body(text)?;
    }

    for attachment in &message.attachments {
        builder.add_attachment(attachment)?;
    }

    for (name, value) in &message.custom_headers {
        builder.add_custom_header(name, value)?;
    }

    let recipients = [
        (RecipientKind::To, &message.to),
        (RecipientKind::Cc, &message.cc),
        (RecipientKind::Bcc, &message.bcc),
    ];
    for (kind, list) in recipients {
        for address in list {
            builder.add_recipient(kind, address)?;
        }
    }
    Ok(())
}

/// Parse the sender, falling back to the raw string when nothing parses.
///
/// A list with several entries yields the last one.
fn parse_sender(raw: &str) -> Result<AddressEntry> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(MailerError::validation("sender address is empty"));
    }
    Ok(AddressList::parse(trimmed)
        .into_entries()
        .pop()
        .unwrap_or_else(|| AddressEntry::bare(trimmed)))
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
