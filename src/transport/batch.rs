//! Chunked submission for large recipient lists.
//!
//! Non-recipient fields accumulate in a base message. Recipients accumulate
//! in a pending list; once it reaches the threshold, base + pending is sent
//! as one chunk and the pending list starts over. Any field set after the
//! first chunk went out would be missing from it, which is why callers must
//! add recipients last.

use tracing::debug;

use super::message::ProviderMessage;
use super::{BatchSubmission, MessageBuilder, RecipientKind};
use crate::error::Result;
use crate::model::address::AddressEntry;
use crate::model::attachment::StagedAttachment;

/// Default number of recipients per chunk.
pub const DEFAULT_BATCH_THRESHOLD: usize = 1000;

/// Receives each chunk: `(domain, message)`.
pub type ChunkSink<'a> = Box<dyn FnMut(&str, &ProviderMessage) -> Result<()> + 'a>;

/// Batch builder that flushes to a [`ChunkSink`].
pub struct BatchMessage<'a> {
    domain: String,
    base: ProviderMessage,
    pending: Vec<(RecipientKind, AddressEntry)>,
    threshold: usize,
    chunks_sent: usize,
    sink: ChunkSink<'a>,
}

impl<'a> BatchMessage<'a> {
    /// A threshold of 0 is treated as 1.
    pub fn new(domain: impl Into<String>, threshold: usize, sink: ChunkSink<'a>) -> Self {
        Self {
            domain: domain.into(),
            base: ProviderMessage::new(),
            pending: Vec::new(),
            threshold: threshold.max(1),
            chunks_sent: 0,
            sink,
        }
    }

    pub fn pending_recipients(&self) -> usize {
        self.pending.len()
    }

    pub fn chunks_sent(&self) -> usize {
        self.chunks_sent
    }

    fn flush(&mut self) -> Result<()> {
        let mut chunk = self.base.clone();
        for (kind, address) in self.pending.drain(..) {
            chunk.add_recipient(kind, &address)?;
        }
        debug!(
            domain = %self.domain,
            recipients = chunk.recipient_count(),
            chunk = self.chunks_sent + 1,
            "Sending batch chunk"
        );
        (self.sink)(&self.domain, &chunk)?;
        self.chunks_sent += 1;
        Ok(())
    }
}

impl MessageBuilder for BatchMessage<'_> {
    fn set_from_address(&mut self, from: &AddressEntry) -> Result<()> {
        self.base.set_from_address(from)
    }

    fn set_subject(&mut self, subject: &str) -> Result<()> {
        self.base.set_subject(subject)
    }

    fn set_html_body(&mut self, html: &str) -> Result<()> {
        self.base.set_html_body(html)
    }

    fn set_text_body(&mut self, text: &str) -> Result<()> {
        self.base.set_text_body(text)
    }

    fn add_attachment(&mut self, attachment: &StagedAttachment) -> Result<()> {
        self.base.add_attachment(attachment)
    }

    fn add_custom_header(&mut self, name: &str, value: &str) -> Result<()> {
        self.base.add_custom_header(name, value)
    }

    fn add_recipient(&mut self, kind: RecipientKind, address: &AddressEntry) -> Result<()> {
        self.pending.push((kind, address.clone()));
        if self.pending.len() >= self.threshold {
            self.flush()?;
        }
        Ok(())
    }
}

impl BatchSubmission for BatchMessage<'_> {
    fn finalize(mut self: Box<Self>) -> Result<usize> {
        if !self.pending.is_empty() {
            self.flush()?;
        }
        Ok(self.chunks_sent)
    }
}
