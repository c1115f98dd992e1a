//! Adapter that records every call, for tests and diagnostics.

use std::cell::RefCell;
use std::path::PathBuf;

use super::batch::{BatchMessage, DEFAULT_BATCH_THRESHOLD};
use super::message::ProviderMessage;
use super::{BatchSubmission, DeliveryAdapter, MessageBuilder, RecipientKind};
use crate::error::{MailerError, Result};
use crate::model::address::AddressEntry;
use crate::model::attachment::StagedAttachment;

/// A call observed by [`RecordingAdapter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterCall {
    SetFrom(String),
    SetSubject(String),
    SetHtmlBody(String),
    SetTextBody(String),
    AddAttachment { path: PathBuf, remote_name: String },
    AddCustomHeader(String, String),
    AddRecipient(RecipientKind, String),
    SendSingle { domain: String, message: ProviderMessage },
    SendChunk { domain: String, message: ProviderMessage },
    Finalize,
}

impl AdapterCall {
    pub fn is_recipient(&self) -> bool {
        matches!(self, AdapterCall::AddRecipient(..))
    }

    pub fn is_send(&self) -> bool {
        matches!(self, AdapterCall::SendSingle { .. } | AdapterCall::SendChunk { .. })
    }
}

/// Records builder and send calls in order; can be told to fail sends.
#[derive(Debug)]
pub struct RecordingAdapter {
    calls: RefCell<Vec<AdapterCall>>,
    threshold: usize,
    fail_sends: bool,
}

impl Default for RecordingAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingAdapter {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            threshold: DEFAULT_BATCH_THRESHOLD,
            fail_sends: false,
        }
    }

    /// Every send (single or chunk) fails with a transport error.
    pub fn with_send_failure(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn calls(&self) -> Vec<AdapterCall> {
        self.calls.borrow().clone()
    }

    pub fn send_count(&self) -> usize {
        self.calls.borrow().iter().filter(|c| c.is_send()).count()
    }

    fn record(calls: &RefCell<Vec<AdapterCall>>, call: AdapterCall) {
        calls.borrow_mut().push(call);
    }

    fn check_send(fail_sends: bool) -> Result<()> {
        if fail_sends {
            return Err(MailerError::transport("simulated provider failure"));
        }
        Ok(())
    }
}

impl DeliveryAdapter for RecordingAdapter {
    fn send_single(&mut self, domain: &str, message: &ProviderMessage) -> Result<()> {
        Self::record(
            &self.calls,
            AdapterCall::SendSingle {
                domain: domain.to_string(),
                message: message.clone(),
            },
        );
        Self::check_send(self.fail_sends)
    }

    fn begin_batch(&mut self, domain: &str) -> Result<Box<dyn BatchSubmission + '_>> {
        let calls = &self.calls;
        let fail_sends = self.fail_sends;
        let inner = BatchMessage::new(
            domain,
            self.threshold,
            Box::new(move |domain, chunk| {
                Self::record(
                    calls,
                    AdapterCall::SendChunk {
                        domain: domain.to_string(),
                        message: chunk.clone(),
                    },
                );
                Self::check_send(fail_sends)
            }),
        );
        Ok(Box::new(RecordingBatch { calls, inner }))
    }
}

/// Batch that records builder calls before delegating to a [`BatchMessage`].
struct RecordingBatch<'a> {
    calls: &'a RefCell<Vec<AdapterCall>>,
    inner: BatchMessage<'a>,
}

impl RecordingBatch<'_> {
    fn record(&self, call: AdapterCall) {
        RecordingAdapter::record(self.calls, call);
    }
}

impl MessageBuilder for RecordingBatch<'_> {
    fn set_from_address(&mut self, from: &AddressEntry) -> Result<()> {
        self.record(AdapterCall::SetFrom(from.display()));
        self.inner.set_from_address(from)
    }

    fn set_subject(&mut self, subject: &str) -> Result<()> {
        self.record(AdapterCall::SetSubject(subject.to_string()));
        self.inner.set_subject(subject)
    }

    fn set_html_body(&mut self, html: &str) -> Result<()> {
        self.record(AdapterCall::SetHtmlBody(html.to_string()));
        self.inner.set_html_body(html)
    }

    fn set_text_body(&mut self, text: &str) -> Result<()> {
        self.record(AdapterCall::SetTextBody(text.to_string()));
        self.inner.set_text_body(text)
    }

    fn add_attachment(&mut self, attachment: &StagedAttachment) -> Result<()> {
        self.record(AdapterCall::AddAttachment {
            path: attachment.storage_path.clone(),
            remote_name: attachment.remote_name.clone(),
        });
        self.inner.add_attachment(attachment)
    }

    fn add_custom_header(&mut self, name: &str, value: &str) -> Result<()> {
        self.record(AdapterCall::AddCustomHeader(name.to_string(), value.to_string()));
        self.inner.add_custom_header(name, value)
    }

    fn add_recipient(&mut self, kind: RecipientKind, address: &AddressEntry) -> Result<()> {
        self.record(AdapterCall::AddRecipient(kind, address.email.clone()));
        self.inner.add_recipient(kind, address)
    }
}

impl BatchSubmission for RecordingBatch<'_> {
    fn finalize(self: Box<Self>) -> Result<usize> {
        let RecordingBatch { calls, inner } = *self;
        RecordingAdapter::record(calls, AdapterCall::Finalize);
        Box::new(inner).finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_single_send() {
        let mut adapter = RecordingAdapter::new();
        adapter.send_single("d", &ProviderMessage::new()).unwrap();
        assert_eq!(adapter.send_count(), 1);
        assert!(matches!(&adapter.calls()[0], AdapterCall::SendSingle { domain, .. } if domain == "d"));
    }

    #[test]
    fn test_send_failure() {
        let mut adapter = RecordingAdapter::new().with_send_failure();
        let err = adapter.send_single("d", &ProviderMessage::new()).unwrap_err();
        assert!(matches!(err, MailerError::Transport(_)));
        assert_eq!(adapter.send_count(), 1);
    }

    #[test]
    fn test_batch_records_builder_calls_and_chunks() {
        let mut adapter = RecordingAdapter::new().with_threshold(1);
        {
            let mut batch = adapter.begin_batch("d").unwrap();
            batch.set_subject("s").unwrap();
            batch
                .add_recipient(RecipientKind::To, &AddressEntry::bare("a@example.com"))
                .unwrap();
            assert_eq!(batch.finalize().unwrap(), 1);
        }
        let calls = adapter.calls();
        assert_eq!(calls[0], AdapterCall::SetSubject("s".into()));
        assert_eq!(
            calls[1],
            AdapterCall::AddRecipient(RecipientKind::To, "a@example.com".into())
        );
        assert!(matches!(calls[2], AdapterCall::SendChunk { .. }));
        assert_eq!(calls[3], AdapterCall::Finalize);
    }
}
