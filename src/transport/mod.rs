//! The delivery boundary: how a composed message reaches the provider.
//!
//! The core never talks to the network. It writes fields into a
//! [`MessageBuilder`] and hands the result to a [`DeliveryAdapter`], either
//! in one call (single mode) or through a [`BatchSubmission`] that may send
//! partial chunks while recipients are still being added.

pub mod batch;
pub mod dry_run;
pub mod message;
pub mod recording;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::address::AddressEntry;
use crate::model::attachment::StagedAttachment;

pub use batch::BatchMessage;
pub use message::{AttachmentRef, ProviderMessage};

/// Recipient field an address is added to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientKind {
    To,
    Cc,
    Bcc,
}

impl RecipientKind {
    /// Provider parameter name for this field.
    pub fn param(self) -> &'static str {
        match self {
            RecipientKind::To => "to",
            RecipientKind::Cc => "cc",
            RecipientKind::Bcc => "bcc",
        }
    }
}

/// Receives the fields of one outgoing message.
///
/// Every call may fail: batch builders send a chunk to the provider from
/// inside `add_recipient` once their threshold is reached.
pub trait MessageBuilder {
    fn set_from_address(&mut self, from: &AddressEntry) -> Result<()>;

    fn set_subject(&mut self, subject: &str) -> Result<()>;

    fn set_html_body(&mut self, html: &str) -> Result<()>;

    fn set_text_body(&mut self, text: &str) -> Result<()>;

    fn add_attachment(&mut self, attachment: &StagedAttachment) -> Result<()>;

    fn add_custom_header(&mut self, name: &str, value: &str) -> Result<()>;

    fn add_recipient(&mut self, kind: RecipientKind, address: &AddressEntry) -> Result<()>;
}

/// Incremental submission for large recipient lists.
pub trait BatchSubmission: MessageBuilder {
    /// Send whatever is still pending. Returns the number of chunks sent over
    /// the life of the batch.
    fn finalize(self: Box<Self>) -> Result<usize>;
}

/// A provider transport.
pub trait DeliveryAdapter {
    /// Send a fully built message in one call.
    fn send_single(&mut self, domain: &str, message: &ProviderMessage) -> Result<()>;

    /// Open a batch submission for `domain`.
    fn begin_batch(&mut self, domain: &str) -> Result<Box<dyn BatchSubmission + '_>>;
}
