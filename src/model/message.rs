//! The composed, provider-agnostic message.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::address::AddressEntry;
use super::attachment::StagedAttachment;

/// Header name -> value, in caller order.
pub type Headers = IndexMap<String, String>;

/// How the message is handed to the delivery adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionMode {
    /// One blocking call with the fully composed message.
    #[default]
    Single,
    /// Incremental recipient submission followed by an explicit finalize.
    Batch,
}

impl std::fmt::Display for SubmissionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionMode::Single => write!(f, "single"),
            SubmissionMode::Batch => write!(f, "batch"),
        }
    }
}

/// Fully assembled description of one outgoing email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedMessage {
    pub from: AddressEntry,
    pub to: Vec<AddressEntry>,
    pub cc: Vec<AddressEntry>,
    pub bcc: Vec<AddressEntry>,
    pub subject: String,
    /// `None` when the caller passed no HTML content.
    pub html_body: Option<String>,
    /// `None` when the caller passed no plain-text content.
    pub text_body: Option<String>,
    /// In staging order.
    pub attachments: Vec<StagedAttachment>,
    /// Custom headers with every reserved key removed.
    pub custom_headers: Headers,
    pub mode: SubmissionMode,
}

impl ComposedMessage {
    /// Total of to, cc and bcc recipients.
    pub fn recipient_count(&self) -> usize {
        self.to.len() + self.cc.len() + self.bcc.len()
    }
}
