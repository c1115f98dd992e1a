//! Send attempts: stage, compose, deliver, release.
//!
//! Every call to [`Mailer::send`] is one attempt with its own
//! [`AttachmentStager`]. Whatever happens in between, the stager is
//! released before the call returns, so a failed attempt leaves no open
//! handles or temporary files behind. Errors are returned as-is; logging
//! them or showing them to a user is up to the caller.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::compose::{self, SendRequest};
use crate::config::{Config, StagingConfig};
use crate::error::Result;
use crate::model::attachment::RawAttachment;
use crate::model::message::{ComposedMessage, Headers, SubmissionMode};
use crate::staging::AttachmentStager;
use crate::transport::{DeliveryAdapter, ProviderMessage};

/// Summary of a successful attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendReceipt {
    pub mode: SubmissionMode,
    /// Total of to, cc and bcc recipients.
    pub recipients: usize,
    pub attachments: usize,
    /// Bytes written to temporary storage for attachments.
    pub staged_bytes: u64,
    /// Provider calls made: 1 in single mode, the chunk count in batch mode.
    pub chunks: usize,
    pub sent_at: DateTime<Utc>,
}

/// Sends requests through a [`DeliveryAdapter`].
#[derive(Debug)]
pub struct Mailer<A: DeliveryAdapter> {
    adapter: A,
    domain: String,
    staging: StagingConfig,
}

impl<A: DeliveryAdapter> Mailer<A> {
    pub fn new(adapter: A, domain: impl Into<String>, staging: StagingConfig) -> Self {
        Self {
            adapter,
            domain: domain.into(),
            staging,
        }
    }

    /// Mailer for the domain and staging settings in `config`.
    pub fn from_config(adapter: A, config: &Config) -> Self {
        Self::new(
            adapter,
            config.provider.api_domain.clone(),
            config.staging.clone(),
        )
    }

    /// Send to `domain` instead.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn into_adapter(self) -> A {
        self.adapter
    }

    /// Send a plain-text message.
    pub fn send_plain(
        &mut self,
        to: &str,
        from: &str,
        subject: &str,
        plain_content: &str,
        attachments: Vec<RawAttachment>,
        headers: Headers,
    ) -> Result<SendReceipt> {
        let request = SendRequest {
            plain_content: plain_content.to_string(),
            attachments,
            headers,
            ..SendRequest::new(to, from, subject)
        };
        self.send(&request)
    }

    /// Send an HTML message, with an optional plain-text alternative
    /// (pass `""` for none).
    #[allow(clippy::too_many_arguments)]
    pub fn send_html(
        &mut self,
        to: &str,
        from: &str,
        subject: &str,
        html_content: &str,
        attachments: Vec<RawAttachment>,
        headers: Headers,
        plain_content: &str,
    ) -> Result<SendReceipt> {
        let request = SendRequest {
            html_content: html_content.to_string(),
            plain_content: plain_content.to_string(),
            attachments,
            headers,
            ..SendRequest::new(to, from, subject)
        };
        self.send(&request)
    }

    /// Run one attempt for `request`.
    pub fn send(&mut self, request: &SendRequest) -> Result<SendReceipt> {
        let mut stager = AttachmentStager::new(&self.staging);
        let outcome = self.attempt(&mut stager, request);
        let released = stager.release_all();
        debug!(released, ok = outcome.is_ok(), "Released staged attachments");
        outcome
    }

    fn attempt(
        &mut self,
        stager: &mut AttachmentStager,
        request: &SendRequest,
    ) -> Result<SendReceipt> {
        let staged = stager.stage_all(&request.attachments)?;
        let message = compose::compose(request, &staged)?;
        let chunks = self.deliver(&message)?;

        info!(
            domain = %self.domain,
            mode = %message.mode,
            recipients = message.recipient_count(),
            attachments = message.attachments.len(),
            chunks,
            "Message delivered"
        );

        Ok(SendReceipt {
            mode: message.mode,
            recipients: message.recipient_count(),
            attachments: message.attachments.len(),
            staged_bytes: stager.staged_bytes(),
            chunks,
            sent_at: Utc::now(),
        })
    }

    /// Hand `message` to the adapter according to its mode.
    fn deliver(&mut self, message: &ComposedMessage) -> Result<usize> {
        match message.mode {
            SubmissionMode::Single => {
                let mut outgoing = ProviderMessage::new();
                compose::write_message(message, &mut outgoing)?;
                self.adapter.send_single(&self.domain, &outgoing)?;
                Ok(1)
            }
            SubmissionMode::Batch => {
                let mut batch = self.adapter.begin_batch(&self.domain)?;
                compose::write_message(message, &mut *batch)?;
                batch.finalize()
            }
        }
    }
}
