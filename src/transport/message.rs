//! Provider-shaped message: form parameters plus file references.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{MessageBuilder, RecipientKind};
use crate::error::Result;
use crate::model::address::AddressEntry;
use crate::model::attachment::StagedAttachment;

/// Prefix of custom header parameters.
pub const HEADER_PARAM_PREFIX: &str = "h:";

/// A staged file the provider uploads as an attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub path: PathBuf,
    pub remote_name: String,
}

/// The request body for one provider call.
///
/// `params` keeps insertion order; recipient parameters repeat once per
/// address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMessage {
    pub params: Vec<(String, String)>,
    pub attachments: Vec<AttachmentRef>,
}

impl ProviderMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `key`, in order.
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.params
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Number of to, cc and bcc parameters.
    pub fn recipient_count(&self) -> usize {
        self.params
            .iter()
            .filter(|(k, _)| matches!(k.as_str(), "to" | "cc" | "bcc"))
            .count()
    }

    /// Replace any existing value for `key`.
    fn set(&mut self, key: &str, value: impl Into<String>) {
        self.params.retain(|(k, _)| k != key);
        self.params.push((key.to_string(), value.into()));
    }

    fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.push((key.into(), value.into()));
    }
}

impl MessageBuilder for ProviderMessage {
    fn set_from_address(&mut self, from: &AddressEntry) -> Result<()> {
        self.set("from", from.display());
        Ok(())
    }

    fn set_subject(&mut self, subject: &str) -> Result<()> {
        self.set("subject", subject);
        Ok(())
    }

    fn set_html_body(&mut self, html: &str) -> Result<()> {
        self.set("html", html);
        Ok(())
    }

    fn set_text_body(&mut self, text: &str) -> Result<()> {
        self.set("text", text);
        Ok(())
    }

    fn add_attachment(&mut self, attachment: &StagedAttachment) -> Result<()> {
        self.attachments.push(AttachmentRef {
            path: attachment.storage_path.clone(),
            remote_name: attachment.remote_name.clone(),
        });
        Ok(())
    }

    fn add_custom_header(&mut self, name: &str, value: &str) -> Result<()> {
        self.push(format!("{HEADER_PARAM_PREFIX}{name}"), value);
        Ok(())
    }

    fn add_recipient(&mut self, kind: RecipientKind, address: &AddressEntry) -> Result<()> {
        self.push(kind.param(), address.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_map_to_params() {
        let mut msg = ProviderMessage::new();
        msg.set_from_address(&AddressEntry::new("baz@bam.com", "Baz Smith"))
            .unwrap();
        msg.set_subject("Important question").unwrap();
        msg.add_custom_header("X-Custom-Header", "foo").unwrap();
        msg.add_recipient(RecipientKind::To, &AddressEntry::bare("a@example.com"))
            .unwrap();
        msg.add_recipient(RecipientKind::To, &AddressEntry::new("b@example.com", "B"))
            .unwrap();
        msg.add_recipient(RecipientKind::Bcc, &AddressEntry::bare("c@example.com"))
            .unwrap();

        assert_eq!(msg.get("from"), Some("Baz Smith <baz@bam.com>"));
        assert_eq!(msg.get("subject"), Some("Important question"));
        assert_eq!(msg.get("h:X-Custom-Header"), Some("foo"));
        assert_eq!(msg.get_all("to"), vec!["a@example.com", "B <b@example.com>"]);
        assert_eq!(msg.get_all("bcc"), vec!["c@example.com"]);
        assert_eq!(msg.recipient_count(), 3);
    }

    #[test]
    fn test_set_replaces_previous_value() {
        let mut msg = ProviderMessage::new();
        msg.set_subject("first").unwrap();
        msg.set_subject("second").unwrap();
        assert_eq!(msg.get_all("subject"), vec!["second"]);
    }

    #[test]
    fn test_attachment_ref() {
        let mut msg = ProviderMessage::new();
        let staged = StagedAttachment {
            storage_path: PathBuf::from("/foo/bar/baz"),
            remote_name: "image.jpg".to_string(),
            handle: crate::model::attachment::HandleId(0),
        };
        msg.add_attachment(&staged).unwrap();
        assert_eq!(
            msg.attachments,
            vec![AttachmentRef {
                path: PathBuf::from("/foo/bar/baz"),
                remote_name: "image.jpg".to_string(),
            }]
        );
    }
}
