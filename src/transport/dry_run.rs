//! Adapter that prints provider payloads instead of sending them.

use std::io::Write;

use serde::Serialize;

use super::batch::BatchMessage;
use super::message::ProviderMessage;
use super::{BatchSubmission, DeliveryAdapter};
use crate::error::{MailerError, Result};

/// One output line.
#[derive(Serialize)]
struct Payload<'a> {
    kind: &'a str,
    domain: &'a str,
    message: &'a ProviderMessage,
}

/// Writes every outgoing message as a JSON line.
///
/// Single sends produce one `"single"` line; batches produce one `"chunk"`
/// line per flushed chunk.
#[derive(Debug)]
pub struct DryRunAdapter<W: Write> {
    out: W,
    threshold: usize,
}

impl<W: Write> DryRunAdapter<W> {
    pub fn new(out: W, threshold: usize) -> Self {
        Self { out, threshold }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn write_payload<W: Write>(
    out: &mut W,
    kind: &str,
    domain: &str,
    message: &ProviderMessage,
) -> Result<()> {
    let payload = Payload {
        kind,
        domain,
        message,
    };
    serde_json::to_writer(&mut *out, &payload)
        .map_err(|e| MailerError::transport(format!("could not encode payload: {e}")))?;
    writeln!(out).map_err(|e| MailerError::transport(e.to_string()))
}

impl<W: Write> DeliveryAdapter for DryRunAdapter<W> {
    fn send_single(&mut self, domain: &str, message: &ProviderMessage) -> Result<()> {
        write_payload(&mut self.out, "single", domain, message)
    }

    fn begin_batch(&mut self, domain: &str) -> Result<Box<dyn BatchSubmission + '_>> {
        let out = &mut self.out;
        Ok(Box::new(BatchMessage::new(
            domain,
            self.threshold,
            Box::new(move |domain, chunk| write_payload(&mut *out, "chunk", domain, chunk)),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::address::AddressEntry;
    use crate::transport::{MessageBuilder, RecipientKind};

    #[test]
    fn test_single_writes_one_line() {
        let mut adapter = DryRunAdapter::new(Vec::new(), 1000);
        let mut msg = ProviderMessage::new();
        msg.set_subject("Hi").unwrap();
        adapter.send_single("mg.example.com", &msg).unwrap();

        let out = String::from_utf8(adapter.into_inner()).unwrap();
        let value: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(value["kind"], "single");
        assert_eq!(value["domain"], "mg.example.com");
        assert_eq!(value["message"]["params"][0][0], "subject");
    }

    #[test]
    fn test_batch_writes_line_per_chunk() {
        let mut adapter = DryRunAdapter::new(Vec::new(), 2);
        {
            let mut batch = adapter.begin_batch("mg.example.com").unwrap();
            batch.set_subject("Hi").unwrap();
            for i in 0..3 {
                let address = AddressEntry::bare(format!("u{i}@example.com"));
                batch.add_recipient(RecipientKind::To, &address).unwrap();
            }
            assert_eq!(batch.finalize().unwrap(), 2);
        }

        let out = String::from_utf8(adapter.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.contains("\"kind\":\"chunk\"")));
    }
}
