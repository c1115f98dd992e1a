//! Reserved header handling.
//!
//! `Cc` and `Bcc` carry recipient lists and [`BATCH_MESSAGE_HEADER`] selects
//! batch submission. All three are consumed here and never reach the
//! provider as custom headers. Matching is case-sensitive.

use crate::error::{MailerError, Result};
use crate::model::message::Headers;

pub const CC_HEADER: &str = "Cc";
pub const BCC_HEADER: &str = "Bcc";
/// Presence (with a truthy value) switches the message to batch mode.
pub const BATCH_MESSAGE_HEADER: &str = "X-Mailgunner-Batch-Message";

/// Caller headers with the reserved keys taken out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitHeaders {
    /// Raw `Cc` value, empty when absent.
    pub cc: String,
    /// Raw `Bcc` value, empty when absent.
    pub bcc: String,
    pub batch: bool,
    pub custom: Headers,
}

/// Separate reserved keys from custom headers, keeping custom order.
pub fn split_headers(headers: &Headers) -> SplitHeaders {
    let mut split = SplitHeaders::default();
    for (name, value) in headers {
        match name.as_str() {
            CC_HEADER => split.cc = value.clone(),
            BCC_HEADER => split.bcc = value.clone(),
            BATCH_MESSAGE_HEADER => split.batch = is_truthy(value),
            _ => {
                split.custom.insert(name.clone(), value.clone());
            }
        }
    }
    split
}

/// Whether a flag header value turns the flag on.
pub fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}

/// Reject header names or values that would corrupt the outgoing message.
pub fn validate_custom_header(name: &str, value: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MailerError::validation("custom header name is empty"));
    }
    if name
        .chars()
        .any(|c| c == ':' || c.is_whitespace() || c.is_control())
    {
        return Err(MailerError::validation(format!(
            "invalid custom header name '{}'",
            name.escape_debug()
        )));
    }
    if has_bare_line_break(value) {
        return Err(MailerError::validation(format!(
            "custom header '{name}' contains a line break"
        )));
    }
    Ok(())
}

/// True when `value` has a CR or LF that is not part of a folded line
/// (CRLF or LF followed by a space or tab).
fn has_bare_line_break(value: &str) -> bool {
    let bytes = value.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let newline = match bytes[i] {
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => i + 1,
            b'\r' => return true,
            b'\n' => i,
            _ => {
                i += 1;
                continue;
            }
        };
        if !matches!(bytes.get(newline + 1), Some(b' ' | b'\t')) {
            return true;
        }
        i = newline + 2;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> Headers {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_split_reserved_keys() {
        let split = split_headers(&headers(&[
            ("X-Custom-Header", "foo"),
            ("Cc", "bar@baz.com"),
            ("Bcc", "nobody@example.com"),
            (BATCH_MESSAGE_HEADER, "true"),
            ("X-Other", "1"),
        ]));
        assert_eq!(split.cc, "bar@baz.com");
        assert_eq!(split.bcc, "nobody@example.com");
        assert!(split.batch);
        assert_eq!(split.custom, headers(&[("X-Custom-Header", "foo"), ("X-Other", "1")]));
    }

    #[test]
    fn test_reserved_keys_are_case_sensitive() {
        let split = split_headers(&headers(&[("CC", "a@b.com"), ("bcc", "c@d.com")]));
        assert!(split.cc.is_empty());
        assert!(split.bcc.is_empty());
        assert_eq!(split.custom.len(), 2);
    }

    #[test]
    fn test_falsy_batch_flag_is_still_stripped() {
        let split = split_headers(&headers(&[(BATCH_MESSAGE_HEADER, "false")]));
        assert!(!split.batch);
        assert!(split.custom.is_empty());
    }

    #[test]
    fn test_is_truthy() {
        for v in ["true", "1", "yes", "TRUE", "anything"] {
            assert!(is_truthy(v), "{v} should be truthy");
        }
        for v in ["", " ", "0", "false", "False", "no", "off"] {
            assert!(!is_truthy(v), "{v:?} should be falsy");
        }
    }

    #[test]
    fn test_validate_custom_header() {
        assert!(validate_custom_header("X-Foo", "1").is_ok());
        assert!(validate_custom_header("", "1").is_err());
        assert!(validate_custom_header("X Foo", "1").is_err());
        assert!(validate_custom_header("X-Foo:", "1").is_err());
        assert!(validate_custom_header("X-Foo", "1\r\nBcc: evil@example.com").is_err());
    }

    #[test]
    fn test_folded_header_values() {
        assert!(validate_custom_header("X-Long", "a\r\n b").is_ok());
        assert!(validate_custom_header("X-Long", "a\n\tb").is_ok());
        assert!(validate_custom_header("X-Long", "a\r\n b\r\n\tc").is_ok());

        assert!(validate_custom_header("X-Long", "a\r\n").is_err());
        assert!(validate_custom_header("X-Long", "a\nb").is_err());
        assert!(validate_custom_header("X-Long", "a\r b").is_err());
        assert!(validate_custom_header("X-Long", "a\r\n b\nBcc: evil@example.com").is_err());
    }
}
