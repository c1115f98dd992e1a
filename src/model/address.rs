//! Tolerant parsing of human-entered address lists.
//!
//! Accepts any mix of the following, separated by `,` or `;`:
//! - `joe@example.com`
//! - `Joe Bloggs <joe@example.com>`
//! - `"Joe Bloggs" <joe@example.com>`
//! - `'Joe'<joe@example.com>`
//!
//! The grammar is deliberately shallow. A comma inside a quoted name
//! (`"Smith, John" <john@example.com>`) or mismatched quotes are split
//! best-effort instead of being rejected.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One entry: optional quoted-or-bare name, optional `<email>` segment.
static ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s*["']?([^><,;"']+)["']?\s*((?:<[^><,]+>)?)\s*"#)
        .expect("address entry pattern is valid")
});

/// A single parsed address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressEntry {
    /// The bare email address. Never empty when produced by the parser.
    pub email: String,
    /// Human-readable display name (may be empty).
    pub display_name: String,
}

impl AddressEntry {
    pub fn new(email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: display_name.into(),
        }
    }

    /// An address without a display name.
    pub fn bare(email: impl Into<String>) -> Self {
        Self::new(email, String::new())
    }

    /// Format for a provider `from`/`to` field: `"Name <email>"` or `"email"`.
    pub fn display(&self) -> String {
        if self.display_name.is_empty() {
            self.email.clone()
        } else {
            format!("{} <{}>", self.display_name, self.email)
        }
    }
}

impl std::fmt::Display for AddressEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Ordered `email -> display name` mapping produced by [`AddressList::parse`].
///
/// A repeated email keeps the position of its first occurrence and takes the
/// display name of its last one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressList {
    entries: IndexMap<String, String>,
}

impl AddressList {
    /// Parse a raw address list. Empty or whitespace-only input yields an
    /// empty list; nothing here ever fails.
    pub fn parse(raw: &str) -> Self {
        let mut entries = IndexMap::new();

        for caps in ENTRY_RE.captures_iter(raw) {
            let text = caps.get(1).map_or("", |m| m.as_str());
            let angle = caps.get(2).map_or("", |m| m.as_str());

            let (email, name) = if angle.is_empty() {
                // No `<...>` segment: the text itself is the address
                (text.trim(), "")
            } else {
                (angle.trim_matches(|c| c == '<' || c == '>').trim(), text.trim())
            };

            if email.is_empty() {
                continue;
            }
            entries.insert(email.to_string(), name.to_string());
        }

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Display name recorded for `email`, if present.
    pub fn get(&self, email: &str) -> Option<&str> {
        self.entries.get(email).map(String::as_str)
    }

    /// `(email, display_name)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(e, n)| (e.as_str(), n.as_str()))
    }

    pub fn into_entries(self) -> Vec<AddressEntry> {
        self.entries
            .into_iter()
            .map(|(email, display_name)| AddressEntry {
                email,
                display_name,
            })
            .collect()
    }
}
