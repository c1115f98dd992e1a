//! Attachment records before and after staging.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MailerError, Result};

/// Attachment as supplied by the caller: a filename and its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttachment {
    /// Name the recipient sees.
    pub filename: String,
    pub contents: Vec<u8>,
}

impl RawAttachment {
    pub fn new(filename: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            contents: contents.into(),
        }
    }

    /// Read an attachment from disk, naming it after the file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read(path).map_err(|e| MailerError::io(path, e))?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("attachment")
            .to_string();
        Ok(Self { filename, contents })
    }

    pub fn validate(&self) -> Result<()> {
        if self.filename.trim().is_empty() {
            return Err(MailerError::validation("attachment filename is empty"));
        }
        Ok(())
    }
}

/// Opaque reference to a staged file inside its attempt's registry.
///
/// The index is the staging order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandleId(pub(crate) usize);

impl HandleId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Attachment contents written to a temporary file, referenced by path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedAttachment {
    /// Location of the temporary file holding the contents.
    pub storage_path: PathBuf,
    /// Filename presented to the recipient.
    pub remote_name: String,
    pub handle: HandleId,
}

impl StagedAttachment {
    pub fn validate(&self) -> Result<()> {
        if self.storage_path.as_os_str().is_empty() {
            return Err(MailerError::validation(format!(
                "staged attachment '{}' has no storage path",
                self.remote_name
            )));
        }
        if self.remote_name.trim().is_empty() {
            return Err(MailerError::validation(format!(
                "staged attachment at '{}' has no remote name",
                self.storage_path.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_attachment_validate() {
        assert!(RawAttachment::new("a.txt", "x").validate().is_ok());
        assert!(RawAttachment::new("  ", "x").validate().is_err());
    }

    #[test]
    fn test_staged_attachment_validate() {
        let staged = StagedAttachment {
            storage_path: PathBuf::from("/tmp/SS_MG_TMP1"),
            remote_name: "image.jpg".to_string(),
            handle: HandleId(0),
        };
        assert!(staged.validate().is_ok());

        let no_path = StagedAttachment {
            storage_path: PathBuf::new(),
            ..staged.clone()
        };
        assert!(no_path.validate().unwrap_err().is_validation());

        let no_name = StagedAttachment {
            remote_name: String::new(),
            ..staged
        };
        assert!(no_name.validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_from_path_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let att = RawAttachment::from_path(&path).unwrap();
        assert_eq!(att.filename, "notes.txt");
        assert_eq!(att.contents, b"hello");
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = RawAttachment::from_path(Path::new("/nonexistent/file.bin")).unwrap_err();
        assert!(matches!(err, MailerError::Io { .. }));
    }
}
