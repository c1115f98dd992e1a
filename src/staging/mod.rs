//! Attachment staging and release.
//!
//! Provider transports reference attachments by file path, so the bytes the
//! caller hands over are written to temporary files first. Each send attempt
//! owns one [`AttachmentStager`]: an append-only registry of open handles,
//! indexed by staging order, that is released exactly once when the attempt
//! ends.
//!
//! ```text
//! Empty ──stage──▶ Staging ──stage──▶ Staging
//!   │                 │
//!   └──release_all────┴──────────────▶ Released (terminal)
//! ```

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tracing::{debug, warn};

use crate::config::StagingConfig;
use crate::error::{MailerError, Result};
use crate::model::attachment::{HandleId, RawAttachment, StagedAttachment};

/// Lifecycle of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagerState {
    Empty,
    Staging,
    Released,
}

/// An open handle and the file it belongs to.
struct StagedFile {
    file: File,
    path: TempPath,
}

/// Attempt-scoped registry of staged attachment files.
///
/// Dropping a stager that was never released releases it, so an unwinding
/// panic does not leave files behind either.
pub struct AttachmentStager {
    dir: Option<PathBuf>,
    prefix: String,
    files: Vec<StagedFile>,
    staged_bytes: u64,
    state: StagerState,
}

impl AttachmentStager {
    pub fn new(config: &StagingConfig) -> Self {
        Self {
            dir: config.temp_dir.clone(),
            prefix: config.file_prefix.clone(),
            files: Vec::new(),
            staged_bytes: 0,
            state: StagerState::Empty,
        }
    }

    /// Stager writing into `dir` instead of the configured location.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(&StagingConfig {
            temp_dir: Some(dir.into()),
            ..StagingConfig::default()
        })
    }

    pub fn state(&self) -> StagerState {
        self.state
    }

    /// Number of files currently held.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total bytes written by this registry.
    pub fn staged_bytes(&self) -> u64 {
        self.staged_bytes
    }

    /// Paths of every file still held, in staging order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|f| &*f.path)
    }

    /// Write `attachment` to a new temporary file and record it.
    ///
    /// A file whose write fails is removed before the error is returned and
    /// is never recorded.
    pub fn stage(&mut self, attachment: &RawAttachment) -> Result<StagedAttachment> {
        if self.state == StagerState::Released {
            return Err(MailerError::RegistryReleased);
        }
        attachment.validate()?;

        let mut builder = tempfile::Builder::new();
        builder.prefix(&self.prefix);
        let named = match &self.dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| MailerError::staging(&attachment.filename, e))?;

        let (mut file, path) = named.into_parts();
        file.write_all(&attachment.contents)
            .and_then(|()| file.flush())
            .map_err(|e| MailerError::staging(&attachment.filename, e))?;

        let staged = StagedAttachment {
            storage_path: path.to_path_buf(),
            remote_name: attachment.filename.clone(),
            handle: HandleId(self.files.len()),
        };
        debug!(
            path = %staged.storage_path.display(),
            filename = %staged.remote_name,
            bytes = attachment.contents.len(),
            "Staged attachment"
        );

        self.staged_bytes += attachment.contents.len() as u64;
        self.files.push(StagedFile { file, path });
        self.state = StagerState::Staging;
        Ok(staged)
    }

    /// Stage every attachment in order, stopping at the first failure.
    ///
    /// Files staged before the failure stay registered until `release_all`.
    pub fn stage_all(&mut self, attachments: &[RawAttachment]) -> Result<Vec<StagedAttachment>> {
        attachments.iter().map(|a| self.stage(a)).collect()
    }

    /// Close every handle, delete every file, and mark the registry released.
    ///
    /// Deletion failures are logged and otherwise ignored. Returns the number
    /// of files released; calling it again is a no-op returning 0.
    pub fn release_all(&mut self) -> usize {
        let count = self.files.len();
        for StagedFile { file, path } in self.files.drain(..) {
            drop(file);
            let staged_path = path.to_path_buf();
            if let Err(e) = path.close() {
                warn!(
                    path = %staged_path.display(),
                    error = %e,
                    "Could not remove staged attachment"
                );
            }
        }
        self.state = StagerState::Released;
        count
    }
}

impl Drop for AttachmentStager {
    fn drop(&mut self) {
        if self.state != StagerState::Released {
            self.release_all();
        }
    }
}

impl std::fmt::Debug for AttachmentStager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachmentStager")
            .field("dir", &self.dir)
            .field("files", &self.files.len())
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries_in(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_stage_writes_contents() {
        let dir = tempfile::tempdir().unwrap();
        let mut stager = AttachmentStager::in_dir(dir.path());

        let staged = stager
            .stage(&RawAttachment::new("notes.txt", "test file contents"))
            .unwrap();

        assert_eq!(staged.remote_name, "notes.txt");
        assert_eq!(staged.handle.index(), 0);
        assert!(staged.storage_path.starts_with(dir.path()));
        assert_eq!(
            std::fs::read_to_string(&staged.storage_path).unwrap(),
            "test file contents"
        );
        assert_eq!(stager.state(), StagerState::Staging);
        assert_eq!(stager.staged_bytes(), 18);
    }

    #[test]
    fn test_file_names_use_prefix_and_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let mut stager = AttachmentStager::in_dir(dir.path());

        let a = stager.stage(&RawAttachment::new("a.jpg", "abc")).unwrap();
        let b = stager.stage(&RawAttachment::new("a.jpg", "abc")).unwrap();

        assert_ne!(a.storage_path, b.storage_path);
        assert_eq!(b.handle.index(), 1);
        let name = a.storage_path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("SS_MG_TMP"), "unexpected name {name}");
    }

    #[test]
    fn test_release_all_removes_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut stager = AttachmentStager::in_dir(dir.path());
        stager.stage(&RawAttachment::new("1.txt", "one")).unwrap();
        stager.stage(&RawAttachment::new("2.txt", "two")).unwrap();
        assert_eq!(entries_in(dir.path()), 2);

        assert_eq!(stager.release_all(), 2);
        assert_eq!(entries_in(dir.path()), 0);
        assert!(stager.is_empty());
        assert_eq!(stager.state(), StagerState::Released);
    }

    #[test]
    fn test_release_empty_is_noop() {
        let mut stager = AttachmentStager::new(&StagingConfig::default());
        assert_eq!(stager.state(), StagerState::Empty);
        assert_eq!(stager.release_all(), 0);
        assert_eq!(stager.release_all(), 0);
        assert_eq!(stager.state(), StagerState::Released);
    }

    #[test]
    fn test_release_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut stager = AttachmentStager::in_dir(dir.path());
        let staged = stager.stage(&RawAttachment::new("gone.txt", "x")).unwrap();
        stager.stage(&RawAttachment::new("kept.txt", "y")).unwrap();
        std::fs::remove_file(&staged.storage_path).unwrap();

        // A failed delete is logged and does not stop the remaining releases
        assert_eq!(stager.release_all(), 2);
        assert_eq!(stager.state(), StagerState::Released);
        assert_eq!(entries_in(dir.path()), 0);
    }

    #[test]
    fn test_stage_after_release_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut stager = AttachmentStager::in_dir(dir.path());
        stager.release_all();

        let err = stager.stage(&RawAttachment::new("late.txt", "x")).unwrap_err();
        assert!(matches!(err, MailerError::RegistryReleased));
        assert_eq!(entries_in(dir.path()), 0);
    }

    #[test]
    fn test_stage_into_missing_dir_is_staging_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut stager = AttachmentStager::in_dir(dir.path().join("does-not-exist"));

        let err = stager.stage(&RawAttachment::new("a.txt", "x")).unwrap_err();
        assert!(matches!(err, MailerError::Staging { ref filename, .. } if filename == "a.txt"));
        assert_eq!(stager.state(), StagerState::Empty);
    }

    #[test]
    fn test_drop_releases() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut stager = AttachmentStager::in_dir(dir.path());
            stager.stage(&RawAttachment::new("a.txt", "x")).unwrap();
            assert_eq!(entries_in(dir.path()), 1);
        }
        assert_eq!(entries_in(dir.path()), 0);
    }
}
