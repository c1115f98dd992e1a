//! Centralized error types for mailgunner.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the mailgunner library.
#[derive(Error, Debug)]
pub enum MailerError {
    /// The request could not be turned into a message (bad sender, empty
    /// recipient list, malformed attachment record or header).
    #[error("Invalid message: {0}")]
    Validation(String),

    /// Writing attachment contents to temporary storage failed.
    #[error("Failed to stage attachment '{filename}': {source}")]
    Staging {
        filename: String,
        source: std::io::Error,
    },

    /// `stage` was called on a registry that has already been released.
    #[error("Attachment registry already released")]
    RegistryReleased,

    /// The delivery adapter reported a failure.
    #[error("Delivery failed: {0}")]
    Transport(String),

    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias for `Result<T, MailerError>`.
pub type Result<T> = std::result::Result<T, MailerError>;

impl MailerError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a `Staging` variant for the attachment named `filename`.
    pub fn staging(filename: impl Into<String>, source: std::io::Error) -> Self {
        Self::Staging {
            filename: filename.into(),
            source,
        }
    }

    /// Shorthand for a `Validation` error.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    /// Shorthand for a `Transport` error.
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport(reason.into())
    }

    /// `true` for failures caused by the caller's input rather than by
    /// staging or delivery.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
