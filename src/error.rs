//! Error types
//!
//! One taxonomy per concern: `SyncError` for mirror operations, `StreamError`
//! for the status stream transport, and `ApiError` for catalog/status fetches
//! and configuration plumbing.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single mirror operation (sync or offload).
#[derive(Debug, Error)]
pub enum SyncError {
    /// The node is a presentational placeholder with no backing identifier.
    #[error("resource has no identifier and cannot be synced")]
    InvalidNode,

    /// Network-layer failure before a response was obtained.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The remote answered with a non-success status.
    #[error("remote returned {status}: {message}")]
    Remote { status: u16, message: String },

    /// Access denied under the sync root. Recoverable: the caller may
    /// re-prompt for a new sync root and retry the same operation.
    #[error("permission denied at {0}")]
    Permission(PathBuf),

    /// Any other local I/O failure.
    #[error("filesystem failure: {0}")]
    Filesystem(#[source] std::io::Error),
}

impl SyncError {
    /// Classify an I/O error observed while touching `path`.
    ///
    /// Access-denied causes get their own variant so callers can run the
    /// sync-root recovery flow; everything else stays a plain filesystem
    /// failure.
    pub(crate) fn from_io(path: &std::path::Path, error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::PermissionDenied {
            SyncError::Permission(path.to_path_buf())
        } else {
            SyncError::Filesystem(error)
        }
    }
}

/// Connection-level failure of the status stream.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("failed to open stream: {0}")]
    Connect(String),

    #[error("stream closed by remote")]
    Closed,

    #[error("stream transport failure: {0}")]
    Transport(String),
}

/// Failure of a full fetch (course catalog, full status snapshot) or of
/// configuration/logging setup.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("remote returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("malformed response payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Pull a human-readable message out of a JSON error body, falling back to a
/// generic one when the body has no `message` field.
pub(crate) fn remote_message(body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(|message| message.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "Something went wrong".to_string())
}
