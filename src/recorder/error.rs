//! Session recorder error types.
//!
//! Recorder failures never stop the timer. The dispatcher uses
//! [`RecorderError::is_retryable`] to decide whether a failed operation is
//! queued for another attempt or dropped.

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while persisting timer sessions.
#[derive(Debug, Error)]
pub enum RecorderError {
    /// Reading or writing the session file failed.
    #[error("session store I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The session file could not be encoded or decoded.
    #[error("session store is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stop was recorded for a session that was never started.
    #[error("session {0} not found")]
    SessionNotFound(Uuid),

    /// A stop was recorded twice for the same session.
    #[error("session {0} was already stopped")]
    AlreadyStopped(Uuid),

    /// The backing store is temporarily unavailable.
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

impl RecorderError {
    /// Returns true if repeating the same operation later may succeed.
    ///
    /// A stop for an unknown session is retryable because its start may
    /// itself still be waiting in the retry queue.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Io { .. } | Self::Unavailable(_) | Self::SessionNotFound(_) => true,
            Self::Serialization(_) | Self::AlreadyStopped(_) => false,
        }
    }
}
