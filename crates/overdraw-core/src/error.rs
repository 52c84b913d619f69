//! Error types for overdraw-core
//!
//! The engine does no I/O of its own, so the taxonomy is small: boundary
//! validation failures, decode failures and submitting into a stopped engine.

use thiserror::Error;

use crate::stroke::StrokeKey;

/// Engine error type
#[derive(Debug, Error)]
pub enum Error {
    /// The ingestion loop has stopped and no longer accepts events
    #[error("event queue closed")]
    QueueClosed,

    /// Event rejected at the boundary
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    /// Wire payload could not be decoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Append targeted a key with no live stroke
    #[error("stroke not found: {0}")]
    StrokeNotFound(StrokeKey),

    /// Insert targeted a key that already has a live stroke
    #[error("stroke already live: {0}")]
    StrokeExists(StrokeKey),
}

impl Error {
    /// Create an invalid event error
    #[must_use]
    pub fn invalid_event(msg: impl Into<String>) -> Self {
        Self::InvalidEvent(msg.into())
    }

    /// Create a serialization error
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Whether the producer can keep sending after this error
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::QueueClosed)
    }

    /// Get error code for protocol messages
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::QueueClosed => "queue_closed",
            Self::InvalidEvent(_) => "invalid_event",
            Self::Serialization(_) => "serialization_error",
            Self::StrokeNotFound(_) => "stroke_not_found",
            Self::StrokeExists(_) => "stroke_exists",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;
