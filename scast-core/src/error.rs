//! Domain-specific error types for scast.
//!
//! All fallible operations return `Result<T, ScastError>`. Which of these
//! are fatal and which only end the current connection or frame is decided
//! by the sender and receiver loops, not here.

use std::time::Duration;
use thiserror::Error;

/// The canonical error type for scast.
#[derive(Debug, Error)]
pub enum ScastError {
    // ── Wire Errors ──────────────────────────────────────────────
    /// Fewer than eight bytes were available for a length prefix.
    #[error("malformed length prefix: got {len} of 8 bytes")]
    MalformedLength { len: usize },

    /// The announced frame length exceeds the configured maximum.
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: u64, max: u64 },

    // ── Connection Errors ────────────────────────────────────────
    /// The TCP/IO layer reported an error.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// An outbound connection attempt failed.
    #[error("connect to {endpoint} failed: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    /// The listening socket could not be bound.
    #[error("bind on {endpoint} failed: {source}")]
    Bind {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    /// An operation exceeded its deadline.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    // ── Pipeline Errors ──────────────────────────────────────────
    /// An image payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// An image could not be encoded for transmission.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The screen capture backend failed.
    #[error("capture error: {0}")]
    Capture(String),

    /// The analysis step failed.
    #[error("processing error: {0}")]
    Processing(String),

    /// The display backend failed.
    #[error("display error: {0}")]
    Display(String),

    /// A configuration value is unusable.
    #[error("invalid config: {0}")]
    Config(String),

    /// Catch-all for errors that do not fit another variant.
    #[error("{0}")]
    Other(String),
}

impl ScastError {
    /// Whether the error means the peer or the socket went away, as
    /// opposed to a problem with a single frame.
    pub fn is_connection_loss(&self) -> bool {
        matches!(
            self,
            ScastError::Connection(_) | ScastError::Connect { .. } | ScastError::Timeout(_)
        )
    }
}

// ── Convenient From implementations ──────────────────────────────

impl From<String> for ScastError {
    fn from(s: String) -> Self {
        ScastError::Other(s)
    }
}

impl From<&str> for ScastError {
    fn from(s: &str) -> Self {
        ScastError::Other(s.to_string())
    }
}
