//! Frames as seen by the transport, and the ways a stream can end.

use bytes::Bytes;

/// One logical image payload.
///
/// The payload is immutable once constructed; clones share the buffer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    payload: Bytes,
}

impl Frame {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

impl From<Bytes> for Frame {
    fn from(payload: Bytes) -> Self {
        Self { payload }
    }
}

impl From<Vec<u8>> for Frame {
    fn from(payload: Vec<u8>) -> Self {
        Self::new(payload)
    }
}

/// Why a peer stopped delivering frames.
///
/// None of these are errors: the receiver treats all of them as the end of
/// the current client session. The distinction only feeds the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOfStream {
    /// The peer closed exactly on a frame boundary.
    Clean,
    /// The peer closed after sending part of a length prefix.
    TruncatedHeader { read: usize },
    /// The peer closed before the announced payload was complete.
    TruncatedPayload { read: u64, expected: u64 },
}

impl EndOfStream {
    /// Whether the close happened between frames.
    pub fn is_clean(&self) -> bool {
        matches!(self, EndOfStream::Clean)
    }
}

impl std::fmt::Display for EndOfStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndOfStream::Clean => write!(f, "peer closed the connection"),
            EndOfStream::TruncatedHeader { read } => {
                write!(f, "peer closed mid-header ({read} of 8 bytes)")
            }
            EndOfStream::TruncatedPayload { read, expected } => {
                write!(f, "peer closed mid-frame ({read} of {expected} bytes)")
            }
        }
    }
}

/// Outcome of a single `receive_frame` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    Frame(Frame),
    EndOfStream(EndOfStream),
}

impl Received {
    /// The frame, if one was received.
    pub fn into_frame(self) -> Option<Frame> {
        match self {
            Received::Frame(frame) => Some(frame),
            Received::EndOfStream(_) => None,
        }
    }
}
