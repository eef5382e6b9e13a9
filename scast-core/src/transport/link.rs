//! A single connection carrying length-prefixed frames.
//!
//! Writes are always complete: the prefix and the payload each go through
//! `write_all`, so a short socket write is retried internally and never
//! reported as success. Reads are exact: the payload is accumulated across
//! as many socket reads as needed, each bounded by the configured chunk
//! size, and a peer close at any point yields [`Received::EndOfStream`]
//! instead of a truncated frame.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::codec::{ByteOrder, FrameCodec, PREFIX_LEN};
use crate::error::ScastError;
use crate::transport::frame::{EndOfStream, Frame, Received};

// ── Constants ────────────────────────────────────────────────────

/// Default upper bound on bytes requested per socket read.
pub const DEFAULT_READ_CHUNK: usize = 8 * 1024;

/// Default cap on an announced frame length (64 MiB).
pub const DEFAULT_MAX_FRAME_LEN: u64 = 64 * 1024 * 1024;

// ── LinkConfig ───────────────────────────────────────────────────

/// Static per-connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Maximum bytes requested from the socket in one read call.
    pub read_chunk_size: usize,
    /// Byte order of the length prefix.
    pub byte_order: ByteOrder,
    /// Largest frame the receiving side will allocate for.
    pub max_frame_len: Option<u64>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK,
            byte_order: ByteOrder::Little,
            max_frame_len: Some(DEFAULT_MAX_FRAME_LEN),
        }
    }
}

// ── LinkStats ────────────────────────────────────────────────────

/// Running counters for one link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub frames_sent: u64,
    pub frames_received: u64,
    /// Wire bytes written, prefixes included.
    pub bytes_sent: u64,
    /// Wire bytes read, prefixes included.
    pub bytes_received: u64,
    /// Socket read calls spent on payload bytes.
    pub payload_reads: u64,
}

// ── TransportLink ────────────────────────────────────────────────

/// Owns one duplex stream and moves whole frames across it.
///
/// A link is used by exactly one loop at a time; it has no internal
/// locking. Drop it (or call [`shutdown`](Self::shutdown)) to close the
/// connection.
pub struct TransportLink<S> {
    stream: S,
    codec: FrameCodec,
    read_chunk_size: usize,
    stats: LinkStats,
}

impl<S> TransportLink<S> {
    /// Wrap an already-connected stream.
    pub fn new(stream: S, config: LinkConfig) -> Self {
        Self {
            stream,
            codec: FrameCodec::new(config.byte_order).with_max_frame_len(config.max_frame_len),
            read_chunk_size: config.read_chunk_size.max(1),
            stats: LinkStats::default(),
        }
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: AsyncWrite + Unpin> TransportLink<S> {
    /// Send one frame: length prefix, then payload, then flush.
    ///
    /// Either the whole record reaches the socket or an error is
    /// returned; in the latter case the connection must be discarded.
    pub async fn send_frame(&mut self, payload: impl Into<Bytes>) -> Result<(), ScastError> {
        let record = self.codec.encode(payload.into());

        self.stream.write_all(record.prefix()).await?;
        self.stream.write_all(record.payload()).await?;
        self.stream.flush().await?;

        self.stats.frames_sent += 1;
        self.stats.bytes_sent += record.wire_len() as u64;
        trace!(len = record.payload().len(), "frame sent");
        Ok(())
    }

    /// Flush and close the write half.
    pub async fn shutdown(&mut self) -> Result<(), ScastError> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

impl<S: AsyncRead + Unpin> TransportLink<S> {
    /// Receive the next frame.
    ///
    /// Returns [`Received::Frame`] with exactly the announced number of
    /// bytes (possibly zero), or [`Received::EndOfStream`] if the peer
    /// closed before or during the frame. Socket errors and oversized
    /// announcements are returned as `Err`.
    pub async fn receive_frame(&mut self) -> Result<Received, ScastError> {
        let mut prefix = [0u8; PREFIX_LEN];
        let got = self.read_prefix(&mut prefix).await?;
        self.stats.bytes_received += got as u64;

        let announced = match self.codec.decode_length(&prefix[..got]) {
            Ok(len) => len,
            Err(ScastError::MalformedLength { len: 0 }) => {
                return Ok(Received::EndOfStream(EndOfStream::Clean));
            }
            Err(ScastError::MalformedLength { len }) => {
                return Ok(Received::EndOfStream(EndOfStream::TruncatedHeader { read: len }));
            }
            Err(e) => return Err(e),
        };
        let len = self.codec.check_length(announced)?;

        let mut payload = vec![0u8; len];
        let mut filled = 0usize;
        while filled < len {
            let want = self.read_chunk_size.min(len - filled);
            let n = self.stream.read(&mut payload[filled..filled + want]).await?;
            self.stats.payload_reads += 1;
            if n == 0 {
                self.stats.bytes_received += filled as u64;
                return Ok(Received::EndOfStream(EndOfStream::TruncatedPayload {
                    read: filled as u64,
                    expected: announced,
                }));
            }
            filled += n;
        }

        self.stats.frames_received += 1;
        self.stats.bytes_received += len as u64;
        trace!(len, "frame received");
        Ok(Received::Frame(Frame::new(payload)))
    }

    /// Read up to [`PREFIX_LEN`] bytes, stopping early only at EOF.
    async fn read_prefix(&mut self, prefix: &mut [u8; PREFIX_LEN]) -> Result<usize, ScastError> {
        let mut filled = 0usize;
        while filled < PREFIX_LEN {
            let n = self.stream.read(&mut prefix[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }
}

// ── Tests ────────────────────────────────────────────────────────
