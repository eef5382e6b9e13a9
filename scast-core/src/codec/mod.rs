//! Length-prefixed wire records.
//!
//! Every frame on the wire is an 8-byte unsigned length followed by exactly
//! that many payload bytes:
//!
//! ```text
//! length:   u64  (8, byte order fixed per deployment)
//! payload:  [u8] (length bytes)
//! ```
//!
//! There is no magic, version byte or checksum. Both ends must agree on the
//! byte order out-of-band; a mismatch shows up as absurd lengths, which is
//! why the decoder carries an optional maximum.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::ScastError;

/// Width of the length prefix in bytes.
pub const PREFIX_LEN: usize = 8;

// ── ByteOrder ────────────────────────────────────────────────────

/// Byte order of the length prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    /// Little-endian (the default; matches native order on x86 and ARM).
    #[default]
    Little,
    /// Big-endian / network order.
    Big,
    /// Whatever the build target uses.
    Native,
}

impl ByteOrder {
    /// Serialize a length into prefix bytes.
    pub fn write_u64(self, value: u64) -> [u8; PREFIX_LEN] {
        match self {
            ByteOrder::Little => value.to_le_bytes(),
            ByteOrder::Big => value.to_be_bytes(),
            ByteOrder::Native => value.to_ne_bytes(),
        }
    }

    /// Parse prefix bytes into a length.
    pub fn read_u64(self, bytes: [u8; PREFIX_LEN]) -> u64 {
        match self {
            ByteOrder::Little => u64::from_le_bytes(bytes),
            ByteOrder::Big => u64::from_be_bytes(bytes),
            ByteOrder::Native => u64::from_ne_bytes(bytes),
        }
    }
}

// ── WireRecord ───────────────────────────────────────────────────

/// One frame in its on-the-wire form: prefix plus payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRecord {
    prefix: [u8; PREFIX_LEN],
    payload: Bytes,
}

impl WireRecord {
    /// The encoded length prefix.
    pub fn prefix(&self) -> &[u8; PREFIX_LEN] {
        &self.prefix
    }

    /// The payload bytes.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Total bytes this record occupies on the wire.
    pub fn wire_len(&self) -> usize {
        PREFIX_LEN + self.payload.len()
    }

    /// Flatten into a single contiguous buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.wire_len());
        buf.put_slice(&self.prefix);
        buf.put_slice(&self.payload);
        buf.freeze()
    }
}

// ── FrameCodec ───────────────────────────────────────────────────

/// Encoder/decoder for length-prefixed frames.
///
/// Used directly by [`TransportLink`](crate::transport::TransportLink) and
/// usable with `tokio_util::codec::{FramedRead, FramedWrite}`.
#[derive(Debug, Clone, Default)]
pub struct FrameCodec {
    byte_order: ByteOrder,
    max_frame_len: Option<u64>,
}

impl FrameCodec {
    /// Create a codec using `byte_order` with no frame length limit.
    pub fn new(byte_order: ByteOrder) -> Self {
        Self {
            byte_order,
            max_frame_len: None,
        }
    }

    /// Reject announced lengths above `max` when decoding.
    pub fn with_max_frame_len(mut self, max: Option<u64>) -> Self {
        self.max_frame_len = max;
        self
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn max_frame_len(&self) -> Option<u64> {
        self.max_frame_len
    }

    /// Wrap `payload` into a wire record. No size limit is applied here.
    pub fn encode(&self, payload: Bytes) -> WireRecord {
        WireRecord {
            prefix: self.byte_order.write_u64(payload.len() as u64),
            payload,
        }
    }

    /// Parse a length prefix.
    ///
    /// Fails with [`ScastError::MalformedLength`] unless exactly
    /// [`PREFIX_LEN`] bytes are given.
    pub fn decode_length(&self, prefix: &[u8]) -> Result<u64, ScastError> {
        let bytes: [u8; PREFIX_LEN] = prefix
            .try_into()
            .map_err(|_| ScastError::MalformedLength { len: prefix.len() })?;
        Ok(self.byte_order.read_u64(bytes))
    }

    /// Check an announced length against the configured maximum.
    pub fn check_length(&self, len: u64) -> Result<usize, ScastError> {
        if let Some(max) = self.max_frame_len {
            if len > max {
                return Err(ScastError::FrameTooLarge { size: len, max });
            }
        }
        usize::try_from(len).map_err(|_| ScastError::FrameTooLarge {
            size: len,
            max: usize::MAX as u64,
        })
    }
}

impl tokio_util::codec::Decoder for FrameCodec {
    type Item = Bytes;
    type Error = ScastError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < PREFIX_LEN {
            return Ok(None);
        }

        let len = self.decode_length(&src[..PREFIX_LEN])?;
        let len = self.check_length(len)?;

        if src.len() < PREFIX_LEN + len {
            src.reserve(PREFIX_LEN + len - src.len());
            return Ok(None);
        }

        src.advance(PREFIX_LEN);
        Ok(Some(src.split_to(len).freeze()))
    }
}

impl tokio_util::codec::Encoder<Bytes> for FrameCodec {
    type Error = ScastError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(PREFIX_LEN + item.len());
        dst.put_slice(&self.byte_order.write_u64(item.len() as u64));
        dst.put_slice(&item);
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::codec::{Decoder, Encoder};

    #[test]
    fn empty_payload_has_zero_prefix() {
        let codec = FrameCodec::default();
        let record = codec.encode(Bytes::new());
        assert_eq!(record.prefix(), &[0u8; 8]);
        assert_eq!(record.wire_len(), 8);
        assert_eq!(record.to_bytes().as_ref(), &[0u8; 8]);
    }

    #[test]
    fn prefix_respects_byte_order() {
        let payload = Bytes::from(vec![7u8; 258]);

        let le = FrameCodec::new(ByteOrder::Little).encode(payload.clone());
        assert_eq!(le.prefix(), &[2, 1, 0, 0, 0, 0, 0, 0]);

        let be = FrameCodec::new(ByteOrder::Big).encode(payload);
        assert_eq!(be.prefix(), &[0, 0, 0, 0, 0, 0, 1, 2]);
    }

    #[test]
    fn decode_length_reads_configured_order() {
        let codec = FrameCodec::new(ByteOrder::Big);
        assert_eq!(codec.decode_length(&[0, 0, 0, 0, 0, 0, 1, 0]).unwrap(), 256);
    }

    #[test]
    fn short_prefix_is_malformed() {
        let codec = FrameCodec::default();
        let err = codec.decode_length(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, ScastError::MalformedLength { len: 3 }));
    }

    #[test]
    fn check_length_enforces_maximum() {
        let codec = FrameCodec::default().with_max_frame_len(Some(1024));
        assert_eq!(codec.check_length(1024).unwrap(), 1024);
        assert!(matches!(
            codec.check_length(1025),
            Err(ScastError::FrameTooLarge { size: 1025, max: 1024 })
        ));
    }

    #[test]
    fn decoder_waits_for_complete_frame() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::new();

        buf.put_slice(&5u64.to_le_bytes()[..4]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.put_slice(&5u64.to_le_bytes()[4..]);
        buf.put_slice(b"hel");
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.put_slice(b"lo");
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.as_ref(), b"hello");
        assert!(buf.is_empty());
    }

    #[test]
    fn decoder_splits_back_to_back_frames() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::new();
        Encoder::encode(&mut codec, Bytes::from_static(b"ab"), &mut buf).unwrap();
        Encoder::encode(&mut codec, Bytes::new(), &mut buf).unwrap();
        Encoder::encode(&mut codec, Bytes::from_static(b"cde"), &mut buf).unwrap();

        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().as_ref(), b"ab");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().len(), 0);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().as_ref(), b"cde");
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn decoder_rejects_oversized_frame() {
        let mut codec = FrameCodec::default().with_max_frame_len(Some(16));
        let mut buf = BytesMut::new();
        buf.put_slice(&17u64.to_le_bytes());
        assert!(matches!(
            codec.decode(&mut buf),
            Err(ScastError::FrameTooLarge { .. })
        ));
    }
}
