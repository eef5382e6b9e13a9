//! Image payload encoding.
//!
//! The transport treats payloads as opaque bytes; this module defines what
//! the bundled sender and receiver put inside them.
//!
//! ## Payload layout (little-endian)
//!
//! ```text
//! magic:   [u8; 4]  "SCI1"
//! width:   u32      (4)
//! height:  u32      (4)
//! format:  u8       (1, PixelFormat tag)
//! pixels:  [u8]     zstd-compressed, tightly packed rows
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::ScastError;
use crate::image::types::{Image, PixelFormat};

/// Size of the fixed header preceding compressed pixels.
pub const IMAGE_HEADER_LEN: usize = 13;

const MAGIC: &[u8; 4] = b"SCI1";

/// Largest image the decoder will inflate (16k x 16k BGRA).
const MAX_DECODED_LEN: usize = 16_384 * 16_384 * 4;

// ── Traits ───────────────────────────────────────────────────────

/// Turns an image into an opaque payload (sender side).
pub trait ImageEncoder {
    fn encode(&mut self, image: &Image) -> Result<Bytes, ScastError>;
}

/// Turns a payload back into an image (receiver side).
///
/// A failure here drops the frame; it never tears the connection down.
pub trait ImageDecoder {
    fn decode(&mut self, payload: &[u8]) -> Result<Image, ScastError>;
}

// ── ZstdImageCodec ───────────────────────────────────────────────

/// Lossless zstd codec for raw pixel buffers.
#[derive(Debug, Clone)]
pub struct ZstdImageCodec {
    /// zstd compression level (1 = fastest, 19 = smallest).
    level: i32,
}

impl ZstdImageCodec {
    pub fn new(level: i32) -> Self {
        Self {
            level: level.clamp(1, 19),
        }
    }

    pub fn level(&self) -> i32 {
        self.level
    }
}

impl Default for ZstdImageCodec {
    fn default() -> Self {
        Self::new(3)
    }
}

impl ImageEncoder for ZstdImageCodec {
    fn encode(&mut self, image: &Image) -> Result<Bytes, ScastError> {
        let pixels = image.to_packed();
        let compressed = zstd::bulk::compress(&pixels, self.level)
            .map_err(|e| ScastError::Encoding(format!("zstd encode failed: {e}")))?;

        let mut out = BytesMut::with_capacity(IMAGE_HEADER_LEN + compressed.len());
        out.put_slice(MAGIC);
        out.put_u32_le(image.width());
        out.put_u32_le(image.height());
        out.put_u8(image.format().tag());
        out.put_slice(&compressed);
        Ok(out.freeze())
    }
}

impl ImageDecoder for ZstdImageCodec {
    fn decode(&mut self, payload: &[u8]) -> Result<Image, ScastError> {
        if payload.len() < IMAGE_HEADER_LEN {
            return Err(ScastError::Decode(format!(
                "payload too short for image header: {} < {IMAGE_HEADER_LEN}",
                payload.len()
            )));
        }
        if &payload[0..4] != MAGIC {
            return Err(ScastError::Decode("bad image magic".into()));
        }

        let width = u32::from_le_bytes([payload[4], payload[5], payload[6], payload[7]]);
        let height = u32::from_le_bytes([payload[8], payload[9], payload[10], payload[11]]);
        let format = PixelFormat::from_tag(payload[12])
            .ok_or_else(|| ScastError::Decode(format!("unknown pixel format {}", payload[12])))?;
        if width == 0 || height == 0 {
            return Err(ScastError::Decode(format!("empty image {width}x{height}")));
        }
        let stride = width
            .checked_mul(format.bytes_per_pixel() as u32)
            .ok_or_else(|| ScastError::Decode(format!("implausible image width {width}")))?;

        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(format.bytes_per_pixel()))
            .filter(|&n| n <= MAX_DECODED_LEN)
            .ok_or_else(|| ScastError::Decode(format!("implausible image size {width}x{height}")))?;

        let pixels = zstd::bulk::decompress(&payload[IMAGE_HEADER_LEN..], expected)
            .map_err(|e| ScastError::Decode(format!("zstd decode failed: {e}")))?;
        if pixels.len() != expected {
            return Err(ScastError::Decode(format!(
                "pixel data length mismatch: expected {expected}, got {}",
                pixels.len()
            )));
        }

        Image::from_raw(width, height, stride, format, pixels)
            .map_err(|e| ScastError::Decode(e.to_string()))
    }
}

// ── Tests ────────────────────────────────────────────────────────
