//! Pixel formats and raw image buffers.

use serde::{Deserialize, Serialize};

use crate::error::ScastError;

// ── PixelFormat ──────────────────────────────────────────────────

/// Pixel layout of an [`Image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// 4 bytes per pixel: Blue, Green, Red, Alpha (DXGI default).
    Bgra8,
    /// 4 bytes per pixel: Red, Green, Blue, Alpha.
    Rgba8,
    /// 3 bytes per pixel: Blue, Green, Red.
    Bgr8,
}

impl PixelFormat {
    /// Bytes consumed by a single pixel in this format.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Bgra8 | PixelFormat::Rgba8 => 4,
            PixelFormat::Bgr8 => 3,
        }
    }

    /// Wire tag used in encoded image headers.
    pub const fn tag(self) -> u8 {
        match self {
            PixelFormat::Bgra8 => 0,
            PixelFormat::Rgba8 => 1,
            PixelFormat::Bgr8 => 2,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(PixelFormat::Bgra8),
            1 => Some(PixelFormat::Rgba8),
            2 => Some(PixelFormat::Bgr8),
            _ => None,
        }
    }

    /// Read one pixel as `[b, g, r]`.
    pub fn to_bgr(self, px: &[u8]) -> [u8; 3] {
        match self {
            PixelFormat::Bgra8 | PixelFormat::Bgr8 => [px[0], px[1], px[2]],
            PixelFormat::Rgba8 => [px[2], px[1], px[0]],
        }
    }

    /// Write `[b, g, r]` into one pixel, setting alpha opaque.
    pub fn write_bgr(self, px: &mut [u8], bgr: [u8; 3]) {
        match self {
            PixelFormat::Bgr8 => px.copy_from_slice(&bgr),
            PixelFormat::Bgra8 => px.copy_from_slice(&[bgr[0], bgr[1], bgr[2], 0xFF]),
            PixelFormat::Rgba8 => px.copy_from_slice(&[bgr[2], bgr[1], bgr[0], 0xFF]),
        }
    }
}

// ── Image ────────────────────────────────────────────────────────

/// An uncompressed image.
///
/// The `data` buffer holds `height` rows of `stride` bytes each. `stride`
/// may exceed `width * bytes_per_pixel` for captured frames (GPU row
/// alignment); images produced by normalization are tightly packed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    stride: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl Image {
    /// A black, tightly packed image.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let stride = width * format.bytes_per_pixel() as u32;
        Self {
            width,
            height,
            stride,
            format,
            data: vec![0u8; stride as usize * height as usize],
        }
    }

    /// Wrap an existing buffer, checking that it is large enough.
    pub fn from_raw(
        width: u32,
        height: u32,
        stride: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, ScastError> {
        let min_stride = width as usize * format.bytes_per_pixel();
        if (stride as usize) < min_stride {
            return Err(ScastError::Other(format!(
                "stride {stride} shorter than a {width}px {format:?} row"
            )));
        }
        let needed = stride as usize * height as usize;
        if data.len() < needed {
            return Err(ScastError::Other(format!(
                "image buffer too small: {} < {needed}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            stride,
            format,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row pitch in bytes.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether rows carry no padding.
    pub fn is_packed(&self) -> bool {
        self.stride as usize == self.width as usize * self.format.bytes_per_pixel()
    }

    /// Visible bytes of row `y` (padding excluded).
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride as usize;
        let end = start + self.width as usize * self.format.bytes_per_pixel();
        &self.data[start..end]
    }

    /// The pixel bytes at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let offset = self.offset(x, y);
        &self.data[offset..offset + self.format.bytes_per_pixel()]
    }

    /// Mutable pixel bytes at `(x, y)`.
    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [u8] {
        let offset = self.offset(x, y);
        let bpp = self.format.bytes_per_pixel();
        &mut self.data[offset..offset + bpp]
    }

    /// Copy into a tightly packed buffer (rows only, no padding).
    pub fn to_packed(&self) -> Vec<u8> {
        if self.is_packed() {
            return self.data[..self.stride as usize * self.height as usize].to_vec();
        }
        let mut out =
            Vec::with_capacity(self.width as usize * self.height as usize * self.format.bytes_per_pixel());
        for y in 0..self.height {
            out.extend_from_slice(self.row(y));
        }
        out
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        y as usize * self.stride as usize + x as usize * self.format.bytes_per_pixel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_tags_roundtrip() {
        for f in [PixelFormat::Bgra8, PixelFormat::Rgba8, PixelFormat::Bgr8] {
            assert_eq!(PixelFormat::from_tag(f.tag()), Some(f));
        }
        assert_eq!(PixelFormat::from_tag(9), None);
    }

    #[test]
    fn rgba_swaps_to_bgr() {
        assert_eq!(PixelFormat::Rgba8.to_bgr(&[1, 2, 3, 4]), [3, 2, 1]);
        let mut px = [0u8; 4];
        PixelFormat::Rgba8.write_bgr(&mut px, [3, 2, 1]);
        assert_eq!(px, [1, 2, 3, 255]);
    }

    #[test]
    fn padded_rows_are_skipped() {
        // 2x2 BGR with 8-byte stride (2 bytes of padding per row).
        let data = vec![
            1, 1, 1, 2, 2, 2, 0xEE, 0xEE, //
            3, 3, 3, 4, 4, 4, 0xEE, 0xEE,
        ];
        let img = Image::from_raw(2, 2, 8, PixelFormat::Bgr8, data).unwrap();
        assert!(!img.is_packed());
        assert_eq!(img.row(1), &[3, 3, 3, 4, 4, 4]);
        assert_eq!(img.pixel(1, 0), &[2, 2, 2]);
        assert_eq!(img.to_packed(), vec![1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4]);
    }

    #[test]
    fn from_raw_rejects_short_buffer() {
        assert!(Image::from_raw(4, 4, 16, PixelFormat::Bgra8, vec![0; 63]).is_err());
        assert!(Image::from_raw(4, 4, 8, PixelFormat::Bgra8, vec![0; 64]).is_err());
    }

    #[test]
    fn pixel_mut_writes_through() {
        let mut img = Image::new(3, 2, PixelFormat::Bgra8);
        img.pixel_mut(2, 1).copy_from_slice(&[9, 8, 7, 6]);
        assert_eq!(img.pixel(2, 1), &[9, 8, 7, 6]);
        assert_eq!(img.data().len(), 24);
    }
}
