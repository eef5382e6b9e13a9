//! Post-capture normalization.
//!
//! Every captured frame goes through the same three steps before encoding:
//! crop to the configured region, convert to packed BGR, and resize to the
//! output size with nearest-neighbour sampling.

use serde::{Deserialize, Serialize};

use crate::error::ScastError;
use crate::image::{Image, PixelFormat};

// ── CaptureRegion ────────────────────────────────────────────────

/// Rectangle of the screen to keep, in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRegion {
    /// Distance from the top edge of the screen.
    pub top: u32,
    /// Distance from the left edge of the screen.
    pub left: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for CaptureRegion {
    fn default() -> Self {
        Self {
            top: 100,
            left: 400,
            width: 1600,
            height: 1000,
        }
    }
}

impl CaptureRegion {
    /// Intersect with a `width × height` source. `None` if nothing is left.
    fn clamp_to(&self, width: u32, height: u32) -> Option<CaptureRegion> {
        if self.left >= width || self.top >= height {
            return None;
        }
        let w = self.width.min(width - self.left);
        let h = self.height.min(height - self.top);
        if w == 0 || h == 0 {
            return None;
        }
        Some(CaptureRegion {
            top: self.top,
            left: self.left,
            width: w,
            height: h,
        })
    }
}

// ── Normalizer ───────────────────────────────────────────────────

/// Crop, convert and resize captured frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalizer {
    region: Option<CaptureRegion>,
    output: Option<(u32, u32)>,
}

impl Normalizer {
    /// `region = None` keeps the whole screen, `output = None` keeps the
    /// cropped size.
    pub fn new(region: Option<CaptureRegion>, output: Option<(u32, u32)>) -> Self {
        Self {
            region,
            output: output.filter(|&(w, h)| w > 0 && h > 0),
        }
    }

    /// Pass frames through untouched apart from the BGR conversion.
    pub fn identity() -> Self {
        Self::new(None, None)
    }

    pub fn apply(&self, source: &Image) -> Result<Image, ScastError> {
        let full = CaptureRegion {
            top: 0,
            left: 0,
            width: source.width(),
            height: source.height(),
        };
        let region = self
            .region
            .unwrap_or(full)
            .clamp_to(source.width(), source.height())
            .ok_or_else(|| {
                ScastError::Capture(format!(
                    "capture region {:?} lies outside the {}x{} screen",
                    self.region,
                    source.width(),
                    source.height()
                ))
            })?;

        let (out_w, out_h) = self.output.unwrap_or((region.width, region.height));
        let mut out = Image::new(out_w, out_h, PixelFormat::Bgr8);
        let src_format = source.format();

        for y in 0..out_h {
            let sy = region.top + (y as u64 * region.height as u64 / out_h as u64) as u32;
            for x in 0..out_w {
                let sx = region.left + (x as u64 * region.width as u64 / out_w as u64) as u32;
                let bgr = src_format.to_bgr(source.pixel(sx, sy));
                out.pixel_mut(x, y).copy_from_slice(&bgr);
            }
        }

        Ok(out)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(Some(CaptureRegion::default()), Some((800, 600)))
    }
}

// ── Tests ────────────────────────────────────────────────────────
