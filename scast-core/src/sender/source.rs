//! Where outgoing frames come from.

use bytes::Bytes;

use crate::capture::{Normalizer, ScreenCapture};
use crate::error::ScastError;
use crate::image::ImageEncoder;

/// Produces the next payload to send.
///
/// An error skips the current streaming iteration; it does not close the
/// connection.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Bytes, ScastError>;
}

impl<F> FrameSource for F
where
    F: FnMut() -> Result<Bytes, ScastError>,
{
    fn next_frame(&mut self) -> Result<Bytes, ScastError> {
        self()
    }
}

/// Capture → normalize → encode.
pub struct CapturePipeline<C, E> {
    capture: C,
    normalizer: Normalizer,
    encoder: E,
    frames: u64,
}

impl<C: ScreenCapture, E: ImageEncoder> CapturePipeline<C, E> {
    pub fn new(capture: C, normalizer: Normalizer, encoder: E) -> Self {
        Self {
            capture,
            normalizer,
            encoder,
            frames: 0,
        }
    }

    /// Frames successfully produced so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl<C: ScreenCapture, E: ImageEncoder> FrameSource for CapturePipeline<C, E> {
    fn next_frame(&mut self) -> Result<Bytes, ScastError> {
        let raw = self.capture.capture()?;
        let image = self.normalizer.apply(&raw)?;
        let payload = self.encoder.encode(&image)?;
        self.frames += 1;
        Ok(payload)
    }
}
