//! Receiver-side analysis of decoded frames.
//!
//! The processing step is a collaborator: anything implementing
//! [`FrameProcessor`] can sit between the decoder and the display. It runs
//! inline on the receive loop, so a slow processor directly limits how
//! fast frames are drained from the connection.

pub mod motion;

pub use motion::{Detection, MotionAnnotator};

use crate::error::ScastError;
use crate::image::Image;

/// Turns a decoded image into the annotated image to display.
pub trait FrameProcessor {
    fn process(&mut self, image: Image) -> Result<Image, ScastError>;
}

impl<T: FrameProcessor + ?Sized> FrameProcessor for Box<T> {
    fn process(&mut self, image: Image) -> Result<Image, ScastError> {
        (**self).process(image)
    }
}

/// Shows frames exactly as received.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl FrameProcessor for Passthrough {
    fn process(&mut self, image: Image) -> Result<Image, ScastError> {
        Ok(image)
    }
}
