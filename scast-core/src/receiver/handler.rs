//! What the receiver does with each frame.

use std::time::Instant;

use tracing::{debug, trace};

use crate::analysis::FrameProcessor;
use crate::error::ScastError;
use crate::image::{Image, ImageDecoder};
use crate::stats::{FpsMeter, FrameStats};
use crate::transport::Frame;

/// Whether the receiver should keep going after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Stop the whole receiver, not just the current client.
    Shutdown,
}

/// Consumes complete frames in arrival order.
///
/// An `Err` drops that frame only; the connection stays open.
pub trait FrameHandler {
    fn on_frame(&mut self, frame: Frame) -> Result<Flow, ScastError>;
}

impl<F> FrameHandler for F
where
    F: FnMut(Frame) -> Result<Flow, ScastError>,
{
    fn on_frame(&mut self, frame: Frame) -> Result<Flow, ScastError> {
        self(frame)
    }
}

/// Presents processed images.
pub trait Display {
    fn show(&mut self, image: &Image) -> Result<(), ScastError>;

    /// Polled once per frame; `true` ends the receiver.
    fn stop_requested(&mut self) -> bool {
        false
    }

    /// Latest statistics, called after every shown frame.
    fn update_stats(&mut self, _stats: &FrameStats) {}
}

impl<T: Display + ?Sized> Display for Box<T> {
    fn show(&mut self, image: &Image) -> Result<(), ScastError> {
        (**self).show(image)
    }

    fn stop_requested(&mut self) -> bool {
        (**self).stop_requested()
    }

    fn update_stats(&mut self, stats: &FrameStats) {
        (**self).update_stats(stats)
    }
}

// ── DetectionPipeline ────────────────────────────────────────────

/// decode → process → show, with running statistics.
pub struct DetectionPipeline<D, P, S> {
    decoder: D,
    processor: P,
    display: S,
    fps: FpsMeter,
    stats: FrameStats,
}

impl<D, P, S> DetectionPipeline<D, P, S>
where
    D: ImageDecoder,
    P: FrameProcessor,
    S: Display,
{
    pub fn new(decoder: D, processor: P, display: S) -> Self {
        Self {
            decoder,
            processor,
            display,
            fps: FpsMeter::new(),
            stats: FrameStats::default(),
        }
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn display(&self) -> &S {
        &self.display
    }

    pub fn into_display(self) -> S {
        self.display
    }

    fn render(&mut self, payload: &[u8]) -> Result<(), ScastError> {
        let image = self.decoder.decode(payload)?;
        let image = self.processor.process(image)?;
        self.display.show(&image)?;

        self.stats.total_frames += 1;
        self.stats.width = image.width();
        self.stats.height = image.height();
        self.stats.fps = self.fps.tick(Instant::now());
        trace!(
            width = image.width(),
            height = image.height(),
            fps = self.stats.fps,
            "frame shown"
        );
        self.display.update_stats(&self.stats);
        Ok(())
    }
}

impl<D, P, S> FrameHandler for DetectionPipeline<D, P, S>
where
    D: ImageDecoder,
    P: FrameProcessor,
    S: Display,
{
    fn on_frame(&mut self, frame: Frame) -> Result<Flow, ScastError> {
        self.stats.total_bytes += frame.len() as u64;

        let rendered = self.render(frame.payload());
        if rendered.is_err() {
            self.stats.dropped_frames += 1;
        }

        // Polled on every frame, dropped or not; the window pumps its
        // messages here.
        if self.display.stop_requested() {
            debug!("display asked to stop");
            return Ok(Flow::Shutdown);
        }
        rendered.map(|()| Flow::Continue)
    }
}
