//! Frame-rate and throughput statistics for the receiving side.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Number of inter-frame gaps averaged for the FPS estimate.
const FPS_WINDOW: usize = 60;

/// Per-frame statistics exposed to the display layer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    /// Current smoothed frames per second.
    pub fps: f64,
    /// Total frames displayed since start.
    pub total_frames: u64,
    /// Total payload bytes received (encoded size).
    pub total_bytes: u64,
    /// Frames dropped because they could not be decoded or processed.
    pub dropped_frames: u64,
    /// Last frame width.
    pub width: u32,
    /// Last frame height.
    pub height: u32,
}

/// Sliding-window FPS meter.
#[derive(Debug, Clone)]
pub struct FpsMeter {
    samples: VecDeque<Duration>,
    last: Option<Instant>,
}

impl FpsMeter {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(FPS_WINDOW + 1),
            last: None,
        }
    }

    /// Record a frame arriving at `now`; returns the updated estimate.
    pub fn tick(&mut self, now: Instant) -> f64 {
        if let Some(prev) = self.last.replace(now) {
            self.samples.push_back(now.saturating_duration_since(prev));
            if self.samples.len() > FPS_WINDOW {
                self.samples.pop_front();
            }
        }
        self.fps()
    }

    /// Current estimate; zero until two frames have been seen.
    pub fn fps(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let avg_secs: f64 =
            self.samples.iter().map(|d| d.as_secs_f64()).sum::<f64>() / self.samples.len() as f64;
        if avg_secs > 0.0 { 1.0 / avg_secs } else { 0.0 }
    }
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self::new()
    }
}
