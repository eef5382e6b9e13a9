//! Synthetic capture source.
//!
//! Renders a static gradient with a bright bar that moves a few pixels per
//! call, so the receiver's motion annotation has something to find.

use crate::capture::ScreenCapture;
use crate::error::ScastError;
use crate::image::{Image, PixelFormat};

/// Moving-bar test pattern in BGRA.
#[derive(Debug, Clone)]
pub struct PatternCapture {
    width: u32,
    height: u32,
    bar_width: u32,
    step: u32,
    tick: u64,
}

impl PatternCapture {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            bar_width: (width / 16).max(1),
            step: (width / 64).max(1),
            tick: 0,
        }
    }

    /// Frames produced so far.
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Left edge of the bar for the given tick.
    fn bar_x(&self, tick: u64) -> u32 {
        ((tick * self.step as u64) % self.width as u64) as u32
    }
}

impl ScreenCapture for PatternCapture {
    fn capture(&mut self) -> Result<Image, ScastError> {
        let mut img = Image::new(self.width, self.height, PixelFormat::Bgra8);
        let bar_start = self.bar_x(self.tick);
        let bar_end = bar_start + self.bar_width;

        for y in 0..self.height {
            let g = (y * 255 / self.height) as u8;
            for x in 0..self.width {
                let in_bar = x >= bar_start && x < bar_end;
                let bgr = if in_bar {
                    [0x20, 0xF0, 0xF0]
                } else {
                    [(x * 255 / self.width) as u8, g, 0x40]
                };
                PixelFormat::Bgra8.write_bgr(img.pixel_mut(x, y), bgr);
            }
        }

        self.tick += 1;
        Ok(img)
    }
}
