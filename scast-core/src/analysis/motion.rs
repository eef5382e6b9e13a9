//! Block-level motion detection and annotation.
//!
//! Divides each frame into `block_size × block_size` tiles and compares
//! every tile against the previous frame. Changed tiles that touch each
//! other (4-neighbourhood) are merged into one [`Detection`] whose bounding
//! box is drawn onto the outgoing image.

use std::cmp;

use tracing::trace;

use crate::analysis::FrameProcessor;
use crate::error::ScastError;
use crate::image::Image;

// ── Detection ────────────────────────────────────────────────────

/// A rectangular region that moved since the previous frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Number of changed tiles merged into this region.
    pub blocks: u32,
}

// ── MotionAnnotator ──────────────────────────────────────────────

/// Stateful detector that remembers the previous frame.
pub struct MotionAnnotator {
    block_size: u32,
    /// Per-channel difference a pixel must exceed to count as changed.
    threshold: u8,
    /// Box colour as `[b, g, r]`.
    color: [u8; 3],
    previous: Option<Image>,
    last: Vec<Detection>,
}

impl MotionAnnotator {
    /// Create a detector with the given tile size (in pixels).
    pub fn new(block_size: u32, threshold: u8) -> Self {
        Self {
            block_size: block_size.max(1),
            threshold,
            color: [0x00, 0xFF, 0x00],
            previous: None,
            last: Vec::new(),
        }
    }

    /// Box colour as `[b, g, r]`.
    pub fn with_color(mut self, bgr: [u8; 3]) -> Self {
        self.color = bgr;
        self
    }

    /// Forget the previous frame; the next frame yields no detections.
    pub fn reset(&mut self) {
        self.previous = None;
        self.last.clear();
    }

    /// Detections from the most recent frame.
    pub fn last_detections(&self) -> &[Detection] {
        &self.last
    }

    /// Compare `current` against the stored previous frame.
    ///
    /// The first frame, and any frame whose size or format differs from
    /// its predecessor, produces no detections.
    pub fn detect(&self, current: &Image) -> Vec<Detection> {
        let prev = match &self.previous {
            Some(p)
                if p.width() == current.width()
                    && p.height() == current.height()
                    && p.format() == current.format() =>
            {
                p
            }
            _ => return Vec::new(),
        };

        let bs = self.block_size;
        let blocks_x = current.width().div_ceil(bs);
        let blocks_y = current.height().div_ceil(bs);

        let mut changed = vec![false; (blocks_x * blocks_y) as usize];
        for by in 0..blocks_y {
            for bx in 0..blocks_x {
                changed[(by * blocks_x + bx) as usize] = self.block_differs(current, prev, bx, by);
            }
        }

        self.merge(&changed, blocks_x, blocks_y, current.width(), current.height())
    }

    // ── Internal ─────────────────────────────────────────────────

    fn block_differs(&self, current: &Image, previous: &Image, bx: u32, by: u32) -> bool {
        let bs = self.block_size;
        let start_x = bx * bs;
        let start_y = by * bs;
        let end_x = cmp::min(start_x + bs, current.width());
        let end_y = cmp::min(start_y + bs, current.height());
        let format = current.format();

        for y in start_y..end_y {
            for x in start_x..end_x {
                let a = format.to_bgr(current.pixel(x, y));
                let b = format.to_bgr(previous.pixel(x, y));
                if a.iter().zip(b.iter()).any(|(&p, &q)| p.abs_diff(q) > self.threshold) {
                    return true;
                }
            }
        }
        false
    }

    /// Flood-fill changed tiles into connected regions.
    fn merge(&self, changed: &[bool], blocks_x: u32, blocks_y: u32, w: u32, h: u32) -> Vec<Detection> {
        let bs = self.block_size;
        let mut visited = vec![false; changed.len()];
        let mut out = Vec::new();
        let mut stack = Vec::new();

        for start in 0..changed.len() {
            if !changed[start] || visited[start] {
                continue;
            }

            let (mut min_bx, mut min_by) = (u32::MAX, u32::MAX);
            let (mut max_bx, mut max_by) = (0u32, 0u32);
            let mut blocks = 0u32;

            visited[start] = true;
            stack.push(start);
            while let Some(idx) = stack.pop() {
                let bx = idx as u32 % blocks_x;
                let by = idx as u32 / blocks_x;
                min_bx = min_bx.min(bx);
                min_by = min_by.min(by);
                max_bx = max_bx.max(bx);
                max_by = max_by.max(by);
                blocks += 1;

                let mut visit = |nx: u32, ny: u32| {
                    let n = (ny * blocks_x + nx) as usize;
                    if changed[n] && !visited[n] {
                        visited[n] = true;
                        stack.push(n);
                    }
                };
                if bx > 0 {
                    visit(bx - 1, by);
                }
                if bx + 1 < blocks_x {
                    visit(bx + 1, by);
                }
                if by > 0 {
                    visit(bx, by - 1);
                }
                if by + 1 < blocks_y {
                    visit(bx, by + 1);
                }
            }

            let x = min_bx * bs;
            let y = min_by * bs;
            out.push(Detection {
                x,
                y,
                width: cmp::min((max_bx + 1) * bs, w) - x,
                height: cmp::min((max_by + 1) * bs, h) - y,
                blocks,
            });
        }

        out
    }

    /// Draw a 2-pixel rectangle outline for each detection.
    fn annotate(&self, image: &mut Image, detections: &[Detection]) {
        let format = image.format();
        let (w, h) = (image.width(), image.height());
        let mut put = |x: u32, y: u32| {
            if x < w && y < h {
                format.write_bgr(image.pixel_mut(x, y), self.color);
            }
        };

        for d in detections {
            let right = d.x + d.width - 1;
            let bottom = d.y + d.height - 1;
            for t in 0..2 {
                for x in d.x..=right {
                    put(x, d.y + t);
                    put(x, bottom.saturating_sub(t));
                }
                for y in d.y..=bottom {
                    put(d.x + t, y);
                    put(right.saturating_sub(t), y);
                }
            }
        }
    }
}

impl FrameProcessor for MotionAnnotator {
    fn process(&mut self, mut image: Image) -> Result<Image, ScastError> {
        let detections = self.detect(&image);
        self.previous = Some(image.clone());

        if !detections.is_empty() {
            trace!(regions = detections.len(), "motion detected");
            self.annotate(&mut image, &detections);
        }
        self.last = detections;
        Ok(image)
    }
}

// ── Tests ────────────────────────────────────────────────────────
