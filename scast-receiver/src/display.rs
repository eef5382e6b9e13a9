//! Display backends: a GDI window and a headless statistics logger.

use tracing::{info, trace, warn};

use scast_core::{Display, FrameStats, Image, ScastError};

use crate::config::{DisplayBackend, DisplayConfig};
use crate::window::NativeWindow;

/// Open the configured backend.
///
/// Falls back to [`HeadlessDisplay`] if the window cannot be created.
pub fn open(config: &DisplayConfig) -> Box<dyn Display> {
    match config.backend {
        DisplayBackend::Window => match WindowDisplay::new(config) {
            Ok(window) => Box::new(window),
            Err(e) => {
                warn!("{e}; falling back to headless display");
                Box::new(HeadlessDisplay::new(config.stats_interval))
            }
        },
        DisplayBackend::Headless => Box::new(HeadlessDisplay::new(config.stats_interval)),
    }
}

/// Expand any supported pixel format to top-down BGRA rows for GDI.
pub fn to_bgra(image: &Image, out: &mut Vec<u8>) {
    let format = image.format();
    out.clear();
    out.reserve(image.width() as usize * image.height() as usize * 4);
    for y in 0..image.height() {
        for px in image.row(y).chunks_exact(format.bytes_per_pixel()) {
            let [b, g, r] = format.to_bgr(px);
            out.extend_from_slice(&[b, g, r, 0xFF]);
        }
    }
}

// ── WindowDisplay ────────────────────────────────────────────────

/// Shows frames in a native window; closing it or pressing `q` stops
/// the receiver.
pub struct WindowDisplay {
    window: NativeWindow,
    renderer: GdiRenderer,
    scratch: Vec<u8>,
    quit: bool,
}

impl WindowDisplay {
    pub fn new(config: &DisplayConfig) -> Result<Self, ScastError> {
        let window =
            NativeWindow::create(&config.title, config.width, config.height, config.topmost)?;
        let renderer = GdiRenderer::new(&window, config.width, config.height);
        info!("window \"{}\" opened ({}x{})", config.title, config.width, config.height);
        Ok(Self {
            window,
            renderer,
            scratch: Vec::new(),
            quit: false,
        })
    }

    fn pump(&mut self) {
        for event in self.window.poll_events() {
            match event {
                crate::window::WindowEvent::Resize(w, h) => self.renderer.resize(w, h),
                ev if ev.is_quit() => self.quit = true,
                _ => {}
            }
        }
    }
}

impl Display for WindowDisplay {
    fn show(&mut self, image: &Image) -> Result<(), ScastError> {
        to_bgra(image, &mut self.scratch);
        self.renderer.render(&self.scratch, image.width(), image.height())
    }

    fn stop_requested(&mut self) -> bool {
        self.pump();
        self.quit
    }
}

// ── HeadlessDisplay ──────────────────────────────────────────────

/// Discards images and logs throughput every `interval` frames.
#[derive(Debug, Clone)]
pub struct HeadlessDisplay {
    interval: u64,
    shown: u64,
    last_logged: Option<FrameStats>,
}

impl HeadlessDisplay {
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
            shown: 0,
            last_logged: None,
        }
    }

    pub fn shown(&self) -> u64 {
        self.shown
    }

    /// Statistics as of the last log line.
    pub fn last_logged(&self) -> Option<FrameStats> {
        self.last_logged
    }
}

impl Display for HeadlessDisplay {
    fn show(&mut self, image: &Image) -> Result<(), ScastError> {
        trace!(width = image.width(), height = image.height(), "frame discarded");
        self.shown += 1;
        Ok(())
    }

    fn update_stats(&mut self, stats: &FrameStats) {
        if stats.total_frames % self.interval == 0 {
            info!(
                fps = stats.fps,
                frames = stats.total_frames,
                dropped = stats.dropped_frames,
                kib = stats.total_bytes / 1024,
                "{}x{}",
                stats.width,
                stats.height
            );
            self.last_logged = Some(*stats);
        }
    }
}

// ── GDI renderer ─────────────────────────────────────────────────

#[cfg(target_os = "windows")]
mod gdi {
    use windows::Win32::Foundation::HWND;
    use windows::Win32::Graphics::Gdi::*;

    use scast_core::ScastError;

    use crate::window::NativeWindow;

    /// Stretches BGRA frames onto the window's client area with GDI.
    pub struct GdiRenderer {
        hwnd: HWND,
        width: u32,
        height: u32,
    }

    impl GdiRenderer {
        pub fn new(window: &NativeWindow, width: u32, height: u32) -> Self {
            Self {
                hwnd: window.hwnd(),
                width,
                height,
            }
        }

        pub fn resize(&mut self, width: u32, height: u32) {
            self.width = width;
            self.height = height;
        }

        pub fn render(
            &self,
            bgra: &[u8],
            frame_width: u32,
            frame_height: u32,
        ) -> Result<(), ScastError> {
            let expected = frame_width as usize * frame_height as usize * 4;
            if bgra.len() < expected {
                return Err(ScastError::Display(format!(
                    "frame buffer too small: {} < {expected}",
                    bgra.len()
                )));
            }

            unsafe {
                let hdc = GetDC(self.hwnd);
                if hdc.is_invalid() {
                    return Err(ScastError::Display("GetDC failed".into()));
                }

                let bmi = BITMAPINFO {
                    bmiHeader: BITMAPINFOHEADER {
                        biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                        biWidth: frame_width as i32,
                        // Negative height = top-down DIB.
                        biHeight: -(frame_height as i32),
                        biPlanes: 1,
                        biBitCount: 32,
                        biCompression: BI_RGB.0,
                        ..Default::default()
                    },
                    bmiColors: [RGBQUAD::default(); 1],
                };

                StretchDIBits(
                    hdc,
                    0,
                    0,
                    self.width as i32,
                    self.height as i32,
                    0,
                    0,
                    frame_width as i32,
                    frame_height as i32,
                    Some(bgra.as_ptr() as *const _),
                    &bmi,
                    DIB_RGB_COLORS,
                    SRCCOPY,
                );

                ReleaseDC(self.hwnd, hdc);
            }
            Ok(())
        }
    }
}

#[cfg(target_os = "windows")]
use gdi::GdiRenderer;

#[cfg(not(target_os = "windows"))]
struct GdiRenderer;

#[cfg(not(target_os = "windows"))]
impl GdiRenderer {
    fn new(_window: &NativeWindow, _width: u32, _height: u32) -> Self {
        Self
    }

    fn resize(&mut self, _width: u32, _height: u32) {}

    fn render(&self, _bgra: &[u8], _width: u32, _height: u32) -> Result<(), ScastError> {
        Err(ScastError::Display("GDI rendering is only supported on Windows".into()))
    }
}

// ── Tests ────────────────────────────────────────────────────────
