//! Builds the capture pipeline selected in the config.

use tracing::info;

use scast_core::{
    CapturePipeline, DxgiCapturer, PatternCapture, ScastError, ScreenCapture, ZstdImageCodec,
};

use crate::config::{CaptureSource, SenderConfig};

pub type SenderPipeline = CapturePipeline<Box<dyn ScreenCapture>, ZstdImageCodec>;

/// Open the configured capture backend.
///
/// Fails if the screen backend is unavailable (for instance off Windows).
pub fn build_pipeline(config: &SenderConfig) -> Result<SenderPipeline, ScastError> {
    let cap = &config.capture;
    let capture: Box<dyn ScreenCapture> = match cap.source {
        CaptureSource::Screen => {
            let dxgi = DxgiCapturer::new(cap.monitor_index, cap.capture_timeout_ms)?;
            info!(
                monitor = cap.monitor_index,
                "capturing {}x{} screen",
                dxgi.width(),
                dxgi.height()
            );
            Box::new(dxgi)
        }
        CaptureSource::Pattern => {
            info!("capturing {}x{} test pattern", cap.pattern_width, cap.pattern_height);
            Box::new(PatternCapture::new(cap.pattern_width, cap.pattern_height))
        }
    };

    Ok(CapturePipeline::new(
        capture,
        config.normalizer(),
        ZstdImageCodec::new(cap.compression_level),
    ))
}
