//! Screen capture backends.
//!
//! | Module    | Purpose                                                  |
//! |-----------|----------------------------------------------------------|
//! | `dxgi`    | DXGI Desktop Duplication capture (Windows)               |
//! | `pattern` | Synthetic moving test pattern (all platforms)            |
//! | `region`  | Crop / colour conversion / resize applied after capture  |

pub mod dxgi;
pub mod pattern;
pub mod region;

pub use dxgi::DxgiCapturer;
pub use pattern::PatternCapture;
pub use region::{CaptureRegion, Normalizer};

use crate::error::ScastError;
use crate::image::Image;

/// Produces one image per call.
///
/// Errors abort only the current streaming iteration; the sender keeps the
/// connection and tries again on the next tick.
pub trait ScreenCapture {
    fn capture(&mut self) -> Result<Image, ScastError>;
}

impl<T: ScreenCapture + ?Sized> ScreenCapture for Box<T> {
    fn capture(&mut self) -> Result<Image, ScastError> {
        (**self).capture()
    }
}
