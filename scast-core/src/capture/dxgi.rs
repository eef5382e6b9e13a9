//! DXGI Desktop Duplication screen capture for Windows.
//!
//! Uses the Direct3D 11 Desktop Duplication API to obtain GPU-backed
//! screen frames with minimal latency.
//!
//! # Platform
//!
//! This module is **Windows-only**. On other platforms the type is still
//! defined but construction fails at runtime.

use crate::capture::ScreenCapture;
use crate::error::ScastError;
use crate::image::Image;

/// DXGI-based screen capturer.
///
/// Wraps the `IDXGIOutputDuplication` pipeline:
///
/// 1. Create a D3D11 device.
/// 2. Enumerate outputs and duplicate the target monitor.
/// 3. Create a CPU-readable staging texture.
/// 4. On each call to [`capture`](ScreenCapture::capture):
///    - `AcquireNextFrame` (blocks up to `timeout_ms`).
///    - Copy the desktop texture to the staging texture.
///    - Map, copy into an [`Image`], unmap, release.
///
/// The compositor only hands out a frame when something changed. On an
/// acquire timeout the previous image is returned again so the stream
/// keeps its cadence on a static desktop.
pub struct DxgiCapturer {
    width: u32,
    height: u32,
    #[cfg_attr(not(target_os = "windows"), allow(dead_code))]
    timeout_ms: u32,
    #[cfg_attr(not(target_os = "windows"), allow(dead_code))]
    last: Option<Image>,

    #[cfg(target_os = "windows")]
    device: windows::Win32::Graphics::Direct3D11::ID3D11Device,
    #[cfg(target_os = "windows")]
    context: windows::Win32::Graphics::Direct3D11::ID3D11DeviceContext,
    #[cfg(target_os = "windows")]
    duplication: windows::Win32::Graphics::Dxgi::IDXGIOutputDuplication,
    #[cfg(target_os = "windows")]
    staging_texture: windows::Win32::Graphics::Direct3D11::ID3D11Texture2D,
}

impl DxgiCapturer {
    /// Screen width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Screen height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }
}

impl ScreenCapture for DxgiCapturer {
    fn capture(&mut self) -> Result<Image, ScastError> {
        match self.acquire() {
            Ok(img) => {
                self.last = Some(img.clone());
                Ok(img)
            }
            Err(ScastError::Timeout(t)) => self.last.clone().ok_or(ScastError::Timeout(t)),
            Err(e) => Err(e),
        }
    }
}

// ── Windows implementation ───────────────────────────────────────

#[cfg(target_os = "windows")]
mod platform {
    use super::*;
    use crate::image::PixelFormat;
    use windows::{
        core::Interface,
        Win32::Graphics::{
            Direct3D::D3D_DRIVER_TYPE_HARDWARE,
            Direct3D11::*,
            Dxgi::{Common::*, *},
        },
    };

    fn dxgi_err(what: &str, e: windows::core::Error) -> ScastError {
        ScastError::Capture(format!("{what} failed: {e}"))
    }

    impl DxgiCapturer {
        /// Initialise the capturer for monitor `monitor_index` (0 = primary).
        pub fn new(monitor_index: u32, timeout_ms: u32) -> Result<Self, ScastError> {
            unsafe { Self::init_dxgi(monitor_index, timeout_ms) }
        }

        unsafe fn init_dxgi(monitor_index: u32, timeout_ms: u32) -> Result<Self, ScastError> {
            let mut device = None;
            let mut context = None;
            unsafe {
                D3D11CreateDevice(
                    None,
                    D3D_DRIVER_TYPE_HARDWARE,
                    None,
                    D3D11_CREATE_DEVICE_BGRA_SUPPORT,
                    None,
                    D3D11_SDK_VERSION,
                    Some(&mut device),
                    None,
                    Some(&mut context),
                )
                .map_err(|e| dxgi_err("D3D11CreateDevice", e))?;
            }

            let device =
                device.ok_or_else(|| ScastError::Capture("D3D11 device is None".into()))?;
            let context =
                context.ok_or_else(|| ScastError::Capture("D3D11 context is None".into()))?;

            // Device → Adapter → Output → Duplication.
            let dxgi_device: IDXGIDevice =
                device.cast().map_err(|e| dxgi_err("cast to IDXGIDevice", e))?;
            let adapter =
                unsafe { dxgi_device.GetAdapter() }.map_err(|e| dxgi_err("GetAdapter", e))?;
            let output: IDXGIOutput = unsafe { adapter.EnumOutputs(monitor_index) }
                .map_err(|e| dxgi_err(&format!("EnumOutputs({monitor_index})"), e))?;
            let output1: IDXGIOutput1 =
                output.cast().map_err(|e| dxgi_err("cast to IDXGIOutput1", e))?;
            let duplication = unsafe { output1.DuplicateOutput(&device) }
                .map_err(|e| dxgi_err("DuplicateOutput", e))?;

            let dup_desc = unsafe { duplication.GetDesc() };
            let width = dup_desc.ModeDesc.Width;
            let height = dup_desc.ModeDesc.Height;

            let staging_desc = D3D11_TEXTURE2D_DESC {
                Width: width,
                Height: height,
                MipLevels: 1,
                ArraySize: 1,
                Format: DXGI_FORMAT_B8G8R8A8_UNORM,
                SampleDesc: DXGI_SAMPLE_DESC {
                    Count: 1,
                    Quality: 0,
                },
                Usage: D3D11_USAGE_STAGING,
                BindFlags: 0,
                CPUAccessFlags: D3D11_CPU_ACCESS_READ.0 as u32,
                MiscFlags: 0,
            };

            let mut staging_texture = None;
            unsafe {
                device
                    .CreateTexture2D(&staging_desc, None, Some(&mut staging_texture))
                    .map_err(|e| dxgi_err("CreateTexture2D (staging)", e))?;
            }
            let staging_texture = staging_texture
                .ok_or_else(|| ScastError::Capture("staging texture is None".into()))?;

            Ok(Self {
                width,
                height,
                timeout_ms,
                last: None,
                device,
                context,
                duplication,
                staging_texture,
            })
        }

        pub(super) fn acquire(&mut self) -> Result<Image, ScastError> {
            unsafe { self.acquire_inner() }
        }

        unsafe fn acquire_inner(&mut self) -> Result<Image, ScastError> {
            let mut frame_info = DXGI_OUTDUPL_FRAME_INFO::default();
            let mut resource = None;

            match unsafe {
                self.duplication
                    .AcquireNextFrame(self.timeout_ms, &mut frame_info, &mut resource)
            } {
                Ok(()) => {}
                Err(e) if e.code() == DXGI_ERROR_WAIT_TIMEOUT => {
                    return Err(ScastError::Timeout(std::time::Duration::from_millis(
                        self.timeout_ms as u64,
                    )));
                }
                Err(e) => return Err(dxgi_err("AcquireNextFrame", e)),
            }

            let resource = match resource {
                Some(r) => r,
                None => {
                    let _ = unsafe { self.duplication.ReleaseFrame() };
                    return Err(ScastError::Capture("acquired resource is None".into()));
                }
            };

            let texture: ID3D11Texture2D = resource.cast().map_err(|e| {
                let _ = unsafe { self.duplication.ReleaseFrame() };
                dxgi_err("cast to ID3D11Texture2D", e)
            })?;

            unsafe { self.context.CopyResource(&self.staging_texture, &texture) };
            let _ = unsafe { self.duplication.ReleaseFrame() };

            let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
            unsafe {
                self.context
                    .Map(&self.staging_texture, 0, D3D11_MAP_READ, 0, Some(&mut mapped))
                    .map_err(|e| dxgi_err("Map", e))?;
            }

            let stride = mapped.RowPitch;
            let total_bytes = stride as usize * self.height as usize;
            let data =
                unsafe { std::slice::from_raw_parts(mapped.pData as *const u8, total_bytes) }
                    .to_vec();

            unsafe { self.context.Unmap(&self.staging_texture, 0) };

            Image::from_raw(self.width, self.height, stride, PixelFormat::Bgra8, data)
        }
    }
}

// ── Non-Windows stub ─────────────────────────────────────────────

#[cfg(not(target_os = "windows"))]
impl DxgiCapturer {
    /// DXGI is only available on Windows.
    pub fn new(_monitor_index: u32, _timeout_ms: u32) -> Result<Self, ScastError> {
        Err(ScastError::Capture(
            "DXGI Desktop Duplication is only available on Windows".into(),
        ))
    }

    fn acquire(&mut self) -> Result<Image, ScastError> {
        Err(ScastError::Capture("not supported on this platform".into()))
    }
}

#[cfg(test)]
mod tests {
    #[cfg(not(target_os = "windows"))]
    #[test]
    fn construction_fails_off_windows() {
        use super::*;
        assert!(matches!(
            DxgiCapturer::new(0, 100),
            Err(ScastError::Capture(_))
        ));
    }
}
