//! Win32 window creation and message pump.
//!
//! Creates the native HWND the display renders into. The window reports
//! the few [`WindowEvent`]s the receiver cares about: close, resize and
//! key presses (for the `q` quit key).

/// Virtual-key code of the `Q` key.
pub const VK_Q: u16 = 0x51;

/// Events produced by the window message loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    /// Window close requested (Alt-F4 / X button).
    Close,
    /// Client area resized.
    Resize(u32, u32),
    /// Key down: virtual-key code.
    KeyDown(u16),
}

impl WindowEvent {
    /// Whether this event should end the receiver.
    pub fn is_quit(&self) -> bool {
        matches!(self, Self::Close | Self::KeyDown(VK_Q))
    }
}

#[cfg(target_os = "windows")]
mod platform {
    use std::sync::mpsc;

    use windows::Win32::Foundation::*;
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::UI::WindowsAndMessaging::*;
    use windows::core::PCWSTR;

    use super::WindowEvent;
    use scast_core::ScastError;

    /// Handle to the native window.
    pub struct NativeWindow {
        hwnd: HWND,
        event_rx: mpsc::Receiver<WindowEvent>,
    }

    // The boxed event sender lives in GWLP_USERDATA until `Drop`.
    unsafe extern "system" fn wndproc(
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        let tx_ptr =
            unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) } as *const mpsc::Sender<WindowEvent>;

        if tx_ptr.is_null() {
            return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
        }

        let tx = unsafe { &*tx_ptr };

        match msg {
            WM_CLOSE => {
                let _ = tx.send(WindowEvent::Close);
                LRESULT(0)
            }
            WM_SIZE => {
                let w = (lparam.0 & 0xFFFF) as u32;
                let h = ((lparam.0 >> 16) & 0xFFFF) as u32;
                let _ = tx.send(WindowEvent::Resize(w, h));
                LRESULT(0)
            }
            WM_KEYDOWN => {
                let vk = (wparam.0 & 0xFFFF) as u16;
                let _ = tx.send(WindowEvent::KeyDown(vk));
                LRESULT(0)
            }
            WM_DESTROY => {
                unsafe { PostQuitMessage(0) };
                LRESULT(0)
            }
            _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
        }
    }

    impl NativeWindow {
        /// Create a top-level window at the screen origin.
        pub fn create(
            title: &str,
            width: u32,
            height: u32,
            topmost: bool,
        ) -> Result<Self, ScastError> {
            let (event_tx, event_rx) = mpsc::channel();

            let hinstance = unsafe { GetModuleHandleW(None) }
                .map_err(|e| ScastError::Display(format!("GetModuleHandle: {e}")))?;

            let class_name_wide: Vec<u16> = "ScastReceiverClass\0".encode_utf16().collect();

            let wc = WNDCLASSW {
                lpfnWndProc: Some(wndproc),
                hInstance: hinstance.into(),
                lpszClassName: PCWSTR(class_name_wide.as_ptr()),
                hCursor: unsafe { LoadCursorW(None, IDC_ARROW) }.unwrap_or_default(),
                ..Default::default()
            };

            if unsafe { RegisterClassW(&wc) } == 0 {
                return Err(ScastError::Display("RegisterClassW failed".into()));
            }

            let title_wide: Vec<u16> = title.encode_utf16().chain(std::iter::once(0)).collect();
            let ex_style = if topmost {
                WS_EX_TOPMOST
            } else {
                WINDOW_EX_STYLE(0)
            };

            let hwnd = unsafe {
                CreateWindowExW(
                    ex_style,
                    PCWSTR(class_name_wide.as_ptr()),
                    PCWSTR(title_wide.as_ptr()),
                    WS_OVERLAPPEDWINDOW | WS_VISIBLE,
                    0,
                    0,
                    width as i32,
                    height as i32,
                    None,
                    None,
                    hinstance,
                    None,
                )
            }
            .map_err(|e| ScastError::Display(format!("CreateWindowExW failed: {e}")))?;

            if hwnd.is_invalid() {
                return Err(ScastError::Display("CreateWindowExW returned invalid HWND".into()));
            }

            let tx_ptr = Box::into_raw(Box::new(event_tx));
            unsafe {
                SetWindowLongPtrW(hwnd, GWLP_USERDATA, tx_ptr as isize);
            }

            Ok(Self { hwnd, event_rx })
        }

        /// Pump window messages without blocking and return the events.
        pub fn poll_events(&self) -> Vec<WindowEvent> {
            unsafe {
                let mut msg = MSG::default();
                while PeekMessageW(&mut msg, self.hwnd, 0, 0, PM_REMOVE).as_bool() {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            }
            self.event_rx.try_iter().collect()
        }

        pub fn hwnd(&self) -> HWND {
            self.hwnd
        }
    }

    impl Drop for NativeWindow {
        fn drop(&mut self) {
            unsafe {
                let ptr = GetWindowLongPtrW(self.hwnd, GWLP_USERDATA)
                    as *mut mpsc::Sender<WindowEvent>;
                if !ptr.is_null() {
                    SetWindowLongPtrW(self.hwnd, GWLP_USERDATA, 0);
                    drop(Box::from_raw(ptr));
                }
                let _ = DestroyWindow(self.hwnd);
            }
        }
    }
}

#[cfg(target_os = "windows")]
pub use platform::NativeWindow;

// ── Non-Windows stub ─────────────────────────────────────────────

#[cfg(not(target_os = "windows"))]
mod stub {
    use super::WindowEvent;
    use scast_core::ScastError;

    pub struct NativeWindow;

    impl NativeWindow {
        pub fn create(
            _title: &str,
            _width: u32,
            _height: u32,
            _topmost: bool,
        ) -> Result<Self, ScastError> {
            Err(ScastError::Display(
                "window display is only supported on Windows".into(),
            ))
        }

        pub fn poll_events(&self) -> Vec<WindowEvent> {
            Vec::new()
        }
    }
}

#[cfg(not(target_os = "windows"))]
pub use stub::NativeWindow;
