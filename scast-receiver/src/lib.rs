//! # scast-receiver
//!
//! Listens for a single scast sender, decodes each incoming image,
//! outlines the regions that moved since the previous frame and shows the
//! result in a native window (or logs statistics when headless). Closing
//! the window or pressing `q` ends the process.

pub mod config;
pub mod display;
pub mod window;
