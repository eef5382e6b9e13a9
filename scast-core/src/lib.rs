//! # scast-core
//!
//! Core library for streaming screen images over a single TCP connection.
//!
//! This crate contains:
//! - **Codec**: `FrameCodec`, an 8-byte length prefix followed by the payload
//! - **Transport**: `TransportLink` for exact, chunked frame I/O; `Connector` / `Endpoint`
//! - **Sender**: `StreamSender`, the connect → stream → backoff → reconnect loop
//! - **Receiver**: `FrameReceiver`, the single-client accept → receive loop
//! - **Image**: `Image`, `PixelFormat` and the zstd payload codec
//! - **Capture / Analysis**: screen capture backends, normalization and motion detection
//! - **Error**: `ScastError`, a `thiserror`-based error type

pub mod analysis;
pub mod capture;
pub mod codec;
pub mod error;
pub mod image;
pub mod receiver;
pub mod sender;
pub mod stats;
pub mod transport;

mod stop;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use analysis::{Detection, FrameProcessor, MotionAnnotator, Passthrough};
pub use capture::{CaptureRegion, DxgiCapturer, Normalizer, PatternCapture, ScreenCapture};
pub use codec::{ByteOrder, FrameCodec, PREFIX_LEN, WireRecord};
pub use error::ScastError;
pub use image::{Image, ImageDecoder, ImageEncoder, PixelFormat, ZstdImageCodec};
pub use receiver::{
    DetectionPipeline, Display, Flow, FrameHandler, FrameReceiver, ReceiverConfig, ReceiverExit,
    ReceiverState, ReceiverStats,
};
pub use sender::{
    BackoffPolicy, CapturePipeline, FixedBackoff, FrameSource, SenderConfig, SenderState,
    SenderStats, StreamSender,
};
pub use stats::{FpsMeter, FrameStats};
pub use transport::{
    Connector, EndOfStream, Endpoint, Frame, LinkConfig, LinkStats, Received, TcpConnector,
    TransportLink,
};
