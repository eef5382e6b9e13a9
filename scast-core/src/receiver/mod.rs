//! Receiving side: accept one client at a time and dispatch its frames.
//!
//! ```text
//! Listening ──► Accepting ──► PerClient ──(end of stream / error)──┐
//!                  ▲                                                │
//!                  └────────────────────────────────────────────────┘
//! ```
//!
//! | Module    | Purpose                                                   |
//! |-----------|-----------------------------------------------------------|
//! | `handler` | `FrameHandler`, `Display` and the decode → detect pipeline |
//! | `service` | `FrameReceiver`, the accept / receive state machine        |

pub mod handler;
pub mod service;

pub use handler::{DetectionPipeline, Display, Flow, FrameHandler};
pub use service::{FrameReceiver, ReceiverConfig, ReceiverExit, ReceiverState, ReceiverStats};
