//! Sending side: connect, stream frames, back off and reconnect.
//!
//! ```text
//!            connect ok                 send error
//! Connecting ─────────► Streaming ─────────────────► Disconnected
//!     ▲                                                  │
//!     └──────────────── backoff elapsed ◄────────────────┘
//!     (connect error also goes to Disconnected)
//! ```
//!
//! | Module    | Purpose                                                 |
//! |-----------|---------------------------------------------------------|
//! | `backoff` | `BackoffPolicy` trait and the fixed-delay default       |
//! | `source`  | `FrameSource` trait and the capture → encode pipeline   |
//! | `service` | `StreamSender`, the reconnecting state machine          |

pub mod backoff;
pub mod service;
pub mod source;

pub use backoff::{BackoffPolicy, FixedBackoff};
pub use service::{SenderConfig, SenderState, SenderStats, StreamSender};
pub use source::{CapturePipeline, FrameSource};
