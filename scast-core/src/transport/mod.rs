//! TCP transport for length-prefixed frames.
//!
//! | Module     | Purpose                                                |
//! |------------|--------------------------------------------------------|
//! | `frame`    | `Frame` payload and `EndOfStream` reasons              |
//! | `endpoint` | `Endpoint` (host + port) and the `Connector` seam      |
//! | `link`     | `TransportLink`: complete writes, chunked exact reads  |

pub mod endpoint;
pub mod frame;
pub mod link;

pub use endpoint::{Connector, Endpoint, TcpConnector};
pub use frame::{EndOfStream, Frame, Received};
pub use link::{LinkConfig, LinkStats, TransportLink, DEFAULT_READ_CHUNK, DEFAULT_MAX_FRAME_LEN};
