//! Images moving through the capture and display pipelines.
//!
//! [`Image`] is the in-memory representation on both ends. It never
//! touches the wire directly: the sender encodes it with an
//! [`ImageEncoder`] into an opaque payload and the receiver turns the
//! payload back into an `Image` with an [`ImageDecoder`].

pub mod codec;
pub mod types;

pub use codec::{ImageDecoder, ImageEncoder, ZstdImageCodec, IMAGE_HEADER_LEN};
pub use types::{Image, PixelFormat};
