//! Pixel buffer adapter
//!
//! Decoding, random pixel access and canvas operations over the `image` codec.

mod pixel_buffer;
pub mod codec;

pub use pixel_buffer::PixelBuffer;
