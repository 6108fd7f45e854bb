//! Audio I/O: buffer representation, decoding, encoding

pub mod buffer;
pub mod decoder;
pub mod encoder;

pub use buffer::{AudioBuffer, BitDepth};
pub use decoder::decode;
pub use encoder::{create_encoder, write_output, AudioEncoder};
