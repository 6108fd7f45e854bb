//! Per-file processing stages: analysis, gain, format conversion
//!
//! Stages are pure functions over `AudioBuffer`; the batch runner chains
//! them and owns all I/O.

pub mod analyzer;
pub mod converter;
pub mod normalizer;

pub use analyzer::{measure, Measurement};
pub use converter::convert;
pub use normalizer::{apply_gain, GainReport};
