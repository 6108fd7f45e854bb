//! Normwave - batch loudness normalization and format conversion
//!
//! Decodes common audio formats (wav/mp3/flac/ogg), normalizes loudness to
//! a target dBFS level by peak or RMS measurement, converts channel layout,
//! sample rate and bit depth, and re-encodes. Files are processed
//! sequentially with per-file failure isolation; one bad input never stops
//! the batch.
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use normwave::audio::BitDepth;
//! use normwave::batch::BatchRunner;
//! use normwave::config::{
//!     BatchConfig, ChannelMode, LoudnessTarget, NormalizeMethod, OutputFormat, OutputSpec,
//! };
//!
//! let config = BatchConfig {
//!     output_dir: PathBuf::from("out"),
//!     output: OutputSpec {
//!         format: OutputFormat::Flac,
//!         bit_depth: BitDepth::Sixteen,
//!         channels: ChannelMode::Stereo,
//!         sample_rate: 44100,
//!     },
//!     target: LoudnessTarget {
//!         level_db: -3.0,
//!         method: NormalizeMethod::Peak,
//!     },
//!     recursive: false,
//! };
//!
//! let runner = BatchRunner::new(config)?;
//! let result = runner.run(&[PathBuf::from("music")]);
//! println!("{} of {} succeeded", result.succeeded(), result.total());
//! # Ok::<(), normwave::error::NormwaveError>(())
//! ```

pub mod audio;
pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;

pub use audio::{AudioBuffer, BitDepth};
pub use batch::{BatchResult, BatchRunner};
pub use config::BatchConfig;
pub use error::{NormwaveError, Result};
