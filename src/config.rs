//! Batch run configuration
//!
//! An immutable `BatchConfig` is assembled once (from CLI arguments) and
//! validated before any file is touched. Nothing in the pipeline consults
//! global state during a run.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::audio::BitDepth;
use crate::error::{NormwaveError, Result};

/// Supported target level range in dB, matching the UI range of typical
/// normalizer tools
const MIN_TARGET_DB: f32 = -60.0;
const MAX_TARGET_DB: f32 = 0.0;

/// Supported output sample rate range in Hz
const MIN_SAMPLE_RATE: u32 = 8_000;
const MAX_SAMPLE_RATE: u32 = 192_000;

/// Output container/codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Wav,
    Mp3,
    Flac,
    Ogg,
}

impl OutputFormat {
    /// File extension for this format (without the dot)
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "wav",
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Flac => "flac",
            OutputFormat::Ogg => "ogg",
        }
    }

    /// True for lossy codecs where the requested bit depth only applies
    /// to the intermediate samples handed to the encoder
    pub fn is_lossy(&self) -> bool {
        matches!(self, OutputFormat::Mp3 | OutputFormat::Ogg)
    }
}

impl FromStr for OutputFormat {
    type Err = NormwaveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "wav" => Ok(OutputFormat::Wav),
            "mp3" => Ok(OutputFormat::Mp3),
            "flac" => Ok(OutputFormat::Flac),
            "ogg" => Ok(OutputFormat::Ogg),
            other => Err(NormwaveError::InvalidConfig {
                reason: format!("unknown output format '{}' (wav/mp3/flac/ogg)", other),
            }),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Loudness measurement method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizeMethod {
    /// Scale so the loudest single sample reaches the target level
    Peak,
    /// Scale so the root-mean-square level reaches the target level
    Rms,
    /// Scale so the mono-downmix loudness estimate reaches the target level
    Loudness,
}

impl FromStr for NormalizeMethod {
    type Err = NormwaveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "peak" => Ok(NormalizeMethod::Peak),
            "rms" => Ok(NormalizeMethod::Rms),
            "loudness" => Ok(NormalizeMethod::Loudness),
            other => Err(NormwaveError::InvalidConfig {
                reason: format!("unknown normalization method '{}' (peak/rms/loudness)", other),
            }),
        }
    }
}

/// Output channel layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelMode {
    Mono,
    Stereo,
}

impl ChannelMode {
    /// Channel count for this mode
    pub fn count(&self) -> usize {
        match self {
            ChannelMode::Mono => 1,
            ChannelMode::Stereo => 2,
        }
    }
}

impl FromStr for ChannelMode {
    type Err = NormwaveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mono" => Ok(ChannelMode::Mono),
            "stereo" => Ok(ChannelMode::Stereo),
            other => Err(NormwaveError::InvalidConfig {
                reason: format!("unknown channel mode '{}' (mono/stereo)", other),
            }),
        }
    }
}

/// Target loudness for a batch run
#[derive(Debug, Clone, Copy)]
pub struct LoudnessTarget {
    /// Target level in dBFS (negative for anything below full scale)
    pub level_db: f32,
    /// Measurement method the level refers to
    pub method: NormalizeMethod,
}

/// Output parameters applied uniformly to every file in a batch
#[derive(Debug, Clone, Copy)]
pub struct OutputSpec {
    pub format: OutputFormat,
    pub bit_depth: BitDepth,
    pub channels: ChannelMode,
    pub sample_rate: u32,
}

/// Complete configuration for one batch run
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Directory output files are written into
    pub output_dir: PathBuf,
    /// Output format parameters
    pub output: OutputSpec,
    /// Normalization target
    pub target: LoudnessTarget,
    /// Expand directories recursively during enumeration
    pub recursive: bool,
}

impl BatchConfig {
    /// Validate the configuration before a run starts
    ///
    /// # Errors
    /// Returns `InvalidConfig` for a target level or sample rate outside
    /// the supported range, or a bit depth the chosen format cannot carry.
    /// Configuration errors are fatal: no file is processed after one.
    pub fn validate(&self) -> Result<()> {
        if !self.target.level_db.is_finite() {
            return Err(NormwaveError::InvalidConfig {
                reason: "target level must be a finite dB value".to_string(),
            });
        }
        if self.target.level_db < MIN_TARGET_DB || self.target.level_db > MAX_TARGET_DB {
            return Err(NormwaveError::InvalidConfig {
                reason: format!(
                    "target level {:.1} dB outside supported range [{:.0}, {:.0}]",
                    self.target.level_db, MIN_TARGET_DB, MAX_TARGET_DB
                ),
            });
        }
        if self.output.sample_rate < MIN_SAMPLE_RATE || self.output.sample_rate > MAX_SAMPLE_RATE {
            return Err(NormwaveError::InvalidConfig {
                reason: format!(
                    "sample rate {} Hz outside supported range [{}, {}]",
                    self.output.sample_rate, MIN_SAMPLE_RATE, MAX_SAMPLE_RATE
                ),
            });
        }
        // FLAC carries at most 24-bit PCM
        if self.output.format == OutputFormat::Flac && self.output.bit_depth == BitDepth::ThirtyTwo
        {
            return Err(NormwaveError::InvalidConfig {
                reason: "FLAC output supports at most 24-bit depth".to_string(),
            });
        }
        Ok(())
    }
}
