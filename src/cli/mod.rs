//! Command-line interface
//!
//! One command: normalize and convert a batch of audio files. Argument
//! parsing builds an immutable `BatchConfig`; the exit code contract is
//! 0 for a clean batch, 1 when any file fails, 2 for configuration errors.

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::audio::BitDepth;
use crate::batch::{BatchResult, BatchRunner, Warning};
use crate::config::{
    BatchConfig, ChannelMode, LoudnessTarget, NormalizeMethod, OutputFormat, OutputSpec,
};
use crate::error::{NormwaveError, Result};

/// Directory created next to the inputs when no output dir is given
const DEFAULT_OUTPUT_DIR: &str = "normalized";

/// Normwave - batch loudness normalization and format conversion
#[derive(Parser, Debug)]
#[command(name = "normwave")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Input audio files or directories
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output directory (default: <input folder>/normalized)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Output format: wav, mp3, flac or ogg
    #[arg(short, long, default_value = "wav")]
    pub format: String,

    /// Target level in dBFS
    #[arg(short, long, default_value_t = -3.0, allow_negative_numbers = true)]
    pub level: f32,

    /// Normalization method: peak, rms or loudness
    #[arg(short, long, default_value = "peak")]
    pub method: String,

    /// Output bit depth: 8, 16, 24 or 32
    #[arg(short, long, default_value_t = 16)]
    pub bit_depth: u16,

    /// Output channel layout: mono or stereo
    #[arg(short, long, default_value = "stereo")]
    pub channels: String,

    /// Output sample rate in Hz
    #[arg(short, long, default_value_t = 44100)]
    pub sample_rate: u32,

    /// Recurse into input directories
    #[arg(short, long)]
    pub recursive: bool,

    /// Write a JSON report of all outcomes to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Build the validated batch configuration from the arguments
    ///
    /// # Errors
    /// Returns `InvalidConfig` for unknown format/method/channel names, an
    /// unsupported bit depth, or values outside the validated ranges.
    pub fn to_config(&self) -> Result<BatchConfig> {
        let format: OutputFormat = self.format.parse()?;
        let method: NormalizeMethod = self.method.parse()?;
        let channels: ChannelMode = self.channels.parse()?;
        let bit_depth =
            BitDepth::from_bits(self.bit_depth).ok_or_else(|| NormwaveError::InvalidConfig {
                reason: format!("unsupported bit depth {} (8/16/24/32)", self.bit_depth),
            })?;

        let config = BatchConfig {
            output_dir: self.resolve_output_dir(),
            output: OutputSpec {
                format,
                bit_depth,
                channels,
                sample_rate: self.sample_rate,
            },
            target: LoudnessTarget {
                level_db: self.level,
                method,
            },
            recursive: self.recursive,
        };
        config.validate()?;
        Ok(config)
    }

    /// Default output dir sits next to the first input
    fn resolve_output_dir(&self) -> PathBuf {
        if let Some(dir) = &self.output_dir {
            return dir.clone();
        }
        let first = &self.inputs[0];
        let base = if first.is_dir() {
            first.clone()
        } else {
            first.parent().map(Path::to_path_buf).unwrap_or_default()
        };
        base.join(DEFAULT_OUTPUT_DIR)
    }
}

/// Run the batch described by the arguments
///
/// Prints a human summary to stdout and optionally writes the JSON report.
///
/// # Errors
/// Returns an error for invalid configuration or an unwritable report path;
/// per-file processing errors are recorded in the result instead.
pub fn run(cli: &Cli) -> Result<BatchResult> {
    let config = cli.to_config()?;
    log::info!(
        "target {:.1} dBFS ({}), output {} {} {} ch {} Hz -> {}",
        config.target.level_db,
        cli.method,
        config.output.format,
        config.output.bit_depth,
        config.output.channels.count(),
        config.output.sample_rate,
        config.output_dir.display()
    );

    let runner = BatchRunner::new(config)?.with_progress(Box::new(|index, path, stage| {
        log::debug!("[{}] {} - {}", index + 1, path.display(), stage);
    }));

    let result = runner.run(&cli.inputs);
    print_summary(&result);

    if let Some(report_path) = &cli.report {
        result.write_json(report_path)?;
        log::info!("report written to {}", report_path.display());
    }

    Ok(result)
}

fn print_summary(result: &BatchResult) {
    println!(
        "{} files: {} succeeded, {} failed, {} aborted",
        result.total(),
        result.succeeded(),
        result.failed(),
        result.aborted()
    );
    for outcome in &result.outcomes {
        if let (Some(code), Some(message)) = (outcome.error_code, &outcome.error) {
            println!("  FAILED {} [{}] {}", outcome.input.display(), code, message);
        }
        for warning in &outcome.warnings {
            match warning {
                Warning::SilentInput => {
                    println!(
                        "  WARN   {} is silent, copied without gain",
                        outcome.input.display()
                    );
                }
                Warning::Clipping { samples } => {
                    println!(
                        "  WARN   {} clipped {} samples at full scale",
                        outcome.input.display(),
                        samples
                    );
                }
            }
        }
    }
}
