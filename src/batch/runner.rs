//! Batch orchestrator
//!
//! Drives each file through decode, analysis, gain, conversion and encode.
//! Files are processed sequentially; one failure is recorded and the batch
//! moves on. A shared cancel flag is checked between files and between
//! stages so a stop request takes effect quickly without leaving partial
//! output files.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::audio::{create_encoder, decode, write_output};
use crate::batch::report::{BatchResult, FileOutcome, Warning};
use crate::batch::scanner::scan_inputs;
use crate::config::BatchConfig;
use crate::error::{NormwaveError, Result};
use crate::pipeline::{apply_gain, convert, measure};

/// Pipeline stage a file is currently in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Decoding,
    Analyzing,
    Normalizing,
    Converting,
    Encoding,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Decoding => "decoding",
            Stage::Analyzing => "analyzing",
            Stage::Normalizing => "normalizing",
            Stage::Converting => "converting",
            Stage::Encoding => "encoding",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Progress callback: file index, file path, stage just entered
pub type ProgressCallback = Box<dyn Fn(usize, &Path, Stage) + Send>;

enum FileRun {
    Completed(FileOutcome),
    Cancelled,
}

/// Sequential batch processor
pub struct BatchRunner {
    config: BatchConfig,
    cancel: Arc<AtomicBool>,
    progress: Option<ProgressCallback>,
}

impl BatchRunner {
    /// Create a runner for a validated configuration
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the configuration fails validation;
    /// nothing is processed in that case.
    pub fn new(config: BatchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: Arc::new(AtomicBool::new(false)),
            progress: None,
        })
    }

    /// Shared flag that stops the batch when set
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Attach a progress callback invoked on every stage transition
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Process every audio file reachable from `inputs`
    ///
    /// Every enumerated file ends up in the result, including files never
    /// started because of cancellation.
    pub fn run(&self, inputs: &[PathBuf]) -> BatchResult {
        let scan = scan_inputs(inputs, self.config.recursive);
        let mut result = BatchResult::new();

        for missing in scan.missing {
            let err = NormwaveError::FileNotFound {
                path: missing.display().to_string(),
            };
            result.push(FileOutcome::failure(missing, &err));
        }

        let total = scan.files.len();
        let mut written: HashSet<PathBuf> = HashSet::new();
        for (index, input) in scan.files.iter().enumerate() {
            if self.cancelled() {
                log::info!("cancelled before {} of {} files", index + 1, total);
                for remaining in &scan.files[index..] {
                    result.push(FileOutcome::aborted(remaining.clone()));
                }
                break;
            }

            log::info!("[{}/{}] {}", index + 1, total, input.display());
            match self.process_file(index, input, &mut written) {
                FileRun::Completed(outcome) => result.push(outcome),
                FileRun::Cancelled => {
                    log::info!("cancelled while processing {}", input.display());
                    for remaining in &scan.files[index..] {
                        result.push(FileOutcome::aborted(remaining.clone()));
                    }
                    break;
                }
            }
        }

        log::info!(
            "batch finished: {} succeeded, {} failed, {} aborted",
            result.succeeded(),
            result.failed(),
            result.aborted()
        );
        result
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    fn emit(&self, index: usize, path: &Path, stage: Stage) {
        if let Some(callback) = &self.progress {
            callback(index, path, stage);
        }
    }

    fn process_file(&self, index: usize, input: &Path, written: &mut HashSet<PathBuf>) -> FileRun {
        match self.run_pipeline(index, input, written) {
            Ok(Some(outcome)) => FileRun::Completed(outcome),
            Ok(None) => FileRun::Cancelled,
            Err(err) => {
                log::error!("{}: {}", input.display(), err);
                FileRun::Completed(FileOutcome::failure(input.to_path_buf(), &err))
            }
        }
    }

    /// One file through the whole pipeline; `Ok(None)` means cancelled
    fn run_pipeline(
        &self,
        index: usize,
        input: &Path,
        written: &mut HashSet<PathBuf>,
    ) -> Result<Option<FileOutcome>> {
        let output_path = self.output_path(input, written)?;

        self.emit(index, input, Stage::Decoding);
        let buffer = decode(input)?;
        if self.cancelled() {
            return Ok(None);
        }

        self.emit(index, input, Stage::Analyzing);
        let measurement = measure(&buffer);
        if self.cancelled() {
            return Ok(None);
        }

        self.emit(index, input, Stage::Normalizing);
        let mut warnings = Vec::new();
        let level_db = measurement.level_db(self.config.target.method);
        let (buffer, measured_db, gain_db) = if !level_db.is_finite() {
            warnings.push(Warning::SilentInput);
            (buffer, None, None)
        } else {
            let (buffer, report) = apply_gain(buffer, &measurement, &self.config.target);
            if report.clipped_samples > 0 {
                warnings.push(Warning::Clipping {
                    samples: report.clipped_samples,
                });
            }
            (buffer, Some(report.measured_db), Some(report.gain_db))
        };
        if self.cancelled() {
            return Ok(None);
        }

        self.emit(index, input, Stage::Converting);
        let buffer = convert(buffer, &self.config.output)?;
        if self.cancelled() {
            return Ok(None);
        }

        self.emit(index, input, Stage::Encoding);
        let encoder = create_encoder(&self.config.output);
        let data = encoder.encode(&buffer)?;
        if self.cancelled() {
            return Ok(None);
        }
        write_output(&output_path, &data)?;
        written.insert(output_path.clone());

        self.emit(index, input, Stage::Done);
        log::info!("wrote {}", output_path.display());

        Ok(Some(FileOutcome::success(
            input.to_path_buf(),
            output_path,
            measured_db,
            gain_db,
            warnings,
        )))
    }

    /// Output path for an input: same stem, output extension, output dir
    ///
    /// Writing onto the input itself is rejected, as is a path another
    /// input of this batch already wrote (stems collide after the
    /// extension swap, e.g. `a.wav` and `a.mp3`).
    fn output_path(&self, input: &Path, written: &HashSet<PathBuf>) -> Result<PathBuf> {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| NormwaveError::ProcessingError {
                reason: format!("cannot derive output name for {}", input.display()),
            })?;

        let output = self
            .config
            .output_dir
            .join(format!("{}.{}", stem, self.config.output.format.extension()));

        if output == input || paths_refer_to_same_file(&output, input) {
            return Err(NormwaveError::WouldOverwriteInput {
                path: input.display().to_string(),
            });
        }
        if written.contains(&output) {
            return Err(NormwaveError::ProcessingError {
                reason: format!(
                    "output {} was already written by another input in this batch",
                    output.display()
                ),
            });
        }
        Ok(output)
    }
}

/// Compare two paths by canonical form, tolerating a not-yet-existing output
fn paths_refer_to_same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => false,
    }
}
