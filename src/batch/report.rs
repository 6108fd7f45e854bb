//! Batch result accounting
//!
//! Outcomes are appended as files finish and never rewritten, so a partial
//! run still yields an accurate report. The whole structure serializes to
//! JSON for machine consumption.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{NormwaveError, Result};

/// Non-fatal condition observed while processing a file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Input was silent; passed through without gain
    SilentInput,
    /// Gain pushed samples past full scale; they were clamped
    Clipping { samples: usize },
}

/// Terminal state of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Success,
    Failed,
    Aborted,
}

/// Outcome of one file in the batch
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// Level measured before gain, dBFS (null in JSON for silence)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measured_db: Option<f32>,
    /// Gain applied, dB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gain_db: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn success(
        input: PathBuf,
        output: PathBuf,
        measured_db: Option<f32>,
        gain_db: Option<f32>,
        warnings: Vec<Warning>,
    ) -> Self {
        Self {
            input,
            status: FileStatus::Success,
            output: Some(output),
            measured_db,
            gain_db,
            warnings,
            error_code: None,
            error: None,
        }
    }

    pub fn failure(input: PathBuf, error: &NormwaveError) -> Self {
        Self {
            input,
            status: FileStatus::Failed,
            output: None,
            measured_db: None,
            gain_db: None,
            warnings: Vec::new(),
            error_code: Some(error.error_code()),
            error: Some(error.to_string()),
        }
    }

    pub fn aborted(input: PathBuf) -> Self {
        Self {
            input,
            status: FileStatus::Aborted,
            output: None,
            measured_db: None,
            gain_db: None,
            warnings: Vec::new(),
            error_code: None,
            error: None,
        }
    }
}

/// Append-only record of a whole batch run
#[derive(Debug, Default, Serialize)]
pub struct BatchResult {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: FileOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.count(FileStatus::Success)
    }

    pub fn failed(&self) -> usize {
        self.count(FileStatus::Failed)
    }

    pub fn aborted(&self) -> usize {
        self.count(FileStatus::Aborted)
    }

    fn count(&self, status: FileStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    /// True when every recorded file succeeded
    pub fn all_succeeded(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| o.status == FileStatus::Success)
    }

    /// Write the report as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut result = BatchResult::new();
        result.push(FileOutcome::success(
            PathBuf::from("a.wav"),
            PathBuf::from("out/a.wav"),
            Some(-6.0),
            Some(3.0),
            vec![],
        ));
        result.push(FileOutcome::failure(
            PathBuf::from("b.wav"),
            &NormwaveError::EmptyAudio,
        ));
        result.push(FileOutcome::aborted(PathBuf::from("c.wav")));

        assert_eq!(result.total(), 3);
        assert_eq!(result.succeeded(), 1);
        assert_eq!(result.failed(), 1);
        assert_eq!(result.aborted(), 1);
        assert!(!result.all_succeeded());
    }

    #[test]
    fn test_failure_carries_error_code() {
        let outcome = FileOutcome::failure(
            PathBuf::from("x.wav"),
            &NormwaveError::FileNotFound {
                path: "x.wav".to_string(),
            },
        );
        assert_eq!(outcome.error_code, Some("FILE_NOT_FOUND"));
        assert!(outcome.error.as_deref().unwrap().contains("x.wav"));
    }

    #[test]
    fn test_json_report_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        let mut result = BatchResult::new();
        result.push(FileOutcome::success(
            PathBuf::from("a.wav"),
            PathBuf::from("out/a.flac"),
            Some(-6.0),
            Some(3.0),
            vec![Warning::Clipping { samples: 12 }],
        ));
        result.write_json(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["outcomes"][0]["status"], "success");
        assert_eq!(parsed["outcomes"][0]["warnings"][0]["kind"], "clipping");
        assert_eq!(parsed["outcomes"][0]["warnings"][0]["samples"], 12);
    }

    #[test]
    fn test_silent_outcome_serializes_without_levels() {
        let outcome = FileOutcome::success(
            PathBuf::from("quiet.wav"),
            PathBuf::from("out/quiet.wav"),
            None,
            None,
            vec![Warning::SilentInput],
        );
        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("measured_db").is_none());
        assert_eq!(json["warnings"][0]["kind"], "silent_input");
    }
}
