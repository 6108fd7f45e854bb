//! Batch orchestration: input enumeration, per-file pipeline, reporting

pub mod report;
pub mod runner;
pub mod scanner;

pub use report::{BatchResult, FileOutcome, FileStatus, Warning};
pub use runner::{BatchRunner, Stage};
pub use scanner::{scan_inputs, Scan};
