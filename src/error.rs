//! Error handling for Normwave
//!
//! Configuration errors are fatal and surface before any file is processed;
//! everything else is caught per file by the batch runner so one bad input
//! never aborts a run.

use thiserror::Error;

/// Result type alias for Normwave operations
pub type Result<T> = std::result::Result<T, NormwaveError>;

/// Main error type for Normwave operations
#[derive(Error, Debug)]
pub enum NormwaveError {
    // File Errors
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Decode error: {reason}")]
    DecodeError {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Audio contains no samples")]
    EmptyAudio,

    // Output Errors
    #[error("Encode error: {reason}")]
    EncodeError { reason: String },

    #[error("Refusing to overwrite input file: {path}")]
    WouldOverwriteInput { path: String },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // Processing Errors
    #[error("Processing error: {reason}")]
    ProcessingError { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NormwaveError {
    /// Get the stable error code for this error type
    ///
    /// These codes appear in batch reports, so they must not change
    /// between releases.
    pub fn error_code(&self) -> &'static str {
        match self {
            NormwaveError::FileNotFound { .. } => "FILE_NOT_FOUND",
            NormwaveError::DecodeError { .. } => "DECODE_ERROR",
            NormwaveError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            NormwaveError::EmptyAudio => "EMPTY_AUDIO",
            NormwaveError::EncodeError { .. } => "ENCODE_ERROR",
            NormwaveError::WouldOverwriteInput { .. } => "WOULD_OVERWRITE_INPUT",
            NormwaveError::InvalidConfig { .. } => "INVALID_CONFIG",
            NormwaveError::ProcessingError { .. } => "PROCESSING_ERROR",
            NormwaveError::Io(_) => "IO_ERROR",
            NormwaveError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether this error aborts the whole batch rather than a single file
    pub fn is_fatal(&self) -> bool {
        matches!(self, NormwaveError::InvalidConfig { .. })
    }
}
