//! Error types for the study tree engine.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for study tree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the study tree engine.
#[derive(Error, Debug)]
pub enum Error {
    // Descriptor errors (10-19)
    #[error("missing study data at {path}: {reason}")]
    MissingStudyData { path: PathBuf, reason: String },

    #[error("malformed study document: missing or invalid '{key}'")]
    MalformedStudyDocument { key: String },

    // Navigation errors (20-29)
    #[error("unknown segment '{segment}' under '{address}'")]
    UnknownAddressSegment { address: String, segment: String },

    #[error("address not fully consumed at {path}: '{remaining}' left over")]
    AddressNotFullyConsumed { path: PathBuf, remaining: String },

    #[error("write to composite {path} requires a non-empty address")]
    CompositeWriteRequiresAddress { path: PathBuf },

    // Schema errors (30-39)
    #[error("unsupported schema shape at '{pointer}': {reason}")]
    UnsupportedSchemaShape { pointer: String, reason: String },

    #[error("schema validation failed at '{path}': {constraint}")]
    SchemaValidation { path: String, constraint: String },

    // Leaf errors (40-49)
    #[error("cannot coerce '{value}' to {expected} at {location}")]
    TypeCoercion {
        location: String,
        expected: String,
        value: String,
    },

    #[error("backing file missing: {path}")]
    BackingFileMissing { path: PathBuf },

    // I/O errors (60-69)
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Configuration and service errors (70-79)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid study name: {0}")]
    InvalidStudyName(String),

    #[error("study not found: {0}")]
    StudyNotFound(String),
}

impl Error {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Shorthand for a coercion failure.
    pub fn coercion(
        location: impl Into<String>,
        expected: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Error::TypeCoercion {
            location: location.into(),
            expected: expected.into(),
            value: value.into(),
        }
    }

    /// Returns the error code for this error type.
    /// Used for detailed error reporting by callers that expose the engine.
    pub fn code(&self) -> u32 {
        match self {
            Error::MissingStudyData { .. } => 10,
            Error::MalformedStudyDocument { .. } => 11,
            Error::UnknownAddressSegment { .. } => 20,
            Error::AddressNotFullyConsumed { .. } => 21,
            Error::CompositeWriteRequiresAddress { .. } => 22,
            Error::UnsupportedSchemaShape { .. } => 30,
            Error::SchemaValidation { .. } => 31,
            Error::TypeCoercion { .. } => 40,
            Error::BackingFileMissing { .. } => 41,
            Error::Io { .. } => 60,
            Error::Json(_) => 61,
            Error::Config(_) => 70,
            Error::InvalidStudyName(_) => 71,
            Error::StudyNotFound(_) => 72,
        }
    }

    /// Whether the error was caused by the request rather than the study on disk.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownAddressSegment { .. }
                | Error::AddressNotFullyConsumed { .. }
                | Error::CompositeWriteRequiresAddress { .. }
                | Error::SchemaValidation { .. }
                | Error::InvalidStudyName(_)
                | Error::StudyNotFound(_)
        )
    }
}
