//! Error types for the ASDM storage manager
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using StManError
pub type Result<T> = std::result::Result<T, StManError>;

/// Unified error type for storage manager operations
#[derive(Debug, Error)]
pub enum StManError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO error on {path}: {source}")]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Index / Format Errors
    // -------------------------------------------------------------------------
    #[error("Corrupt index {path}: {reason}")]
    CorruptIndex { path: PathBuf, reason: String },

    #[error("Unsupported index version {found} in {path} (max supported {supported})")]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        supported: u32,
    },

    #[error("Unsupported data encoding tag {0}")]
    UnsupportedEncoding(i16),

    #[error("Block too short: cell needs {needed} bytes, block holds {available}")]
    ShortBlock { needed: u64, available: u64 },

    #[error("Index contains no entries")]
    EmptyIndex,

    // -------------------------------------------------------------------------
    // Table Engine Errors
    // -------------------------------------------------------------------------
    #[error("Unknown column '{0}' (expected DATA, FLAG, WEIGHT or SIGMA)")]
    UnknownColumn(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Row {row} out of range (table has {total} rows)")]
    OutOfRange { row: u64, total: u64 },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StManError {
    /// Shorthand for a `CorruptIndex` error on `path`
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        StManError::CorruptIndex {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
