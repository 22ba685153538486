// src/error.rs

//! Central error type for conversion operations.
//!
//! Only genuinely recoverable conditions surface here: bad inputs at
//! construction and collaborator I/O failures. Internal contract violations
//! (an unknown configuration condition reaching a diff lookup) panic instead,
//! since they indicate an upstream evaluator or parser bug that no caller can
//! meaningfully handle.

use thiserror::Error;

/// Errors that can occur while converting a project
#[derive(Debug, Error)]
pub enum Error {
    /// A required input was missing or unusable at construction
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The evaluator collaborator failed to produce an evaluated state
    #[error("Evaluation failed for configuration '{configuration}': {message}")]
    Evaluation {
        configuration: String,
        message: String,
    },

    /// The package-lock reader collaborator failed
    #[error("Failed to read package lock '{path}': {message}")]
    PackageLock { path: String, message: String },

    /// The serializer collaborator failed to write the output descriptor
    #[error("Failed to save project to '{path}': {message}")]
    Save { path: String, message: String },

    /// Diff report serialization failed
    #[error("Failed to render report: {0}")]
    Report(#[from] serde_json::Error),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, Error>;
