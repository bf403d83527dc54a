//! Result and error types for Cukedash.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for Cukedash operations
pub type CukedashResult<T> = Result<T, CukedashError>;

/// Errors that can occur while aggregating reports
#[derive(Debug, Error)]
pub enum CukedashError {
    /// Runner result file not written yet
    #[error("Result file not found: {}", path.display())]
    MissingResults {
        /// Expected location of the result file
        path: PathBuf,
    },

    /// Configuration could not be loaded
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Report generator failed
    #[error("Report rendering failed: {message}")]
    Render {
        /// Error message
        message: String,
    },

    /// Module or feature name unusable as a report folder
    #[error("Invalid bucket: {message}")]
    InvalidBucket {
        /// Error message
        message: String,
    },

    /// Screenshot capture failed
    #[error("Screenshot capture failed: {message}")]
    Capture {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CukedashError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a render error
    #[must_use]
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    /// Create an invalid bucket error
    #[must_use]
    pub fn invalid_bucket(message: impl Into<String>) -> Self {
        Self::InvalidBucket {
            message: message.into(),
        }
    }

    /// Create a capture error
    #[must_use]
    pub fn capture(message: impl Into<String>) -> Self {
        Self::Capture {
            message: message.into(),
        }
    }
}
