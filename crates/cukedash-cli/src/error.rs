//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Cukedash library error
    #[error("{0}")]
    Cukedash(#[from] cukedash::CukedashError),

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },
}

impl CliError {
    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_invalid_argument_error() {
        let err = CliError::invalid_argument("bad arg");
        assert!(err.to_string().contains("Invalid argument"));
    }

    #[test]
    fn test_library_error_is_transparent() {
        let lib_err = cukedash::CukedashError::MissingResults {
            path: PathBuf::from("cucumber-reports/cucumber-report.json"),
        };
        let cli_err: CliError = lib_err.into();
        assert_eq!(
            cli_err.to_string(),
            "Result file not found: cucumber-reports/cucumber-report.json"
        );
    }
}
