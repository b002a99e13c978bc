//! Exit codes for CLI operations following Unix conventions.
//!
//! # Exit Code Semantics
//!
//! - `0`: Success - an answer was produced (or the session ended normally)
//! - `1`: General error - unspecified failure
//! - `3`: Not found - the query ran but nothing scored above the threshold
//! - `4-6`: Specific recoverable errors
//! - `126-255`: Reserved by shell

use crate::error::{DatasetError, KnowledgeError};

/// Standard exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// Query answered with the low-confidence message (code 3)
    NotFound = 3,

    /// Dataset could not be parsed (code 4)
    ParseError = 4,

    /// File I/O error (code 5)
    IoError = 5,

    /// Configuration error (code 6)
    ConfigError = 6,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

impl ExitCode {
    /// `Success` for a confident match, `NotFound` for a miss.
    pub fn from_match<T>(matched: &Option<T>) -> Self {
        match matched {
            Some(_) => ExitCode::Success,
            None => ExitCode::NotFound,
        }
    }

    /// Map an error to the exit code scripts can branch on.
    pub fn from_error(error: &KnowledgeError) -> Self {
        match error {
            KnowledgeError::Dataset(DatasetError::FileRead { .. }) | KnowledgeError::Io(_) => {
                ExitCode::IoError
            }
            KnowledgeError::Dataset(
                DatasetError::Parse { .. }
                | DatasetError::NotAnArray { .. }
                | DatasetError::NoValidEntries { .. },
            ) => ExitCode::ParseError,
            KnowledgeError::Config { .. } => ExitCode::ConfigError,
            KnowledgeError::Index(_) => ExitCode::GeneralError,
        }
    }

    /// Check if this exit code indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndexError;
    use std::path::PathBuf;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success as u8, 0);
        assert_eq!(ExitCode::GeneralError as u8, 1);
        assert_eq!(ExitCode::NotFound as u8, 3);
        assert_eq!(ExitCode::IoError as u8, 5);
    }

    #[test]
    fn test_from_match() {
        assert_eq!(ExitCode::from_match(&Some("answer")), ExitCode::Success);
        assert_eq!(ExitCode::from_match::<&str>(&None), ExitCode::NotFound);
        assert!(!ExitCode::NotFound.is_success());
    }

    #[test]
    fn test_from_error() {
        let err = KnowledgeError::from(DatasetError::FileRead {
            path: PathBuf::from("missing.json"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
        assert_eq!(ExitCode::from_error(&err), ExitCode::IoError);

        let err = KnowledgeError::from(DatasetError::NotAnArray {
            path: PathBuf::from("obj.json"),
        });
        assert_eq!(ExitCode::from_error(&err), ExitCode::ParseError);

        let err = KnowledgeError::Config {
            reason: "bad".to_string(),
        };
        assert_eq!(ExitCode::from_error(&err), ExitCode::ConfigError);

        let err = KnowledgeError::from(IndexError::EmptyVocabulary);
        assert_eq!(ExitCode::from_error(&err), ExitCode::GeneralError);
    }
}
