//! Error types for the knowledge-base assistant
//!
//! Structured error types using thiserror. Each top-level error carries a
//! stable status code and recovery suggestions for the CLI.

use crate::types::DocumentId;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or updating the document index
#[derive(Error, Debug)]
pub enum IndexError {
    /// Every token in the corpus was a stop word, or there were no tokens
    #[error("Empty vocabulary: the documents contain only stop words or no indexable terms")]
    EmptyVocabulary,

    #[error("Got {ids} explicit document IDs for {texts} texts")]
    IdCountMismatch { ids: usize, texts: usize },

    #[error("Document ID {id} is already in use")]
    DuplicateId { id: DocumentId },

    #[error("No document ID is left after {}", u64::MAX)]
    IdOverflow,
}

/// Errors raised while loading a dataset file
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read dataset '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse dataset '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Dataset '{path}' must contain a single JSON array of records")]
    NotAnArray { path: PathBuf },

    #[error("Dataset '{path}' has no valid entries ({skipped} records skipped)")]
    NoValidEntries { path: PathBuf, skipped: usize },
}

/// Main error type for knowledge-base sessions
#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Index(#[from] IndexError),

    /// Configuration errors
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    /// Console or output worker I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl KnowledgeError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::Dataset(DatasetError::FileRead { .. }) => "DATASET_READ_ERROR",
            Self::Dataset(DatasetError::Parse { .. }) => "DATASET_PARSE_ERROR",
            Self::Dataset(DatasetError::NotAnArray { .. }) => "DATASET_SHAPE_ERROR",
            Self::Dataset(DatasetError::NoValidEntries { .. }) => "DATASET_EMPTY",
            Self::Index(IndexError::EmptyVocabulary) => "EMPTY_VOCABULARY",
            Self::Index(IndexError::IdCountMismatch { .. }) => "ID_COUNT_MISMATCH",
            Self::Index(IndexError::DuplicateId { .. }) => "DUPLICATE_ID",
            Self::Index(IndexError::IdOverflow) => "ID_OVERFLOW",
            Self::Config { .. } => "CONFIG_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Dataset(DatasetError::FileRead { .. }) => vec![
                "Check that the dataset file exists and you have read permissions",
                "Pass the path explicitly with --dataset",
            ],
            Self::Dataset(DatasetError::Parse { .. } | DatasetError::NotAnArray { .. }) => vec![
                "The dataset must be a single JSON array of objects",
                "Validate the file with a JSON linter",
            ],
            Self::Dataset(DatasetError::NoValidEntries { .. }) => vec![
                "Every record was missing a required field",
                "Check that the dataset matches the selected --variant",
            ],
            Self::Index(IndexError::EmptyVocabulary) => vec![
                "Add documents with meaningful words, not only stop words",
            ],
            Self::Config { .. } => vec![
                "Run 'streamkb config' to inspect the effective settings",
                "Run 'streamkb init --force' to regenerate the settings file",
            ],
            _ => vec![],
        }
    }
}

/// Result type alias for index operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Result type alias for dataset loading
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Result type alias for knowledge-base operations
pub type KnowledgeResult<T> = Result<T, KnowledgeError>;
