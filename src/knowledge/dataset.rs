//! Dataset loading and record validation.
//!
//! A dataset file is a single JSON array. Each element is converted to the
//! entry type of the selected variant; elements that fail conversion or
//! validation are skipped and counted rather than treated as errors.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::entry::{ArticleEntry, FaqEntry, InstructionEntry, truncate_with_ellipsis};
use crate::error::{DatasetError, DatasetResult};

/// A record type that can be read from a dataset file.
pub trait DatasetRecord: DeserializeOwned {
    /// Whether the record carries every field it needs.
    fn is_valid(&self) -> bool;

    /// One-line preview for load diagnostics.
    fn preview(&self) -> String;
}

impl DatasetRecord for FaqEntry {
    fn is_valid(&self) -> bool {
        !self.question.trim().is_empty() && !self.answer.trim().is_empty()
    }

    fn preview(&self) -> String {
        format!("Question: {}", truncate_with_ellipsis(&self.question, 50))
    }
}

impl DatasetRecord for ArticleEntry {
    fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && !self.content.trim().is_empty()
    }

    fn preview(&self) -> String {
        format!("Title: {} ({})", self.title, self.category)
    }
}

impl DatasetRecord for InstructionEntry {
    fn is_valid(&self) -> bool {
        !self.output.trim().is_empty()
    }

    fn preview(&self) -> String {
        let input = if self.input.is_empty() {
            "None".to_string()
        } else {
            truncate_with_ellipsis(&self.input, 50)
        };
        format!(
            "Instruction: {} | Input: {} | Output length: {} chars",
            truncate_with_ellipsis(&self.instruction, 50),
            input,
            self.output.chars().count()
        )
    }
}

/// Valid entries from one dataset plus how many records were dropped.
#[derive(Debug, Clone)]
pub struct LoadReport<T> {
    pub entries: Vec<T>,
    pub skipped: usize,
}

/// Convert raw JSON records, keeping the valid ones in order.
pub fn parse_records<T: DatasetRecord>(records: Vec<Value>) -> LoadReport<T> {
    let mut entries = Vec::with_capacity(records.len());
    let mut skipped = 0;

    for record in records {
        match serde_json::from_value::<T>(record) {
            Ok(entry) if entry.is_valid() => entries.push(entry),
            Ok(_) => skipped += 1,
            Err(e) => {
                debug!("Skipping dataset record: {e}");
                skipped += 1;
            }
        }
    }

    LoadReport { entries, skipped }
}

/// Parse dataset text. `origin` is only used in error messages.
pub fn load_str<T: DatasetRecord>(
    json: &str,
    origin: &Path,
    max_entries: Option<usize>,
) -> DatasetResult<LoadReport<T>> {
    let value: Value = serde_json::from_str(json).map_err(|source| DatasetError::Parse {
        path: origin.to_path_buf(),
        source,
    })?;

    let Value::Array(records) = value else {
        return Err(DatasetError::NotAnArray {
            path: origin.to_path_buf(),
        });
    };

    let mut report = parse_records::<T>(records);
    if let Some(max) = max_entries {
        report.entries.truncate(max);
    }

    if report.entries.is_empty() {
        return Err(DatasetError::NoValidEntries {
            path: origin.to_path_buf(),
            skipped: report.skipped,
        });
    }

    info!(
        "Loaded {} valid entries from {} (skipped {} invalid entries)",
        report.entries.len(),
        origin.display(),
        report.skipped
    );
    for (i, entry) in report.entries.iter().take(3).enumerate() {
        debug!("Entry {}: {}", i + 1, entry.preview());
    }

    Ok(report)
}

/// Read and parse a dataset file.
pub fn load_file<T: DatasetRecord>(
    path: impl AsRef<Path>,
    max_entries: Option<usize>,
) -> DatasetResult<LoadReport<T>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| DatasetError::FileRead {
        path: PathBuf::from(path),
        source,
    })?;
    load_str(&json, path, max_entries)
}
