//! Core value types shared by the search and knowledge layers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a document inside a [`DocumentIndex`](crate::search::DocumentIndex).
///
/// Zero is a valid ID: auto-assigned IDs start at 0 for an empty index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(u64);

impl DocumentId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// The ID following this one, or `None` after `u64::MAX`.
    #[must_use]
    pub fn checked_next(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    /// Position of the entry this ID was assigned to, when IDs mirror positions.
    #[must_use]
    pub fn as_index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for DocumentId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A stored document. Never mutated after insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub text: String,
}

/// One ranked hit: the document and its cosine similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredResult {
    pub document_id: DocumentId,
    pub document_text: String,
    pub score: f32,
}
