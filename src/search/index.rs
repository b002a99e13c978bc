//! Document collection with its fitted TF-IDF matrix.
//!
//! The documents, the fitted model and the matrix live together in one
//! [`IndexSnapshot`]. Adding documents builds a complete new snapshot over the
//! whole corpus and replaces the old one only when the build succeeds, so the
//! three never disagree.

use std::collections::HashSet;

use tracing::debug;

use super::ranker;
use super::stop_words::StopWords;
use super::vectorizer::{DocumentMatrix, FittedModel, TfidfVectorizer};
use crate::error::{IndexError, IndexResult};
use crate::types::{Document, DocumentId, ScoredResult};

/// Immutable state of a non-empty index.
#[derive(Debug, Clone)]
pub struct IndexSnapshot {
    documents: Vec<Document>,
    model: FittedModel,
    matrix: DocumentMatrix,
}

impl IndexSnapshot {
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn model(&self) -> &FittedModel {
        &self.model
    }

    pub fn matrix(&self) -> &DocumentMatrix {
        &self.matrix
    }
}

/// Append-only document store that refits on every batch.
///
/// Vocabulary growth is not incremental: each [`add_documents`](Self::add_documents)
/// call refits over every accumulated text, which changes vector dimensions and
/// weights for all documents.
#[derive(Debug, Default)]
pub struct DocumentIndex {
    vectorizer: TfidfVectorizer,
    snapshot: Option<IndexSnapshot>,
}

impl DocumentIndex {
    /// Create an empty index using the English stop-word list
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stop_words(stop_words: StopWords) -> Self {
        Self {
            vectorizer: TfidfVectorizer::new(stop_words),
            snapshot: None,
        }
    }

    /// Append `texts` and refit over the whole corpus.
    ///
    /// Without `ids`, documents get sequential IDs starting after the current
    /// maximum (0 for an empty index). Explicit IDs must match `texts` in count
    /// and must be unused. On any error the index is left unchanged.
    pub fn add_documents<S: AsRef<str>>(
        &mut self,
        texts: &[S],
        ids: Option<&[DocumentId]>,
    ) -> IndexResult<Vec<DocumentId>> {
        let existing = self.documents();

        let assigned: Vec<DocumentId> = match ids {
            Some(ids) => {
                if ids.len() != texts.len() {
                    return Err(IndexError::IdCountMismatch {
                        ids: ids.len(),
                        texts: texts.len(),
                    });
                }
                let mut taken: HashSet<DocumentId> = existing.iter().map(|d| d.id).collect();
                for id in ids {
                    if !taken.insert(*id) {
                        return Err(IndexError::DuplicateId { id: *id });
                    }
                }
                ids.to_vec()
            }
            None => {
                let mut next = self.next_id();
                let mut assigned = Vec::with_capacity(texts.len());
                for _ in texts {
                    let id = next.ok_or(IndexError::IdOverflow)?;
                    assigned.push(id);
                    next = id.checked_next();
                }
                assigned
            }
        };

        let mut documents = existing.to_vec();
        documents.extend(
            assigned
                .iter()
                .zip(texts)
                .map(|(id, text)| Document {
                    id: *id,
                    text: text.as_ref().to_string(),
                }),
        );

        let corpus: Vec<&str> = documents.iter().map(|d| d.text.as_str()).collect();
        let (model, matrix) = self.vectorizer.fit(&corpus)?;

        debug!(
            "Refit index: {} documents, {} terms",
            documents.len(),
            model.vocabulary().len()
        );

        self.snapshot = Some(IndexSnapshot {
            documents,
            model,
            matrix,
        });

        Ok(assigned)
    }

    /// Rank every document against `query`, keeping at most `top_k`.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<ScoredResult> {
        let Some(snapshot) = &self.snapshot else {
            return Vec::new();
        };
        let query_vector = snapshot.model.transform(query);
        ranker::rank(
            &query_vector,
            &snapshot.matrix,
            &snapshot.documents,
            top_k,
        )
    }

    pub fn documents(&self) -> &[Document] {
        self.snapshot
            .as_ref()
            .map(|s| s.documents.as_slice())
            .unwrap_or(&[])
    }

    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.documents().iter().find(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.documents().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents().is_empty()
    }

    /// Size of the current vocabulary (0 for an empty index).
    pub fn vocabulary_size(&self) -> usize {
        self.snapshot
            .as_ref()
            .map_or(0, |s| s.model.vocabulary().len())
    }

    pub fn snapshot(&self) -> Option<&IndexSnapshot> {
        self.snapshot.as_ref()
    }

    /// `None` once the largest ID is `u64::MAX`.
    fn next_id(&self) -> Option<DocumentId> {
        match self.documents().iter().map(|d| d.id).max() {
            None => Some(DocumentId::new(0)),
            Some(max) => max.checked_next(),
        }
    }
}
