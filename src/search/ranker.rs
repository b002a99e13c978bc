//! Cosine ranking of a query vector against a document matrix.

use super::vectorizer::{DocumentMatrix, SparseVector};
use crate::types::{Document, ScoredResult};

/// Cosine similarity of two vectors already scaled to unit length.
///
/// No normalization happens here; for unit vectors this is the plain dot product.
#[inline]
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f32 {
    a.dot(b)
}

/// Rank `documents` against `query`, best first, keeping at most `top_k`.
///
/// `matrix` row `i` must be the vector of `documents[i]`. Equal scores keep
/// document order (the sort is stable). An empty matrix yields no results.
pub fn rank(
    query: &SparseVector,
    matrix: &DocumentMatrix,
    documents: &[Document],
    top_k: usize,
) -> Vec<ScoredResult> {
    debug_assert_eq!(matrix.row_count(), documents.len());

    if top_k == 0 || matrix.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(usize, f32)> = matrix
        .rows()
        .iter()
        .enumerate()
        .map(|(position, row)| (position, cosine_similarity(query, row)))
        .collect();

    // Stable: ties stay in insertion order
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(top_k);

    scored
        .into_iter()
        .filter_map(|(position, score)| {
            documents.get(position).map(|doc| ScoredResult {
                document_id: doc.id,
                document_text: doc.text.clone(),
                score,
            })
        })
        .collect()
}
