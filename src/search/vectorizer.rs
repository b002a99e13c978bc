//! TF-IDF term vectorizer over sparse vectors.
//!
//! A fit produces an owned [`FittedModel`] (vocabulary plus IDF weights) and the
//! [`DocumentMatrix`] for the fitted corpus. Nothing here is updated in place:
//! refitting builds a new model and the caller swaps it in as a whole.
//!
//! Weighting:
//! - term frequency is the raw count of the term in the text
//! - `idf(t) = ln((1 + N) / (1 + df(t))) + 1`
//! - each row is scaled to unit L2 norm

use std::collections::{BTreeMap, HashMap};

use super::stop_words::StopWords;
use super::tokenizer::Tokenizer;
use crate::error::{IndexError, IndexResult};

/// Sparse vector stored as `(column, weight)` pairs sorted by column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(u32, f32)>,
}

impl SparseVector {
    /// The all-zero vector.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Build from unsorted pairs. Zero weights are dropped.
    pub fn from_pairs(mut pairs: Vec<(u32, f32)>) -> Self {
        pairs.retain(|(_, w)| *w != 0.0);
        pairs.sort_by_key(|(col, _)| *col);
        Self { entries: pairs }
    }

    /// Number of non-zero entries.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    /// Weight at `column`, zero when absent.
    pub fn get(&self, column: u32) -> f32 {
        self.entries
            .binary_search_by_key(&column, |(col, _)| *col)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.entries.iter().copied()
    }

    /// Euclidean length.
    pub fn norm(&self) -> f32 {
        self.entries
            .iter()
            .map(|(_, w)| w * w)
            .sum::<f32>()
            .sqrt()
    }

    /// Dot product by merging the two sorted entry lists.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (ca, wa) = self.entries[i];
            let (cb, wb) = other.entries[j];
            match ca.cmp(&cb) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += wa * wb;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// Term to column mapping. Columns follow the lexicographic order of terms.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    columns: HashMap<String, u32>,
    terms: Vec<String>,
}

impl Vocabulary {
    fn from_sorted(terms: Vec<String>) -> Self {
        let columns = terms
            .iter()
            .enumerate()
            .map(|(col, term)| (term.clone(), col as u32))
            .collect();
        Self { columns, terms }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn column(&self, term: &str) -> Option<u32> {
        self.columns.get(term).copied()
    }

    pub fn term(&self, column: u32) -> Option<&str> {
        self.terms.get(column as usize).map(String::as_str)
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

/// One L2-normalized row per fitted text.
#[derive(Debug, Clone, Default)]
pub struct DocumentMatrix {
    rows: Vec<SparseVector>,
    columns: usize,
}

impl DocumentMatrix {
    pub fn rows(&self) -> &[SparseVector] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&SparseVector> {
        self.rows.get(index)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Vocabulary and IDF weights learned from one corpus.
#[derive(Debug, Clone)]
pub struct FittedModel {
    tokenizer: Tokenizer,
    vocabulary: Vocabulary,
    idf: Vec<f64>,
    document_count: usize,
}

impl FittedModel {
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// IDF weight of `term`, if it is in the vocabulary.
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary
            .column(term)
            .map(|col| self.idf[col as usize])
    }

    /// Number of texts the model was fitted on.
    pub fn document_count(&self) -> usize {
        self.document_count
    }

    /// Project `text` into the fitted space.
    ///
    /// Terms outside the vocabulary are ignored, so text made only of unknown
    /// words maps to the zero vector.
    pub fn transform(&self, text: &str) -> SparseVector {
        let counts = self.count_terms(text);
        self.weigh(counts)
    }

    fn count_terms(&self, text: &str) -> HashMap<u32, u32> {
        let mut counts = HashMap::new();
        for term in self.tokenizer.tokenize(text) {
            if let Some(col) = self.vocabulary.column(&term) {
                *counts.entry(col).or_insert(0u32) += 1;
            }
        }
        counts
    }

    fn weigh(&self, counts: HashMap<u32, u32>) -> SparseVector {
        let weighted: Vec<(u32, f64)> = counts
            .into_iter()
            .map(|(col, tf)| (col, f64::from(tf) * self.idf[col as usize]))
            .collect();
        let norm = weighted.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm == 0.0 {
            return SparseVector::zero();
        }
        SparseVector::from_pairs(
            weighted
                .into_iter()
                .map(|(col, w)| (col, (w / norm) as f32))
                .collect(),
        )
    }
}

/// Builds TF-IDF models. The vectorizer itself only holds tokenization
/// settings and the most recent fit.
#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    tokenizer: Tokenizer,
    fitted: Option<FittedModel>,
}

impl TfidfVectorizer {
    pub fn new(stop_words: StopWords) -> Self {
        Self {
            tokenizer: Tokenizer::new(stop_words),
            fitted: None,
        }
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// The current fit, if any.
    pub fn fitted(&self) -> Option<&FittedModel> {
        self.fitted.as_ref()
    }

    /// Learn vocabulary and IDF from `texts` without touching `self`.
    ///
    /// Fails with [`IndexError::EmptyVocabulary`] when no text contributes a
    /// single term.
    pub fn fit<S: AsRef<str>>(&self, texts: &[S]) -> IndexResult<(FittedModel, DocumentMatrix)> {
        let tokenized: Vec<Vec<String>> = texts
            .iter()
            .map(|text| self.tokenizer.tokenize(text.as_ref()))
            .collect();

        // Document frequency per term; BTreeMap gives the column order.
        let mut document_frequency: BTreeMap<&str, u32> = BTreeMap::new();
        for terms in &tokenized {
            let mut seen: Vec<&str> = terms.iter().map(String::as_str).collect();
            seen.sort_unstable();
            seen.dedup();
            for term in seen {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        if document_frequency.is_empty() {
            return Err(IndexError::EmptyVocabulary);
        }

        let n = texts.len() as f64;
        let idf: Vec<f64> = document_frequency
            .values()
            .map(|&df| ((1.0 + n) / (1.0 + f64::from(df))).ln() + 1.0)
            .collect();
        let vocabulary = Vocabulary::from_sorted(
            document_frequency
                .keys()
                .map(|term| (*term).to_string())
                .collect(),
        );

        let model = FittedModel {
            tokenizer: self.tokenizer.clone(),
            vocabulary,
            idf,
            document_count: texts.len(),
        };

        let rows = tokenized
            .iter()
            .map(|terms| {
                let mut counts = HashMap::new();
                for term in terms {
                    if let Some(col) = model.vocabulary.column(term) {
                        *counts.entry(col).or_insert(0u32) += 1;
                    }
                }
                model.weigh(counts)
            })
            .collect();

        let matrix = DocumentMatrix {
            rows,
            columns: model.vocabulary.len(),
        };

        Ok((model, matrix))
    }

    /// Fit on `texts`, replacing any previous fit, and return the matrix.
    ///
    /// On error the previous fit is kept.
    pub fn fit_transform<S: AsRef<str>>(&mut self, texts: &[S]) -> IndexResult<DocumentMatrix> {
        let (model, matrix) = self.fit(texts)?;
        self.fitted = Some(model);
        Ok(matrix)
    }

    /// Project `text` into the current fitted space; the zero vector before any fit.
    pub fn transform(&self, text: &str) -> SparseVector {
        match &self.fitted {
            Some(model) => model.transform(text),
            None => SparseVector::zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_rows_are_unit_length() {
        let mut vectorizer = TfidfVectorizer::default();
        let matrix = vectorizer
            .fit_transform(&[
                "Database management systems store data",
                "Natural language processing reads human language",
                "Data science uses statistics",
            ])
            .unwrap();

        assert_eq!(matrix.row_count(), 3);
        for row in matrix.rows() {
            assert!((row.norm() - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn test_smoothed_idf_values() {
        let vectorizer = TfidfVectorizer::new(StopWords::None);
        let (model, _) = vectorizer.fit(&["apple banana", "apple cherry"]).unwrap();

        // apple appears in both documents, banana in one
        let apple = ((1.0f64 + 2.0) / (1.0 + 2.0)).ln() + 1.0;
        let banana = ((1.0f64 + 2.0) / (1.0 + 1.0)).ln() + 1.0;
        assert!((model.idf("apple").unwrap() - apple).abs() < 1e-12);
        assert!((model.idf("banana").unwrap() - banana).abs() < 1e-12);
        assert_eq!(model.idf("durian"), None);
    }

    #[test]
    fn test_vocabulary_is_sorted() {
        let vectorizer = TfidfVectorizer::new(StopWords::None);
        let (model, matrix) = vectorizer.fit(&["zebra apple", "mango"]).unwrap();
        assert_eq!(model.vocabulary().terms(), &["apple", "mango", "zebra"]);
        assert_eq!(matrix.column_count(), 3);
        assert_eq!(model.vocabulary().column("mango"), Some(1));
        assert_eq!(model.vocabulary().term(2), Some("zebra"));
    }

    #[test]
    fn test_term_frequency_counts() {
        let vectorizer = TfidfVectorizer::new(StopWords::None);
        let (model, matrix) = vectorizer.fit(&["cat cat dog"]).unwrap();
        // Single document: both idf values are 1, so weights are 2 and 1 before scaling
        let row = matrix.row(0).unwrap();
        let cat = row.get(model.vocabulary().column("cat").unwrap());
        let dog = row.get(model.vocabulary().column("dog").unwrap());
        assert!((cat - 2.0 / 5.0f32.sqrt()).abs() < EPS);
        assert!((dog - 1.0 / 5.0f32.sqrt()).abs() < EPS);
    }

    #[test]
    fn test_transform_unknown_terms_is_zero() {
        let mut vectorizer = TfidfVectorizer::default();
        vectorizer
            .fit_transform(&["How do I track my order?"])
            .unwrap();
        let v = vectorizer.transform("asdkjaslkdj nonsense xyz");
        assert!(v.is_zero());
        assert_eq!(v.norm(), 0.0);
    }

    #[test]
    fn test_transform_before_fit_is_zero() {
        let vectorizer = TfidfVectorizer::default();
        assert!(vectorizer.transform("anything at all").is_zero());
    }

    #[test]
    fn test_transform_is_idempotent() {
        let mut vectorizer = TfidfVectorizer::default();
        vectorizer
            .fit_transform(&["reset password link", "shipping takes days"])
            .unwrap();
        let a = vectorizer.transform("reset my password please");
        let b = vectorizer.transform("reset my password please");
        assert_eq!(a, b);
        assert!((a.norm() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_empty_vocabulary_keeps_previous_fit() {
        let mut vectorizer = TfidfVectorizer::default();
        vectorizer.fit_transform(&["refund policy"]).unwrap();

        let err = vectorizer.fit_transform(&["the and of", "is it"]).unwrap_err();
        assert!(matches!(err, IndexError::EmptyVocabulary));

        let fitted = vectorizer.fitted().unwrap();
        assert_eq!(fitted.vocabulary().terms(), &["policy", "refund"]);
    }

    #[test]
    fn test_refit_discards_old_vocabulary() {
        let mut vectorizer = TfidfVectorizer::default();
        vectorizer.fit_transform(&["solar energy"]).unwrap();
        let before = vectorizer.transform("solar");
        assert!(!before.is_zero());

        vectorizer.fit_transform(&["wind power"]).unwrap();
        assert!(vectorizer.transform("solar").is_zero());
    }

    #[test]
    fn test_sparse_dot() {
        let a = SparseVector::from_pairs(vec![(3, 0.5), (1, 0.5), (7, 0.0)]);
        let b = SparseVector::from_pairs(vec![(1, 2.0), (2, 9.0), (3, 4.0)]);
        assert_eq!(a.nnz(), 2);
        assert!((a.dot(&b) - 3.0).abs() < EPS);
        assert_eq!(a.dot(&SparseVector::zero()), 0.0);
    }
}
