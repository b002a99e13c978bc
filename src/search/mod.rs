//! Lexical search core: tokenization, TF-IDF vectors, cosine ranking and the
//! document index that ties them together.
//!
//! This is pure term-frequency scoring. There are no embeddings and nothing is
//! persisted; the index lives for one session.

mod index;
mod ranker;
mod stop_words;
mod tokenizer;
mod vectorizer;

pub use index::{DocumentIndex, IndexSnapshot};
pub use ranker::{cosine_similarity, rank};
pub use stop_words::StopWords;
pub use tokenizer::Tokenizer;
pub use vectorizer::{DocumentMatrix, FittedModel, SparseVector, TfidfVectorizer, Vocabulary};
