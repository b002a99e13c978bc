//! Streaming knowledge-base assistant.
//!
//! Documents are indexed with TF-IDF vectors and ranked by cosine similarity;
//! the best match is worded per knowledge-base variant and streamed to the
//! terminal one character at a time.

pub mod config;
pub mod display;
pub mod error;
pub mod io;
pub mod knowledge;
pub mod search;
pub mod stream;
pub mod types;

// Explicit exports for better API clarity
pub use config::Settings;
pub use error::{
    DatasetError, DatasetResult, IndexError, IndexResult, KnowledgeError, KnowledgeResult,
};
pub use knowledge::{Corpus, KnowledgeBase, MatchInfo, SessionOptions, Synthesis, Variant};
pub use search::{DocumentIndex, StopWords, TfidfVectorizer};
pub use stream::{EmitterOptions, TextEmitter};
pub use types::{Document, DocumentId, ScoredResult};
