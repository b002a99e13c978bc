//! Knowledge-base layer: entry shapes, dataset loading, answer synthesis and
//! the interactive session that streams answers.

mod base;
pub mod dataset;
mod entry;
pub mod samples;
mod synthesizer;
pub mod thinking;

pub use base::{KnowledgeBase, LoadedCorpus, SessionOptions, footer, load_corpus};
pub use dataset::{DatasetRecord, LoadReport};
pub use entry::{
    ArticleEntry, EMPTY_ENTRY_TEXT, EntryType, FaqEntry, InstructionEntry, truncate_with_ellipsis,
};
pub use synthesizer::{
    Corpus, FAQ_MISS_MESSAGE, LOW_CONFIDENCE_MESSAGE, MatchInfo, Synthesis, Synthesizer,
    Thresholds, Variant, format_article_answer, format_instruction_answer, is_question,
    passes_threshold,
};
