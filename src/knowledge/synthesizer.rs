//! Turns ranked search results into a user-facing answer.
//!
//! The three knowledge-base variants share retrieval and differ in how deep
//! they search, which confidence threshold applies and how the best hit is
//! worded. A result below the threshold is a miss: the caller gets the
//! variant's canned message and no [`MatchInfo`].

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use super::entry::{ArticleEntry, EntryType, FaqEntry, InstructionEntry, truncate_with_ellipsis};
use super::thinking;
use crate::search::DocumentIndex;
use crate::types::ScoredResult;

/// Miss message of the FAQ variant.
pub const FAQ_MISS_MESSAGE: &str =
    "I'm sorry, I don't understand your question. Could you rephrase it?";

/// Miss message of the article and instruction variants.
pub const LOW_CONFIDENCE_MESSAGE: &str = "I don't have enough information to answer that question accurately. Could you try rephrasing or asking something else?";

const RELATED_TOPIC_CHARS: usize = 40;

const QUESTION_WORDS: [&str; 12] = [
    "what", "how", "why", "when", "where", "who", "which", "is", "are", "can", "do", "does",
];

/// Kind of knowledge base.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Customer-support questions and answers
    Faq,
    /// Titled articles grouped by category
    #[default]
    Article,
    /// Instruction, optional input and expected output
    Instruction,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Faq => "faq",
            Self::Article => "article",
            Self::Instruction => "instruction",
        }
    }

    /// How many ranked results a query retrieves.
    pub fn top_k(&self) -> usize {
        match self {
            Self::Faq => 1,
            Self::Article => 3,
            Self::Instruction => 5,
        }
    }

    pub fn miss_message(&self) -> &'static str {
        match self {
            Self::Faq => FAQ_MISS_MESSAGE,
            Self::Article | Self::Instruction => LOW_CONFIDENCE_MESSAGE,
        }
    }

    /// Whether a console line ends the session.
    pub fn is_quit_command(&self, line: &str) -> bool {
        let line = line.trim().to_lowercase();
        matches!(line.as_str(), "quit" | "exit" | "bye")
            || (*self == Self::Instruction && line == "see you")
    }

    /// Noun used in the "Found N relevant ..." thinking step.
    fn result_noun(&self) -> &'static str {
        match self {
            Self::Instruction => "examples",
            Self::Faq | Self::Article => "documents",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum top score for a confident answer, per variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub faq: f32,
    pub article: f32,
    pub instruction: f32,
    /// Instruction threshold for queries with fewer than `short_query_words` words
    pub instruction_short_query: f32,
    pub short_query_words: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            faq: 0.3,
            article: 0.3,
            instruction: 0.3,
            instruction_short_query: 0.2,
            short_query_words: 5,
        }
    }
}

impl Thresholds {
    pub fn for_query(&self, variant: Variant, query: &str) -> f32 {
        match variant {
            Variant::Faq => self.faq,
            Variant::Article => self.article,
            Variant::Instruction => {
                if query.split_whitespace().count() < self.short_query_words {
                    self.instruction_short_query
                } else {
                    self.instruction
                }
            }
        }
    }
}

/// A score equal to the threshold is still confident.
#[inline]
pub fn passes_threshold(score: f32, threshold: f32) -> bool {
    score >= threshold
}

/// The loaded entries of one knowledge base. Entry `i` is document `i` in the index.
#[derive(Debug, Clone)]
pub enum Corpus {
    Faq(Vec<FaqEntry>),
    Article(Vec<ArticleEntry>),
    Instruction(Vec<InstructionEntry>),
}

impl Corpus {
    pub fn variant(&self) -> Variant {
        match self {
            Self::Faq(_) => Variant::Faq,
            Self::Article(_) => Variant::Article,
            Self::Instruction(_) => Variant::Instruction,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Faq(entries) => entries.len(),
            Self::Article(entries) => entries.len(),
            Self::Instruction(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text indexed for each entry, in entry order.
    pub fn search_texts(&self) -> Vec<String> {
        match self {
            Self::Faq(entries) => entries.iter().map(FaqEntry::search_text).collect(),
            Self::Article(entries) => entries.iter().map(ArticleEntry::search_text).collect(),
            Self::Instruction(entries) => {
                entries.iter().map(InstructionEntry::search_text).collect()
            }
        }
    }
}

/// Structured description of a confident match.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "variant", rename_all = "lowercase")]
pub enum MatchInfo {
    Faq {
        matched_question: String,
        confidence: f32,
        answer: String,
    },
    Article {
        title: String,
        category: String,
        confidence: f32,
        answer: String,
        related_titles: Vec<String>,
    },
    Instruction {
        query: String,
        answer: String,
        related_topics: Vec<String>,
        top_score: f32,
        entry_type: EntryType,
    },
}

impl MatchInfo {
    pub fn answer(&self) -> &str {
        match self {
            Self::Faq { answer, .. }
            | Self::Article { answer, .. }
            | Self::Instruction { answer, .. } => answer,
        }
    }

    pub fn score(&self) -> f32 {
        match self {
            Self::Faq { confidence, .. } | Self::Article { confidence, .. } => *confidence,
            Self::Instruction { top_score, .. } => *top_score,
        }
    }
}

/// Outcome of one query.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub answer: String,
    /// `None` for a low-confidence miss
    pub matched: Option<MatchInfo>,
    /// Thinking steps to show before the answer (empty on a miss)
    pub thinking: Vec<String>,
}

impl Synthesis {
    fn miss(variant: Variant) -> Self {
        Self {
            answer: variant.miss_message().to_string(),
            matched: None,
            thinking: Vec::new(),
        }
    }

    pub fn is_miss(&self) -> bool {
        self.matched.is_none()
    }
}

/// Applies thresholds and wording rules to search results.
#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    thresholds: Thresholds,
}

impl Synthesizer {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Answer `query` from `corpus`, whose entries were indexed in order into `index`.
    pub fn synthesize(&self, corpus: &Corpus, index: &DocumentIndex, query: &str) -> Synthesis {
        let variant = corpus.variant();
        let search_query = match variant {
            Variant::Instruction => query.strip_suffix('?').unwrap_or(query),
            Variant::Faq | Variant::Article => query,
        };
        let results = index.search(search_query, variant.top_k());
        let threshold = self.thresholds.for_query(variant, query);

        debug!(
            "Search '{search_query}': {} hits, top score {:.3} (threshold {threshold})",
            results.len(),
            results.first().map_or(0.0, |r| r.score)
        );

        match corpus {
            Corpus::Faq(entries) => faq_answer(entries, &results, threshold),
            Corpus::Article(entries) => article_answer(entries, &results, threshold, query),
            Corpus::Instruction(entries) => {
                instruction_answer(entries, &results, threshold, query)
            }
        }
    }
}

/// Pair each result with its entry, dropping results with no entry.
fn resolve<'a, T>(entries: &'a [T], results: &'a [ScoredResult]) -> Vec<(&'a T, f32)> {
    results
        .iter()
        .filter_map(|r| entries.get(r.document_id.as_index()).map(|e| (e, r.score)))
        .collect()
}

fn faq_answer(entries: &[FaqEntry], results: &[ScoredResult], threshold: f32) -> Synthesis {
    let hits = resolve(entries, results);
    let Some(&(entry, score)) = hits.first().filter(|(_, s)| passes_threshold(*s, threshold))
    else {
        return Synthesis::miss(Variant::Faq);
    };

    Synthesis {
        answer: entry.answer.clone(),
        matched: Some(MatchInfo::Faq {
            matched_question: entry.question.clone(),
            confidence: score,
            answer: entry.answer.clone(),
        }),
        thinking: Vec::new(),
    }
}

fn article_answer(
    entries: &[ArticleEntry],
    results: &[ScoredResult],
    threshold: f32,
    query: &str,
) -> Synthesis {
    let hits = resolve(entries, results);
    let Some(&(top, score)) = hits.first().filter(|(_, s)| passes_threshold(*s, threshold)) else {
        return Synthesis::miss(Variant::Article);
    };

    let thinking = thinking::steps(
        query,
        results.len(),
        Variant::Article.result_noun(),
        hits.iter()
            .map(|(article, score)| thinking::article_hit(article, *score))
            .collect(),
    );

    let answer = format_article_answer(query, &top.title, &top.content);
    let related_titles = hits
        .iter()
        .skip(1)
        .take(2)
        .map(|(article, _)| article.title.clone())
        .collect();

    Synthesis {
        answer: answer.clone(),
        matched: Some(MatchInfo::Article {
            title: top.title.clone(),
            category: top.category.clone(),
            confidence: score,
            answer,
            related_titles,
        }),
        thinking,
    }
}

fn instruction_answer(
    entries: &[InstructionEntry],
    results: &[ScoredResult],
    threshold: f32,
    query: &str,
) -> Synthesis {
    let hits = resolve(entries, results);
    if !hits
        .first()
        .is_some_and(|(_, s)| passes_threshold(*s, threshold))
    {
        return Synthesis::miss(Variant::Instruction);
    }

    let thinking = thinking::steps(
        query,
        results.len(),
        Variant::Instruction.result_noun(),
        hits.iter()
            .take(3)
            .map(|(entry, score)| thinking::instruction_hit(entry, *score))
            .collect(),
    );

    let selected: Vec<(&InstructionEntry, f32)> = hits
        .into_iter()
        .take(3)
        .filter(|(_, s)| passes_threshold(*s, threshold))
        .collect();
    let Some(&(top, top_score)) = selected.first() else {
        return Synthesis::miss(Variant::Instruction);
    };

    let answer = format_instruction_answer(query, top, top_score);
    let related_topics = selected
        .iter()
        .skip(1)
        .filter_map(|(entry, _)| related_topic(entry))
        .collect();

    Synthesis {
        answer: answer.clone(),
        matched: Some(MatchInfo::Instruction {
            query: query.to_string(),
            answer,
            related_topics,
            top_score,
            entry_type: top.entry_type(),
        }),
        thinking,
    }
}

/// Whether the query reads like a question.
pub fn is_question(query: &str) -> bool {
    let lower = query.to_lowercase();
    QUESTION_WORDS.iter().any(|w| lower.starts_with(w)) || query.ends_with('?')
}

/// Word an article answer according to the shape of the query.
pub fn format_article_answer(query: &str, title: &str, content: &str) -> String {
    let lower = query.to_lowercase();
    if lower.starts_with("what is") || lower.starts_with("what are") {
        content.to_string()
    } else if lower.contains("how to") || lower.contains("how do i") {
        format!("To understand {title}, here's what you need to know: {content}")
    } else {
        format!("Regarding {title}: {content}")
    }
}

/// Word the best instruction entry. Score comparisons here are strict.
pub fn format_instruction_answer(query: &str, entry: &InstructionEntry, score: f32) -> String {
    let output = &entry.output;
    match entry.entry_type() {
        EntryType::OutputOnly => output.clone(),
        EntryType::QuestionAnswer if score > 0.6 => output.clone(),
        EntryType::InstructionWithInput => {
            if score > 0.7
                || entry
                    .instruction
                    .to_lowercase()
                    .contains(&query.to_lowercase())
            {
                output.clone()
            } else {
                format!(
                    "Based on a similar request: '{}'\n\n{output}",
                    entry.instruction
                )
            }
        }
        _ if is_question(query) && score < 0.5 => format!(
            "While I don't have exact information on this question, here's a related response that might help:\n\n{output}"
        ),
        _ => output.clone(),
    }
}

fn related_topic(entry: &InstructionEntry) -> Option<String> {
    if !entry.instruction.is_empty() {
        Some(truncate_with_ellipsis(&entry.instruction, RELATED_TOPIC_CHARS))
    } else if !entry.input.is_empty() {
        Some(truncate_with_ellipsis(&entry.input, RELATED_TOPIC_CHARS))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(instruction: &str, input: &str, output: &str) -> InstructionEntry {
        InstructionEntry {
            instruction: instruction.to_string(),
            input: input.to_string(),
            output: output.to_string(),
        }
    }

    #[test]
    fn test_instruction_threshold_depends_on_query_length() {
        let t = Thresholds::default();
        assert_eq!(t.for_query(Variant::Instruction, "primary colors"), 0.2);
        assert_eq!(t.for_query(Variant::Instruction, "one two three four"), 0.2);
        assert_eq!(
            t.for_query(Variant::Instruction, "one two three four five"),
            0.3
        );
        assert_eq!(t.for_query(Variant::Faq, "a"), 0.3);
        assert_eq!(t.for_query(Variant::Article, "a"), 0.3);
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        assert!(passes_threshold(0.3, 0.3));
        assert!(!passes_threshold(0.299_999, 0.3));
    }

    #[test]
    fn test_is_question() {
        assert!(is_question("What is rust"));
        assert!(is_question("does it work"));
        assert!(is_question("tell me more?"));
        assert!(!is_question("tell me more"));
        // prefix match, not whole word
        assert!(is_question("island hopping"));
    }

    #[test]
    fn test_article_wording() {
        assert_eq!(
            format_article_answer("What are neural networks", "Deep Learning", "Layers."),
            "Layers."
        );
        assert_eq!(
            format_article_answer("how do I learn this", "Deep Learning", "Layers."),
            "To understand Deep Learning, here's what you need to know: Layers."
        );
        assert_eq!(
            format_article_answer("deep learning", "Deep Learning", "Layers."),
            "Regarding Deep Learning: Layers."
        );
    }

    #[test]
    fn test_output_only_is_verbatim_even_for_weak_questions() {
        let e = entry("", "", "Just the output.");
        assert_eq!(
            format_instruction_answer("why is that?", &e, 0.21),
            "Just the output."
        );
    }

    #[test]
    fn test_instruction_with_input_boundaries() {
        let e = entry("Sort the numbers", "3 1 2", "1 2 3");
        // exactly 0.7 is not above the bar
        assert_eq!(
            format_instruction_answer("order these values", &e, 0.7),
            "Based on a similar request: 'Sort the numbers'\n\n1 2 3"
        );
        assert_eq!(format_instruction_answer("order these values", &e, 0.71), "1 2 3");
        assert_eq!(format_instruction_answer("SORT THE", &e, 0.3), "1 2 3");
    }

    #[test]
    fn test_weak_question_gets_preface() {
        let e = entry("Name three primary colors", "", "Red, blue and yellow.");
        assert_eq!(
            format_instruction_answer("what colors are primary", &e, 0.45),
            "While I don't have exact information on this question, here's a related response that might help:\n\nRed, blue and yellow."
        );
        // exactly 0.5 is not below the bar
        assert_eq!(
            format_instruction_answer("what colors are primary", &e, 0.5),
            "Red, blue and yellow."
        );
        assert_eq!(
            format_instruction_answer("primary colors", &e, 0.45),
            "Red, blue and yellow."
        );
    }

    #[test]
    fn test_quit_commands() {
        assert!(Variant::Faq.is_quit_command("quit"));
        assert!(Variant::Article.is_quit_command(" BYE "));
        assert!(!Variant::Article.is_quit_command("see you"));
        assert!(Variant::Instruction.is_quit_command("see you"));
        assert!(!Variant::Faq.is_quit_command("quit now"));
    }

    #[test]
    fn test_related_topic_truncation() {
        let long = "Explain the process of photosynthesis in great detail";
        assert_eq!(
            related_topic(&entry(long, "", "x")).unwrap(),
            "Explain the process of photosynthesis in..."
        );
        assert_eq!(
            related_topic(&entry("", "raw input", "x")).unwrap(),
            "raw input"
        );
        assert!(related_topic(&entry("", "", "x")).is_none());
    }
}
