//! A running knowledge-base session: corpus, index, synthesizer and the two
//! output emitters.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use super::dataset;
use super::samples;
use super::synthesizer::{Corpus, MatchInfo, Synthesis, Synthesizer, Thresholds, Variant};
use crate::config::Settings;
use crate::error::{KnowledgeError, KnowledgeResult};
use crate::search::DocumentIndex;
use crate::stream::{self, EmitterOptions, Jitter, NoJitter, RandomJitter, Sink, TextEmitter};
use crate::types::DocumentId;

/// Timing and threshold knobs of a session.
#[derive(Clone)]
pub struct SessionOptions {
    pub thresholds: Thresholds,
    pub answer: EmitterOptions,
    pub thinking: EmitterOptions,
    pub step_pause: Duration,
    pub step_pause_jitter: Duration,
    pub jitter: Arc<dyn Jitter>,
}

impl SessionOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        let streaming = &settings.streaming;
        let jitter: Arc<dyn Jitter> = if streaming.jitter {
            Arc::new(RandomJitter)
        } else {
            Arc::new(NoJitter)
        };
        Self {
            thresholds: settings.search.thresholds(),
            answer: streaming.answer_emitter(),
            thinking: streaming.thinking_emitter(),
            step_pause: Duration::from_millis(streaming.step_pause_ms),
            step_pause_jitter: Duration::from_millis(streaming.step_pause_jitter_ms),
            jitter,
        }
    }

    /// No pacing at all. Output appears as fast as the sink accepts it.
    pub fn instant() -> Self {
        let emitter = EmitterOptions {
            interval: Duration::ZERO,
            stop_timeout: Duration::from_secs(1),
        };
        Self {
            thresholds: Thresholds::default(),
            answer: emitter,
            thinking: emitter,
            step_pause: Duration::ZERO,
            step_pause_jitter: Duration::ZERO,
            jitter: Arc::new(NoJitter),
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl std::fmt::Debug for SessionOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionOptions")
            .field("thresholds", &self.thresholds)
            .field("answer", &self.answer)
            .field("thinking", &self.thinking)
            .field("step_pause", &self.step_pause)
            .field("step_pause_jitter", &self.step_pause_jitter)
            .finish_non_exhaustive()
    }
}

/// A loaded corpus and where it came from.
#[derive(Debug, Clone)]
pub struct LoadedCorpus {
    pub corpus: Corpus,
    /// Dataset records dropped as invalid.
    pub skipped: usize,
    /// `None` for the built-in corpora.
    pub source: Option<PathBuf>,
}

impl LoadedCorpus {
    /// One line for the console, e.g.
    /// `Loaded 4 instruction entries from data/alpaca.json (skipped 2 invalid entries)`.
    pub fn summary(&self) -> String {
        let origin = match &self.source {
            Some(path) => path.display().to_string(),
            None => format!("the built-in {} corpus", self.corpus.variant()),
        };
        let mut line = format!(
            "Loaded {} {} entries from {origin}",
            self.corpus.len(),
            self.corpus.variant()
        );
        if self.skipped > 0 {
            line.push_str(&format!(" (skipped {} invalid entries)", self.skipped));
        }
        line
    }
}

/// Load the corpus for `variant` from `dataset`, or the built-in one.
pub fn load_corpus(
    variant: Variant,
    dataset: Option<&Path>,
    max_entries: Option<usize>,
) -> KnowledgeResult<LoadedCorpus> {
    let (corpus, skipped) = match (variant, dataset) {
        (Variant::Faq, Some(path)) => {
            let report = dataset::load_file(path, max_entries)?;
            (Corpus::Faq(report.entries), report.skipped)
        }
        (Variant::Article, Some(path)) => {
            let report = dataset::load_file(path, max_entries)?;
            (Corpus::Article(report.entries), report.skipped)
        }
        (Variant::Instruction, Some(path)) => {
            let report = dataset::load_file(path, max_entries)?;
            (Corpus::Instruction(report.entries), report.skipped)
        }
        (Variant::Faq, None) => {
            let report = samples::faq_entries()?;
            (Corpus::Faq(report.entries), report.skipped)
        }
        (Variant::Article, None) => {
            let report = samples::article_entries()?;
            (Corpus::Article(report.entries), report.skipped)
        }
        (Variant::Instruction, None) => {
            return Err(KnowledgeError::Config {
                reason: "the instruction variant needs a dataset file (--dataset or knowledge.dataset)"
                    .to_string(),
            });
        }
    };
    Ok(LoadedCorpus {
        corpus,
        skipped,
        source: dataset.map(Path::to_path_buf),
    })
}

/// One interactive session over a fixed corpus.
///
/// Entry `i` of the corpus is document `i` of the index. Answers and thinking
/// steps are written by two [`TextEmitter`]s; nothing else in the session
/// writes to their sinks.
pub struct KnowledgeBase {
    corpus: Corpus,
    index: DocumentIndex,
    synthesizer: Synthesizer,
    answer: TextEmitter,
    thinking: TextEmitter,
    step_pause: Duration,
    step_pause_jitter: Duration,
    jitter: Arc<dyn Jitter>,
}

impl KnowledgeBase {
    /// Build a session writing to standard output.
    pub fn new(corpus: Corpus, options: SessionOptions) -> KnowledgeResult<Self> {
        Self::with_sinks(
            corpus,
            options,
            Box::new(std::io::stdout()),
            Box::new(std::io::stdout()),
        )
    }

    /// Build a session and start both emitters.
    pub fn with_sinks(
        corpus: Corpus,
        options: SessionOptions,
        answer_sink: Sink,
        thinking_sink: Sink,
    ) -> KnowledgeResult<Self> {
        let mut index = DocumentIndex::new();
        let texts = corpus.search_texts();
        let ids: Vec<DocumentId> = (0..texts.len() as u64).map(DocumentId::new).collect();
        index.add_documents(&texts, Some(&ids))?;

        info!(
            "Knowledge base ready: {} {} entries, {} terms",
            corpus.len(),
            corpus.variant(),
            index.vocabulary_size()
        );

        let mut answer = TextEmitter::with_jitter(
            "answer",
            answer_sink,
            options.answer,
            Arc::clone(&options.jitter),
        );
        let mut thinking = TextEmitter::with_jitter(
            "thinking",
            thinking_sink,
            options.thinking,
            Arc::clone(&options.jitter),
        );
        answer.start()?;
        thinking.start()?;

        Ok(Self {
            corpus,
            index,
            synthesizer: Synthesizer::new(options.thresholds),
            answer,
            thinking,
            step_pause: options.step_pause,
            step_pause_jitter: options.step_pause_jitter,
            jitter: options.jitter,
        })
    }

    pub fn variant(&self) -> Variant {
        self.corpus.variant()
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn index(&self) -> &DocumentIndex {
        &self.index
    }

    /// Compute the answer without writing anything.
    pub fn answer(&self, query: &str) -> Synthesis {
        self.synthesizer.synthesize(&self.corpus, &self.index, query)
    }

    /// Answer `query`, streaming thinking steps (when enabled) and the answer.
    ///
    /// Returns after the thinking steps are written; the answer may still be
    /// streaming. Call [`wait_until_done`](Self::wait_until_done) before
    /// printing anything after it. A miss streams the canned message and
    /// returns `None`.
    pub fn respond(&self, query: &str, show_thinking: bool) -> Option<MatchInfo> {
        let synthesis = self.answer(query);

        if synthesis.is_miss() {
            debug!("Low-confidence miss for '{query}'");
        }

        if show_thinking && !synthesis.thinking.is_empty() {
            self.thinking.put_immediate("\nThinking: ");
            for step in &synthesis.thinking {
                self.thinking.put(format!("{step}... "));
                self.thinking.wait_until_done();
                let pause =
                    stream::spread(self.step_pause, self.step_pause_jitter, self.jitter.as_ref());
                if !pause.is_zero() {
                    thread::sleep(pause);
                }
            }
            self.answer.put_immediate("\n\nAnswer: ");
        } else {
            self.answer.put_immediate("Answer: ");
        }

        self.answer.put(synthesis.answer);
        synthesis.matched
    }

    /// Write `text` through the answer stream without pacing and wait for it.
    pub fn say(&self, text: &str) {
        self.answer.put_immediate(text);
        self.answer.wait_until_done();
    }

    /// Block until the answer stream has caught up.
    pub fn wait_until_done(&self) {
        self.answer.wait_until_done();
    }

    /// Stop both emitters. Queued output is abandoned.
    pub fn close(&mut self) {
        self.answer.stop();
        self.thinking.stop();
    }
}

impl Drop for KnowledgeBase {
    fn drop(&mut self) {
        self.close();
    }
}

/// Lines printed under an answer, starting with a blank line.
pub fn footer(info: &MatchInfo) -> Option<String> {
    match info {
        MatchInfo::Faq {
            matched_question,
            confidence,
            ..
        } => Some(format!(
            "\n\n(Matched: '{matched_question}' with confidence {confidence:.2})"
        )),
        MatchInfo::Article {
            title,
            category,
            related_titles,
            ..
        } => {
            let mut text = format!("\n\nFrom: {title} (Category: {category})");
            if !related_titles.is_empty() {
                text.push_str(&format!("\nRelated topics: {}", related_titles.join(", ")));
            }
            Some(text)
        }
        MatchInfo::Instruction {
            related_topics,
            top_score,
            ..
        } => {
            if related_topics.is_empty() {
                return None;
            }
            Some(format!(
                "\n\nRelated topics: {}\nMatch confidence: {top_score:.2}",
                related_topics.join(", ")
            ))
        }
    }
}
