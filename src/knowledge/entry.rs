//! Knowledge entries: the three record shapes a knowledge base can hold.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Searchable text used for an instruction entry with neither instruction nor input.
pub const EMPTY_ENTRY_TEXT: &str = "Empty entry";

/// Question and answer pair. Only the question is searched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

impl FaqEntry {
    pub fn search_text(&self) -> String {
        self.question.clone()
    }
}

fn default_category() -> String {
    "General".to_string()
}

/// Encyclopedia-style article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleEntry {
    pub title: String,
    #[serde(default = "default_category")]
    pub category: String,
    pub content: String,
}

impl ArticleEntry {
    pub fn search_text(&self) -> String {
        format!("{}. {}", self.title, self.content)
    }
}

/// Instruction-tuning record. `output` is the answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionEntry {
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub input: String,
    pub output: String,
}

impl InstructionEntry {
    /// Instruction twice (for weight) followed by the input.
    pub fn search_text(&self) -> String {
        let mut text = String::new();
        if !self.instruction.is_empty() {
            text.push_str(&self.instruction);
            text.push(' ');
            text.push_str(&self.instruction);
        }
        if !self.input.is_empty() {
            text.push(' ');
            text.push_str(&self.input);
        }
        if text.trim().is_empty() {
            return EMPTY_ENTRY_TEXT.to_string();
        }
        text
    }

    pub fn entry_type(&self) -> EntryType {
        EntryType::classify(&self.instruction, &self.input)
    }
}

/// Shape of an instruction entry, from which of its fields carry text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// Instruction without input
    QuestionAnswer,
    /// Both instruction and input
    InstructionWithInput,
    /// Input without instruction
    InputOnly,
    /// Neither
    OutputOnly,
}

impl EntryType {
    pub fn classify(instruction: &str, input: &str) -> Self {
        let has_instruction = !instruction.trim().is_empty();
        let has_input = !input.trim().is_empty();
        match (has_instruction, has_input) {
            (true, false) => Self::QuestionAnswer,
            (true, true) => Self::InstructionWithInput,
            (false, true) => Self::InputOnly,
            (false, false) => Self::OutputOnly,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QuestionAnswer => "question_answer",
            Self::InstructionWithInput => "instruction_with_input",
            Self::InputOnly => "input_only",
            Self::OutputOnly => "output_only",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shorten `text` to `max_chars` characters, appending `...` when cut.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_end, _)) => format!("{}...", &text[..byte_end]),
        None => text.to_string(),
    }
}
