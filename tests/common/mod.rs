#![allow(dead_code)]

use parking_lot::Mutex;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use streamkb::knowledge::{Corpus, InstructionEntry, KnowledgeBase, SessionOptions};
use streamkb::stream::Sink;
use tempfile::TempDir;

/// Temporary directory holding dataset and settings files.
pub struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }
}

/// In-memory sink whose contents can be read while an emitter writes to it.
#[derive(Clone, Default)]
pub struct CaptureSink(Arc<Mutex<Vec<u8>>>);

impl CaptureSink {
    pub fn boxed(&self) -> Sink {
        Box::new(self.clone())
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.0.lock().clone()).expect("sink received invalid UTF-8")
    }
}

impl Write for CaptureSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Session with instant output, returning the answer and thinking captures.
pub fn instant_session(corpus: Corpus) -> (KnowledgeBase, CaptureSink, CaptureSink) {
    let answer = CaptureSink::default();
    let thinking = CaptureSink::default();
    let kb = KnowledgeBase::with_sinks(
        corpus,
        SessionOptions::instant(),
        answer.boxed(),
        thinking.boxed(),
    )
    .expect("Failed to build session");
    (kb, answer, thinking)
}

pub fn instruction(instruction: &str, input: &str, output: &str) -> InstructionEntry {
    InstructionEntry {
        instruction: instruction.to_string(),
        input: input.to_string(),
        output: output.to_string(),
    }
}

pub mod sample_data {
    pub const INSTRUCTIONS_JSON: &str = r#"[
    {"instruction": "Give three tips for staying healthy.", "input": "", "output": "1. Eat a balanced diet. 2. Exercise regularly. 3. Get enough sleep."},
    {"instruction": "What are the three primary colors?", "input": "", "output": "The three primary colors are red, blue, and yellow."},
    {"instruction": "Sort the numbers in ascending order.", "input": "9 4 7 1", "output": "1 4 7 9"},
    {"instruction": "", "input": "", "output": "Photosynthesis converts sunlight, water and carbon dioxide into glucose and oxygen."},
    {"instruction": "Missing output"},
    {"instruction": "Blank output", "output": "  "}
]"#;
}
