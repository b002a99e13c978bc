//! End-to-end sessions: corpus loading, streaming and footers.

mod common;

use common::{TestProject, instant_session, sample_data};
use streamkb::knowledge::{LOW_CONFIDENCE_MESSAGE, MatchInfo, Variant, footer, load_corpus};
use streamkb::{DatasetError, KnowledgeError};

#[test]
fn article_session_streams_thinking_then_answer() {
    let corpus = load_corpus(Variant::Article, None, None).unwrap().corpus;
    let (mut kb, answer, thinking) = instant_session(corpus);

    let matched = kb.respond("Tell me about renewable energy sources", true);
    kb.wait_until_done();

    let thinking = thinking.text();
    assert!(thinking.starts_with(
        "\nThinking: Analyzing query: 'Tell me about renewable energy sources'... Searching knowledge base... Found 3 relevant documents... "
    ));
    assert!(thinking.contains("Found relevant article: 'Renewable Energy Sources' (Category: Energy"));
    assert!(thinking.ends_with("Formulating response... "));

    let answer = answer.text();
    assert!(answer.starts_with("\n\nAnswer: Regarding Renewable Energy Sources: "));

    let info = matched.expect("confident match");
    let footer = footer(&info).unwrap();
    assert!(footer.starts_with("\n\nFrom: Renewable Energy Sources (Category: Energy)"));
    assert!(footer.contains("Related topics: The Solar Energy Industry"));

    kb.close();
}

#[test]
fn thinking_can_be_turned_off() {
    let corpus = load_corpus(Variant::Article, None, None).unwrap().corpus;
    let (mut kb, answer, thinking) = instant_session(corpus);

    assert!(kb.respond("photosynthesis", false).is_some());
    kb.wait_until_done();

    assert_eq!(thinking.text(), "");
    assert!(answer.text().starts_with("Answer: Regarding The Process of Photosynthesis: "));
    kb.close();
}

#[test]
fn miss_streams_canned_message_without_thinking() {
    let corpus = load_corpus(Variant::Article, None, None).unwrap().corpus;
    let (mut kb, answer, thinking) = instant_session(corpus);

    assert!(kb.respond("asdkjaslkdj nonsense query xyz", true).is_none());
    kb.wait_until_done();

    assert_eq!(thinking.text(), "");
    assert_eq!(answer.text(), format!("Answer: {LOW_CONFIDENCE_MESSAGE}"));
    kb.close();
}

#[test]
fn faq_session_reports_matched_question() {
    let corpus = load_corpus(Variant::Faq, None, None).unwrap().corpus;
    let (mut kb, answer, _) = instant_session(corpus);

    let info = kb.respond("track my order", true).unwrap();
    kb.wait_until_done();
    assert!(matches!(info, MatchInfo::Faq { .. }));
    assert!(answer.text().contains("You can track your order"));

    kb.say(&footer(&info).unwrap());
    assert!(answer.text().ends_with("(Matched: 'How do I track my order?' with confidence 1.00)"));
    kb.close();
}

#[test]
fn instruction_session_from_dataset_file() {
    let project = TestProject::new();
    let path = project.add_file("data/alpaca.json", sample_data::INSTRUCTIONS_JSON);

    let loaded = load_corpus(Variant::Instruction, Some(&path), None).unwrap();
    assert_eq!(loaded.skipped, 2);
    assert_eq!(loaded.source.as_deref(), Some(path.as_path()));
    assert_eq!(
        loaded.summary(),
        format!(
            "Loaded 4 instruction entries from {} (skipped 2 invalid entries)",
            path.display()
        )
    );
    let corpus = loaded.corpus;
    assert_eq!(corpus.len(), 4);

    let (mut kb, answer, thinking) = instant_session(corpus);
    assert_eq!(kb.variant(), Variant::Instruction);
    assert_eq!(kb.index().len(), 4);

    let info = kb.respond("What are the three primary colors?", true).unwrap();
    kb.wait_until_done();

    assert!(thinking.text().contains("Found 4 relevant examples... "));
    assert!(thinking.text().contains("Found relevant entry: 'What are the three primary colors?' (Relevance: 1.00)... "));
    assert!(answer.text().ends_with("The three primary colors are red, blue, and yellow."));
    assert_eq!(info.score(), kb.answer("What are the three primary colors?").matched.unwrap().score());
    kb.close();
}

#[test]
fn max_entries_limits_the_corpus() {
    let project = TestProject::new();
    let path = project.add_file("alpaca.json", sample_data::INSTRUCTIONS_JSON);

    let corpus = load_corpus(Variant::Instruction, Some(&path), Some(2)).unwrap().corpus;
    assert_eq!(corpus.len(), 2);
}

#[test]
fn dataset_errors_surface_as_knowledge_errors() {
    let project = TestProject::new();

    let missing = project.path().join("missing.json");
    let err = load_corpus(Variant::Faq, Some(&missing), None).unwrap_err();
    assert!(matches!(
        err,
        KnowledgeError::Dataset(DatasetError::FileRead { .. })
    ));

    // Article records loaded as FAQ entries are all invalid
    let wrong = project.add_file(
        "articles.json",
        r#"[{"title": "Solar", "content": "Panels."}]"#,
    );
    let err = load_corpus(Variant::Faq, Some(&wrong), None).unwrap_err();
    assert_eq!(err.status_code(), "DATASET_EMPTY");

    let object = project.add_file("object.json", r#"{"question": "q", "answer": "a"}"#);
    let err = load_corpus(Variant::Faq, Some(&object), None).unwrap_err();
    assert_eq!(err.status_code(), "DATASET_SHAPE_ERROR");
}
