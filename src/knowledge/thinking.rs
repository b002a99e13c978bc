//! Status lines shown before an answer while "thinking" is enabled.

use super::entry::{ArticleEntry, InstructionEntry, truncate_with_ellipsis};

/// Maximum characters of an instruction or input shown in a hit line.
const DESCRIPTION_CHARS: usize = 50;

/// Build the ordered step list for one confident match.
///
/// `found` is the number of retrieved results and `hits` the per-result lines
/// for (at most) the first three, which land right after the "Found" step.
pub fn steps(query: &str, found: usize, noun: &str, hits: Vec<String>) -> Vec<String> {
    let mut steps = vec![
        format!("Analyzing query: '{query}'"),
        "Searching knowledge base...".to_string(),
        format!("Found {found} relevant {noun}"),
        "Ranking results by relevance...".to_string(),
        "Extracting key information...".to_string(),
        "Formulating response...".to_string(),
    ];
    for (i, hit) in hits.into_iter().take(3).enumerate() {
        steps.insert(3 + i, hit);
    }
    steps
}

pub fn article_hit(article: &ArticleEntry, score: f32) -> String {
    format!(
        "Found relevant article: '{}' (Category: {}, Relevance: {score:.2})",
        article.title, article.category
    )
}

pub fn instruction_hit(entry: &InstructionEntry, score: f32) -> String {
    format!(
        "Found relevant entry: '{}' (Relevance: {score:.2})",
        describe(entry)
    )
}

/// Short label for an instruction entry: its instruction, else its input.
pub fn describe(entry: &InstructionEntry) -> String {
    if !entry.instruction.is_empty() {
        truncate_with_ellipsis(&entry.instruction, DESCRIPTION_CHARS)
    } else if !entry.input.is_empty() {
        format!("Input: {}", truncate_with_ellipsis(&entry.input, DESCRIPTION_CHARS))
    } else {
        "Content entry".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hits_are_inserted_after_found() {
        let hits = vec!["hit one".to_string(), "hit two".to_string()];
        let steps = steps("solar power", 3, "documents", hits);

        assert_eq!(
            steps,
            vec![
                "Analyzing query: 'solar power'",
                "Searching knowledge base...",
                "Found 3 relevant documents",
                "hit one",
                "hit two",
                "Ranking results by relevance...",
                "Extracting key information...",
                "Formulating response...",
            ]
        );
    }

    #[test]
    fn test_describe_falls_back() {
        let mut entry = InstructionEntry {
            instruction: "x".repeat(60),
            input: "some input".to_string(),
            output: "out".to_string(),
        };
        assert_eq!(describe(&entry), format!("{}...", "x".repeat(50)));

        entry.instruction.clear();
        assert_eq!(describe(&entry), "Input: some input");

        entry.input.clear();
        assert_eq!(describe(&entry), "Content entry");
    }

    #[test]
    fn test_hit_lines() {
        let article = ArticleEntry {
            title: "Deep Learning Basics".to_string(),
            category: "AI & Machine Learning".to_string(),
            content: "Neural networks.".to_string(),
        };
        assert_eq!(
            article_hit(&article, 0.4567),
            "Found relevant article: 'Deep Learning Basics' (Category: AI & Machine Learning, Relevance: 0.46)"
        );

        let entry = InstructionEntry {
            instruction: "Name three primary colors".to_string(),
            input: String::new(),
            output: "Red, blue, yellow.".to_string(),
        };
        assert_eq!(
            instruction_hit(&entry, 0.8),
            "Found relevant entry: 'Name three primary colors' (Relevance: 0.80)"
        );
    }
}
