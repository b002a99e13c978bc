//! Built-in corpora used when no dataset file is given.

use std::path::Path;

use super::dataset::{LoadReport, load_str};
use super::entry::{ArticleEntry, FaqEntry};
use crate::error::DatasetResult;

const FAQ_JSON: &str = include_str!("../../data/faq.json");
const ARTICLES_JSON: &str = include_str!("../../data/articles.json");

/// Customer-support questions and answers.
pub fn faq_entries() -> DatasetResult<LoadReport<FaqEntry>> {
    load_str(FAQ_JSON, Path::new("<builtin faq>"), None)
}

/// General-knowledge articles.
pub fn article_entries() -> DatasetResult<LoadReport<ArticleEntry>> {
    load_str(ARTICLES_JSON, Path::new("<builtin articles>"), None)
}
