//! Document text preparation: whitespace cleanup, collection-name rules and
//! the recursive character splitter.

pub mod splitter;

use regex::Regex;
use std::sync::LazyLock;

pub use splitter::TextSplitter;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

static COLLECTION_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_-]*[a-zA-Z0-9]$").expect("valid collection name regex")
});

/// Collapse every whitespace run into one space and trim the ends.
pub fn clean_text(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}

/// 3 to 63 characters, alphanumeric at both ends, `_` or `-` inside.
pub fn validate_collection_name(name: &str) -> bool {
    (3..=63).contains(&name.len()) && COLLECTION_NAME.is_match(name)
}
