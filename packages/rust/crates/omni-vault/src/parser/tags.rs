use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use super::{compile_regex, is_word_char};

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| compile_regex(r"#([\w/]+)"));
static WORD_REGEX: LazyLock<Regex> = LazyLock::new(|| compile_regex(r"\w+"));

/// Extract inline `#tags` in order, without the marker.
///
/// A `#` directly after a word character (`issue#12`, `page#anchor`) is not a tag.
#[must_use]
pub fn extract_tags(body: &str) -> Vec<String> {
    TAG_REGEX
        .captures_iter(body)
        .filter_map(|caps| {
            let marker = caps.get(0)?;
            let preceded_by_word = body[..marker.start()]
                .chars()
                .next_back()
                .is_some_and(is_word_char);
            if preceded_by_word {
                return None;
            }
            caps.get(1).map(|tag| tag.as_str().to_string())
        })
        .collect()
}

/// Lowercase word tokens of at least `min_len` characters.
#[must_use]
pub fn extract_keywords(body: &str, min_len: usize) -> BTreeSet<String> {
    WORD_REGEX
        .find_iter(body)
        .map(|token| token.as_str())
        .filter(|token| token.chars().count() >= min_len)
        .map(str::to_lowercase)
        .collect()
}
