//! Text parsing for vault notes: header block, wikilinks, inline tags, paths.

mod header;
mod links;
mod paths;
mod tags;

use regex::Regex;
use std::sync::LazyLock;

pub use self::header::{ParsedHeader, parse_header, render_note};
pub use self::links::{extract_links, is_attachment_target};
pub use self::paths::{
    is_note_file, normalize_slashes, relative_identifier, relative_location, strip_note_extension,
    with_note_extension,
};
pub use self::tags::{extract_keywords, extract_tags};

pub(crate) fn compile_regex(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(_compile_err) => match Regex::new(r"$^") {
            Ok(fallback) => fallback,
            Err(fallback_err) => panic!("hardcoded fallback regex must compile: {fallback_err}"),
        },
    }
}

/// Whitespace-separated word count.
#[must_use]
pub fn count_words(body: &str) -> usize {
    body.split_whitespace().count()
}

static WORD_CHAR_REGEX: LazyLock<Regex> = LazyLock::new(|| compile_regex(r"^\w$"));

/// Whether `ch` matches the regex `\w` class used by the tag and keyword patterns.
pub(crate) fn is_word_char(ch: char) -> bool {
    let mut buf = [0_u8; 4];
    WORD_CHAR_REGEX.is_match(ch.encode_utf8(&mut buf))
}
