//! Parsed projection of one note file.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::metadata::Metadata;
use crate::parser::{count_words, extract_links, extract_tags, parse_header};

/// Metadata key whose list items are merged into a note's tag set.
pub const TAGS_KEY: &str = "tags";

/// One note, parsed from its file text. The file stays the source of truth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    /// Relative path without extension, forward slashes.
    pub identifier: String,
    /// Relative path with extension.
    pub location: String,
    /// Decoded header metadata.
    pub metadata: Metadata,
    /// Text after the header block.
    pub body: String,
    /// Wikilink targets in order, duplicates kept.
    pub links: Vec<String>,
    /// Inline tags plus list-valued `tags` metadata.
    pub tags: BTreeSet<String>,
    /// Set when a header block was present but could not be decoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_error: Option<String>,
}

impl Note {
    /// Parse raw file text.
    #[must_use]
    pub fn from_text(identifier: impl Into<String>, location: impl Into<String>, text: &str) -> Self {
        let parsed = parse_header(text);
        let links = extract_links(parsed.body);
        let mut tags: BTreeSet<String> = extract_tags(parsed.body).into_iter().collect();
        tags.extend(parsed.metadata.string_list(TAGS_KEY));
        Self {
            identifier: identifier.into(),
            location: location.into(),
            body: parsed.body.to_string(),
            metadata: parsed.metadata,
            links,
            tags,
            metadata_error: parsed.error,
        }
    }

    /// Whitespace-separated words in the body.
    #[must_use]
    pub fn word_count(&self) -> usize {
        count_words(&self.body)
    }
}
