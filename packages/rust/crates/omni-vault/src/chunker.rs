//! Split note bodies into overlapping chunks for a semantic index.
//!
//! Sections are cut before every `## ` header line, then each section is cut
//! into character windows of at most `chunk_size` characters. Each window
//! starts `chunk_overlap` characters before the previous one ended, so every
//! consecutive pair repeats that many characters. A note always yields at
//! least one chunk.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, VaultError};
use crate::metadata::{FlatValue, Metadata};

/// Chunk metadata key: source note identifier.
pub const NOTE_NAME_KEY: &str = "note_name";
/// Chunk metadata key: window position inside its section.
pub const CHUNK_IDX_KEY: &str = "chunk_idx";
/// Chunk metadata key: section position inside the note.
pub const SECTION_IDX_KEY: &str = "section_idx";
/// Chunk metadata key: character length of the chunk text.
pub const CHUNK_SIZE_KEY: &str = "chunk_size";

/// Chunking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Window length in characters.
    pub chunk_size: usize,
    /// Characters repeated between consecutive windows.
    pub chunk_overlap: usize,
    /// Split on `## ` headers before windowing.
    pub chunk_by_headers: bool,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 100,
            chunk_by_headers: true,
        }
    }
}

impl ChunkerConfig {
    /// Reject sizes that cannot make progress.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidConfig`] when `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(VaultError::InvalidConfig(
                "chunking.chunk_size must be positive".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(VaultError::InvalidConfig(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// One chunk handed to the semantic index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    /// Chunk text.
    pub text: String,
    /// `note_{note_name}_chunk_{ordinal}`, unique within the note.
    pub chunk_id: String,
    /// Flattened note metadata plus position fields.
    pub metadata: BTreeMap<String, FlatValue>,
}

/// Header-aware fixed-window chunker.
#[derive(Debug, Clone)]
pub struct ContentChunker {
    config: ChunkerConfig,
}

impl ContentChunker {
    /// Build a chunker from validated settings.
    ///
    /// # Errors
    ///
    /// See [`ChunkerConfig::validate`].
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active settings.
    #[must_use]
    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Chunk a note body.
    #[must_use]
    pub fn chunk(&self, body: &str, note_name: &str, metadata: &Metadata) -> Vec<Chunk> {
        let base = flatten_metadata(metadata);
        let sections = if self.config.chunk_by_headers {
            split_sections(body)
        } else {
            vec![body]
        };

        let mut chunks = Vec::new();
        for (section_idx, section) in sections.into_iter().enumerate() {
            let windows = split_windows(section, self.config.chunk_size, self.config.chunk_overlap);
            for (chunk_idx, text) in windows.into_iter().enumerate() {
                if text.trim().is_empty() {
                    continue;
                }
                let ordinal = chunks.len();
                chunks.push(make_chunk(&base, note_name, text, ordinal, chunk_idx, section_idx));
            }
        }

        if chunks.is_empty() {
            chunks.push(make_chunk(&base, note_name, body, 0, 0, 0));
        }
        chunks
    }
}

/// Flatten note metadata into scalar values; nulls are dropped.
#[must_use]
pub fn flatten_metadata(metadata: &Metadata) -> BTreeMap<String, FlatValue> {
    metadata
        .iter()
        .filter_map(|(key, value)| value.flatten().map(|flat| (key.to_string(), flat)))
        .collect()
}

fn make_chunk(
    base: &BTreeMap<String, FlatValue>,
    note_name: &str,
    text: &str,
    ordinal: usize,
    chunk_idx: usize,
    section_idx: usize,
) -> Chunk {
    let mut metadata = base.clone();
    metadata.insert(NOTE_NAME_KEY.to_string(), FlatValue::String(note_name.to_string()));
    metadata.insert(CHUNK_IDX_KEY.to_string(), FlatValue::Integer(to_i64(chunk_idx)));
    metadata.insert(SECTION_IDX_KEY.to_string(), FlatValue::Integer(to_i64(section_idx)));
    metadata.insert(
        CHUNK_SIZE_KEY.to_string(),
        FlatValue::Integer(to_i64(text.chars().count())),
    );
    Chunk {
        text: text.to_string(),
        chunk_id: format!("note_{note_name}_chunk_{ordinal}"),
        metadata,
    }
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn is_section_header(line: &str) -> bool {
    line.strip_prefix("##")
        .and_then(|rest| rest.chars().next())
        .is_some_and(char::is_whitespace)
}

/// Cut before each line starting with `##` plus whitespace. The separating
/// newline is dropped; whitespace-only sections are discarded.
fn split_sections(body: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut start = 0;
    for (idx, _) in body.match_indices('\n') {
        if is_section_header(&body[idx + 1..]) {
            sections.push(&body[start..idx]);
            start = idx + 1;
        }
    }
    sections.push(&body[start..]);
    sections.retain(|section| !section.trim().is_empty());
    sections
}

fn split_windows(text: &str, size: usize, overlap: usize) -> Vec<&str> {
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(idx, _)| idx)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = boundaries.len() - 1;
    if char_len <= size {
        return vec![text];
    }

    let mut windows = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + size).min(char_len);
        windows.push(&text[boundaries[start]..boundaries[end]]);
        if end == char_len {
            break;
        }
        start = end - overlap;
    }
    windows
}
