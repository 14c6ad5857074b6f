use regex::Regex;
use std::sync::LazyLock;

use super::compile_regex;
use crate::metadata::Metadata;

static HEADER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex(r"(?s)\A---[ \t]*\r?\n(?:(.*?)\r?\n)?---[ \t]*(?:\r?\n|\z)")
});

/// Header block split from a note's raw text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedHeader<'a> {
    /// Decoded metadata; empty when absent or undecodable.
    pub metadata: Metadata,
    /// Text after the header block.
    pub body: &'a str,
    /// Decoder message when a header block was present but not a YAML mapping.
    pub error: Option<String>,
}

/// Split an optional `---` delimited YAML header from the body.
///
/// Without a closed header block the body is `text` unchanged. A malformed
/// block keeps the body and reports the reason in [`ParsedHeader::error`].
#[must_use]
pub fn parse_header(text: &str) -> ParsedHeader<'_> {
    let Some(caps) = HEADER_REGEX.captures(text) else {
        return ParsedHeader {
            metadata: Metadata::new(),
            body: text,
            error: None,
        };
    };
    let body = caps
        .get(0)
        .map_or(text, |m| &text[m.end()..])
        .trim_start_matches(['\r', '\n']);
    let raw = caps.get(1).map_or("", |m| m.as_str());
    match Metadata::from_yaml_str(raw) {
        Ok(metadata) => ParsedHeader {
            metadata,
            body,
            error: None,
        },
        Err(reason) => ParsedHeader {
            metadata: Metadata::new(),
            body,
            error: Some(reason),
        },
    }
}

/// Render metadata and body back into note text.
///
/// Empty metadata writes the body verbatim.
///
/// # Errors
///
/// Propagates YAML serialization failures.
pub fn render_note(metadata: &Metadata, body: &str) -> Result<String, serde_yaml::Error> {
    if metadata.is_empty() {
        return Ok(body.to_string());
    }
    let yaml = serde_yaml::to_string(&metadata.to_yaml())?;
    Ok(format!("---\n{yaml}---\n\n{body}"))
}
