use regex::Regex;
use std::sync::LazyLock;

use super::compile_regex;

static WIKILINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r"\[\[([^\]|#]+)(?:#[^\]|]+)?(?:\|([^\]]+))?\]\]"));

/// Extract wikilink targets in order of appearance.
///
/// `[[Target]]`, `[[Target|Alias]]` and `[[Target#Section]]` all yield
/// `Target`. Duplicates are kept.
#[must_use]
pub fn extract_links(body: &str) -> Vec<String> {
    WIKILINK_REGEX
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|target| target.as_str().trim())
        .filter(|target| !target.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether a link target names a binary resource rather than a note.
///
/// `extensions` are lowercase, without the leading dot.
#[must_use]
pub fn is_attachment_target(target: &str, extensions: &[String]) -> bool {
    let file_name = target.rsplit('/').next().unwrap_or(target);
    let Some((_, ext)) = file_name.rsplit_once('.') else {
        return false;
    };
    let lower = ext.trim().to_lowercase();
    extensions.iter().any(|candidate| *candidate == lower)
}
