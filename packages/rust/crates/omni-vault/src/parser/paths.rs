use std::path::Path;

/// Convert backslashes to forward slashes.
#[must_use]
pub fn normalize_slashes(raw: &str) -> String {
    raw.replace('\\', "/")
}

fn split_extension<'a>(raw: &'a str, suffix: &str) -> Option<&'a str> {
    let cut = raw.len().checked_sub(suffix.len())?;
    let tail = raw.get(cut..)?;
    if tail.eq_ignore_ascii_case(suffix) {
        raw.get(..cut)
    } else {
        None
    }
}

/// Drop a trailing `.{extension}` (ASCII case-insensitive).
#[must_use]
pub fn strip_note_extension(raw: &str, extension: &str) -> String {
    let suffix = format!(".{extension}");
    match split_extension(raw, &suffix) {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => raw.to_string(),
    }
}

/// Append `.{extension}` unless already present.
#[must_use]
pub fn with_note_extension(raw: &str, extension: &str) -> String {
    let suffix = format!(".{extension}");
    if split_extension(raw, &suffix).is_some() {
        raw.to_string()
    } else {
        format!("{raw}{suffix}")
    }
}

/// Whether `path` carries the note extension.
#[must_use]
pub fn is_note_file(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|value| value.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Relative location (forward slashes, extension kept) of `path` under `root`.
#[must_use]
pub fn relative_location(path: &Path, root: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let out = normalize_slashes(&rel.to_string_lossy());
    let out = out.trim_matches('/');
    if out.is_empty() {
        None
    } else {
        Some(out.to_string())
    }
}

/// Note identifier of `path` under `root`: relative location without extension.
#[must_use]
pub fn relative_identifier(path: &Path, root: &Path, extension: &str) -> Option<String> {
    let location = relative_location(path, root)?;
    Some(strip_note_extension(&location, extension))
}
