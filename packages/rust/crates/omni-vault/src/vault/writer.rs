//! Crash-safe note writes: same-directory temp file, fsync, atomic rename.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

fn staged(path: &Path, contents: &str) -> io::Result<NamedTempFile> {
    let dir = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("no parent directory for {}", path.display()),
        )
    })?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;
    if let Ok(existing) = fs::metadata(path) {
        tmp.as_file().set_permissions(existing.permissions())?;
    }
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

/// Replace `path` with `contents`. Readers see the old or the new file, never a mix.
///
/// # Errors
///
/// Propagates I/O failures; the original file is untouched when any step fails.
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    staged(path, contents)?.persist(path)?;
    Ok(())
}

/// Like [`write_atomic`] but never replaces an existing file.
///
/// # Errors
///
/// [`io::ErrorKind::AlreadyExists`] when `path` exists at rename time.
pub fn write_new(path: &Path, contents: &str) -> io::Result<()> {
    staged(path, contents)?.persist_noclobber(path)?;
    Ok(())
}
