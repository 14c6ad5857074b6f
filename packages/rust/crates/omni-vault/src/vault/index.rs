//! Cached snapshot of every note in the vault.
//!
//! A snapshot is immutable once built. Mutations drop the cache and bump a
//! generation counter; a build that raced with an invalidation is handed to
//! its caller but never cached.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::UNIX_EPOCH;
use walkdir::{DirEntry, WalkDir};

use crate::config::VaultLayoutSettings;
use crate::error::VaultError;
use crate::metadata::Metadata;
use crate::note::Note;
use crate::parser::{is_note_file, relative_identifier, relative_location};

/// Indexed view of one note.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexEntry {
    /// Relative location with extension.
    pub location: String,
    /// Header metadata (empty when absent or undecodable).
    pub metadata: Metadata,
    /// Wikilink targets in order.
    pub links: Vec<String>,
    /// Inline and metadata tags.
    pub tags: BTreeSet<String>,
    /// Whether `tags` is non-empty.
    pub has_tags: bool,
    /// Modification time, seconds since the Unix epoch.
    pub modified_at: i64,
    /// Whitespace-separated words in the body.
    pub word_count: usize,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Header decode failure, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_error: Option<String>,
    /// Body text, kept in memory for keyword analysis.
    #[serde(skip)]
    pub body: String,
}

/// A note left out of a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedNote {
    /// Path relative to the vault root (absolute when outside it).
    pub location: String,
    /// Failure message.
    pub reason: String,
}

/// Immutable index: identifier → entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexSnapshot {
    /// Entries keyed by identifier.
    pub notes: BTreeMap<String, IndexEntry>,
    /// Notes that failed to load.
    pub skipped: Vec<SkippedNote>,
}

#[derive(Debug, Default)]
struct CacheState {
    generation: u64,
    snapshot: Option<Arc<IndexSnapshot>>,
}

/// Holder of the cached snapshot.
#[derive(Debug, Default)]
pub struct VaultIndex {
    state: Mutex<CacheState>,
}

impl VaultIndex {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop the cached snapshot. Idempotent.
    pub fn invalidate(&self) {
        let mut state = self.lock();
        state.generation = state.generation.wrapping_add(1);
        state.snapshot = None;
    }

    /// Cached snapshot, if any.
    #[must_use]
    pub fn cached(&self) -> Option<Arc<IndexSnapshot>> {
        self.lock().snapshot.clone()
    }

    /// Return the cached snapshot or build (outside the lock) and cache one.
    pub fn get_or_build(&self, build: impl FnOnce() -> IndexSnapshot) -> Arc<IndexSnapshot> {
        let generation = {
            let state = self.lock();
            if let Some(snapshot) = &state.snapshot {
                log::debug!("vault index cache hit ({} notes)", snapshot.notes.len());
                return Arc::clone(snapshot);
            }
            state.generation
        };
        self.store(generation, build())
    }

    /// Build a fresh snapshot regardless of the cache and cache it.
    pub fn rebuild(&self, build: impl FnOnce() -> IndexSnapshot) -> Arc<IndexSnapshot> {
        let generation = self.lock().generation;
        self.store(generation, build())
    }

    fn store(&self, generation: u64, snapshot: IndexSnapshot) -> Arc<IndexSnapshot> {
        let snapshot = Arc::new(snapshot);
        let mut state = self.lock();
        if state.generation == generation {
            state.snapshot = Some(Arc::clone(&snapshot));
        } else {
            log::debug!("vault index invalidated during build; result not cached");
        }
        snapshot
    }
}

fn should_skip_entry(entry: &DirEntry, excluded_dirs: &HashSet<String>) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return true;
    }
    entry.file_type().is_dir() && excluded_dirs.contains(name.as_ref())
}

/// Every note file under `root`, sorted by path. Hidden entries and
/// excluded directories are not walked.
#[must_use]
pub fn collect_note_paths(root: &Path, layout: &VaultLayoutSettings) -> Vec<PathBuf> {
    let excluded: HashSet<String> = layout.all_excluded_dirs().into_iter().collect();
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !should_skip_entry(entry, &excluded))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("skipping unreadable vault entry: {err}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(DirEntry::into_path)
        .filter(|path| is_note_file(path, &layout.note_extension))
        .collect()
}

fn display_location(path: &Path, root: &Path) -> String {
    relative_location(path, root).unwrap_or_else(|| path.display().to_string())
}

fn load_entry(
    path: &Path,
    root: &Path,
    extension: &str,
) -> Result<(String, IndexEntry), VaultError> {
    let failure = |reason: String| VaultError::PerNoteIndexFailure {
        path: path.to_path_buf(),
        reason,
    };
    let identifier = relative_identifier(path, root, extension)
        .ok_or_else(|| failure("outside vault root".to_string()))?;
    let location = display_location(path, root);
    let text = std::fs::read_to_string(path).map_err(|err| failure(err.to_string()))?;
    let stat = std::fs::metadata(path).map_err(|err| failure(err.to_string()))?;
    let modified_at = stat
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |age| i64::try_from(age.as_secs()).unwrap_or(i64::MAX));

    let note = Note::from_text(identifier.clone(), location.clone(), &text);
    if let Some(reason) = &note.metadata_error {
        log::warn!("invalid metadata in {location}: {reason}; indexing with empty metadata");
    }
    let word_count = note.word_count();
    let entry = IndexEntry {
        location,
        has_tags: !note.tags.is_empty(),
        metadata: note.metadata,
        links: note.links,
        tags: note.tags,
        modified_at,
        word_count,
        size_bytes: stat.len(),
        metadata_error: note.metadata_error,
        body: note.body,
    };
    Ok((identifier, entry))
}

/// Parse `paths` in parallel into a snapshot.
///
/// Unreadable notes are logged and recorded in [`IndexSnapshot::skipped`];
/// they never abort the build. When two paths map to the same identifier the
/// first path (in sorted order) wins.
#[must_use]
pub fn build_snapshot(root: &Path, paths: &[PathBuf], extension: &str) -> IndexSnapshot {
    let loaded: Vec<Result<(String, IndexEntry), VaultError>> = paths
        .par_iter()
        .map(|path| load_entry(path, root, extension))
        .collect();

    let mut snapshot = IndexSnapshot::default();
    for (path, outcome) in paths.iter().zip(loaded) {
        match outcome {
            Ok((identifier, entry)) => {
                if let Some(existing) = snapshot.notes.get(&identifier) {
                    log::warn!(
                        "duplicate note identifier '{identifier}': keeping {}, ignoring {}",
                        existing.location,
                        entry.location
                    );
                    continue;
                }
                snapshot.notes.insert(identifier, entry);
            }
            Err(err) => {
                log::warn!("{err}");
                snapshot.skipped.push(SkippedNote {
                    location: display_location(path, root),
                    reason: err.to_string(),
                });
            }
        }
    }
    log::info!(
        "vault index built: {} notes, {} skipped",
        snapshot.notes.len(),
        snapshot.skipped.len()
    );
    snapshot
}
