//! Vault facade: safe note I/O plus cached graph queries.

mod index;
mod resolver;
pub mod writer;

use chrono::Utc;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::analysis::{ConnectionSuggestion, GraphAnalyzer, VaultSummary};
use crate::chunker::{Chunk, ContentChunker};
use crate::config::VaultSettings;
use crate::error::{Result, VaultError};
use crate::metadata::Metadata;
use crate::note::Note;
use crate::parser::{parse_header, relative_identifier, relative_location, render_note};

pub use self::index::{
    IndexEntry, IndexSnapshot, SkippedNote, VaultIndex, build_snapshot, collect_note_paths,
};
pub use self::resolver::PathResolver;

/// A vault rooted at a directory containing the sentinel subdirectory.
#[derive(Debug)]
pub struct Vault {
    resolver: PathResolver,
    settings: VaultSettings,
    chunker: ContentChunker,
    index: VaultIndex,
}

impl Vault {
    /// Open a vault, loading settings from the vault root and `OMNI_VAULT_CONFIG`.
    ///
    /// # Errors
    ///
    /// [`VaultError::InvalidVault`] without the sentinel directory;
    /// [`VaultError::InvalidConfig`] for bad settings.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let settings = VaultSettings::load(root, None)?;
        Self::open_with_settings(root, settings)
    }

    /// Open a vault with explicit settings.
    ///
    /// # Errors
    ///
    /// [`VaultError::InvalidVault`] without the sentinel directory;
    /// [`VaultError::InvalidConfig`] for bad settings.
    pub fn open_with_settings(root: impl AsRef<Path>, settings: VaultSettings) -> Result<Self> {
        let root = root.as_ref();
        settings.validate()?;
        if !root.join(&settings.vault.sentinel_dir).is_dir() {
            return Err(VaultError::InvalidVault {
                root: root.to_path_buf(),
                sentinel: settings.vault.sentinel_dir.clone(),
            });
        }
        let resolver = PathResolver::new(root, &settings.vault.note_extension)?;
        let chunker = ContentChunker::new(settings.chunking)?;
        log::debug!("opened vault at {}", resolver.root().display());
        Ok(Self {
            resolver,
            settings,
            chunker,
            index: VaultIndex::new(),
        })
    }

    /// Canonical vault root.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.resolver.root()
    }

    /// Active settings.
    #[must_use]
    pub fn settings(&self) -> &VaultSettings {
        &self.settings
    }

    /// Resolve an identifier to an absolute path inside the vault.
    ///
    /// # Errors
    ///
    /// See [`PathResolver::resolve`].
    pub fn resolve(&self, identifier: &str) -> Result<PathBuf> {
        self.resolver.resolve(identifier)
    }

    fn extension(&self) -> &str {
        &self.settings.vault.note_extension
    }

    fn identity(&self, path: &Path, requested: &str) -> Result<(String, String)> {
        let identifier = relative_identifier(path, self.root(), self.extension())
            .ok_or_else(|| VaultError::PathEscape(requested.to_string()))?;
        let location = relative_location(path, self.root())
            .ok_or_else(|| VaultError::PathEscape(requested.to_string()))?;
        Ok((identifier, location))
    }

    /// Reject locations the directory walk never visits (hidden entries or
    /// excluded directories), so created notes always show up in listings.
    fn ensure_listed(&self, location: &str) -> Result<()> {
        let excluded = self.settings.vault.all_excluded_dirs();
        let mut components = location.split('/').peekable();
        while let Some(component) = components.next() {
            let is_dir = components.peek().is_some();
            if component.starts_with('.') || (is_dir && excluded.iter().any(|name| name == component))
            {
                return Err(VaultError::InvalidIdentifier(location.to_string()));
            }
        }
        Ok(())
    }

    /// Identifiers of every note on disk, sorted.
    #[must_use]
    pub fn list_notes(&self) -> Vec<String> {
        collect_note_paths(self.root(), &self.settings.vault)
            .iter()
            .filter_map(|path| relative_identifier(path, self.root(), self.extension()))
            .collect()
    }

    /// Read and parse one note.
    ///
    /// A malformed header does not fail the read; it is reported in
    /// [`Note::metadata_error`].
    ///
    /// # Errors
    ///
    /// [`VaultError::PathEscape`], [`VaultError::NoteNotFound`], or I/O errors.
    pub fn read_note(&self, identifier: &str) -> Result<Note> {
        let path = self.resolve(identifier)?;
        let (id, location) = self.identity(&path, identifier)?;
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(VaultError::NoteNotFound(id));
            }
            Err(err) => return Err(err.into()),
        };
        Ok(Note::from_text(id, location, &text))
    }

    /// Create a note. Missing parent folders are created.
    ///
    /// # Errors
    ///
    /// [`VaultError::NoteAlreadyExists`] when the note exists (the existing
    /// file is never modified), [`VaultError::PathEscape`],
    /// [`VaultError::InvalidIdentifier`] for hidden or excluded locations, or
    /// I/O errors.
    pub fn create_note(
        &self,
        identifier: &str,
        metadata: Option<&Metadata>,
        content: Option<&str>,
    ) -> Result<Note> {
        let path = self.resolve(identifier)?;
        let (id, location) = self.identity(&path, identifier)?;
        self.ensure_listed(&location)?;
        if path.exists() {
            return Err(VaultError::NoteAlreadyExists(id));
        }
        let metadata = metadata.cloned().unwrap_or_default();
        let text = render_note(&metadata, content.unwrap_or_default()).map_err(|err| {
            VaultError::InvalidMetadata {
                location: location.clone(),
                reason: err.to_string(),
            }
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        writer::write_new(&path, &text).map_err(|err| {
            if err.kind() == io::ErrorKind::AlreadyExists {
                VaultError::NoteAlreadyExists(id.clone())
            } else {
                VaultError::Io(err)
            }
        })?;
        self.invalidate_index();
        log::info!("created note {location}");
        Ok(Note::from_text(id, location, &text))
    }

    /// Update a note: append (or prepend) `content` and shallow-merge `metadata`.
    ///
    /// # Errors
    ///
    /// [`VaultError::NoteNotFound`], [`VaultError::PathEscape`], or
    /// [`VaultError::InvalidMetadata`] when the existing header cannot be
    /// decoded (the file is left untouched rather than losing the header).
    pub fn update_note(
        &self,
        identifier: &str,
        content: Option<&str>,
        append: bool,
        metadata: Option<&Metadata>,
    ) -> Result<Note> {
        let path = self.resolve(identifier)?;
        let (id, location) = self.identity(&path, identifier)?;
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(VaultError::NoteNotFound(id));
            }
            Err(err) => return Err(err.into()),
        };
        let parsed = parse_header(&text);
        if let Some(reason) = parsed.error {
            return Err(VaultError::InvalidMetadata { location, reason });
        }

        let mut merged = parsed.metadata;
        if let Some(updates) = metadata {
            merged.merge(updates);
        }
        let body = match content {
            Some(extra) if append => format!("{}{extra}", parsed.body),
            Some(extra) => format!("{extra}{}", parsed.body),
            None => parsed.body.to_string(),
        };
        let rendered =
            render_note(&merged, &body).map_err(|err| VaultError::InvalidMetadata {
                location: location.clone(),
                reason: err.to_string(),
            })?;
        writer::write_atomic(&path, &rendered)?;
        self.invalidate_index();
        log::info!("updated note {location}");
        Ok(Note::from_text(id, location, &rendered))
    }

    /// Current snapshot; `force` rebuilds from disk even when cached.
    pub fn build_index(&self, force: bool) -> Arc<IndexSnapshot> {
        let build = || {
            let paths = collect_note_paths(self.root(), &self.settings.vault);
            build_snapshot(self.root(), &paths, self.extension())
        };
        if force {
            self.index.rebuild(build)
        } else {
            self.index.get_or_build(build)
        }
    }

    /// Drop the cached snapshot.
    pub fn invalidate_index(&self) {
        self.index.invalidate();
    }

    fn with_analyzer<T>(&self, query: impl FnOnce(&GraphAnalyzer<'_>) -> T) -> T {
        let snapshot = self.build_index(false);
        let analyzer = GraphAnalyzer::new(&snapshot, &self.settings.vault.attachment_extensions)
            .with_orphan_policy(self.settings.analysis.orphan_policy);
        query(&analyzer)
    }

    /// Notes linking to `identifier`, sorted.
    #[must_use]
    pub fn get_backlinks(&self, identifier: &str) -> Vec<String> {
        self.with_analyzer(|analyzer| analyzer.backlinks(identifier))
    }

    /// Notes with no links in or out, sorted.
    #[must_use]
    pub fn find_orphaned_notes(&self) -> Vec<String> {
        self.with_analyzer(|analyzer| analyzer.orphaned_notes())
    }

    /// Broken link targets grouped by note.
    #[must_use]
    pub fn find_broken_links(&self) -> BTreeMap<String, Vec<String>> {
        self.with_analyzer(|analyzer| analyzer.broken_links())
    }

    /// Unlinked notes sharing tags.
    #[must_use]
    pub fn suggest_connections_by_tags(&self) -> Vec<ConnectionSuggestion> {
        self.with_analyzer(|analyzer| analyzer.suggest_by_tags())
    }

    /// Unlinked notes sharing keywords; `None` uses the configured minimum.
    #[must_use]
    pub fn suggest_connections_by_keywords(
        &self,
        min_overlap: Option<usize>,
    ) -> Vec<ConnectionSuggestion> {
        let analysis = &self.settings.analysis;
        let min_overlap = min_overlap.unwrap_or(analysis.keyword_min_overlap);
        self.with_analyzer(|analyzer| {
            analyzer.suggest_by_keywords(min_overlap, analysis.keyword_min_length)
        })
    }

    /// Second-degree graph suggestions.
    #[must_use]
    pub fn suggest_connections_by_graph(&self) -> Vec<ConnectionSuggestion> {
        self.with_analyzer(|analyzer| analyzer.suggest_by_graph())
    }

    /// Dashboard summary.
    #[must_use]
    pub fn summary(&self) -> VaultSummary {
        let analysis = &self.settings.analysis;
        self.with_analyzer(|analyzer| {
            analyzer.summary(Utc::now(), analysis.recent_days, analysis.top_hubs)
        })
    }

    /// Chunker configured from settings.
    #[must_use]
    pub fn chunker(&self) -> &ContentChunker {
        &self.chunker
    }

    /// Chunk one note for semantic indexing.
    ///
    /// # Errors
    ///
    /// Same as [`Vault::read_note`].
    pub fn chunk_note(&self, identifier: &str) -> Result<Vec<Chunk>> {
        let note = self.read_note(identifier)?;
        Ok(self
            .chunker
            .chunk(&note.body, &note.identifier, &note.metadata))
    }
}
