//! Hand-off of note chunks to an external embedding model and vector store.
//!
//! The engine never computes embeddings itself. Callers plug in an
//! [`Embedder`] and a [`ChunkStore`]; [`SemanticIndexer`] drives chunking,
//! batching and replacement of stale chunks.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::chunker::{CHUNK_IDX_KEY, Chunk, ContentChunker, NOTE_NAME_KEY, SECTION_IDX_KEY};
use crate::error::{Result, VaultError};
use crate::metadata::{FlatValue, Metadata};
use crate::vault::Vault;

/// Turns chunk texts into vectors.
pub trait Embedder {
    /// One vector per input text, in order.
    ///
    /// # Errors
    ///
    /// [`VaultError::Semantic`] when the provider fails.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Persists embedded chunks.
pub trait ChunkStore {
    /// Remove every chunk of a note.
    fn delete_note(&mut self, note_name: &str);
    /// Insert or replace chunks by `chunk_id`.
    fn upsert(&mut self, records: Vec<EmbeddedChunk>);
    /// Notes that currently have chunks.
    fn indexed_notes(&self) -> BTreeSet<String>;
}

/// A chunk with its vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddedChunk {
    /// Chunk id and text and metadata.
    #[serde(flatten)]
    pub chunk: Chunk,
    /// Embedding vector.
    pub embedding: Vec<f32>,
}

/// Input for bulk indexing: identifier, body, metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteDocument {
    /// Note identifier.
    pub name: String,
    /// Body text.
    pub body: String,
    /// Header metadata.
    pub metadata: Metadata,
}

/// Outcome of [`SemanticIndexer::index_vault`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    /// Notes processed.
    pub total_notes: usize,
    /// Chunks written.
    pub total_chunks: usize,
    /// Notes present in the store afterwards.
    pub indexed_notes: Vec<String>,
}

/// Drives chunking and embedding for one or many notes.
#[derive(Debug, Clone)]
pub struct SemanticIndexer {
    chunker: ContentChunker,
    batch_size: usize,
}

impl SemanticIndexer {
    /// Indexer with an explicit chunker and batch size.
    ///
    /// # Errors
    ///
    /// [`VaultError::InvalidConfig`] when `batch_size` is zero.
    pub fn new(chunker: ContentChunker, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(VaultError::InvalidConfig(
                "semantic.batch_size must be positive".to_string(),
            ));
        }
        Ok(Self {
            chunker,
            batch_size,
        })
    }

    /// Indexer using a vault's chunking and batch settings.
    ///
    /// # Errors
    ///
    /// See [`SemanticIndexer::new`].
    pub fn for_vault(vault: &Vault) -> Result<Self> {
        Self::new(vault.chunker().clone(), vault.settings().semantic.batch_size)
    }

    /// Replace a note's chunks in `store`. Returns the number of chunks written.
    ///
    /// # Errors
    ///
    /// Propagates embedder failures; the note's old chunks are already gone
    /// by then.
    pub fn index_note(
        &self,
        note_name: &str,
        body: &str,
        metadata: &Metadata,
        embedder: &dyn Embedder,
        store: &mut dyn ChunkStore,
    ) -> Result<usize> {
        if store.indexed_notes().contains(note_name) {
            store.delete_note(note_name);
        }
        let chunks = self.chunker.chunk(body, note_name, metadata);
        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts)?;
        if embeddings.len() != chunks.len() {
            return Err(VaultError::Semantic(format!(
                "embedder returned {} vectors for {} chunks of '{note_name}'",
                embeddings.len(),
                chunks.len()
            )));
        }
        let count = chunks.len();
        store.upsert(
            chunks
                .into_iter()
                .zip(embeddings)
                .map(|(chunk, embedding)| EmbeddedChunk { chunk, embedding })
                .collect(),
        );
        log::debug!("indexed {count} chunks for {note_name}");
        Ok(count)
    }

    /// Index many notes in batches, reporting `(done, total)` after each batch.
    ///
    /// # Errors
    ///
    /// Stops at the first embedder failure.
    pub fn index_documents(
        &self,
        documents: &[NoteDocument],
        embedder: &dyn Embedder,
        store: &mut dyn ChunkStore,
        mut progress: impl FnMut(usize, usize),
    ) -> Result<IndexReport> {
        let total = documents.len();
        let mut total_chunks = 0;
        let mut done = 0;
        for batch in documents.chunks(self.batch_size) {
            for doc in batch {
                total_chunks +=
                    self.index_note(&doc.name, &doc.body, &doc.metadata, embedder, store)?;
            }
            done += batch.len();
            progress(done, total);
        }
        log::info!("semantic index updated: {total} notes, {total_chunks} chunks");
        Ok(IndexReport {
            total_notes: total,
            total_chunks,
            indexed_notes: store.indexed_notes().into_iter().collect(),
        })
    }

    /// Index every note of a vault. Notes are read from the index snapshot
    /// first, so no vault state is held while embedding.
    ///
    /// # Errors
    ///
    /// See [`SemanticIndexer::index_documents`].
    pub fn index_vault(
        &self,
        vault: &Vault,
        embedder: &dyn Embedder,
        store: &mut dyn ChunkStore,
        progress: impl FnMut(usize, usize),
    ) -> Result<IndexReport> {
        let documents = vault_documents(vault);
        self.index_documents(&documents, embedder, store, progress)
    }
}

/// Snapshot a vault's notes as indexing input.
#[must_use]
pub fn vault_documents(vault: &Vault) -> Vec<NoteDocument> {
    let snapshot = vault.build_index(false);
    snapshot
        .notes
        .iter()
        .map(|(name, entry)| NoteDocument {
            name: name.clone(),
            body: entry.body.clone(),
            metadata: entry.metadata.clone(),
        })
        .collect()
}

/// In-process [`ChunkStore`] keyed by chunk id.
#[derive(Debug, Clone, Default)]
pub struct MemoryChunkStore {
    records: BTreeMap<String, EmbeddedChunk>,
}

impl MemoryChunkStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no chunks are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Chunks of one note in note order (section, then window).
    #[must_use]
    pub fn chunks_for(&self, note_name: &str) -> Vec<&EmbeddedChunk> {
        let mut chunks: Vec<&EmbeddedChunk> = self
            .records
            .values()
            .filter(|record| note_of(record) == Some(note_name))
            .collect();
        chunks.sort_by_key(|record| {
            (
                position(record, SECTION_IDX_KEY),
                position(record, CHUNK_IDX_KEY),
            )
        });
        chunks
    }
}

fn position(record: &EmbeddedChunk, key: &str) -> i64 {
    match record.chunk.metadata.get(key) {
        Some(FlatValue::Integer(value)) => *value,
        _ => 0,
    }
}

fn note_of(record: &EmbeddedChunk) -> Option<&str> {
    match record.chunk.metadata.get(NOTE_NAME_KEY) {
        Some(FlatValue::String(name)) => Some(name),
        _ => None,
    }
}

impl ChunkStore for MemoryChunkStore {
    fn delete_note(&mut self, note_name: &str) {
        self.records
            .retain(|_, record| note_of(record) != Some(note_name));
    }

    fn upsert(&mut self, records: Vec<EmbeddedChunk>) {
        for record in records {
            self.records.insert(record.chunk.chunk_id.clone(), record);
        }
    }

    fn indexed_notes(&self) -> BTreeSet<String> {
        self.records
            .values()
            .filter_map(note_of)
            .map(str::to_string)
            .collect()
    }
}
