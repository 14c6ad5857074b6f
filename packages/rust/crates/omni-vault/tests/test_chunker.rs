//! Chunking and the semantic index hand-off.

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use omni_vault::chunker::{CHUNK_IDX_KEY, CHUNK_SIZE_KEY, NOTE_NAME_KEY, SECTION_IDX_KEY};
use omni_vault::semantic::vault_documents;
use omni_vault::{
    ChunkStore, ChunkerConfig, ContentChunker, Embedder, FlatValue, MemoryChunkStore, Metadata,
    NoteDocument, Result as VaultResult, SemanticIndexer, Vault, VaultError,
};

fn make_vault() -> Result<TempDir, Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    fs::create_dir_all(tmp.path().join(".obsidian"))?;
    Ok(tmp)
}

fn write_file(path: &Path, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

fn int(value: i64) -> FlatValue {
    FlatValue::Integer(value)
}

/// Embeds each text as `[chars, call]` and records batch sizes.
#[derive(Default)]
struct CountingEmbedder {
    calls: RefCell<Vec<usize>>,
}

impl Embedder for CountingEmbedder {
    fn embed_batch(&self, texts: &[String]) -> VaultResult<Vec<Vec<f32>>> {
        let mut calls = self.calls.borrow_mut();
        calls.push(texts.len());
        let call = calls.len() as f32;
        Ok(texts
            .iter()
            .map(|text| vec![text.chars().count() as f32, call])
            .collect())
    }
}

struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn embed_batch(&self, _texts: &[String]) -> VaultResult<Vec<Vec<f32>>> {
        Err(VaultError::Semantic("provider offline".to_string()))
    }
}

struct ShortEmbedder;

impl Embedder for ShortEmbedder {
    fn embed_batch(&self, _texts: &[String]) -> VaultResult<Vec<Vec<f32>>> {
        Ok(Vec::new())
    }
}

#[test]
fn test_long_section_yields_overlapping_windows() -> Result<(), Box<dyn std::error::Error>> {
    let chunker = ContentChunker::new(ChunkerConfig::default())?;
    let body: String = (0..1200).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
    let chunks = chunker.chunk(&body, "Long", &Metadata::new());

    let sizes: Vec<usize> = chunks.iter().map(|c| c.text.chars().count()).collect();
    assert_eq!(sizes, vec![500, 500, 400]);
    assert_eq!(chunks[0].text, body[0..500]);
    assert_eq!(chunks[1].text, body[400..900]);
    assert_eq!(chunks[2].text, body[800..1200]);
    for pair in chunks.windows(2) {
        let previous = &pair[0].text;
        assert_eq!(&previous[previous.len() - 100..], &pair[1].text[..100]);
    }
    let ids: Vec<&str> = chunks.iter().map(|c| c.chunk_id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["note_Long_chunk_0", "note_Long_chunk_1", "note_Long_chunk_2"]
    );
    for (idx, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.metadata.get(CHUNK_IDX_KEY), Some(&int(idx as i64)));
        assert_eq!(chunk.metadata.get(SECTION_IDX_KEY), Some(&int(0)));
        assert_eq!(
            chunk.metadata.get(CHUNK_SIZE_KEY),
            Some(&int(chunk.text.chars().count() as i64))
        );
    }
    Ok(())
}

#[test]
fn test_header_sections_and_unique_ids() -> Result<(), Box<dyn std::error::Error>> {
    let chunker = ContentChunker::new(ChunkerConfig {
        chunk_size: 50,
        chunk_overlap: 10,
        chunk_by_headers: true,
    })?;
    let body = format!("Intro text\n## Part one\n{}\n## Part two\nshort", "b".repeat(60));
    let chunks = chunker.chunk(&body, "Doc", &Metadata::new());

    let positions: Vec<(Option<&FlatValue>, Option<&FlatValue>)> = chunks
        .iter()
        .map(|c| (c.metadata.get(SECTION_IDX_KEY), c.metadata.get(CHUNK_IDX_KEY)))
        .collect();
    assert_eq!(
        positions,
        vec![
            (Some(&int(0)), Some(&int(0))),
            (Some(&int(1)), Some(&int(0))),
            (Some(&int(1)), Some(&int(1))),
            (Some(&int(2)), Some(&int(0))),
        ]
    );
    assert!(chunks[1].text.starts_with("## Part one"));
    assert!(chunks[3].text.starts_with("## Part two"));

    let mut ids: Vec<&str> = chunks.iter().map(|c| c.chunk_id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), chunks.len());
    Ok(())
}

#[test]
fn test_header_splitting_can_be_disabled() -> Result<(), Box<dyn std::error::Error>> {
    let chunker = ContentChunker::new(ChunkerConfig {
        chunk_by_headers: false,
        ..ChunkerConfig::default()
    })?;
    let chunks = chunker.chunk("one\n## two\nthree", "N", &Metadata::new());
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "one\n## two\nthree");
    Ok(())
}

#[test]
fn test_metadata_is_flattened_into_chunks() -> Result<(), Box<dyn std::error::Error>> {
    let chunker = ContentChunker::new(ChunkerConfig::default())?;
    let mut nested = Metadata::new();
    nested.insert("k", "v");
    let mut meta = Metadata::new();
    meta.insert("title", "Plan");
    meta.insert("tags", vec!["a", "b"]);
    meta.insert("draft", true);
    meta.insert("rank", 2_i64);
    meta.insert("extra", nested);

    let chunks = chunker.chunk("body", "projects/Plan", &meta);
    assert_eq!(chunks.len(), 1);
    let flat = &chunks[0].metadata;
    assert_eq!(flat.get("title"), Some(&FlatValue::String("Plan".to_string())));
    assert_eq!(flat.get("tags"), Some(&FlatValue::String("a, b".to_string())));
    assert_eq!(flat.get("draft"), Some(&FlatValue::Bool(true)));
    assert_eq!(flat.get("rank"), Some(&int(2)));
    assert_eq!(
        flat.get("extra"),
        Some(&FlatValue::String(r#"{"k":"v"}"#.to_string()))
    );
    assert_eq!(
        flat.get(NOTE_NAME_KEY),
        Some(&FlatValue::String("projects/Plan".to_string()))
    );
    Ok(())
}

#[test]
fn test_blank_body_falls_back_to_single_chunk() -> Result<(), Box<dyn std::error::Error>> {
    let chunker = ContentChunker::new(ChunkerConfig::default())?;
    let chunks = chunker.chunk("  \n\n ", "Blank", &Metadata::new());
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "  \n\n ");
    assert_eq!(chunks[0].chunk_id, "note_Blank_chunk_0");
    assert_eq!(chunks[0].metadata.get(CHUNK_IDX_KEY), Some(&int(0)));

    let empty = chunker.chunk("", "Empty", &Metadata::new());
    assert_eq!(empty.len(), 1);
    assert_eq!(empty[0].text, "");
    Ok(())
}

#[test]
fn test_invalid_chunker_settings_rejected() {
    assert!(matches!(
        ContentChunker::new(ChunkerConfig {
            chunk_size: 100,
            chunk_overlap: 100,
            chunk_by_headers: true,
        }),
        Err(VaultError::InvalidConfig(_))
    ));
    assert!(matches!(
        ContentChunker::new(ChunkerConfig {
            chunk_size: 0,
            chunk_overlap: 0,
            chunk_by_headers: true,
        }),
        Err(VaultError::InvalidConfig(_))
    ));
}

#[test]
fn test_vault_chunk_note_uses_body_and_metadata() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = make_vault()?;
    write_file(
        &tmp.path().join("Guide.md"),
        "---\ntitle: Guide\n---\nIntro\n## Setup\nInstall it\n",
    )?;
    let vault = Vault::open(tmp.path())?;

    let chunks = vault.chunk_note("Guide")?;
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].text, "Intro");
    assert!(!chunks.iter().any(|c| c.text.contains("title:")));
    assert_eq!(
        chunks[1].metadata.get("title"),
        Some(&FlatValue::String("Guide".to_string()))
    );
    Ok(())
}

#[test]
fn test_index_note_replaces_previous_chunks() -> Result<(), Box<dyn std::error::Error>> {
    let indexer = SemanticIndexer::new(
        ContentChunker::new(ChunkerConfig {
            chunk_size: 10,
            chunk_overlap: 2,
            chunk_by_headers: false,
        })?,
        8,
    )?;
    let embedder = CountingEmbedder::default();
    let mut store = MemoryChunkStore::new();

    let written = indexer.index_note("N", &"x".repeat(25), &Metadata::new(), &embedder, &mut store)?;
    assert_eq!(written, 3);
    assert_eq!(store.chunks_for("N").len(), 3);

    let written = indexer.index_note("N", "tiny", &Metadata::new(), &embedder, &mut store)?;
    assert_eq!(written, 1);
    let remaining = store.chunks_for("N");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].chunk.text, "tiny");
    assert_eq!(remaining[0].embedding, vec![4.0, 2.0]);
    Ok(())
}

#[test]
fn test_stored_chunks_come_back_in_note_order() -> Result<(), Box<dyn std::error::Error>> {
    let indexer = SemanticIndexer::new(
        ContentChunker::new(ChunkerConfig {
            chunk_size: 4,
            chunk_overlap: 1,
            chunk_by_headers: false,
        })?,
        8,
    )?;
    let mut store = MemoryChunkStore::new();
    let body: String = (0..40).map(|i| char::from(b'a' + (i % 26) as u8)).collect();

    let written = indexer.index_note(
        "Long",
        &body,
        &Metadata::new(),
        &CountingEmbedder::default(),
        &mut store,
    )?;
    assert!(written > 10);

    let positions: Vec<Option<&FlatValue>> = store
        .chunks_for("Long")
        .iter()
        .map(|record| record.chunk.metadata.get(CHUNK_IDX_KEY))
        .collect();
    let expected: Vec<FlatValue> = (0..written).map(|idx| int(idx as i64)).collect();
    assert_eq!(positions, expected.iter().map(Some).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn test_index_documents_reports_progress_per_batch() -> Result<(), Box<dyn std::error::Error>> {
    let indexer = SemanticIndexer::new(ContentChunker::new(ChunkerConfig::default())?, 2)?;
    let embedder = CountingEmbedder::default();
    let mut store = MemoryChunkStore::new();
    let documents: Vec<NoteDocument> = ["A", "B", "C", "D", "E"]
        .iter()
        .map(|name| NoteDocument {
            name: (*name).to_string(),
            body: format!("body of {name}"),
            metadata: Metadata::new(),
        })
        .collect();

    let mut progress = Vec::new();
    let report = indexer.index_documents(&documents, &embedder, &mut store, |done, total| {
        progress.push((done, total));
    })?;

    assert_eq!(progress, vec![(2, 5), (4, 5), (5, 5)]);
    assert_eq!(report.total_notes, 5);
    assert_eq!(report.total_chunks, 5);
    assert_eq!(report.indexed_notes, vec!["A", "B", "C", "D", "E"]);
    assert_eq!(store.len(), 5);
    Ok(())
}

#[test]
fn test_index_vault_covers_every_note() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = make_vault()?;
    write_file(&tmp.path().join("One.md"), "---\ntags: [x]\n---\nfirst note")?;
    write_file(&tmp.path().join("sub/Two.md"), "second note")?;
    let vault = Vault::open(tmp.path())?;

    let documents = vault_documents(&vault);
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0].body, "first note");

    let indexer = SemanticIndexer::for_vault(&vault)?;
    let mut store = MemoryChunkStore::new();
    let report = indexer.index_vault(&vault, &CountingEmbedder::default(), &mut store, |_, _| {})?;
    assert_eq!(report.indexed_notes, vec!["One", "sub/Two"]);
    assert_eq!(
        store.chunks_for("One")[0].chunk.metadata.get("tags"),
        Some(&FlatValue::String("x".to_string()))
    );
    Ok(())
}

#[test]
fn test_embedder_failures_propagate() -> Result<(), Box<dyn std::error::Error>> {
    let indexer = SemanticIndexer::new(ContentChunker::new(ChunkerConfig::default())?, 4)?;
    let mut store = MemoryChunkStore::new();

    let failed = indexer.index_note("N", "text", &Metadata::new(), &FailingEmbedder, &mut store);
    assert!(matches!(failed, Err(VaultError::Semantic(_))));

    let short = indexer.index_note("N", "text", &Metadata::new(), &ShortEmbedder, &mut store);
    assert!(matches!(short, Err(VaultError::Semantic(_))));
    assert!(store.indexed_notes().is_empty());
    Ok(())
}

#[test]
fn test_zero_batch_size_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let chunker = ContentChunker::new(ChunkerConfig::default())?;
    assert!(matches!(
        SemanticIndexer::new(chunker, 0),
        Err(VaultError::InvalidConfig(_))
    ));
    Ok(())
}
