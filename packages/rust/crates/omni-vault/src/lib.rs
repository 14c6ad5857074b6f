//! omni-vault - note index and knowledge-graph analysis for Markdown vaults.
//!
//! Module layout:
//! - `parser`: header block, wikilinks, inline tags, path helpers
//! - `metadata` / `note`: metadata tagged union and the parsed note model
//! - `vault`: safe path resolution, durable writes, cached index, query facade
//! - `analysis`: backlinks, orphans, broken links, suggestions, summary
//! - `chunker` / `semantic`: chunking and the embedding hand-off
//! - `config`: YAML settings
//!
//! # Examples
//!
//! ```no_run
//! use omni_vault::Vault;
//!
//! let vault = Vault::open("/path/to/vault")?;
//! vault.create_note("inbox/Idea", None, Some("Relates to [[Roadmap]] #idea"))?;
//! for (note, missing) in vault.find_broken_links() {
//!     println!("{note}: {}", missing.join(", "));
//! }
//! # Ok::<(), omni_vault::VaultError>(())
//! ```

pub mod analysis;
pub mod chunker;
pub mod config;
mod error;
pub mod metadata;
pub mod note;
pub mod parser;
pub mod semantic;
pub mod vault;

pub use analysis::{
    ConnectionSuggestion, GraphAnalyzer, HubNote, OrphanPolicy, RecentNote, SuggestionEvidence,
    VaultStats, VaultSummary,
};
pub use chunker::{Chunk, ChunkerConfig, ContentChunker};
pub use config::VaultSettings;
pub use error::{Result, VaultError};
pub use metadata::{FlatValue, Metadata, MetadataValue};
pub use note::Note;
pub use semantic::{
    ChunkStore, EmbeddedChunk, Embedder, IndexReport, MemoryChunkStore, NoteDocument,
    SemanticIndexer,
};
pub use vault::{IndexEntry, IndexSnapshot, SkippedNote, Vault};
