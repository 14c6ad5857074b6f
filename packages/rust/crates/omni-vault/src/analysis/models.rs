use serde::{Deserialize, Serialize};

/// How attachment links count toward orphan detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Any link, attachments included, connects a note.
    #[default]
    AnyLink,
    /// Attachment links are ignored on both ends.
    KnowledgeLinksOnly,
}

/// Why two notes were suggested as a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SuggestionEvidence {
    /// Tags present on both notes, sorted.
    SharedTags {
        /// Shared tags.
        tags: Vec<String>,
    },
    /// Keyword overlap between the bodies.
    SharedKeywords {
        /// Size of the shared keyword set.
        count: usize,
        /// Up to five shared keywords, sorted.
        sample: Vec<String>,
    },
    /// Intermediate notes linking the pair (`note1 -> via -> note2`).
    Via {
        /// Intermediate notes, sorted and unique.
        notes: Vec<String>,
    },
}

/// A suggested link between two notes that are not linked yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionSuggestion {
    /// First note (lexicographically smaller).
    pub note1: String,
    /// Second note.
    pub note2: String,
    /// Human-readable reason.
    pub reason: String,
    /// Structured evidence.
    pub evidence: SuggestionEvidence,
}

/// Headline numbers for a vault.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VaultStats {
    /// Indexed notes.
    pub total_notes: usize,
    /// Notes with no links in or out.
    pub orphaned_notes: usize,
    /// Broken link targets summed over all notes.
    pub broken_links: usize,
    /// Notes without any tag.
    pub untagged_notes: usize,
    /// Notes modified inside the recent window.
    pub recent_notes: usize,
    /// Notes skipped during the last index build.
    pub skipped_notes: usize,
}

/// A recently modified note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentNote {
    /// Note identifier.
    pub name: String,
    /// Relative location.
    pub location: String,
    /// Modification time, seconds since the Unix epoch.
    pub modified_at: i64,
}

/// A note ranked by incoming links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubNote {
    /// Note identifier.
    pub name: String,
    /// Number of notes linking to it.
    pub backlinks: usize,
}

/// Dashboard view of a vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VaultSummary {
    /// Headline numbers.
    pub stats: VaultStats,
    /// Recently modified notes, newest first.
    pub recent_notes: Vec<RecentNote>,
    /// Most linked-to notes.
    pub top_hubs: Vec<HubNote>,
    /// Notes without tags, sorted.
    pub untagged_notes: Vec<String>,
    /// RFC 3339 timestamp of generation.
    pub generated_at: String,
}
