//! Graph analysis over one index snapshot.
//!
//! Every query is a pure function of the snapshot it was given; results are
//! ordered by note identifier so repeated calls are identical.

mod models;
mod suggest;
mod summary;

use std::collections::{BTreeMap, BTreeSet};

use crate::parser::is_attachment_target;
use crate::vault::IndexSnapshot;

pub use self::models::{
    ConnectionSuggestion, HubNote, OrphanPolicy, RecentNote, SuggestionEvidence, VaultStats,
    VaultSummary,
};

/// Read-only analyzer borrowing an index snapshot.
#[derive(Debug, Clone, Copy)]
pub struct GraphAnalyzer<'a> {
    snapshot: &'a IndexSnapshot,
    attachment_extensions: &'a [String],
    orphan_policy: OrphanPolicy,
}

impl<'a> GraphAnalyzer<'a> {
    /// Analyzer with the default orphan policy.
    #[must_use]
    pub fn new(snapshot: &'a IndexSnapshot, attachment_extensions: &'a [String]) -> Self {
        Self {
            snapshot,
            attachment_extensions,
            orphan_policy: OrphanPolicy::default(),
        }
    }

    /// Override how attachment links count toward orphan detection.
    #[must_use]
    pub fn with_orphan_policy(mut self, policy: OrphanPolicy) -> Self {
        self.orphan_policy = policy;
        self
    }

    fn is_attachment(&self, target: &str) -> bool {
        is_attachment_target(target, self.attachment_extensions)
    }

    fn links_to(&self, from: &str, to: &str) -> bool {
        self.snapshot
            .notes
            .get(from)
            .is_some_and(|entry| entry.links.iter().any(|link| link == to))
    }

    fn linked_either_way(&self, left: &str, right: &str) -> bool {
        self.links_to(left, right) || self.links_to(right, left)
    }

    /// Notes whose links contain `name`, sorted.
    #[must_use]
    pub fn backlinks(&self, name: &str) -> Vec<String> {
        self.snapshot
            .notes
            .iter()
            .filter(|(_, entry)| entry.links.iter().any(|link| link == name))
            .map(|(source, _)| source.clone())
            .collect()
    }

    /// Notes with no outgoing links that no other note links to, sorted.
    #[must_use]
    pub fn orphaned_notes(&self) -> Vec<String> {
        let mut has_outlinks: BTreeSet<&str> = BTreeSet::new();
        let mut linked_to: BTreeSet<&str> = BTreeSet::new();
        for (name, entry) in &self.snapshot.notes {
            let counted: Vec<&str> = entry
                .links
                .iter()
                .map(String::as_str)
                .filter(|link| match self.orphan_policy {
                    OrphanPolicy::AnyLink => true,
                    OrphanPolicy::KnowledgeLinksOnly => !self.is_attachment(link),
                })
                .collect();
            if !counted.is_empty() {
                has_outlinks.insert(name.as_str());
                linked_to.extend(counted);
            }
        }
        self.snapshot
            .notes
            .keys()
            .filter(|name| !has_outlinks.contains(name.as_str()) && !linked_to.contains(name.as_str()))
            .cloned()
            .collect()
    }

    /// Per note, link targets that are neither indexed notes nor attachments.
    ///
    /// Targets keep first-occurrence order without duplicates; notes without
    /// broken links are omitted.
    #[must_use]
    pub fn broken_links(&self) -> BTreeMap<String, Vec<String>> {
        let mut broken = BTreeMap::new();
        for (name, entry) in &self.snapshot.notes {
            let mut missing: Vec<String> = Vec::new();
            for link in &entry.links {
                if self.snapshot.notes.contains_key(link) || self.is_attachment(link) {
                    continue;
                }
                if !missing.contains(link) {
                    missing.push(link.clone());
                }
            }
            if !missing.is_empty() {
                broken.insert(name.clone(), missing);
            }
        }
        broken
    }
}
