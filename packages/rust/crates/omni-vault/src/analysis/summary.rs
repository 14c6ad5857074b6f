use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;

use super::{GraphAnalyzer, HubNote, RecentNote, VaultStats, VaultSummary};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

impl GraphAnalyzer<'_> {
    /// Notes without any tag, sorted.
    #[must_use]
    pub fn untagged_notes(&self) -> Vec<String> {
        self.snapshot
            .notes
            .iter()
            .filter(|(_, entry)| !entry.has_tags)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Notes modified within `days` of `now`, newest first.
    #[must_use]
    pub fn recent_notes(&self, now: DateTime<Utc>, days: u32) -> Vec<RecentNote> {
        let threshold = now.timestamp() - i64::from(days) * SECONDS_PER_DAY;
        let mut recent: Vec<RecentNote> = self
            .snapshot
            .notes
            .iter()
            .filter(|(_, entry)| entry.modified_at >= threshold)
            .map(|(name, entry)| RecentNote {
                name: name.clone(),
                location: entry.location.clone(),
                modified_at: entry.modified_at,
            })
            .collect();
        recent.sort_by(|left, right| {
            right
                .modified_at
                .cmp(&left.modified_at)
                .then_with(|| left.name.cmp(&right.name))
        });
        recent
    }

    /// Notes with the most backlinks. Notes nobody links to are not hubs.
    #[must_use]
    pub fn top_hubs(&self, limit: usize) -> Vec<HubNote> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for entry in self.snapshot.notes.values() {
            let mut targets: Vec<&str> = entry.links.iter().map(String::as_str).collect();
            targets.sort_unstable();
            targets.dedup();
            for target in targets {
                if self.snapshot.notes.contains_key(target) {
                    *counts.entry(target).or_default() += 1;
                }
            }
        }
        let mut hubs: Vec<HubNote> = counts
            .into_iter()
            .map(|(name, backlinks)| HubNote {
                name: name.to_string(),
                backlinks,
            })
            .collect();
        hubs.sort_by(|left, right| {
            right
                .backlinks
                .cmp(&left.backlinks)
                .then_with(|| left.name.cmp(&right.name))
        });
        hubs.truncate(limit);
        hubs
    }

    /// Dashboard summary at `now`.
    #[must_use]
    pub fn summary(&self, now: DateTime<Utc>, recent_days: u32, top_hubs: usize) -> VaultSummary {
        let orphaned = self.orphaned_notes();
        let broken: usize = self.broken_links().values().map(Vec::len).sum();
        let untagged = self.untagged_notes();
        let recent = self.recent_notes(now, recent_days);
        VaultSummary {
            stats: VaultStats {
                total_notes: self.snapshot.notes.len(),
                orphaned_notes: orphaned.len(),
                broken_links: broken,
                untagged_notes: untagged.len(),
                recent_notes: recent.len(),
                skipped_notes: self.snapshot.skipped.len(),
            },
            recent_notes: recent,
            top_hubs: self.top_hubs(top_hubs),
            untagged_notes: untagged,
            generated_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}
