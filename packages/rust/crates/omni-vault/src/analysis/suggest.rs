use std::collections::{BTreeMap, BTreeSet};

use super::{ConnectionSuggestion, GraphAnalyzer, SuggestionEvidence};
use crate::parser::extract_keywords;

const KEYWORD_SAMPLE_SIZE: usize = 5;

impl GraphAnalyzer<'_> {
    /// Unlinked note pairs sharing at least one tag.
    #[must_use]
    pub fn suggest_by_tags(&self) -> Vec<ConnectionSuggestion> {
        let notes: Vec<(&String, &BTreeSet<String>)> = self
            .snapshot
            .notes
            .iter()
            .map(|(name, entry)| (name, &entry.tags))
            .collect();

        let mut suggestions = Vec::new();
        for (i, (name1, tags1)) in notes.iter().enumerate() {
            for (name2, tags2) in &notes[i + 1..] {
                if self.linked_either_way(name1, name2) {
                    continue;
                }
                let shared: Vec<String> = tags1.intersection(tags2).cloned().collect();
                if shared.is_empty() {
                    continue;
                }
                suggestions.push(ConnectionSuggestion {
                    note1: (*name1).clone(),
                    note2: (*name2).clone(),
                    reason: "shared tags".to_string(),
                    evidence: SuggestionEvidence::SharedTags { tags: shared },
                });
            }
        }
        suggestions
    }

    /// Unlinked note pairs whose bodies share at least `min_overlap` keywords
    /// of `min_length` or more characters.
    #[must_use]
    pub fn suggest_by_keywords(
        &self,
        min_overlap: usize,
        min_length: usize,
    ) -> Vec<ConnectionSuggestion> {
        let notes: Vec<(&String, BTreeSet<String>)> = self
            .snapshot
            .notes
            .iter()
            .map(|(name, entry)| (name, extract_keywords(&entry.body, min_length)))
            .collect();

        let mut suggestions = Vec::new();
        for (i, (name1, words1)) in notes.iter().enumerate() {
            for (name2, words2) in &notes[i + 1..] {
                if self.linked_either_way(name1, name2) {
                    continue;
                }
                let shared: Vec<&String> = words1.intersection(words2).collect();
                if shared.len() < min_overlap || shared.is_empty() {
                    continue;
                }
                suggestions.push(ConnectionSuggestion {
                    note1: (*name1).clone(),
                    note2: (*name2).clone(),
                    reason: "keyword overlap".to_string(),
                    evidence: SuggestionEvidence::SharedKeywords {
                        count: shared.len(),
                        sample: shared
                            .into_iter()
                            .take(KEYWORD_SAMPLE_SIZE)
                            .cloned()
                            .collect(),
                    },
                });
            }
        }
        suggestions
    }

    /// Second-degree neighbours: `A -> B -> C` suggests `(A, C)` via `B`.
    ///
    /// `B` must be an indexed note and neither `B` nor `C` an attachment. `C`
    /// must differ from `A` and not be linked from `A` already; it may be a
    /// note that does not exist yet. Evidence for the same unordered pair is
    /// merged under the sorted pair.
    #[must_use]
    pub fn suggest_by_graph(&self) -> Vec<ConnectionSuggestion> {
        let mut connections: BTreeMap<(&str, &str), BTreeSet<&str>> = BTreeMap::new();
        for (name, entry) in &self.snapshot.notes {
            let direct: BTreeSet<&str> = entry.links.iter().map(String::as_str).collect();
            for via in &direct {
                if self.is_attachment(via) {
                    continue;
                }
                let Some(via_entry) = self.snapshot.notes.get(*via) else {
                    continue;
                };
                for target in via_entry.links.iter().map(String::as_str) {
                    if target == name.as_str()
                        || direct.contains(target)
                        || self.is_attachment(target)
                    {
                        continue;
                    }
                    let pair = if name.as_str() <= target {
                        (name.as_str(), target)
                    } else {
                        (target, name.as_str())
                    };
                    connections.entry(pair).or_default().insert(*via);
                }
            }
        }

        connections
            .into_iter()
            .map(|((note1, note2), via)| {
                let notes: Vec<String> = via.into_iter().map(str::to_string).collect();
                ConnectionSuggestion {
                    note1: note1.to_string(),
                    note2: note2.to_string(),
                    reason: format!("connected via {} note(s)", notes.len()),
                    evidence: SuggestionEvidence::Via { notes },
                }
            })
            .collect()
    }
}
