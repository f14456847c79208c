//! Coarse-to-fine expansion of a hazard selection.

use hashbrown::HashSet;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::models::{Gazetteer, SelectionEntry};

/// Set of finest-level codes covered by a selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipSet {
    codes: HashSet<String>,
}

impl MembershipSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(code)
    }

    pub fn insert(&mut self, code: impl Into<String>) -> bool {
        self.codes.insert(code.into())
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(String::as_str)
    }

    pub fn is_subset(&self, other: &MembershipSet) -> bool {
        self.codes.is_subset(&other.codes)
    }

    /// Codes in ascending order, for stable output.
    pub fn sorted(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.iter().collect();
        codes.sort_unstable();
        codes
    }
}

impl<S: Into<String>> FromIterator<S> for MembershipSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            codes: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Why a selection entry was left out of the expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// `level` is not within `1..=depth`
    LevelOutOfRange { depth: usize },
    /// No gazetteer row carries `code` at `level`
    UnknownCode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    pub entry: SelectionEntry,
    #[serde(flatten)]
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default)]
pub struct Expansion {
    pub members: MembershipSet,
    /// Malformed entries, in selection order
    pub skipped: Vec<SkippedEntry>,
    /// Entries dropped because an earlier entry had the same code
    pub duplicates: usize,
}

/// Expand `entries` to the set of finest-level codes they cover.
///
/// Entries are deduplicated by code (first occurrence kept). Finest-level
/// entries contribute their own code; coarser entries contribute the finest
/// code of every gazetteer row beneath them.
pub fn expand(entries: &[SelectionEntry], gazetteer: &Gazetteer) -> Expansion {
    let depth = gazetteer.depth();
    let mut expansion = Expansion::default();
    let mut seen: HashSet<&str> = HashSet::new();

    for entry in entries {
        if !seen.insert(entry.code.as_str()) {
            expansion.duplicates += 1;
            continue;
        }

        if entry.level == 0 || entry.level > depth {
            warn!(
                "Skipping selection entry '{}' ({}): level {} outside 1..={}",
                entry.display_name, entry.code, entry.level, depth
            );
            expansion.skipped.push(SkippedEntry {
                entry: entry.clone(),
                reason: SkipReason::LevelOutOfRange { depth },
            });
            continue;
        }

        let before = expansion.members.len();
        let mut matched = false;

        if entry.level == depth {
            if gazetteer.find(&entry.code).is_some() {
                expansion.members.insert(entry.code.as_str());
                matched = true;
            }
        } else {
            for row in gazetteer.descendants(entry.level, &entry.code) {
                expansion.members.insert(row.finest_code());
                matched = true;
            }
        }

        if !matched {
            warn!(
                "Skipping selection entry '{}': no level-{} area with code {}",
                entry.display_name, entry.level, entry.code
            );
            expansion.skipped.push(SkippedEntry {
                entry: entry.clone(),
                reason: SkipReason::UnknownCode,
            });
            continue;
        }

        debug!(
            "Entry {} (level {}) added {} codes",
            entry.code,
            entry.level,
            expansion.members.len() - before
        );
    }

    info!(
        "Expanded {} selection entries to {} finest-level codes ({} skipped, {} duplicates)",
        entries.len(),
        expansion.members.len(),
        expansion.skipped.len(),
        expansion.duplicates
    );

    expansion
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GazetteerRow, Hierarchy};

    fn gazetteer() -> Gazetteer {
        Gazetteer::new(
            Hierarchy::default(),
            vec![
                GazetteerRow::new(["P1", "C1", "B1"], ["A", "B", "C"]),
                GazetteerRow::new(["P1", "C1", "B2"], ["A", "B", "D"]),
                GazetteerRow::new(["P1", "C2", "B3"], ["A", "E", "F"]),
                GazetteerRow::new(["P2", "C3", "B4"], ["G", "H", "I"]),
            ],
        )
        .unwrap()
    }

    fn entry(level: usize, code: &str) -> SelectionEntry {
        SelectionEntry::new(level, code, "area", code)
    }

    #[test]
    fn test_province_expands_to_all_barangays() {
        let out = expand(&[entry(1, "P1")], &gazetteer());
        assert_eq!(out.members.sorted(), vec!["B1", "B2", "B3"]);
        assert!(out.skipped.is_empty());
    }

    #[test]
    fn test_mixed_levels() {
        let out = expand(&[entry(2, "C1"), entry(3, "B4"), entry(3, "B1")], &gazetteer());
        assert_eq!(out.members.sorted(), vec!["B1", "B2", "B4"]);
    }

    #[test]
    fn test_empty_selection() {
        let out = expand(&[], &gazetteer());
        assert!(out.members.is_empty());
    }

    #[test]
    fn test_duplicates_keep_first() {
        let out = expand(&[entry(1, "P2"), entry(1, "P2"), entry(9, "P2")], &gazetteer());
        assert_eq!(out.members.sorted(), vec!["B4"]);
        assert_eq!(out.duplicates, 2);
        assert!(out.skipped.is_empty());
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let out = expand(
            &[entry(0, "X"), entry(4, "B1"), entry(2, "C9"), entry(3, "P1"), entry(1, "P2")],
            &gazetteer(),
        );
        assert_eq!(out.members.sorted(), vec!["B4"]);
        let reasons: Vec<&SkipReason> = out.skipped.iter().map(|s| &s.reason).collect();
        assert_eq!(
            reasons,
            vec![
                &SkipReason::LevelOutOfRange { depth: 3 },
                &SkipReason::LevelOutOfRange { depth: 3 },
                &SkipReason::UnknownCode,
                &SkipReason::UnknownCode,
            ]
        );
    }

    #[test]
    fn test_order_independent_and_monotone() {
        let gaz = gazetteer();
        let forward = expand(&[entry(1, "P1"), entry(3, "B4")], &gaz);
        let backward = expand(&[entry(3, "B4"), entry(1, "P1")], &gaz);
        assert_eq!(forward.members, backward.members);
        assert_eq!(forward.members, expand(&[entry(1, "P1"), entry(3, "B4")], &gaz).members);

        let coarse = expand(&[entry(1, "P1")], &gaz).members;
        for code in ["B1", "B2", "B3"] {
            let fine = expand(&[entry(3, code)], &gaz).members;
            assert!(fine.is_subset(&coarse));
            assert!(coarse.len() >= fine.len());
        }
    }
}
