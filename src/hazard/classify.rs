//! Affected/unaffected classification and aggregate statistics.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use super::MembershipSet;
use crate::models::ResolvedIndividual;

/// A percentage, or "not applicable" when the group is empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Share {
    /// Rounded to two decimals
    Percent(f64),
    NotApplicable,
}

impl Share {
    /// `affected / total * 100`, rounded to two decimals.
    pub fn of(affected: usize, total: usize) -> Self {
        if total == 0 {
            return Share::NotApplicable;
        }
        let pct = affected as f64 / total as f64 * 100.0;
        Share::Percent((pct * 100.0).round() / 100.0)
    }

    pub fn percent(&self) -> Option<f64> {
        match self {
            Share::Percent(p) => Some(*p),
            Share::NotApplicable => None,
        }
    }
}

impl fmt::Display for Share {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Share::Percent(p) => write!(f, "{}%", p),
            Share::NotApplicable => write!(f, "n/a"),
        }
    }
}

/// Serialized as a number, or `null` when not applicable.
impl Serialize for Share {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Share::Percent(p) => serializer.serialize_f64(*p),
            Share::NotApplicable => serializer.serialize_none(),
        }
    }
}

/// A resolved individual with its affected flag.
#[derive(Debug, Clone, Copy)]
pub struct Classified<'a> {
    pub record: &'a ResolvedIndividual,
    pub code: &'a str,
    pub affected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStat {
    /// Grouping column, e.g. "strand"
    pub key: String,
    /// Group value; empty when the attribute is absent
    pub value: String,
    pub total: usize,
    pub affected: usize,
    pub share: Share,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub affected: usize,
    /// Individuals left out because they have no resolved code
    pub unresolved: usize,
    pub share: Share,
    pub groups: Vec<GroupStat>,
}

/// Classification of every resolved individual. Unresolved individuals are
/// counted but take no part in any statistic.
#[derive(Debug, Clone)]
pub struct Classification<'a> {
    rows: Vec<Classified<'a>>,
    unresolved: usize,
}

/// Flag each resolved individual as affected when its code is in `members`.
pub fn classify<'a>(resolved: &'a [ResolvedIndividual], members: &MembershipSet) -> Classification<'a> {
    let mut unresolved = 0;
    let rows = resolved
        .iter()
        .filter_map(|record| match record.resolved_code.as_deref() {
            Some(code) => Some(Classified {
                record,
                code,
                affected: members.contains(code),
            }),
            None => {
                unresolved += 1;
                None
            }
        })
        .collect();

    Classification { rows, unresolved }
}

impl<'a> Classification<'a> {
    pub fn rows(&self) -> &[Classified<'a>] {
        &self.rows
    }

    pub fn affected(&self) -> impl Iterator<Item = &Classified<'a>> {
        self.rows.iter().filter(|c| c.affected)
    }

    pub fn total(&self) -> usize {
        self.rows.len()
    }

    pub fn affected_count(&self) -> usize {
        self.affected().count()
    }

    pub fn unresolved_count(&self) -> usize {
        self.unresolved
    }

    pub fn share(&self) -> Share {
        Share::of(self.affected_count(), self.total())
    }

    /// Per-value statistics for attribute `key`, ordered by value.
    pub fn by_group(&self, key: &str) -> Vec<GroupStat> {
        self.by_group_expecting(key, &[])
    }

    /// Like [`Self::by_group`], but `expected` values come first in the given
    /// order and are reported even when no one belongs to them.
    pub fn by_group_expecting(&self, key: &str, expected: &[&str]) -> Vec<GroupStat> {
        let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for row in &self.rows {
            let value = row.record.individual.attribute(key).unwrap_or_default();
            let entry = counts.entry(value).or_default();
            entry.0 += 1;
            if row.affected {
                entry.1 += 1;
            }
        }

        let stat = |value: &str, (total, affected): (usize, usize)| GroupStat {
            key: key.to_string(),
            value: value.to_string(),
            total,
            affected,
            share: Share::of(affected, total),
        };

        let mut stats: Vec<GroupStat> = expected
            .iter()
            .map(|value| stat(*value, counts.remove(value).unwrap_or_default()))
            .collect();
        stats.extend(counts.into_iter().map(|(value, c)| stat(value, c)));
        stats
    }

    /// Overall statistics plus per-group ones. Each group key carries its own
    /// list of expected values.
    pub fn summary(&self, groups: &[(&str, &[&str])]) -> Summary {
        Summary {
            total: self.total(),
            affected: self.affected_count(),
            unresolved: self.unresolved,
            share: self.share(),
            groups: groups
                .iter()
                .flat_map(|(key, expected)| self.by_group_expecting(key, expected))
                .collect(),
        }
    }
}
