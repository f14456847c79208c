//! Areas where at least one individual lives.

use hashbrown::HashMap;
use serde::Serialize;

use crate::models::{Gazetteer, GazetteerRow, ResolvedIndividual};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulatedArea<'a> {
    #[serde(flatten)]
    pub row: &'a GazetteerRow,
    pub residents: usize,
}

/// Gazetteer rows (in gazetteer order) whose finest code has at least one
/// resolved individual, with a resident count.
///
/// Handy as a reference list while assembling a hazard layer.
pub fn populated_areas<'a>(
    gazetteer: &'a Gazetteer,
    resolved: &[ResolvedIndividual],
) -> Vec<PopulatedArea<'a>> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for code in resolved.iter().filter_map(|r| r.resolved_code.as_deref()) {
        *counts.entry(code).or_insert(0) += 1;
    }

    gazetteer
        .rows()
        .iter()
        .filter_map(|row| {
            counts
                .get(row.finest_code())
                .map(|&residents| PopulatedArea { row, residents })
        })
        .collect()
}
