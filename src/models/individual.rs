//! Roster entries and their resolution outputs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One person on the roster with free-text address fields, coarsest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    /// Stable identifier (a roster column or the row position)
    pub id: String,

    /// Raw address text per level. `None` marks a missing cell.
    pub address: Vec<Option<String>>,

    /// Categorical columns used only for grouping (strand, section, ...)
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Individual {
    pub fn new<I, S>(id: impl Into<String>, address: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            address: address.into_iter().map(|a| a.map(Into::into)).collect(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Address text at 1-based `level`; blank cells count as missing.
    pub fn address_text(&self, level: usize) -> Option<&str> {
        level
            .checked_sub(1)
            .and_then(|i| self.address.get(i))
            .and_then(|a| a.as_deref())
            .filter(|a| !a.trim().is_empty())
    }

    /// 1-based levels in `1..=depth` that have no usable text.
    pub fn missing_levels(&self, depth: usize) -> Vec<usize> {
        (1..=depth)
            .filter(|&level| self.address_text(level).is_none())
            .collect()
    }
}

/// An individual after the resolver has run.
///
/// Incomplete individuals keep `None` in every output field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedIndividual {
    pub individual: Individual,

    /// Normalized address, one entry per level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<Vec<String>>,

    /// Finest-level code of the best gazetteer row
    pub resolved_code: Option<String>,

    /// Sum of per-level similarities, in `[0, depth]`
    pub match_score: Option<f64>,

    /// Per-level similarity against the chosen row
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_scores: Option<Vec<f64>>,
}

impl ResolvedIndividual {
    pub fn unresolved(individual: Individual) -> Self {
        Self {
            individual,
            normalized: None,
            resolved_code: None,
            match_score: None,
            level_scores: None,
        }
    }

    /// Already-resolved record, e.g. read back from an export.
    pub fn with_code(individual: Individual, code: impl Into<String>, score: Option<f64>) -> Self {
        Self {
            individual,
            normalized: None,
            resolved_code: Some(code.into()),
            match_score: score,
            level_scores: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_code.is_some()
    }

    pub fn id(&self) -> &str {
        &self.individual.id
    }
}
