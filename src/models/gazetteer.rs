//! Canonical table of administrative areas.
//!
//! One row per finest-level area with the codes and names of every ancestor
//! flattened onto it, so a barangay row carries its province and city too.

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use xxhash_rust::xxh64::Xxh64;

use super::Hierarchy;
use crate::error::{Error, Result};

/// A single finest-level area with its denormalized ancestry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GazetteerRow {
    /// Codes coarsest first; the last one identifies the row.
    pub codes: Vec<String>,
    /// Display names coarsest first.
    pub names: Vec<String>,
}

impl GazetteerRow {
    pub fn new<C, N>(codes: C, names: N) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        N: IntoIterator,
        N::Item: Into<String>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Code at 1-based `level`
    pub fn code(&self, level: usize) -> Option<&str> {
        level
            .checked_sub(1)
            .and_then(|i| self.codes.get(i))
            .map(String::as_str)
    }

    /// Name at 1-based `level`
    pub fn name(&self, level: usize) -> Option<&str> {
        level
            .checked_sub(1)
            .and_then(|i| self.names.get(i))
            .map(String::as_str)
    }

    pub fn finest_code(&self) -> &str {
        self.codes.last().map(String::as_str).unwrap_or_default()
    }

    pub fn finest_name(&self) -> &str {
        self.names.last().map(String::as_str).unwrap_or_default()
    }
}

/// Immutable, validated gazetteer. Swap the whole value to refresh it.
#[derive(Debug, Clone)]
pub struct Gazetteer {
    hierarchy: Hierarchy,
    rows: Vec<GazetteerRow>,
    by_finest: HashMap<String, usize>,
    version: u64,
}

impl Gazetteer {
    /// Validate `rows` against `hierarchy` and build the finest-code index.
    ///
    /// Rejects rows of the wrong arity, empty codes, duplicate finest codes and
    /// codes that appear under two different parents.
    pub fn new(hierarchy: Hierarchy, rows: Vec<GazetteerRow>) -> Result<Self> {
        let depth = hierarchy.depth();
        let mut by_finest = HashMap::with_capacity(rows.len());
        validate_rows(&rows, depth, &mut by_finest)?;

        let version = fingerprint(&hierarchy, &rows);
        debug!("Gazetteer fingerprint {:016x}", version);

        Ok(Self {
            hierarchy,
            rows,
            by_finest,
            version,
        })
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn depth(&self) -> usize {
        self.hierarchy.depth()
    }

    pub fn rows(&self) -> &[GazetteerRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&GazetteerRow> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Content fingerprint. Equal content yields an equal version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Look up a row by its finest-level code
    pub fn find(&self, finest_code: &str) -> Option<&GazetteerRow> {
        self.by_finest.get(finest_code).map(|&i| &self.rows[i])
    }

    /// All rows whose code at `level` equals `code`, by linear scan.
    pub fn descendants<'a>(
        &'a self,
        level: usize,
        code: &'a str,
    ) -> impl Iterator<Item = &'a GazetteerRow> + 'a {
        self.rows
            .iter()
            .filter(move |row| row.code(level) == Some(code))
    }

    /// Derive a coarser gazetteer whose finest level is `level`.
    ///
    /// One row is kept per distinct level code, first occurrence wins.
    pub fn truncate(&self, level: usize) -> Result<Self> {
        let hierarchy = self.hierarchy.truncate(level)?;
        if level == self.depth() {
            return Ok(self.clone());
        }

        let mut seen = HashSet::new();
        let rows: Vec<GazetteerRow> = self
            .rows
            .iter()
            .filter(|row| seen.insert(row.codes[level - 1].as_str()))
            .map(|row| GazetteerRow {
                codes: row.codes[..level].to_vec(),
                names: row.names[..level].to_vec(),
            })
            .collect();

        info!(
            "Truncated gazetteer to level {} ({} -> {} rows)",
            level,
            self.rows.len(),
            rows.len()
        );

        Self::new(hierarchy, rows)
    }
}

/// Arity, empty codes, strict tree and unique finest codes. Fills
/// `by_finest` with the row index of each finest code.
fn validate_rows(
    rows: &[GazetteerRow],
    depth: usize,
    by_finest: &mut HashMap<String, usize>,
) -> Result<()> {
    // (level, code) -> parent code
    let mut parents: HashMap<(usize, &str), &str> = HashMap::new();

    for (i, row) in rows.iter().enumerate() {
        for found in [row.codes.len(), row.names.len()] {
            if found != depth {
                return Err(Error::ArityMismatch {
                    expected: depth,
                    found,
                });
            }
        }

        if let Some(pos) = row.codes.iter().position(|c| c.trim().is_empty()) {
            return Err(Error::EmptyCode {
                row: i,
                level: pos + 1,
            });
        }

        for level in 2..=depth {
            let code = row.codes[level - 1].as_str();
            let parent = row.codes[level - 2].as_str();
            match parents.get(&(level, code)) {
                Some(&first) if first != parent => {
                    return Err(Error::InconsistentHierarchy {
                        level,
                        code: code.to_string(),
                        first_parent: first.to_string(),
                        second_parent: parent.to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    parents.insert((level, code), parent);
                }
            }
        }

        let finest = row.finest_code().to_string();
        if by_finest.insert(finest.clone(), i).is_some() {
            return Err(Error::DuplicateCode { code: finest });
        }
    }

    Ok(())
}

fn fingerprint(hierarchy: &Hierarchy, rows: &[GazetteerRow]) -> u64 {
    let mut hasher = Xxh64::new(0);
    hasher.update(&(hierarchy.depth() as u64).to_le_bytes());
    for row in rows {
        for field in row.codes.iter().chain(row.names.iter()) {
            hasher.update(field.as_bytes());
            hasher.update(&[0x1f]);
        }
        hasher.update(&[0x1e]);
    }
    hasher.digest()
}
