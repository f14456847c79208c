//! Best-match search of a normalized address against the gazetteer.
//!
//! Every row is scored as the sum of per-level similarity ratios, so the
//! score of a perfect match equals the hierarchy depth. The scan stops early
//! on a perfect match; otherwise the first row with the highest score wins.

mod cache;
pub mod similarity;

pub use cache::CacheStats;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{Gazetteer, GazetteerRow};
use crate::normalize::Normalizer;
use cache::{Interner, MatchCache};

/// Result of a best-match search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Index of the matched row in the gazetteer
    pub row_index: usize,
    /// Finest-level code of the matched row
    pub code: String,
    /// Sum of `level_scores`, in `[0, depth]`
    pub score: f64,
    pub level_scores: Vec<f64>,
}

impl Match {
    pub fn is_perfect(&self) -> bool {
        self.level_scores.iter().all(|&s| s == 1.0)
    }
}

/// Fuzzy matcher bound to one gazetteer version.
///
/// Owns its caches; create one per session. Call [`Matcher::refresh`] after
/// swapping the gazetteer so stale scores are dropped.
pub struct Matcher {
    gazetteer: Arc<Gazetteer>,
    names: Interner,
    /// Canonical name id per row, per level
    canonical: Vec<Vec<u32>>,
    /// Fingerprint of the normalizer the names were indexed with
    normalizer_version: u64,
    cache: MatchCache,
}

impl Matcher {
    /// Normalize every gazetteer name through `normalizer` and index them.
    pub fn new(gazetteer: Arc<Gazetteer>, normalizer: &Normalizer) -> Result<Self> {
        let (names, canonical) = index_names(&gazetteer, normalizer)?;
        let cache = MatchCache::new(gazetteer.version());
        info!(
            "Matcher ready: {} rows, {} distinct canonical names",
            gazetteer.len(),
            names.len()
        );
        Ok(Self {
            gazetteer,
            names,
            canonical,
            normalizer_version: normalizer.fingerprint(),
            cache,
        })
    }

    pub fn gazetteer(&self) -> &Arc<Gazetteer> {
        &self.gazetteer
    }

    pub fn depth(&self) -> usize {
        self.gazetteer.depth()
    }

    /// Canonical (normalized) names of a gazetteer row.
    pub fn canonical_names(&self, row_index: usize) -> Option<Vec<&str>> {
        self.canonical
            .get(row_index)
            .map(|ids| ids.iter().map(|&id| self.names.resolve(id)).collect())
    }

    pub fn row(&self, m: &Match) -> Option<&GazetteerRow> {
        self.gazetteer.row(m.row_index)
    }

    /// Find the best gazetteer row for a normalized address (coarsest first).
    ///
    /// Results are memoized per exact address.
    pub fn best_match(&mut self, normalized: &[String]) -> Result<Match> {
        let depth = self.depth();
        if normalized.len() != depth {
            return Err(Error::ArityMismatch {
                expected: depth,
                found: normalized.len(),
            });
        }

        let missing: Vec<String> = normalized
            .iter()
            .enumerate()
            .filter(|(_, text)| text.is_empty())
            .map(|(i, _)| {
                self.gazetteer
                    .hierarchy()
                    .label(i + 1)
                    .unwrap_or_default()
                    .to_string()
            })
            .collect();
        if !missing.is_empty() {
            return Err(Error::IncompleteAddress { missing });
        }

        if self.gazetteer.is_empty() {
            return Err(Error::EmptyGazetteer);
        }

        if let Some(hit) = self.cache.lookup(normalized) {
            return Ok(hit);
        }

        let (row_index, score) = self.scan(normalized);
        let level_scores = self.canonical[row_index]
            .iter()
            .zip(normalized)
            .map(|(&id, text)| self.cache.ratio(text, id, &self.names))
            .collect();

        let result = Match {
            row_index,
            code: self.gazetteer.rows()[row_index].finest_code().to_string(),
            score,
            level_scores,
        };
        debug!(
            "Matched {:?} -> {} ({:.3})",
            normalized, result.code, result.score
        );

        self.cache.store(normalized, result.clone());
        Ok(result)
    }

    /// Linear scan over all rows. Returns as soon as a row matches every level
    /// exactly; otherwise the first row reaching the highest score.
    fn scan(&mut self, normalized: &[String]) -> (usize, f64) {
        // canonical id -> ratio, per level, for this address only
        let mut seen: Vec<HashMap<u32, f64>> = vec![HashMap::new(); normalized.len()];
        let mut best = (0, f64::NEG_INFINITY);
        let mut ties = 0usize;

        for (row_index, ids) in self.canonical.iter().enumerate() {
            let mut score = 0.0;
            let mut exact = true;

            for (level, (&id, text)) in ids.iter().zip(normalized).enumerate() {
                exact &= self.names.resolve(id) == text.as_str();
                score += *seen[level]
                    .entry(id)
                    .or_insert_with(|| self.cache.ratio(text, id, &self.names));
            }

            if exact {
                return (row_index, score);
            }
            if score > best.1 {
                best = (row_index, score);
                ties = 0;
            } else if score == best.1 {
                ties += 1;
            }
        }

        if ties > 0 {
            debug!(
                "{} rows tie with row {} at score {:.3}; keeping the first",
                ties, best.0, best.1
            );
        }
        best
    }

    /// Drop all cached results.
    pub fn invalidate(&mut self) {
        info!(
            "Invalidating matcher caches ({} addresses)",
            self.cache.address_count()
        );
        self.cache.clear(self.gazetteer.version());
    }

    /// Swap in a new gazetteer and normalizer. Names are re-indexed and caches
    /// cleared when either the gazetteer version or the normalizer fingerprint
    /// differs from the current one. Returns whether anything changed.
    pub fn refresh(&mut self, gazetteer: Arc<Gazetteer>, normalizer: &Normalizer) -> Result<bool> {
        let normalizer_version = normalizer.fingerprint();
        if gazetteer.version() == self.cache.version
            && normalizer_version == self.normalizer_version
        {
            debug!("Gazetteer and normalizer unchanged, keeping caches");
            return Ok(false);
        }

        let (names, canonical) = index_names(&gazetteer, normalizer)?;
        self.gazetteer = gazetteer;
        self.names = names;
        self.canonical = canonical;
        self.normalizer_version = normalizer_version;
        self.invalidate();
        Ok(true)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

fn index_names(gazetteer: &Gazetteer, normalizer: &Normalizer) -> Result<(Interner, Vec<Vec<u32>>)> {
    let depth = gazetteer.depth();
    if normalizer.hierarchy().depth() != depth {
        return Err(Error::ArityMismatch {
            expected: depth,
            found: normalizer.hierarchy().depth(),
        });
    }

    let mut names = Interner::default();
    let canonical = gazetteer
        .rows()
        .iter()
        .map(|row| {
            row.names
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    // A blank gazetteer name stays blank and simply scores low
                    let text = normalizer.normalize(i + 1, name).unwrap_or_default();
                    names.intern(&text)
                })
                .collect()
        })
        .collect();

    Ok((names, canonical))
}
