//! Batch resolution of a roster against the gazetteer.

use hashbrown::HashMap;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::matcher::Matcher;
use crate::models::{Individual, ResolvedIndividual};
use crate::normalize::Normalizer;

/// An individual left out of matching because address fields are missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncompleteRecord {
    pub id: String,
    /// Labels of the missing levels, coarsest first
    pub missing: Vec<String>,
}

impl IncompleteRecord {
    /// Human-readable list, e.g. `"city_municipality, barangay"`.
    pub fn missing_data(&self) -> String {
        self.missing.join(", ")
    }
}

/// Output of one resolution run.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Every roster entry in input order; incomplete ones are unresolved.
    pub resolved: Vec<ResolvedIndividual>,
    pub incomplete: Vec<IncompleteRecord>,
    /// Identifiers seen more than once in the roster
    pub duplicate_ids: Vec<String>,
}

impl Resolution {
    pub fn resolved_count(&self) -> usize {
        self.resolved.iter().filter(|r| r.is_resolved()).count()
    }

    /// Resolved individuals whose every level matched exactly.
    pub fn perfect_count(&self) -> usize {
        self.resolved
            .iter()
            .filter(|r| {
                r.level_scores
                    .as_ref()
                    .map_or(false, |s| s.iter().all(|&v| v == 1.0))
            })
            .count()
    }
}

/// Normalizes and matches each individual. One instance per session.
pub struct Resolver {
    normalizer: Normalizer,
    matcher: Matcher,
}

impl Resolver {
    pub fn new(normalizer: Normalizer, matcher: Matcher) -> Result<Self> {
        let depth = matcher.depth();
        if normalizer.hierarchy().depth() != depth {
            return Err(Error::ArityMismatch {
                expected: depth,
                found: normalizer.hierarchy().depth(),
            });
        }
        Ok(Self {
            normalizer,
            matcher,
        })
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn matcher_mut(&mut self) -> &mut Matcher {
        &mut self.matcher
    }

    pub fn resolve(&mut self, roster: &[Individual]) -> Result<Resolution> {
        self.resolve_with(roster, |_| {})
    }

    /// Resolve the full roster, calling `on_progress` after each individual.
    ///
    /// Fails on an empty gazetteer or an address with the wrong number of
    /// fields; missing fields are reported per individual instead.
    pub fn resolve_with<F>(&mut self, roster: &[Individual], mut on_progress: F) -> Result<Resolution>
    where
        F: FnMut(usize),
    {
        let depth = self.matcher.depth();
        if self.matcher.gazetteer().is_empty() {
            return Err(Error::EmptyGazetteer);
        }

        let mut resolution = Resolution {
            duplicate_ids: duplicate_ids(roster),
            ..Resolution::default()
        };
        for id in &resolution.duplicate_ids {
            warn!("Identifier '{}' appears more than once in the roster", id);
        }

        for (done, individual) in roster.iter().enumerate() {
            if individual.address.len() != depth {
                return Err(Error::ArityMismatch {
                    expected: depth,
                    found: individual.address.len(),
                });
            }

            match self.resolve_one(individual) {
                Ok(resolved) => resolution.resolved.push(resolved),
                Err(Error::IncompleteAddress { missing }) => {
                    resolution.incomplete.push(IncompleteRecord {
                        id: individual.id.clone(),
                        missing,
                    });
                    resolution
                        .resolved
                        .push(ResolvedIndividual::unresolved(individual.clone()));
                }
                Err(e) => return Err(e),
            }

            on_progress(done + 1);
        }

        info!(
            "Resolved {} of {} individuals ({} incomplete, {} perfect)",
            resolution.resolved_count(),
            roster.len(),
            resolution.incomplete.len(),
            resolution.perfect_count()
        );

        Ok(resolution)
    }

    fn resolve_one(&mut self, individual: &Individual) -> Result<ResolvedIndividual> {
        let hierarchy = self.normalizer.hierarchy();
        let depth = hierarchy.depth();

        let missing: Vec<String> = individual
            .missing_levels(depth)
            .into_iter()
            .filter_map(|level| hierarchy.label(level).map(str::to_string))
            .collect();
        if !missing.is_empty() {
            return Err(Error::IncompleteAddress { missing });
        }

        let mut normalized = Vec::with_capacity(depth);
        let mut emptied = Vec::new();
        for level in 1..=depth {
            let raw = individual.address_text(level).unwrap_or_default();
            let text = self.normalizer.normalize(level, raw)?;
            if text.is_empty() {
                emptied.push(hierarchy.label(level).unwrap_or_default().to_string());
            }
            normalized.push(text);
        }
        if !emptied.is_empty() {
            warn!(
                "Address of '{}' normalizes to nothing at: {}",
                individual.id,
                emptied.join(", ")
            );
            return Err(Error::IncompleteAddress { missing: emptied });
        }

        let found = self.matcher.best_match(&normalized)?;

        Ok(ResolvedIndividual {
            individual: individual.clone(),
            normalized: Some(normalized),
            resolved_code: Some(found.code),
            match_score: Some(found.score),
            level_scores: Some(found.level_scores),
        })
    }
}

/// Identifiers occurring more than once, in order of first repeat.
fn duplicate_ids(roster: &[Individual]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut dupes = Vec::new();
    for individual in roster {
        let count = counts.entry(individual.id.as_str()).or_insert(0);
        *count += 1;
        if *count == 2 {
            dupes.push(individual.id.clone());
        }
    }
    dupes
}
