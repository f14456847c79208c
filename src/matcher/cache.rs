//! Memoization state owned by a [`super::Matcher`].

use hashbrown::HashMap;
use serde::Serialize;

use super::similarity;
use super::Match;

/// Dense ids for canonical gazetteer names.
#[derive(Debug, Clone, Default)]
pub struct Interner {
    ids: HashMap<String, u32>,
    strings: Vec<String>,
}

impl Interner {
    pub fn intern(&mut self, text: &str) -> u32 {
        if let Some(&id) = self.ids.get(text) {
            return id;
        }
        let id = self.strings.len() as u32;
        self.strings.push(text.to_string());
        self.ids.insert(text.to_string(), id);
        id
    }

    pub fn resolve(&self, id: u32) -> &str {
        &self.strings[id as usize]
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }
}

/// Hit/miss counters for both cache layers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub address_hits: u64,
    pub address_misses: u64,
    pub pair_hits: u64,
    pub pair_misses: u64,
}

/// Address and string-pair caches, tagged with the gazetteer version they
/// were computed against.
#[derive(Debug, Default)]
pub struct MatchCache {
    pub version: u64,
    addresses: HashMap<Vec<String>, Match>,
    /// input text -> canonical name id -> ratio
    pairs: HashMap<String, HashMap<u32, f64>>,
    stats: CacheStats,
}

impl MatchCache {
    pub fn new(version: u64) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    pub fn lookup(&mut self, address: &[String]) -> Option<Match> {
        match self.addresses.get(address) {
            Some(hit) => {
                self.stats.address_hits += 1;
                Some(hit.clone())
            }
            None => {
                self.stats.address_misses += 1;
                None
            }
        }
    }

    pub fn store(&mut self, address: &[String], result: Match) {
        self.addresses.insert(address.to_vec(), result);
    }

    /// Ratio between `text` and the canonical name `id`, computed once.
    pub fn ratio(&mut self, text: &str, id: u32, names: &Interner) -> f64 {
        let per_text = self.pairs.entry_ref(text).or_default();
        match per_text.get(&id) {
            Some(&r) => {
                self.stats.pair_hits += 1;
                r
            }
            None => {
                self.stats.pair_misses += 1;
                let r = similarity::ratio(text, names.resolve(id));
                per_text.insert(id, r);
                r
            }
        }
    }

    pub fn clear(&mut self, version: u64) {
        self.version = version;
        self.addresses.clear();
        self.pairs.clear();
        self.stats = CacheStats::default();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn address_count(&self) -> usize {
        self.addresses.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interner_dedups() {
        let mut names = Interner::default();
        let a = names.intern("cavite");
        let b = names.intern("laguna");
        assert_eq!(names.intern("cavite"), a);
        assert_ne!(a, b);
        assert_eq!(names.resolve(b), "laguna");
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_pair_ratio_memoized() {
        let mut names = Interner::default();
        let id = names.intern("kawit");
        let mut cache = MatchCache::new(7);

        let first = cache.ratio("kawit", id, &names);
        let second = cache.ratio("kawit", id, &names);
        assert_eq!(first, 1.0);
        assert_eq!(first, second);
        assert_eq!(cache.stats().pair_misses, 1);
        assert_eq!(cache.stats().pair_hits, 1);

        cache.clear(8);
        assert_eq!(cache.version, 8);
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
