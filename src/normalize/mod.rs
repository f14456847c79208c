//! Text normalization for free-text address fields and gazetteer names.
//!
//! Both sides of a comparison go through the same pipeline:
//! trim, strip punctuation, lower-case, fold diacritics, collapse whitespace,
//! apply the level's rewrite rules, trim, then apply whole-name aliases.

mod aliases;
mod rules;

pub use aliases::AliasTable;
pub use rules::RewriteRule;

use hashbrown::HashMap;
use tracing::{debug, warn};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use xxhash_rust::xxh64::Xxh64;

use crate::error::{Error, Result};
use crate::models::Hierarchy;

/// Characters removed outright.
const STRIPPED: &[char] = &['.', ',', '\'', '\u{2019}', '-'];

/// Level-aware normalizer. Cheap to share by reference; holds no mutable state.
#[derive(Debug, Clone)]
pub struct Normalizer {
    hierarchy: Hierarchy,
    /// Rewrite rules per level (index = level - 1)
    rules: Vec<Vec<RewriteRule>>,
    /// Whole-name aliases per level (index = level - 1)
    aliases: Vec<HashMap<String, String>>,
}

impl Normalizer {
    /// Normalizer with the built-in rules for each level's role.
    pub fn new(hierarchy: Hierarchy) -> Self {
        let rules = hierarchy
            .levels()
            .map(|(_, level)| rules::builtin(level.kind))
            .collect();
        let aliases = vec![HashMap::new(); hierarchy.depth()];
        Self {
            hierarchy,
            rules,
            aliases,
        }
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// Append a rewrite rule to `level`, after the existing ones.
    pub fn add_rule(&mut self, level: usize, pattern: &str, replacement: &str) -> Result<()> {
        self.hierarchy.check_level(level)?;
        let rule = RewriteRule::new(pattern, replacement)?;
        debug!("Added rule at level {}: {}", level, rule.pattern());
        self.rules[level - 1].push(rule);
        Ok(())
    }

    /// Install whole-name aliases. Variants and canonical names are normalized
    /// first; chains (`a -> b`, `b -> c`) are collapsed to `a -> c` and cycles
    /// are dropped.
    pub fn with_aliases(mut self, table: &AliasTable) -> Result<Self> {
        let mut maps = vec![HashMap::new(); self.hierarchy.depth()];

        for (level, variant, canonical) in table.entries() {
            if self.hierarchy.check_level(level).is_err() {
                warn!("Alias for unknown level {} ignored", level);
                continue;
            }
            let variant = self.rewrite(level, &clean(variant));
            let canonical = self.rewrite(level, &clean(canonical));
            if variant.is_empty() || canonical.is_empty() || variant == canonical {
                continue;
            }
            maps[level - 1].insert(variant, canonical);
        }

        for (i, map) in maps.iter_mut().enumerate() {
            *map = collapse_chains(std::mem::take(map), i + 1);
        }

        self.aliases = maps;
        Ok(self)
    }

    /// Canonical comparison form of `raw` at 1-based `level`.
    ///
    /// Blank input is rejected rather than normalized.
    pub fn normalize(&self, level: usize, raw: &str) -> Result<String> {
        self.hierarchy.check_level(level)?;
        if raw.trim().is_empty() {
            return Err(Error::IncompleteAddress {
                missing: vec![self.level_label(level)],
            });
        }

        let text = self.rewrite(level, &clean(raw));
        Ok(match self.aliases[level - 1].get(&text) {
            Some(canonical) => canonical.clone(),
            None => text,
        })
    }

    /// Normalize one full address, coarsest first.
    pub fn normalize_address<S: AsRef<str>>(&self, address: &[S]) -> Result<Vec<String>> {
        if address.len() != self.hierarchy.depth() {
            return Err(Error::ArityMismatch {
                expected: self.hierarchy.depth(),
                found: address.len(),
            });
        }

        address
            .iter()
            .enumerate()
            .map(|(i, raw)| self.normalize(i + 1, raw.as_ref()))
            .collect()
    }

    /// Fingerprint of the levels, rules and aliases. Two normalizers with the
    /// same fingerprint produce the same canonical text.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = Xxh64::new(0);
        for (i, (_, level)) in self.hierarchy.levels().enumerate() {
            hasher.update(level.label.as_bytes());
            hasher.update(&[level.kind as u8, 0x1e]);
            for rule in &self.rules[i] {
                hasher.update(rule.pattern().as_bytes());
                hasher.update(&[0x1f]);
                hasher.update(rule.replacement().as_bytes());
                hasher.update(&[0x1e]);
            }
            let mut aliases: Vec<(&String, &String)> = self.aliases[i].iter().collect();
            aliases.sort();
            for (variant, canonical) in aliases {
                hasher.update(variant.as_bytes());
                hasher.update(&[0x1f]);
                hasher.update(canonical.as_bytes());
                hasher.update(&[0x1e]);
            }
            hasher.update(&[0x1d]);
        }
        hasher.digest()
    }

    fn rewrite(&self, level: usize, cleaned: &str) -> String {
        rules::apply_all(&self.rules[level - 1], cleaned)
            .trim()
            .to_string()
    }

    fn level_label(&self, level: usize) -> String {
        self.hierarchy
            .label(level)
            .map(str::to_string)
            .unwrap_or_else(|| format!("level {}", level))
    }
}

/// Level-independent cleanup: punctuation, case, diacritics, whitespace.
pub fn clean(raw: &str) -> String {
    let stripped: String = raw
        .trim()
        .chars()
        .filter(|c| !STRIPPED.contains(c))
        .map(|c| if c == '_' { ' ' } else { c })
        .collect();

    let folded: String = stripped
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collapse_chains(map: HashMap<String, String>, level: usize) -> HashMap<String, String> {
    let mut resolved = HashMap::with_capacity(map.len());

    'variants: for (variant, canonical) in &map {
        let mut target = canonical;
        let mut hops = 0;
        while let Some(next) = map.get(target) {
            hops += 1;
            if next == variant || hops > map.len() {
                warn!("Alias cycle at level {} involving '{}'", level, variant);
                continue 'variants;
            }
            target = next;
        }
        resolved.insert(variant.clone(), target.clone());
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::new(Hierarchy::default())
    }

    #[test]
    fn test_clean() {
        assert_eq!(clean("  Sto. Niño  "), "sto nino");
        assert_eq!(clean("Dasmariñas-City"), "dasmarinascity");
        assert_eq!(clean("St. John's"), "st johns");
        assert_eq!(clean("province_a"), "province a");
        assert_eq!(clean("Las   Piñas,  City"), "las pinas city");
        assert_eq!(clean("PARAÑAQUE"), "paranaque");
    }

    #[test]
    fn test_scenario_address() {
        let n = normalizer();
        let out = n
            .normalize_address(&["Province A", "City B City", "Brgy. C"])
            .unwrap();
        assert_eq!(out, vec!["province a", "city b", "c"]);
    }

    #[test]
    fn test_gazetteer_style_names() {
        let n = normalizer();
        let out = n.normalize_address(&["province_a", "city_b", "brgy_c"]).unwrap();
        assert_eq!(out, vec!["province a", "city b", "c"]);
        assert_eq!(n.normalize(1, "Metropolitan Manila").unwrap(), "metro manila");
        assert_eq!(n.normalize(2, "San Juan City").unwrap(), "saint juan");
        assert_eq!(n.normalize(3, "Gen. T. de Leon").unwrap(), "general t de leon");
    }

    #[test]
    fn test_idempotent() {
        let n = normalizer();
        let samples = [
            "  - San Pedro City City ",
            "Brgy. Brgy. Sta. Cruz",
            "barangay no. 12",
            "Hen. Luna",
            "City of San Fernando City",
            "NCR",
            "Ñ",
            "  Quezon   City  ",
            "st. peter",
            "Santo Tomas",
        ];
        for level in 1..=3 {
            for s in samples {
                let once = n.normalize(level, s).unwrap();
                if once.is_empty() {
                    continue;
                }
                let twice = n.normalize(level, &once).unwrap();
                assert_eq!(once, twice, "level {} input {:?}", level, s);
            }
        }
    }

    #[test]
    fn test_blank_and_bad_level_rejected() {
        let n = normalizer();
        assert!(matches!(
            n.normalize(3, "   "),
            Err(Error::IncompleteAddress { missing }) if missing == vec!["barangay".to_string()]
        ));
        assert!(matches!(
            n.normalize(4, "x"),
            Err(Error::InvalidLevel { level: 4, depth: 3 })
        ));
        assert!(matches!(
            n.normalize_address(&["a", "b"]),
            Err(Error::ArityMismatch {
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn test_extra_rule() {
        let mut n = normalizer();
        n.add_rule(3, r"^pob$", "poblacion").unwrap();
        assert_eq!(n.normalize(3, "Pob.").unwrap(), "poblacion");
        assert!(n.add_rule(7, "x", "y").is_err());
    }

    #[test]
    fn test_aliases_normalized_and_chained() {
        let mut table = AliasTable::new();
        table.insert(2, "QC", "Kyusi");
        table.insert(2, "Kyusi", "Quezon City");
        table.insert(3, "a", "b");
        table.insert(3, "b", "a");
        let n = normalizer().with_aliases(&table).unwrap();

        assert_eq!(n.normalize(2, "Q.C.").unwrap(), "quezon");
        assert_eq!(n.normalize(2, "kyusi").unwrap(), "quezon");
        // cycle dropped
        assert_eq!(n.normalize(3, "a").unwrap(), "a");
        let once = n.normalize(2, "QC").unwrap();
        assert_eq!(n.normalize(2, &once).unwrap(), once);
    }

    #[test]
    fn test_fingerprint_follows_rules_and_aliases() {
        let base = Normalizer::new(Hierarchy::default());
        assert_eq!(base.fingerprint(), Normalizer::new(Hierarchy::default()).fingerprint());

        let mut with_rule = Normalizer::new(Hierarchy::default());
        with_rule.add_rule(3, "^pob$", "poblacion").unwrap();
        assert_ne!(with_rule.fingerprint(), base.fingerprint());

        let mut table = AliasTable::new();
        table.insert(2, "QC", "Quezon");
        let with_alias = Normalizer::new(Hierarchy::default()).with_aliases(&table).unwrap();
        assert_ne!(with_alias.fingerprint(), base.fingerprint());
    }
}
