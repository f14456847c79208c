//! Level-specific rewrite rules.

use regex::Regex;

use crate::error::{Error, Result};
use crate::models::LevelKind;

/// Leading saint-name variants, all rewritten to "saint".
const SAINT_VARIANTS: &str = r"^(?:san|sto|sta|santo|santa)\b";

/// A single pattern -> replacement pair, applied once.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pattern: Regex,
    replacement: String,
}

impl RewriteRule {
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        let compiled = Regex::new(pattern).map_err(|source| Error::InvalidRule {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            pattern: compiled,
            replacement: replacement.into(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn apply(&self, text: &str) -> String {
        self.pattern
            .replace(text, self.replacement.as_str())
            .into_owned()
    }
}

/// Built-in rules for a level role, in application order.
///
/// Every pattern is anchored and consumes repeated qualifiers in one pass, so
/// running the rules over their own output changes nothing.
pub fn builtin(kind: LevelKind) -> Vec<RewriteRule> {
    let pairs: &[(&str, &str)] = match kind {
        LevelKind::Coarsest => &[(
            r"^(?:metropolitan manila|metro manila|national capital region|ncr)$",
            "metro manila",
        )],
        LevelKind::Middle => &[
            (r"^(?:city of\s+)+", ""),
            (r"(?:\s+city)+$", ""),
            (SAINT_VARIANTS, "saint"),
        ],
        LevelKind::Finest => &[
            (r"^(?:(?:barangay|brgy|bgy)(?:\s+no)?\s+)+", ""),
            (SAINT_VARIANTS, "saint"),
            (r"^(?:gen|hen|heneral)\b", "general"),
        ],
    };

    pairs
        .iter()
        .map(|(pattern, replacement)| {
            // Built-in patterns are constants
            RewriteRule::new(pattern, *replacement).expect("built-in rewrite rule must compile")
        })
        .collect()
}

/// Apply `rules` in order.
pub fn apply_all(rules: &[RewriteRule], text: &str) -> String {
    rules
        .iter()
        .fold(text.to_string(), |acc, rule| rule.apply(&acc))
}
