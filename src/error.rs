//! Error types for the resolution and membership engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// One or more address fields are missing or normalize to nothing.
    #[error("incomplete address: missing {}", missing.join(", "))]
    IncompleteAddress { missing: Vec<String> },

    /// Matching was attempted against a gazetteer with no rows.
    #[error("gazetteer has no rows")]
    EmptyGazetteer,

    /// An address or row does not carry one value per hierarchy level.
    #[error("expected {expected} levels, found {found}")]
    ArityMismatch { expected: usize, found: usize },

    /// A level number outside `1..=depth`.
    #[error("level {level} is outside 1..={depth}")]
    InvalidLevel { level: usize, depth: usize },

    /// A code at some level was seen with two different parent codes.
    #[error("code '{code}' at level {level} has parents '{first_parent}' and '{second_parent}'")]
    InconsistentHierarchy {
        level: usize,
        code: String,
        first_parent: String,
        second_parent: String,
    },

    /// Two gazetteer rows share a finest-level code.
    #[error("duplicate finest-level code '{code}'")]
    DuplicateCode { code: String },

    /// A gazetteer row has an empty code.
    #[error("row {row} has an empty code at level {level}")]
    EmptyCode { row: usize, level: usize },

    /// A rewrite rule failed to compile.
    #[error("invalid rewrite pattern '{pattern}': {source}")]
    InvalidRule {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_address_message() {
        let err = Error::IncompleteAddress {
            missing: vec!["city_municipality".into(), "barangay".into()],
        };
        assert_eq!(
            err.to_string(),
            "incomplete address: missing city_municipality, barangay"
        );
    }

    #[test]
    fn test_arity_message() {
        let err = Error::ArityMismatch {
            expected: 3,
            found: 2,
        };
        assert_eq!(err.to_string(), "expected 3 levels, found 2");
    }
}
