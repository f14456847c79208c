use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{Hierarchy, LevelKind};
use crate::normalize::{AliasTable, Normalizer};

/// Run configuration. Every section is optional; defaults describe a
/// province / city-or-municipality / barangay dataset with GADM columns.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub hierarchy: HierarchyConfig,
    pub gazetteer: GazetteerConfig,
    pub roster: RosterConfig,
    pub normalize: NormalizeConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Level labels, coarsest first
    pub levels: Vec<String>,
    /// Match only down to this level (e.g. 2 for city-level matching)
    pub finest_level: Option<usize>,
    /// Role per level (`coarsest`, `middle`, `finest`). Derived from
    /// position when absent: first is coarsest, last is finest.
    pub kinds: Option<Vec<LevelKind>>,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            levels: Hierarchy::default().labels().map(str::to_string).collect(),
            finest_level: None,
            kinds: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GazetteerConfig {
    pub code_columns: Vec<String>,
    pub name_columns: Vec<String>,
    /// Rows whose name at the matching level is one of these are dropped at load
    pub exclude_names: Vec<String>,
}

impl Default for GazetteerConfig {
    fn default() -> Self {
        Self {
            code_columns: vec!["GID_1".into(), "GID_2".into(), "GID_3".into()],
            name_columns: vec!["NAME_1".into(), "NAME_2".into(), "NAME_3".into()],
            exclude_names: vec!["n.a.".into()],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RosterConfig {
    /// Identifier column; row position is used when it is absent
    pub id_column: String,
    /// Address columns, coarsest first
    pub address_columns: Vec<String>,
    /// Categorical columns reported on
    pub group_columns: Vec<String>,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            id_column: "student_number".into(),
            address_columns: HierarchyConfig::default().levels,
            group_columns: vec!["strand".into(), "grade_level".into(), "section".into()],
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct NormalizeConfig {
    pub alias_dir: Option<PathBuf>,
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RuleConfig {
    pub level: usize,
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        let depth = self.hierarchy.levels.len();
        if depth == 0 {
            anyhow::bail!("hierarchy.levels must name at least one level");
        }
        for (what, len) in [
            ("gazetteer.code_columns", self.gazetteer.code_columns.len()),
            ("gazetteer.name_columns", self.gazetteer.name_columns.len()),
            ("roster.address_columns", self.roster.address_columns.len()),
        ] {
            if len != depth {
                anyhow::bail!("{} has {} entries, expected {}", what, len, depth);
            }
        }
        if let Some(kinds) = &self.hierarchy.kinds {
            if kinds.len() != depth {
                anyhow::bail!("hierarchy.kinds has {} entries, expected {}", kinds.len(), depth);
            }
        }
        if let Some(finest) = self.hierarchy.finest_level {
            if finest == 0 || finest > depth {
                anyhow::bail!("hierarchy.finest_level {} is outside 1..={}", finest, depth);
            }
        }
        Ok(())
    }

    /// Full hierarchy as described by the gazetteer columns.
    pub fn hierarchy(&self) -> Hierarchy {
        let labels = self.hierarchy.levels.iter().cloned();
        match &self.hierarchy.kinds {
            Some(kinds) => Hierarchy::with_kinds(labels.zip(kinds.iter().copied())),
            None => Hierarchy::new(labels),
        }
    }

    /// Hierarchy actually matched against (after `finest_level`).
    pub fn matching_hierarchy(&self) -> Result<Hierarchy> {
        let full = self.hierarchy();
        match self.hierarchy.finest_level {
            Some(level) => Ok(full.truncate(level)?),
            None => Ok(full),
        }
    }

    /// Build the normalizer: built-in rules, configured rules, then aliases
    /// from `alias_dir` (or the override).
    pub fn normalizer(&self, alias_dir: Option<&Path>) -> Result<Normalizer> {
        let hierarchy = self.matching_hierarchy()?;
        let depth = hierarchy.depth();
        let mut normalizer = Normalizer::new(hierarchy);

        for rule in self.rules_within(depth) {
            normalizer
                .add_rule(rule.level, &rule.pattern, &rule.replacement)
                .with_context(|| format!("Invalid rule for level {}", rule.level))?;
        }

        let mut aliases = AliasTable::new();
        if let Some(dir) = alias_dir.or(self.normalize.alias_dir.as_deref()) {
            aliases.load_from_dir(dir, normalizer.hierarchy())?;
        }

        Ok(normalizer.with_aliases(&aliases)?)
    }

    fn rules_within(&self, depth: usize) -> impl Iterator<Item = &RuleConfig> {
        self.normalize
            .rules
            .iter()
            .filter(move |rule| rule.level <= depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.hierarchy().depth(), 3);
        assert_eq!(config.roster.id_column, "student_number");
        assert_eq!(config.roster.address_columns[2], "barangay");
        assert_eq!(config.gazetteer.code_columns[0], "GID_1");
        assert_eq!(config.gazetteer.exclude_names, vec!["n.a.".to_string()]);
    }

    #[test]
    fn test_city_level_with_rules() {
        let config = Config::from_toml(
            r#"
[hierarchy]
finest_level = 2

[[normalize.rules]]
level = 2
pattern = "^qc$"
replacement = "quezon"

[[normalize.rules]]
level = 3
pattern = "^pob$"
replacement = "poblacion"
"#,
        )
        .unwrap();

        let normalizer = config.normalizer(None).unwrap();
        assert_eq!(normalizer.hierarchy().depth(), 2);
        assert_eq!(normalizer.normalize(2, "Q.C.").unwrap(), "quezon");
    }

    #[test]
    fn test_rejects_mismatched_columns() {
        let err = Config::from_toml(
            r#"
[hierarchy]
levels = ["province", "city"]
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("expected 2"));
    }

    #[test]
    fn test_two_level_dataset_with_city_roles() {
        let config = Config::from_toml(
            r#"
[hierarchy]
levels = ["province", "city"]
kinds = ["coarsest", "middle"]

[gazetteer]
code_columns = ["GID_1", "GID_2"]
name_columns = ["NAME_1", "NAME_2"]

[roster]
address_columns = ["province", "city"]
"#,
        )
        .unwrap();

        assert_eq!(config.hierarchy().kind(2), Some(LevelKind::Middle));
        let normalizer = config.normalizer(None).unwrap();
        assert_eq!(normalizer.normalize(2, "Sta. Rosa City").unwrap(), "saint rosa");

        let mismatched = r#"
[hierarchy]
levels = ["province", "city"]
kinds = ["coarsest"]

[gazetteer]
code_columns = ["GID_1", "GID_2"]
name_columns = ["NAME_1", "NAME_2"]

[roster]
address_columns = ["province", "city"]
"#;
        let err = Config::from_toml(mismatched).unwrap_err();
        assert!(err.to_string().contains("hierarchy.kinds"));
    }

    #[test]
    fn test_rejects_bad_finest_level() {
        assert!(Config::from_toml("[hierarchy]\nfinest_level = 5\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hazmap.toml");
        fs::write(&path, "[roster]\nid_column = \"obf_email\"\n").unwrap();
        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.roster.id_column, "obf_email");
        assert!(Config::load_from_file(dir.path().join("missing.toml")).is_err());
    }
}
