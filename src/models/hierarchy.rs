//! Administrative hierarchy description (depth and level labels).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Role of a level within the hierarchy. Rewrite rules are chosen by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelKind {
    /// Province / region
    Coarsest,
    /// City / municipality
    Middle,
    /// Barangay / neighbourhood
    Finest,
}

impl LevelKind {
    /// Role of 1-based `level` in a hierarchy of `depth` levels.
    pub fn from_position(level: usize, depth: usize) -> Self {
        if level <= 1 {
            LevelKind::Coarsest
        } else if level >= depth {
            LevelKind::Finest
        } else {
            LevelKind::Middle
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub label: String,
    pub kind: LevelKind,
}

/// Ordered levels, coarsest first. Levels are addressed 1-based throughout the crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hierarchy {
    levels: Vec<Level>,
}

impl Default for Hierarchy {
    fn default() -> Self {
        Self::new(["province", "city_municipality", "barangay"])
    }
}

impl Hierarchy {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        let depth = labels.len();
        let levels = labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| Level {
                label,
                kind: LevelKind::from_position(i + 1, depth),
            })
            .collect();
        Self { levels }
    }

    /// Hierarchy with explicit roles, e.g. a two-level province / city
    /// dataset whose second level should use the city rules.
    pub fn with_kinds<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = (S, LevelKind)>,
        S: Into<String>,
    {
        let levels = levels
            .into_iter()
            .map(|(label, kind)| Level {
                label: label.into(),
                kind,
            })
            .collect();
        Self { levels }
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn check_level(&self, level: usize) -> Result<()> {
        if level == 0 || level > self.depth() {
            return Err(Error::InvalidLevel {
                level,
                depth: self.depth(),
            });
        }
        Ok(())
    }

    pub fn level(&self, level: usize) -> Option<&Level> {
        level.checked_sub(1).and_then(|i| self.levels.get(i))
    }

    pub fn label(&self, level: usize) -> Option<&str> {
        self.level(level).map(|l| l.label.as_str())
    }

    pub fn kind(&self, level: usize) -> Option<LevelKind> {
        self.level(level).map(|l| l.kind)
    }

    /// Iterate `(level, &Level)` pairs, coarsest first.
    pub fn levels(&self) -> impl Iterator<Item = (usize, &Level)> {
        self.levels.iter().enumerate().map(|(i, l)| (i + 1, l))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.levels.iter().map(|l| l.label.as_str())
    }

    /// Keep levels `1..=finest`. Level roles are preserved, so a three-level
    /// hierarchy cut at level 2 keeps city rules on its last level.
    pub fn truncate(&self, finest: usize) -> Result<Self> {
        self.check_level(finest)?;
        Ok(Self {
            levels: self.levels[..finest].to_vec(),
        })
    }
}
