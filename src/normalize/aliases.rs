use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::models::Hierarchy;

/// Raw whole-name aliases per level, as read from alias files.
///
/// Entries are kept as written; [`super::Normalizer::with_aliases`] runs them
/// through the normalization pipeline before use.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    /// (level, variant, canonical)
    entries: Vec<(usize, String, String)>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, level: usize, variant: impl Into<String>, canonical: impl Into<String>) {
        self.entries.push((level, variant.into(), canonical.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (usize, &str, &str)> {
        self.entries
            .iter()
            .map(|(level, v, c)| (*level, v.as_str(), c.as_str()))
    }

    /// Load alias files from a directory, recursively.
    ///
    /// Each `.txt` file applies to the level whose label equals the file stem
    /// (`province.txt`, `barangay.txt`, ...). Files for unknown levels are skipped.
    pub fn load_from_dir<P: AsRef<Path>>(&mut self, dir: P, hierarchy: &Hierarchy) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.exists() {
            warn!("Alias directory not found: {}", dir.display());
            return Ok(());
        }

        info!("Loading aliases from {}", dir.display());

        for entry in WalkDir::new(dir).follow_links(true) {
            let entry = entry?;
            let path = entry.path();

            if !path.is_file() || path.extension().map_or(true, |e| e != "txt") {
                continue;
            }

            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            let level = match hierarchy.levels().find(|(_, l)| l.label == stem) {
                Some((level, _)) => level,
                None => {
                    warn!("Skipping alias file for unknown level: {}", path.display());
                    continue;
                }
            };

            self.load_file(path, level)?;
        }

        info!("Loaded {} alias mappings", self.entries.len());
        Ok(())
    }

    fn load_file(&mut self, path: &Path, level: usize) -> Result<()> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read alias file: {}", path.display()))?;
        self.parse(&content, level)
    }

    /// Parse alias lines for one level.
    ///
    /// `a, b => c` maps `a` and `b` to `c`; `c, a, b` maps `a` and `b` to the
    /// first item. `#` starts a comment.
    pub fn parse(&mut self, content: &str, level: usize) -> Result<()> {
        let comment_regex = Regex::new(r"#.*")?;

        for line in content.lines() {
            let line = comment_regex.replace(line, "");
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (lefts, canonical) = match line.split_once("=>") {
                Some((left, right)) => {
                    let canonical = right.split(',').next().unwrap_or_default().trim();
                    (left.split(',').collect::<Vec<_>>(), canonical)
                }
                None => {
                    let mut parts = line.split(',');
                    let canonical = parts.next().unwrap_or_default().trim();
                    (parts.collect::<Vec<_>>(), canonical)
                }
            };

            if canonical.is_empty() {
                continue;
            }

            for variant in lefts {
                let variant = variant.trim();
                if !variant.is_empty() && variant != canonical {
                    self.insert(level, variant, canonical);
                }
            }
        }
        Ok(())
    }
}
