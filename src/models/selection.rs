//! Hazard selection entries and the caller-owned selection list.

use serde::{Deserialize, Serialize};

/// One row of a hazard map layer. Column order matches the layer CSV
/// header `level,category,name,gid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionEntry {
    /// 1-based hierarchy level of `code`
    pub level: usize,

    /// Display label such as "province"; not used for expansion
    pub category: String,

    #[serde(rename = "name")]
    pub display_name: String,

    #[serde(rename = "gid")]
    pub code: String,
}

impl SelectionEntry {
    pub fn new(
        level: usize,
        code: impl Into<String>,
        category: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            level,
            category: category.into(),
            display_name: display_name.into(),
            code: code.into(),
        }
    }
}

/// Ordered list of selected areas. Order only matters for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    entries: Vec<SelectionEntry>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[SelectionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: SelectionEntry) {
        self.entries.push(entry);
    }

    /// Append a whole layer after the current entries.
    pub fn append<I: IntoIterator<Item = SelectionEntry>>(&mut self, layer: I) {
        self.entries.extend(layer);
    }

    /// Remove the entry at `index`, if any.
    pub fn remove(&mut self, index: usize) -> Option<SelectionEntry> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    /// Remove the most recently added entry.
    pub fn pop(&mut self) -> Option<SelectionEntry> {
        self.entries.pop()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl FromIterator<SelectionEntry> for Selection {
    fn from_iter<I: IntoIterator<Item = SelectionEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_operations() {
        let mut sel = Selection::new();
        sel.push(SelectionEntry::new(1, "P1", "province", "Province A"));
        sel.append([
            SelectionEntry::new(2, "C1", "city or municipality", "City B"),
            SelectionEntry::new(3, "B1", "barangay", "Brgy C"),
        ]);
        assert_eq!(sel.len(), 3);

        assert_eq!(sel.remove(1).map(|e| e.code), Some("C1".to_string()));
        assert_eq!(sel.remove(5), None);
        assert_eq!(sel.pop().map(|e| e.code), Some("B1".to_string()));
        assert_eq!(sel.entries()[0].code, "P1");

        sel.clear();
        assert!(sel.is_empty());
    }
}
