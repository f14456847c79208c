//! Hazard map layer files: `level,category,name,gid`.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Writer};
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

use super::open_reader;
use crate::models::{Selection, SelectionEntry};

const LAYER_HEADER: [&str; 4] = ["level", "category", "name", "gid"];

/// Read one layer. The header must be exactly `level,category,name,gid`.
pub fn read_layer<R: Read>(reader: R) -> Result<Vec<SelectionEntry>> {
    let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    if headers.iter().ne(LAYER_HEADER) {
        anyhow::bail!(
            "Invalid layer header '{}', expected '{}'",
            headers.iter().collect::<Vec<_>>().join(","),
            LAYER_HEADER.join(",")
        );
    }

    csv_reader
        .deserialize()
        .enumerate()
        .map(|(i, row)| row.with_context(|| format!("Invalid layer row {}", i + 1)))
        .collect()
}

/// Load layers in order, appending each to one selection.
pub fn load_layers<P: AsRef<Path>>(paths: &[P]) -> Result<Selection> {
    let mut selection = Selection::new();
    for path in paths {
        let path = path.as_ref();
        let entries = read_layer(open_reader(path)?)
            .with_context(|| format!("Failed to load layer {}", path.display()))?;
        info!("Loaded {} entries from {}", entries.len(), path.display());
        selection.append(entries);
    }
    Ok(selection)
}

pub fn write_layer<W: Write>(writer: W, selection: &Selection) -> Result<()> {
    let mut csv_writer = Writer::from_writer(writer);
    if selection.is_empty() {
        csv_writer.write_record(LAYER_HEADER)?;
    }
    for entry in selection.entries() {
        csv_writer.serialize(entry)?;
    }
    csv_writer.flush()?;
    Ok(())
}
