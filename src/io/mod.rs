//! Tabular file boundary: gazetteer, roster and hazard layer CSVs in, result
//! tables out. Column names are resolved once here; the engine only sees
//! typed values.

mod export;
mod gazetteer;
mod layer;
mod roster;

pub use export::{
    write_affected, write_comparison, write_incomplete, write_populated, write_resolved,
    write_scores,
};
pub use gazetteer::{load_gazetteer, read_gazetteer};
pub use layer::{load_layers, read_layer, write_layer};
pub use roster::{load_resolved, load_roster, read_resolved, read_roster, ResolvedRoster, Roster};

use anyhow::{Context, Result};
use csv::StringRecord;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Open a file for reading, transparently decompressing `.gz`.
pub fn open_reader(path: &Path) -> Result<Box<dyn Read>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(reader)
}

/// Index of each named column in `headers`.
fn column_positions(headers: &StringRecord, names: &[String]) -> Result<Vec<usize>> {
    names
        .iter()
        .map(|name| {
            headers
                .iter()
                .position(|h| h == name)
                .with_context(|| format!("Column '{}' not found", name))
        })
        .collect()
}
