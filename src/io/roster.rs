use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use super::{column_positions, open_reader};
use crate::config::Config;
use crate::models::{Individual, ResolvedIndividual};

/// Column names written by [`super::write_resolved`] and read back by [`read_resolved`].
pub(crate) const ID_COLUMN: &str = "id";
pub(crate) const CODE_COLUMN: &str = "resolved_code";
pub(crate) const SCORE_COLUMN: &str = "match_score";

/// A roster snapshot with its column layout.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    /// Non-address, non-id columns in file order
    pub attribute_columns: Vec<String>,
    /// Address columns, coarsest first
    pub address_columns: Vec<String>,
    pub individuals: Vec<Individual>,
}

pub fn load_roster(path: &Path, config: &Config) -> Result<Roster> {
    info!("Loading roster from {}", path.display());
    let reader = open_reader(path)?;
    read_roster(reader, config).with_context(|| format!("Failed to load roster {}", path.display()))
}

/// Read a roster. Blank address cells become missing fields; when the id
/// column is absent the 0-based row position is the identifier.
pub fn read_roster<R: Read>(reader: R, config: &Config) -> Result<Roster> {
    let depth = config.matching_hierarchy()?.depth();
    let address_columns: Vec<String> = config.roster.address_columns[..depth].to_vec();

    let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let address_idx = column_positions(&headers, &address_columns)?;
    let id_idx = headers.iter().position(|h| h == config.roster.id_column);
    if id_idx.is_none() {
        warn!(
            "Column '{}' not found, using row position as identifier",
            config.roster.id_column
        );
    }

    let attribute_idx: Vec<usize> = (0..headers.len())
        .filter(|i| Some(*i) != id_idx && !address_idx.contains(i))
        .collect();

    let mut individuals = Vec::new();
    for (row, result) in csv_reader.records().enumerate() {
        let record = result?;
        let id = match id_idx {
            Some(i) => record.get(i).unwrap_or_default().trim().to_string(),
            None => row.to_string(),
        };

        let address = address_idx.iter().map(|&i| {
            record
                .get(i)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        });

        let mut individual = Individual::new(id, address);
        individual.attributes = attribute_idx
            .iter()
            .map(|&i| (headers[i].to_string(), record.get(i).unwrap_or_default().to_string()))
            .collect::<BTreeMap<_, _>>();
        individuals.push(individual);
    }

    info!("Loaded {} roster entries", individuals.len());

    Ok(Roster {
        attribute_columns: attribute_idx.iter().map(|&i| headers[i].to_string()).collect(),
        address_columns,
        individuals,
    })
}

/// A previously exported resolved roster.
#[derive(Debug, Clone, Default)]
pub struct ResolvedRoster {
    pub attribute_columns: Vec<String>,
    pub records: Vec<ResolvedIndividual>,
}

pub fn load_resolved(path: &Path) -> Result<ResolvedRoster> {
    info!("Loading resolved roster from {}", path.display());
    let reader = open_reader(path)?;
    read_resolved(reader).with_context(|| format!("Failed to load {}", path.display()))
}

/// Read a resolved roster written by [`super::write_resolved`]. Every column
/// other than id, code and score becomes an attribute.
pub fn read_resolved<R: Read>(reader: R) -> Result<ResolvedRoster> {
    let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let fixed = column_positions(&headers, &[ID_COLUMN.to_string(), CODE_COLUMN.to_string()])?;
    let (id_idx, code_idx) = (fixed[0], fixed[1]);
    let score_idx = headers.iter().position(|h| h == SCORE_COLUMN);

    let attribute_idx: Vec<usize> = (0..headers.len())
        .filter(|&i| i != id_idx && i != code_idx && Some(i) != score_idx)
        .collect();

    let mut records = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        let mut individual = Individual::new(
            record.get(id_idx).unwrap_or_default().trim(),
            std::iter::empty::<Option<String>>(),
        );
        individual.attributes = attribute_idx
            .iter()
            .map(|&i| (headers[i].to_string(), record.get(i).unwrap_or_default().to_string()))
            .collect();

        let score = match score_idx.and_then(|i| record.get(i)).map(str::trim) {
            Some(s) if !s.is_empty() => Some(
                s.parse::<f64>()
                    .with_context(|| format!("Invalid match score '{}'", s))?,
            ),
            _ => None,
        };

        let code = record.get(code_idx).unwrap_or_default().trim();
        records.push(if code.is_empty() {
            ResolvedIndividual::unresolved(individual)
        } else {
            ResolvedIndividual::with_code(individual, code, score)
        });
    }

    info!("Loaded {} resolved records", records.len());

    Ok(ResolvedRoster {
        attribute_columns: attribute_idx.iter().map(|&i| headers[i].to_string()).collect(),
        records,
    })
}
