use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;
use tracing::info;

use super::{column_positions, open_reader};
use crate::config::Config;
use crate::models::{Gazetteer, GazetteerRow};

/// Load the gazetteer CSV (optionally gzipped) and cut it to the configured
/// matching level.
pub fn load_gazetteer(path: &Path, config: &Config) -> Result<Gazetteer> {
    info!("Loading gazetteer from {}", path.display());
    let reader = open_reader(path)?;
    read_gazetteer(reader, config)
        .with_context(|| format!("Failed to load gazetteer {}", path.display()))
}

/// Read gazetteer rows from any CSV source. Extra columns (geometry, ...) are ignored.
pub fn read_gazetteer<R: Read>(reader: R, config: &Config) -> Result<Gazetteer> {
    let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let code_idx = column_positions(&headers, &config.gazetteer.code_columns)?;
    let name_idx = column_positions(&headers, &config.gazetteer.name_columns)?;

    // Exclusions apply to names at the level matched against
    let match_level = config
        .hierarchy
        .finest_level
        .unwrap_or(config.hierarchy.levels.len());
    let mut rows = Vec::new();
    let mut excluded = 0usize;

    for result in csv_reader.records() {
        let record = result?;
        let field = |i: usize| record.get(i).unwrap_or_default().trim().to_string();

        let row = GazetteerRow {
            codes: code_idx.iter().map(|&i| field(i)).collect(),
            names: name_idx.iter().map(|&i| field(i)).collect(),
        };

        if config
            .gazetteer
            .exclude_names
            .iter()
            .any(|n| Some(n.as_str()) == row.name(match_level))
        {
            excluded += 1;
            continue;
        }

        rows.push(row);
    }

    info!("Loaded {} gazetteer rows ({} excluded)", rows.len(), excluded);

    let gazetteer = Gazetteer::new(config.hierarchy(), rows)?;
    match config.hierarchy.finest_level {
        Some(level) => Ok(gazetteer.truncate(level)?),
        None => Ok(gazetteer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const CSV: &str = "\
GID_0,GID_1,NAME_1,GID_2,NAME_2,GID_3,NAME_3,geometry
PHL,P1,Cavite,C1,Kawit,B1,Binakayan,POLYGON
PHL,P1,Cavite,C1,Kawit,B2,n.a.,POLYGON
PHL,P1,Cavite,C2,Imus,B3,Poblacion,POLYGON
";

    #[test]
    fn test_reads_configured_columns_and_excludes() {
        let gaz = read_gazetteer(CSV.as_bytes(), &Config::default()).unwrap();
        assert_eq!(gaz.len(), 2);
        let row = gaz.find("B3").unwrap();
        assert_eq!(row.codes, vec!["P1", "C2", "B3"]);
        assert_eq!(row.names, vec!["Cavite", "Imus", "Poblacion"]);
        assert!(gaz.find("B2").is_none());
    }

    #[test]
    fn test_missing_column() {
        let err = read_gazetteer("GID_1,NAME_1\nP1,A\n".as_bytes(), &Config::default()).unwrap_err();
        assert!(err.to_string().contains("GID_2"));
    }

    #[test]
    fn test_truncated_by_config() {
        let config = Config::from_toml("[hierarchy]\nfinest_level = 2\n").unwrap();
        let gaz = read_gazetteer(CSV.as_bytes(), &config).unwrap();
        assert_eq!(gaz.depth(), 2);
        assert_eq!(gaz.len(), 2);
        assert!(gaz.find("C2").is_some());
    }

    #[test]
    fn test_load_gzipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gadm.csv.gz");
        let mut enc = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::default());
        enc.write_all(CSV.as_bytes()).unwrap();
        enc.finish().unwrap();

        let gaz = load_gazetteer(&path, &Config::default()).unwrap();
        assert_eq!(gaz.len(), 2);
    }
}
