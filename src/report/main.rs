//! Hazard exposure report.
//!
//! Expands hazard map layers over the gazetteer and reports how many
//! resolved individuals live inside them, overall and per group.

mod render;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use hazmap::hazard::{SkippedEntry, Summary};
use hazmap::io::{load_gazetteer, load_layers, load_resolved, write_affected, write_populated};
use hazmap::{classify, expand, populated_areas, Config};

use crate::render::{render_skipped, render_summary};

#[derive(Parser, Debug)]
#[command(name = "report")]
#[command(about = "Report individuals living inside hazard areas")]
struct Args {
    /// Gazetteer CSV (optionally .gz)
    #[arg(short, long)]
    gazetteer: PathBuf,

    /// Resolved roster written by `resolve`
    #[arg(short, long)]
    resolved: PathBuf,

    /// Hazard layer CSV (level,category,name,gid); repeat to combine layers
    #[arg(short, long = "layer", required = true)]
    layers: Vec<PathBuf>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Group column; repeat for several. Defaults to roster.group_columns
    #[arg(long = "group")]
    groups: Vec<String>,

    /// Group value always reported even when empty, as `column=value`
    /// (e.g. `strand=STEM`); repeat for several
    #[arg(long = "expect", value_parser = parse_expectation)]
    expected: Vec<(String, String)>,

    /// Write affected individuals to this CSV
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Write populated gazetteer areas to this CSV
    #[arg(long)]
    populated: Option<PathBuf>,

    /// Print statistics as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    generated_at: DateTime<Utc>,
    gazetteer_version: String,
    selection_entries: usize,
    member_codes: usize,
    duplicate_entries: usize,
    skipped: &'a [SkippedEntry],
    #[serde(flatten)]
    summary: Summary,
}

fn parse_expectation(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => anyhow::bail!("expected `column=value`, got '{}'", raw),
    }
}

/// Expected values of each group column, in flag order.
fn expected_by_group<'a>(
    groups: &[&'a str],
    expected: &'a [(String, String)],
) -> Vec<(&'a str, Vec<&'a str>)> {
    groups
        .iter()
        .map(|&group| {
            let values = expected
                .iter()
                .filter(|(key, _)| key == group)
                .map(|(_, value)| value.as_str())
                .collect();
            (group, values)
        })
        .collect()
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn default_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging, RUST_LOG takes precedence over --verbose
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(args.verbose)));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Hazmap Report");

    let config = Config::load_or_default(args.config.as_deref())?;
    let gazetteer = load_gazetteer(&args.gazetteer, &config)?;
    let table = load_resolved(&args.resolved)?;
    let selection = load_layers(args.layers.as_slice())?;

    let expansion = expand(selection.entries(), &gazetteer);
    info!(
        "{} selection entries cover {} areas ({} skipped, {} duplicates)",
        selection.len(),
        expansion.members.len(),
        expansion.skipped.len(),
        expansion.duplicates
    );
    if !expansion.skipped.is_empty() {
        warn!(
            "Skipped selection entries:\n{}",
            render_skipped(&expansion.skipped)
        );
    }

    let classification = classify(&table.records, &expansion.members);

    let groups: Vec<&str> = if args.groups.is_empty() {
        config
            .roster
            .group_columns
            .iter()
            .map(String::as_str)
            .filter(|g| table.attribute_columns.iter().any(|c| c.as_str() == *g))
            .collect()
    } else {
        args.groups.iter().map(String::as_str).collect()
    };
    for (key, value) in &args.expected {
        if !groups.contains(&key.as_str()) {
            warn!("Ignoring expected value '{}' for unreported column '{}'", value, key);
        }
    }
    let expected = expected_by_group(&groups, &args.expected);
    let specs: Vec<(&str, &[&str])> = expected
        .iter()
        .map(|(group, values)| (*group, values.as_slice()))
        .collect();
    let summary = classification.summary(&specs);

    if let Some(path) = &args.out {
        write_affected(create(path)?, &classification, &gazetteer, &groups)?;
        info!("Wrote {} affected individuals to {}", summary.affected, path.display());
    }

    if let Some(path) = &args.populated {
        let areas = populated_areas(&gazetteer, &table.records);
        write_populated(create(path)?, gazetteer.hierarchy(), &areas)?;
        info!("Wrote {} populated areas to {}", areas.len(), path.display());
    }

    if args.json {
        let report = Report {
            generated_at: Utc::now(),
            gazetteer_version: format!("{:016x}", gazetteer.version()),
            selection_entries: selection.len(),
            member_codes: expansion.members.len(),
            duplicate_entries: expansion.duplicates,
            skipped: &expansion.skipped,
            summary,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_summary(&summary));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_level() {
        use tracing::level_filters::LevelFilter;

        let quiet = EnvFilter::new(default_level(false));
        assert_eq!(quiet.max_level_hint(), Some(LevelFilter::INFO));
        let verbose = EnvFilter::new(default_level(true));
        assert_eq!(verbose.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_parse_expectation() {
        assert_eq!(
            parse_expectation("strand = STEM").unwrap(),
            ("strand".to_string(), "STEM".to_string())
        );
        assert!(parse_expectation("STEM").is_err());
        assert!(parse_expectation("=STEM").is_err());
    }

    #[test]
    fn test_expected_values_grouped_per_column() {
        let expected = vec![
            ("strand".to_string(), "STEM".to_string()),
            ("grade_level".to_string(), "12".to_string()),
            ("strand".to_string(), "ABM".to_string()),
        ];
        let specs = expected_by_group(&["strand", "grade_level", "section"], &expected);
        assert_eq!(
            specs,
            vec![
                ("strand", vec!["STEM", "ABM"]),
                ("grade_level", vec!["12"]),
                ("section", vec![]),
            ]
        );
    }
}
