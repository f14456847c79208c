//! Roster resolution.
//!
//! Loads the gazetteer and roster, normalizes and matches every address,
//! and writes the resolved roster plus review tables to an output directory.

mod summary;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use hazmap::io::{
    load_gazetteer, load_roster, write_comparison, write_incomplete, write_resolved, write_scores,
};
use hazmap::{Config, Matcher, Resolver};

use crate::summary::RunSummary;

#[derive(Parser, Debug)]
#[command(name = "resolve")]
#[command(about = "Resolve roster addresses against an administrative gazetteer")]
struct Args {
    /// Gazetteer CSV (optionally .gz)
    #[arg(short, long)]
    gazetteer: PathBuf,

    /// Roster CSV (optionally .gz)
    #[arg(short, long)]
    roster: PathBuf,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Alias directory, overrides normalize.alias_dir
    #[arg(long)]
    aliases: Option<PathBuf>,

    /// Directory for output tables
    #[arg(short, long, default_value = "out")]
    out_dir: PathBuf,

    /// Also write raw vs normalized text per level
    #[arg(long)]
    comparison: bool,

    /// Also write per-level match scores
    #[arg(long)]
    scores: bool,

    /// Sort the resolved roster by ascending score
    #[arg(long)]
    sort_by_score: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
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
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Hazmap Resolve");
    let started_at = Utc::now();

    let config = Config::load_or_default(args.config.as_deref())?;
    let normalizer = config.normalizer(args.aliases.as_deref())?;
    let gazetteer = Arc::new(load_gazetteer(&args.gazetteer, &config)?);
    let roster = load_roster(&args.roster, &config)?;

    let matcher = Matcher::new(gazetteer.clone(), &normalizer)?;
    let mut resolver = Resolver::new(normalizer, matcher)?;

    let pb = ProgressBar::new(roster.individuals.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    let resolution = resolver
        .resolve_with(&roster.individuals, |done| pb.set_position(done as u64))
        .context("Resolution failed")?;
    pb.finish_with_message("Resolution complete");

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;
    let create = |name: &str| -> Result<BufWriter<File>> {
        let path = args.out_dir.join(name);
        let file =
            File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
        Ok(BufWriter::new(file))
    };

    write_resolved(
        create("resolved.csv")?,
        &roster,
        &resolution.resolved,
        &gazetteer,
        args.sort_by_score,
    )?;
    write_incomplete(create("incomplete.csv")?, &resolution.incomplete)?;

    if args.comparison {
        write_comparison(create("comparison.csv")?, gazetteer.hierarchy(), &resolution.resolved)?;
    }
    if args.scores {
        write_scores(create("scores.csv")?, gazetteer.hierarchy(), &resolution.resolved)?;
    }

    if !resolution.incomplete.is_empty() {
        warn!(
            "{} individuals have incomplete addresses, see incomplete.csv",
            resolution.incomplete.len()
        );
    }

    let summary = RunSummary::new(
        started_at,
        gazetteer.version(),
        gazetteer.len(),
        gazetteer.depth(),
        &resolution,
        resolver.matcher().cache_stats(),
    );
    serde_json::to_writer_pretty(create("summary.json")?, &summary)?;

    info!(
        "Resolved {} of {} individuals into {}",
        summary.resolved,
        summary.individuals,
        args.out_dir.display()
    );

    Ok(())
}
