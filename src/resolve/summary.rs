//! Machine-readable record of one resolve run.

use chrono::{DateTime, Utc};
use serde::Serialize;

use hazmap::matcher::CacheStats;
use hazmap::Resolution;

#[derive(Debug, Serialize)]
pub struct ScoreStats {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// xxh64 fingerprint of the gazetteer, hex
    pub gazetteer_version: String,
    pub gazetteer_rows: usize,
    pub depth: usize,
    pub individuals: usize,
    pub resolved: usize,
    pub perfect: usize,
    pub incomplete: usize,
    pub duplicate_ids: Vec<String>,
    pub scores: Option<ScoreStats>,
    pub cache: CacheStats,
}

impl RunSummary {
    pub fn new(
        started_at: DateTime<Utc>,
        gazetteer_version: u64,
        gazetteer_rows: usize,
        depth: usize,
        resolution: &Resolution,
        cache: CacheStats,
    ) -> Self {
        Self {
            started_at,
            finished_at: Utc::now(),
            gazetteer_version: format!("{:016x}", gazetteer_version),
            gazetteer_rows,
            depth,
            individuals: resolution.resolved.len(),
            resolved: resolution.resolved_count(),
            perfect: resolution.perfect_count(),
            incomplete: resolution.incomplete.len(),
            duplicate_ids: resolution.duplicate_ids.clone(),
            scores: score_stats(resolution),
            cache,
        }
    }
}

fn score_stats(resolution: &Resolution) -> Option<ScoreStats> {
    let scores: Vec<f64> = resolution
        .resolved
        .iter()
        .filter_map(|r| r.match_score)
        .collect();
    if scores.is_empty() {
        return None;
    }

    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    Some(ScoreStats { min, mean, max })
}
