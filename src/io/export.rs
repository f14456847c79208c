//! CSV result tables.

use anyhow::Result;
use csv::Writer;
use std::cmp::Ordering;
use std::io::Write;

use super::roster::{CODE_COLUMN, ID_COLUMN, SCORE_COLUMN};
use super::Roster;
use crate::hazard::{Classification, Classified, PopulatedArea};
use crate::models::{Gazetteer, Hierarchy, ResolvedIndividual};
use crate::resolver::IncompleteRecord;

fn score_field(score: Option<f64>) -> String {
    score.map(|s| format!("{:.4}", s)).unwrap_or_default()
}

/// Ascending by score, unresolved last.
fn by_score(a: &ResolvedIndividual, b: &ResolvedIndividual) -> Ordering {
    match (a.match_score, b.match_score) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Write the resolved roster: id, the roster's other columns, its address
/// columns, the matched gazetteer name per level, then code and score.
pub fn write_resolved<W: Write>(
    writer: W,
    roster: &Roster,
    resolved: &[ResolvedIndividual],
    gazetteer: &Gazetteer,
    sort_by_score: bool,
) -> Result<()> {
    let mut records: Vec<&ResolvedIndividual> = resolved.iter().collect();
    if sort_by_score {
        records.sort_by(|a, b| by_score(a, b));
    }

    let mut csv_writer = Writer::from_writer(writer);
    let mut header = vec![ID_COLUMN.to_string()];
    header.extend(roster.attribute_columns.iter().cloned());
    header.extend(roster.address_columns.iter().cloned());
    header.extend(gazetteer.hierarchy().labels().map(|l| format!("gazetteer_{}", l)));
    header.push(CODE_COLUMN.to_string());
    header.push(SCORE_COLUMN.to_string());
    csv_writer.write_record(&header)?;

    for record in records {
        let individual = &record.individual;
        let mut fields = vec![individual.id.clone()];
        fields.extend(
            roster
                .attribute_columns
                .iter()
                .map(|c| individual.attribute(c).unwrap_or_default().to_string()),
        );
        fields.extend(
            (1..=roster.address_columns.len())
                .map(|level| individual.address_text(level).unwrap_or_default().to_string()),
        );

        let row = record.resolved_code.as_deref().and_then(|c| gazetteer.find(c));
        fields.extend((1..=gazetteer.depth()).map(|level| {
            row.and_then(|r| r.name(level))
                .unwrap_or_default()
                .to_string()
        }));
        fields.push(record.resolved_code.clone().unwrap_or_default());
        fields.push(score_field(record.match_score));
        csv_writer.write_record(&fields)?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn write_incomplete<W: Write>(writer: W, incomplete: &[IncompleteRecord]) -> Result<()> {
    let mut csv_writer = Writer::from_writer(writer);
    csv_writer.write_record([ID_COLUMN, "missing_data"])?;
    for record in incomplete {
        csv_writer.write_record([record.id.as_str(), record.missing_data().as_str()])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Raw and normalized text side by side for every individual that reached
/// the matcher.
pub fn write_comparison<W: Write>(
    writer: W,
    hierarchy: &Hierarchy,
    resolved: &[ResolvedIndividual],
) -> Result<()> {
    let mut csv_writer = Writer::from_writer(writer);
    let mut header = vec![ID_COLUMN.to_string()];
    for label in hierarchy.labels() {
        header.push(label.to_string());
        header.push(format!("{}_normalized", label));
    }
    csv_writer.write_record(&header)?;

    for record in resolved {
        let Some(normalized) = &record.normalized else {
            continue;
        };
        let mut fields = vec![record.id().to_string()];
        for (level, text) in (1..=hierarchy.depth()).zip(normalized) {
            fields.push(record.individual.address_text(level).unwrap_or_default().to_string());
            fields.push(text.clone());
        }
        csv_writer.write_record(&fields)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Per-level similarity of each best match, lowest total first.
pub fn write_scores<W: Write>(
    writer: W,
    hierarchy: &Hierarchy,
    resolved: &[ResolvedIndividual],
) -> Result<()> {
    let mut records: Vec<&ResolvedIndividual> =
        resolved.iter().filter(|r| r.level_scores.is_some()).collect();
    records.sort_by(|a, b| by_score(a, b));

    let mut csv_writer = Writer::from_writer(writer);
    let mut header = vec![ID_COLUMN.to_string(), CODE_COLUMN.to_string()];
    header.extend(hierarchy.labels().map(|l| format!("{}_score", l)));
    header.push("score".to_string());
    csv_writer.write_record(&header)?;

    for record in records {
        let mut fields = vec![
            record.id().to_string(),
            record.resolved_code.clone().unwrap_or_default(),
        ];
        fields.extend(
            record
                .level_scores
                .iter()
                .flatten()
                .map(|s| format!("{:.4}", s)),
        );
        fields.push(score_field(record.match_score));
        csv_writer.write_record(&fields)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Affected individuals sorted by `group_columns` then id, with the matched
/// gazetteer names.
pub fn write_affected<W: Write>(
    writer: W,
    classification: &Classification<'_>,
    gazetteer: &Gazetteer,
    group_columns: &[&str],
) -> Result<()> {
    let group_key = |c: &Classified<'_>| -> Vec<String> {
        group_columns
            .iter()
            .map(|g| c.record.individual.attribute(g).unwrap_or_default().to_string())
            .collect()
    };

    let mut affected: Vec<&Classified<'_>> = classification.affected().collect();
    affected.sort_by(|a, b| {
        group_key(a)
            .cmp(&group_key(b))
            .then_with(|| a.record.id().cmp(b.record.id()))
    });

    let mut csv_writer = Writer::from_writer(writer);
    let mut header = vec![ID_COLUMN.to_string()];
    header.extend(group_columns.iter().map(|g| g.to_string()));
    header.extend(gazetteer.hierarchy().labels().map(str::to_string));
    header.push(CODE_COLUMN.to_string());
    csv_writer.write_record(&header)?;

    for c in affected {
        let mut fields = vec![c.record.id().to_string()];
        fields.extend(group_key(c));
        let row = gazetteer.find(c.code);
        fields.extend((1..=gazetteer.depth()).map(|level| {
            row.and_then(|r| r.name(level))
                .unwrap_or_default()
                .to_string()
        }));
        fields.push(c.code.to_string());
        csv_writer.write_record(&fields)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Populated areas: name per level, finest code and resident count.
pub fn write_populated<W: Write>(
    writer: W,
    hierarchy: &Hierarchy,
    areas: &[PopulatedArea<'_>],
) -> Result<()> {
    let mut csv_writer = Writer::from_writer(writer);
    let mut header: Vec<String> = hierarchy.labels().map(str::to_string).collect();
    header.push("gid".to_string());
    header.push("residents".to_string());
    csv_writer.write_record(&header)?;

    for area in areas {
        let mut fields = area.row.names.clone();
        fields.push(area.row.finest_code().to_string());
        fields.push(area.residents.to_string());
        csv_writer.write_record(&fields)?;
    }

    csv_writer.flush()?;
    Ok(())
}
