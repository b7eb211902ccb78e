use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use pitchlens_config::PitchLensConfig;
use pitchlens_core::{MetricCatalog, Role, SeasonRecord, validate_season};
use pitchlens_store::SqliteStore;
use serde::Deserialize;

/// One season row as exported by the aggregation job. Every key besides the
/// identity fields must name a catalog metric; `null` marks a missing value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeasonRow {
    pub pitcher_id: i64,
    pub name: String,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub is_starter: bool,
    pub year: i32,
    pub innings_pitched: f64,
    #[serde(flatten)]
    pub metrics: BTreeMap<String, Option<f64>>,
}

pub fn parse_season_rows(raw: &str, catalog: &MetricCatalog) -> Result<Vec<SeasonRecord>> {
    let rows: Vec<SeasonRow> =
        serde_json::from_str(raw).context("season file must be a JSON array of season rows")?;

    let mut records = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        validate_season(row.year).with_context(|| format!("row {index}"))?;
        if !row.innings_pitched.is_finite() || row.innings_pitched < 0.0 {
            bail!(
                "row {index}: innings_pitched must be a non-negative number, got {}",
                row.innings_pitched
            );
        }

        let mut record = SeasonRecord::new(
            row.pitcher_id,
            row.name,
            row.year,
            Role::from_is_starter(row.is_starter),
        )
        .with_innings(row.innings_pitched);
        record.team = row.team;

        for (key, value) in row.metrics {
            let Some(descriptor) = catalog.get(&key) else {
                bail!("row {index}: unknown metric '{key}'");
            };
            if let Some(value) = value {
                record = record.with_metric(descriptor.id.clone(), value);
            }
        }
        records.push(record);
    }

    Ok(records)
}

pub fn run_import(
    workspace: &Path,
    config: &PitchLensConfig,
    file: &Path,
    out: &mut dyn Write,
) -> Result<usize> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("failed to read season file {}", file.display()))?;
    let records = parse_season_rows(&raw, &MetricCatalog::builtin())
        .with_context(|| format!("invalid season file {}", file.display()))?;

    let store = SqliteStore::open(workspace, config).context("failed to open season store")?;
    let count = store
        .upsert_season_records(&records)
        .context("failed to store season records")?;
    writeln!(
        out,
        "imported {count} season records into {}",
        store.path().display()
    )?;

    Ok(count)
}
