use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use pitchlens_config::{PitchLensConfig, database_path};
use pitchlens_core::{MetricId, RecordFilter, Role, SeasonRecord};
use rusqlite::{Connection, params};

use crate::{SeasonRecordSource, StoreError};

pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    pub fn open(
        workspace_root: impl AsRef<Path>,
        config: &PitchLensConfig,
    ) -> Result<Self, StoreError> {
        Self::open_path(database_path(workspace_root, config))
    }

    pub fn open_path(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        run_migrations(&conn)?;
        tracing::debug!(path = %path.display(), "opened season store");

        Ok(Self { conn, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the pitcher row, the season row and replaces the season's
    /// metric values. Non-finite values are dropped.
    pub fn upsert_season_record(&self, record: &SeasonRecord) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        write_season_record(&tx, record)?;
        tx.commit()?;
        Ok(())
    }

    /// Stores every record in one transaction; any failure leaves the store
    /// untouched.
    pub fn upsert_season_records(&self, records: &[SeasonRecord]) -> Result<usize, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        for record in records {
            write_season_record(&tx, record)?;
        }
        tx.commit()?;
        tracing::info!(count = records.len(), "stored season records");
        Ok(records.len())
    }

    pub fn count_season_records(&self) -> Result<u64, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM season_stats", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

fn write_season_record(conn: &Connection, record: &SeasonRecord) -> Result<(), StoreError> {
    conn.execute(
        r#"
        INSERT INTO pitchers (id, name, team, is_starter)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            team = excluded.team,
            is_starter = excluded.is_starter
        "#,
        params![
            record.pitcher_id,
            record.pitcher_name,
            record.team,
            record.role.is_starter(),
        ],
    )?;

    conn.execute(
        r#"
        INSERT INTO season_stats (pitcher_id, year, innings_pitched)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(pitcher_id, year) DO UPDATE SET
            innings_pitched = excluded.innings_pitched
        "#,
        params![record.pitcher_id, record.year, record.innings_pitched],
    )?;

    conn.execute(
        "DELETE FROM season_metric_values WHERE pitcher_id = ?1 AND year = ?2",
        params![record.pitcher_id, record.year],
    )?;

    {
        let mut insert = conn.prepare(
            r#"
            INSERT INTO season_metric_values (pitcher_id, year, metric_id, value)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )?;
        for (metric, value) in &record.metrics {
            if !value.is_finite() {
                tracing::warn!(
                    pitcher_id = record.pitcher_id,
                    year = record.year,
                    metric = %metric,
                    "skipping non-finite metric value"
                );
                continue;
            }
            insert.execute(params![record.pitcher_id, record.year, metric.as_str(), value])?;
        }
    }

    Ok(())
}

impl SeasonRecordSource for SqliteStore {
    fn fetch_season_records(&self, filter: &RecordFilter) -> Result<Vec<SeasonRecord>, StoreError> {
        let year = filter.year;
        let is_starter = filter.role.map(Role::is_starter);
        let min_innings = filter.min_innings;

        let mut stmt = self.conn.prepare(
            r#"
            SELECT s.pitcher_id, p.name, p.team, p.is_starter, s.year, s.innings_pitched
            FROM season_stats s
            JOIN pitchers p ON p.id = s.pitcher_id
            WHERE (?1 IS NULL OR s.year = ?1)
              AND (?2 IS NULL OR p.is_starter = ?2)
              AND (?3 <= 0 OR s.innings_pitched >= ?3)
            ORDER BY s.pitcher_id ASC, s.year ASC
            "#,
        )?;
        let rows = stmt.query_map(params![year, is_starter, min_innings], |row| {
            let is_starter: bool = row.get(3)?;
            Ok(SeasonRecord {
                pitcher_id: row.get(0)?,
                pitcher_name: row.get(1)?,
                team: row.get(2)?,
                role: Role::from_is_starter(is_starter),
                year: row.get(4)?,
                innings_pitched: row.get(5)?,
                metrics: BTreeMap::new(),
            })
        })?;

        let mut by_season = BTreeMap::<(i64, i32), SeasonRecord>::new();
        for row in rows {
            let record = row?;
            by_season.insert((record.pitcher_id, record.year), record);
        }

        let mut stmt = self.conn.prepare(
            r#"
            SELECT v.pitcher_id, v.year, v.metric_id, v.value
            FROM season_metric_values v
            JOIN season_stats s ON s.pitcher_id = v.pitcher_id AND s.year = v.year
            JOIN pitchers p ON p.id = v.pitcher_id
            WHERE (?1 IS NULL OR s.year = ?1)
              AND (?2 IS NULL OR p.is_starter = ?2)
              AND (?3 <= 0 OR s.innings_pitched >= ?3)
            "#,
        )?;
        let values = stmt.query_map(params![year, is_starter, min_innings], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i32>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
            ))
        })?;
        for value in values {
            let (pitcher_id, season, metric, value) = value?;
            if let Some(record) = by_season.get_mut(&(pitcher_id, season)) {
                record.metrics.insert(MetricId::new(metric), value);
            }
        }

        let records = by_season.into_values().collect::<Vec<_>>();
        tracing::debug!(
            count = records.len(),
            year = ?filter.year,
            role = ?filter.role,
            min_innings = filter.min_innings,
            "fetched season records"
        );
        Ok(records)
    }
}

fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS pitchers (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            team TEXT,
            is_starter INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS season_stats (
            pitcher_id INTEGER NOT NULL REFERENCES pitchers(id),
            year INTEGER NOT NULL,
            innings_pitched REAL NOT NULL,
            PRIMARY KEY (pitcher_id, year)
        );

        CREATE INDEX IF NOT EXISTS idx_season_stats_year ON season_stats(year);

        CREATE TABLE IF NOT EXISTS season_metric_values (
            pitcher_id INTEGER NOT NULL,
            year INTEGER NOT NULL,
            metric_id TEXT NOT NULL,
            value REAL NOT NULL,
            PRIMARY KEY (pitcher_id, year, metric_id)
        );
        "#,
    )?;

    Ok(())
}
