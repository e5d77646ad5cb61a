// src/store/mod.rs

use anyhow::{Context, Result};
use rusqlite::{params, types::Value, Connection, OptionalExtension as _, Transaction};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::scrape::ScrapedRow;

pub const TABLE: &str = "ed_life";

const SCHEMA: &str = "
DROP TABLE IF EXISTS ed_life;
CREATE TABLE ed_life (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    country TEXT,
    year    TEXT,
    total   INTEGER,
    men     INTEGER,
    women   INTEGER,
    gdp     NUMERIC
);
";

/// A stored row of `ed_life`.
#[derive(Debug, Clone, PartialEq)]
pub struct EducationRecord {
    pub id: i64,
    pub country: String,
    pub year: String,
    pub total: Option<f64>,
    pub men: Option<f64>,
    pub women: Option<f64>,
    pub gdp: Option<f64>,
}

/// `(country, men, women)` with both values numeric.
#[derive(Debug, Clone, PartialEq)]
pub struct SexRow {
    pub country: String,
    pub men: f64,
    pub women: f64,
}

/// `(country, total, gdp)` for rows the joiner annotated.
#[derive(Debug, Clone, PartialEq)]
pub struct GdpRow {
    pub country: String,
    pub total: f64,
    pub gdp: f64,
}

/// The SQLite file holding `ed_life`.
///
/// Only the path is kept; each operation opens its own connection and drops
/// it when done.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.path)
            .with_context(|| format!("opening database {}", self.path.display()))
    }

    /// Drop and recreate `ed_life`, leaving it empty.
    pub fn create_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(SCHEMA)
            .with_context(|| format!("creating table {}", TABLE))?;
        info!(db = %self.path.display(), "created empty {} table", TABLE);
        Ok(())
    }

    /// Insert scraped rows in one transaction; returns how many were written.
    pub fn insert_records(&self, rows: &[ScrapedRow]) -> Result<usize> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO ed_life (country, year, total, men, women) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for row in rows {
                stmt.execute(params![row.country, row.year, row.total, row.men, row.women])
                    .with_context(|| format!("inserting row for {}", row.country))?;
            }
        }
        tx.commit().context("committing scraped rows")?;
        info!(rows = rows.len(), "loaded scraped rows");
        Ok(rows.len())
    }

    /// Open a write transaction for a batch of GDP updates.
    pub fn with_transaction<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit().context("committing transaction")?;
        Ok(out)
    }

    /// Year of the lowest-id record for `country`, if any.
    pub fn first_year_for(&self, country: &str) -> Result<Option<String>> {
        first_year(&self.connect()?, country)
    }

    /// Set `gdp` on every record named `country`; returns rows changed.
    pub fn set_gdp(&self, country: &str, gdp: f64) -> Result<usize> {
        update_gdp(&self.connect()?, country, gdp)
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.connect()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM ed_life", [], |r| r.get(0))?;
        Ok(n as usize)
    }

    /// All rows in id order.
    pub fn records(&self) -> Result<Vec<EducationRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, country, year, total, men, women, gdp FROM ed_life ORDER BY id",
        )?;
        let rows = stmt.query_map([], |r| {
            Ok(EducationRecord {
                id: r.get(0)?,
                country: r.get::<_, Option<String>>(1)?.unwrap_or_default(),
                year: r.get::<_, Option<String>>(2)?.unwrap_or_default(),
                total: as_f64(r.get(3)?),
                men: as_f64(r.get(4)?),
                women: as_f64(r.get(5)?),
                gdp: as_f64(r.get(6)?),
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("reading ed_life rows")
    }

    /// `(country, men, women)` for every row; rows with non-numeric values are skipped.
    pub fn sex_rows(&self) -> Result<Vec<SexRow>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT country, men, women FROM ed_life ORDER BY id")?;
        let raw = stmt
            .query_map([], |r| {
                Ok((r.get::<_, Option<String>>(0)?, r.get::<_, Value>(1)?, r.get::<_, Value>(2)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut out = Vec::with_capacity(raw.len());
        for (country, men, women) in raw {
            let country = country.unwrap_or_default();
            match (as_f64(men), as_f64(women)) {
                (Some(men), Some(women)) => out.push(SexRow {
                    country,
                    men,
                    women,
                }),
                _ => warn!(%country, "skipping row with non-numeric men/women values"),
            }
        }
        debug!(rows = out.len(), "loaded men/women rows");
        Ok(out)
    }

    /// `(country, total, gdp)` where `gdp IS NOT NULL`.
    pub fn gdp_rows(&self) -> Result<Vec<GdpRow>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT country, total, gdp FROM ed_life WHERE gdp IS NOT NULL ORDER BY id",
        )?;
        let raw = stmt
            .query_map([], |r| {
                Ok((r.get::<_, Option<String>>(0)?, r.get::<_, Value>(1)?, r.get::<_, Value>(2)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut out = Vec::with_capacity(raw.len());
        for (country, total, gdp) in raw {
            let country = country.unwrap_or_default();
            match (as_f64(total), as_f64(gdp)) {
                (Some(total), Some(gdp)) => out.push(GdpRow { country, total, gdp }),
                _ => warn!(%country, "skipping row with non-numeric total/gdp values"),
            }
        }
        debug!(rows = out.len(), "loaded total/gdp rows");
        Ok(out)
    }
}

pub(crate) fn first_year(conn: &Connection, country: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT year FROM ed_life WHERE country = ?1 ORDER BY id LIMIT 1",
        params![country],
        |r| r.get::<_, Option<String>>(0),
    )
    .optional()
    .with_context(|| format!("looking up year for {}", country))
    .map(Option::flatten)
}

pub(crate) fn update_gdp(conn: &Connection, country: &str, gdp: f64) -> Result<usize> {
    conn.execute(
        "UPDATE ed_life SET gdp = ?1 WHERE country = ?2",
        params![gdp, country],
    )
    .with_context(|| format!("updating gdp for {}", country))
}

/// Numeric view of a column stored with INTEGER/NUMERIC affinity.
fn as_f64(v: Value) -> Option<f64> {
    match v {
        Value::Integer(i) => Some(i as f64),
        Value::Real(f) => Some(f),
        Value::Text(s) => s.trim().parse().ok(),
        Value::Null | Value::Blob(_) => None,
    }
}
