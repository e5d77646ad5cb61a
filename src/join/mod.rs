// src/join/mod.rs

pub mod country_names;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use rusqlite::Connection;
use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::store::{self, Store};

pub const GDP_DOWNLOAD_URL: &str =
    "http://api.worldbank.org/v2/en/indicator/ny.gdp.mktp.cd?downloadformat=csv";

/// Lines of metadata ahead of the header row.
const METADATA_LINES: usize = 2;
const COUNTRY_COLUMN: &str = "Country Name";

#[derive(Debug, Error)]
pub enum JoinError {
    #[error(
        "missing GDP csv file {}. The pipeline cannot continue until you download the GDP data. \
         Go to \"{url}\" and put the csv file in the working directory",
        .path.display(),
        url = GDP_DOWNLOAD_URL
    )]
    MissingGdpFile { path: PathBuf },

    #[error(
        "GDP file ended after {lines} line(s); expected {expected} metadata lines and a header",
        expected = METADATA_LINES
    )]
    MissingHeader { lines: usize },

    #[error("GDP header has no \"{column}\" column", column = COUNTRY_COLUMN)]
    MissingCountryColumn,
}

/// Counters for one join pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct JoinReport {
    /// Store rows whose `gdp` was written.
    pub updated: usize,
    /// Matched countries without a usable value for their year.
    pub missing_gdp: usize,
    /// GDP rows with no corresponding store record.
    pub unmatched: usize,
}

/// The World Bank GDP file: one row per country, one column per year.
#[derive(Debug)]
pub struct GdpTable {
    columns: HashMap<String, usize>,
    country_idx: usize,
    rows: Vec<StringRecord>,
}

impl GdpTable {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("opening GDP file {}", path.display()))?;
        Self::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing GDP file {}", path.display()))
    }

    pub fn from_reader<R: BufRead>(mut reader: R) -> Result<Self> {
        let mut line = String::new();
        for seen in 0..METADATA_LINES {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Err(JoinError::MissingHeader { lines: seen }.into());
            }
        }
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(JoinError::MissingHeader {
                lines: METADATA_LINES,
            }
            .into());
        }

        let header = parse_header(&line)?;
        let columns: HashMap<String, usize> = header
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name, i))
            .collect();
        let country_idx = *columns
            .get(COUNTRY_COLUMN)
            .ok_or(JoinError::MissingCountryColumn)?;

        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        let mut rows = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            let record =
                result.with_context(|| format!("CSV parse error at data record {}", idx))?;
            rows.push(record);
        }
        debug!(rows = rows.len(), columns = columns.len(), "read GDP table");

        Ok(Self {
            columns,
            country_idx,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// `(country, row)` pairs in file order.
    pub fn rows(&self) -> impl Iterator<Item = GdpRecord<'_>> {
        self.rows.iter().map(move |r| GdpRecord { table: self, record: r })
    }
}

/// One country row of a [`GdpTable`].
pub struct GdpRecord<'a> {
    table: &'a GdpTable,
    record: &'a StringRecord,
}

impl<'a> GdpRecord<'a> {
    pub fn country(&self) -> &'a str {
        self.record.get(self.table.country_idx).unwrap_or("")
    }

    /// Raw cell for a year column; `None` when the column is not in the header
    /// or the row is short.
    pub fn value(&self, year: &str) -> Option<&'a str> {
        let idx = *self.table.columns.get(year)?;
        self.record.get(idx)
    }
}

/// Split the header line and strip the embedded quote characters.
fn parse_header(line: &str) -> Result<Vec<String>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    let record = rdr
        .records()
        .next()
        .transpose()
        .context("parsing GDP header line")?
        .unwrap_or_default();
    Ok(record
        .iter()
        .map(|f| f.replace('"', "").trim().to_string())
        .collect())
}

/// Annotate stored records with GDP for their survey year.
///
/// Fails with [`JoinError::MissingGdpFile`] before opening the store when the
/// file is absent.
#[instrument(level = "info", skip(store), fields(db = %store.path().display()))]
pub fn join_gdp(store: &Store, csv_path: &Path) -> Result<JoinReport> {
    if !csv_path.is_file() {
        return Err(JoinError::MissingGdpFile {
            path: csv_path.to_path_buf(),
        }
        .into());
    }
    let table = GdpTable::open(csv_path)?;
    let report = store.with_transaction(|tx| apply_gdp(tx, &table))?;
    info!(
        updated = report.updated,
        missing_gdp = report.missing_gdp,
        unmatched = report.unmatched,
        "joined GDP data"
    );
    Ok(report)
}

/// Write GDP values from `table` through an open connection.
pub fn apply_gdp(conn: &Connection, table: &GdpTable) -> Result<JoinReport> {
    let mut report = JoinReport::default();

    for row in table.rows() {
        let country = country_names::resolve(row.country());

        // no education data for that country, nothing to annotate
        let Some(year) = store::first_year(conn, country)? else {
            report.unmatched += 1;
            continue;
        };

        let raw = row.value(&year).map(str::trim).unwrap_or("");
        if raw.is_empty() {
            info!("No GDP data that year for {}", country);
            report.missing_gdp += 1;
            continue;
        }
        let gdp: f64 = match raw.parse() {
            Ok(v) => v,
            Err(_) => {
                warn!(%country, %year, value = raw, "GDP value is not numeric");
                report.missing_gdp += 1;
                continue;
            }
        };

        report.updated += store::update_gdp(conn, country, gdp)?;
    }

    Ok(report)
}
