// src/pipeline.rs

use anyhow::{Context, Result};
use std::{io::Write, path::Path};
use tracing::{info, instrument};

use crate::{
    analysis::{self, charts::ChartRenderer, GdpAnalysis, ProfileSummary},
    config::Config,
    fetch::DocumentSource,
    join::{self, JoinReport},
    scrape,
    store::Store,
};

/// Whether a run rebuilds the store before reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IngestDecision {
    /// Ingest only when the database file does not exist yet.
    #[default]
    WhenStoreMissing,
    Always,
    Never,
}

impl IngestDecision {
    pub fn should_ingest(self, db_path: &Path) -> bool {
        match self {
            IngestDecision::WhenStoreMissing => !db_path.exists(),
            IngestDecision::Always => true,
            IngestDecision::Never => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub scraped: usize,
    pub anomalies: usize,
    pub inserted: usize,
    pub join: JoinReport,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub ingest: Option<IngestSummary>,
    pub profile: ProfileSummary,
    pub gdp: GdpAnalysis,
}

/// Schema → fetch → parse → load → join.
#[instrument(level = "info", skip_all, fields(db = %store.path().display()))]
pub fn ingest(cfg: &Config, source: &dyn DocumentSource, store: &Store) -> Result<IngestSummary> {
    store.create_schema()?;

    let html = source.fetch().context("fetching school life expectancy page")?;
    let scraped = scrape::parse_document(&html, &cfg.rows);
    info!(
        rows = scraped.rows.len(),
        anomalies = scraped.anomalies.len(),
        "parsed document"
    );

    let inserted = store.insert_records(&scraped.rows)?;
    let join = join::join_gdp(store, &cfg.gdp_csv)?;

    Ok(IngestSummary {
        scraped: scraped.rows.len() + scraped.anomalies.len(),
        anomalies: scraped.anomalies.len(),
        inserted,
        join,
    })
}

/// Run the whole pipeline, ingesting first if `decision` says so.
pub fn run(
    cfg: &Config,
    decision: IngestDecision,
    source: &dyn DocumentSource,
    charts: &dyn ChartRenderer,
    out: &mut dyn Write,
) -> Result<RunSummary> {
    let store = Store::new(&cfg.db_path);

    let ingest = if decision.should_ingest(store.path()) {
        Some(ingest(cfg, source, &store)?)
    } else {
        info!(db = %store.path().display(), "store present; skipping ingestion");
        None
    };

    let profile = analysis::profile_data(&store, charts, out)?;
    let gdp = analysis::analyze_gdp(&store, charts, out)?;
    out.flush()?;

    Ok(RunSummary {
        ingest,
        profile,
        gdp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{analysis::tests::RecordingCharts, fetch::StaticSource};
    use std::{cell::Cell, fs};

    const PAGE: &str = "<html><body><table>\
<tr><td>Albania</td><td>2005</td><td>11</td><td>10</td><td>12</td></tr>\
<tr><td>XYZ-Footnote-Row</td><td>a</td><td></td><td></td><td></td></tr>\
</table></body></html>";

    const GDP: &str = "meta\nmeta\n\"Country Name\",\"Country Code\",\"2005\"\n\
\"Albania\",\"ALB\",\"8052073539\"\n";

    /// Counts fetches so tests can tell whether ingestion ran.
    struct CountingSource {
        html: String,
        calls: Cell<usize>,
    }

    impl DocumentSource for CountingSource {
        fn fetch(&self) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.html.clone())
        }
    }

    fn config(dir: &Path) -> Config {
        Config {
            rows: scrape::RowSelection::Range { first: 0, last: 200 },
            db_path: dir.join("world_ed.db"),
            gdp_csv: dir.join("gdp.csv"),
            output_dir: dir.to_path_buf(),
            ..Config::default()
        }
    }

    #[test]
    fn decision_checks_the_store_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let db = dir.path().join("world_ed.db");
        assert!(IngestDecision::WhenStoreMissing.should_ingest(&db));
        assert!(IngestDecision::Always.should_ingest(&db));
        assert!(!IngestDecision::Never.should_ingest(&db));

        fs::write(&db, b"")?;
        assert!(!IngestDecision::WhenStoreMissing.should_ingest(&db));
        assert!(IngestDecision::Always.should_ingest(&db));
        Ok(())
    }

    #[test]
    fn loader_receives_only_the_valid_row() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let cfg = config(dir.path());
        let store = Store::new(&cfg.db_path);
        store.create_schema()?;

        let html = StaticSource(PAGE.into()).fetch()?;
        let scraped = scrape::parse_document(&html, &cfg.rows);
        assert_eq!(scraped.anomalies.len(), 1);
        store.insert_records(&scraped.rows)?;

        let recs = store.records()?;
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].country, "Albania");
        assert_eq!(recs[0].gdp, None);

        fs::write(&cfg.gdp_csv, GDP)?;
        join::join_gdp(&store, &cfg.gdp_csv)?;
        assert_eq!(store.records()?[0].gdp, Some(8052073539.0));
        Ok(())
    }

    #[test]
    fn first_run_ingests_second_run_reuses_store() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let cfg = config(dir.path());
        fs::write(&cfg.gdp_csv, GDP)?;
        let source = CountingSource {
            html: PAGE.into(),
            calls: Cell::new(0),
        };
        let charts = RecordingCharts::default();

        let mut out: Vec<u8> = Vec::new();
        let first = run(&cfg, IngestDecision::default(), &source, &charts, &mut out)?;
        let ingest = first.ingest.expect("first run ingests");
        assert_eq!(ingest.inserted, 1);
        assert_eq!(ingest.anomalies, 1);
        assert_eq!(ingest.join.updated, 1);
        assert_eq!(first.profile.count, 1);
        assert_eq!(first.gdp.count, 1);

        let mut out: Vec<u8> = Vec::new();
        let second = run(&cfg, IngestDecision::default(), &source, &charts, &mut out)?;
        assert!(second.ingest.is_none());
        assert_eq!(source.calls.get(), 1);
        assert_eq!(second.profile, first.profile);
        Ok(())
    }

    #[test]
    fn missing_gdp_file_aborts_ingestion() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let cfg = config(dir.path());
        let charts = RecordingCharts::default();
        let mut out: Vec<u8> = Vec::new();

        let err = run(
            &cfg,
            IngestDecision::Always,
            &StaticSource(PAGE.into()),
            &charts,
            &mut out,
        )
        .expect_err("gdp csv absent");
        assert!(matches!(
            err.downcast_ref::<join::JoinError>(),
            Some(join::JoinError::MissingGdpFile { .. })
        ));
        assert!(charts.histograms.borrow().is_empty());
        Ok(())
    }
}
