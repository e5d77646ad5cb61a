use anyhow::Result;
use clap::Parser;
use edugdp::{
    analysis::charts::PlottersRenderer, config::Config, fetch::HttpSource, run, IngestDecision,
};
use std::{fs, io, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// School life expectancy vs. GDP: scrape, join, summarize, regress.
#[derive(Parser, Debug)]
#[command(name = "edugdp")]
struct Args {
    /// YAML config file; command-line flags override its values
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long)]
    db: Option<PathBuf>,

    /// World Bank GDP csv
    #[arg(long)]
    gdp_csv: Option<PathBuf>,

    /// Directory for the chart PNGs
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Page to scrape
    #[arg(long)]
    url: Option<String>,

    /// Rebuild the database even if it exists
    #[arg(long, conflicts_with = "skip_ingest")]
    force_ingest: bool,

    /// Only report over the existing database
    #[arg(long)]
    skip_ingest: bool,
}

impl Args {
    fn config(&self) -> Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => Config::from_yaml_file(path)?,
            None => Config::default(),
        };
        if let Some(db) = &self.db {
            cfg.db_path = db.clone();
        }
        if let Some(csv) = &self.gdp_csv {
            cfg.gdp_csv = csv.clone();
        }
        if let Some(dir) = &self.output_dir {
            cfg.output_dir = dir.clone();
        }
        if let Some(url) = &self.url {
            cfg.source_url = url.clone();
        }
        Ok(cfg)
    }

    fn decision(&self) -> IngestDecision {
        if self.force_ingest {
            IngestDecision::Always
        } else if self.skip_ingest {
            IngestDecision::Never
        } else {
            IngestDecision::WhenStoreMissing
        }
    }
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    // ─── 2) configure ────────────────────────────────────────────────
    let args = Args::parse();
    let cfg = args.config()?;
    fs::create_dir_all(&cfg.output_dir)?;
    info!(
        db = %cfg.db_path.display(),
        gdp_csv = %cfg.gdp_csv.display(),
        output_dir = %cfg.output_dir.display(),
        "startup"
    );

    // ─── 3) run ──────────────────────────────────────────────────────
    let source = HttpSource::from_config(&cfg)?;
    let charts = PlottersRenderer::new(&cfg.output_dir);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = run(&cfg, args.decision(), &source, &charts, &mut out)?;

    info!(
        ingested = summary.ingest.is_some(),
        rows = summary.profile.count,
        gdp_rows = summary.gdp.count,
        "all done"
    );
    Ok(())
}
