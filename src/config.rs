// src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::scrape::RowSelection;

/// Archived UN social indicators page carrying the school life expectancy table.
pub const DEFAULT_SOURCE_URL: &str = "http://web.archive.org/web/20110514112442/\
http://unstats.un.org/unsd/demographic/products/socind/education.htm";

pub const DEFAULT_DB_PATH: &str = "world_ed.db";
pub const DEFAULT_GDP_CSV: &str = "ny.gdp.mktp.cd_Indicator_en_csv_v2.csv";

/// Runtime settings for a pipeline run.
///
/// Every field has a default, so a YAML file only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Which `<tr>` elements of the document hold data rows.
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub rows: RowSelection,
    pub db_path: PathBuf,
    pub gdp_csv: PathBuf,
    /// Directory the chart PNGs are written into.
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            user_agent: concat!("edugdp/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 60,
            rows: RowSelection::default(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            gdp_csv: PathBuf::from(DEFAULT_GDP_CSV),
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Parse a YAML document; absent keys keep their defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        // an empty document deserializes to unit, not to a mapping
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).context("parsing YAML config")
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("in config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_the_archived_snapshot() {
        let cfg = Config::default();
        assert_eq!(cfg.db_path, PathBuf::from("world_ed.db"));
        assert_eq!(
            cfg.gdp_csv,
            PathBuf::from("ny.gdp.mktp.cd_Indicator_en_csv_v2.csv")
        );
        assert_eq!(cfg.rows, RowSelection::Range { first: 18, last: 200 });
        assert!(cfg.source_url.starts_with("http://web.archive.org/web/20110514112442/"));
        assert!(cfg.source_url.ends_with("socind/education.htm"));
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() -> Result<()> {
        let cfg = Config::from_yaml_str(
            r#"
db_path: /tmp/other.db
rows:
  after_marker:
    marker: "Country or area"
    max_rows: 250
"#,
        )?;
        assert_eq!(cfg.db_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(
            cfg.rows,
            RowSelection::AfterMarker {
                marker: "Country or area".into(),
                max_rows: Some(250),
            }
        );
        assert_eq!(cfg.gdp_csv, Config::default().gdp_csv);
        assert_eq!(cfg.timeout_secs, 60);
        Ok(())
    }

    #[test]
    fn empty_yaml_is_default() -> Result<()> {
        assert_eq!(Config::from_yaml_str("  \n")?, Config::default());
        Ok(())
    }

    #[test]
    fn range_rows_read_as_a_nested_map() -> Result<()> {
        let cfg = Config::from_yaml_str("rows:\n  range:\n    first: 2\n    last: 40\n")?;
        assert_eq!(cfg.rows, RowSelection::Range { first: 2, last: 40 });
        Ok(())
    }

    #[test]
    fn config_file_is_read_from_disk() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "timeout_secs: 5")?;
        writeln!(file, "rows:\n  after_marker:\n    marker: Country")?;
        file.flush()?;

        let cfg = Config::from_yaml_file(file.path())?;
        assert_eq!(cfg.timeout_secs, 5);
        assert_eq!(
            cfg.rows,
            RowSelection::AfterMarker {
                marker: "Country".into(),
                max_rows: None,
            }
        );
        assert_eq!(cfg.db_path, PathBuf::from(DEFAULT_DB_PATH));
        Ok(())
    }

    #[test]
    fn missing_config_file_names_the_path() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nope.yaml");
        let err = Config::from_yaml_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("nope.yaml"), "{:#}", err);
        Ok(())
    }

    #[test]
    fn bad_config_file_reports_which_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "timeout_secs: soon")?;
        file.flush()?;
        let err = Config::from_yaml_file(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("in config file"), "{:#}", err);
        Ok(())
    }

    #[test]
    fn unknown_row_selection_is_rejected() {
        assert!(Config::from_yaml_str("rows: everything\n").is_err());
        assert!(Config::from_yaml_str("rows:\n  everything: {}\n").is_err());
    }
}
