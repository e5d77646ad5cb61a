// src/analysis/mod.rs

pub mod charts;
pub mod stats;

use anyhow::{Context, Result};
use std::io::Write;
use tracing::{info, instrument, warn};

use crate::store::Store;
use charts::{ChartRenderer, HistogramPanel, ScatterPlot};
use stats::Regression;

pub const PROFILE_CHART: &str = "school_hist.png";
pub const GDP_HIST_CHART: &str = "gdp_school_hist.png";
pub const SCATTER_CHART: &str = "gdp_scatter.png";

const YEARS_LABEL: &str = "Years of Education";
const COUNT_LABEL: &str = "No. of Countries";

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSummary {
    pub count: usize,
    pub men_mean: Option<f64>,
    pub women_mean: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GdpAnalysis {
    /// Rows with a stored GDP value.
    pub count: usize,
    pub correlation: Option<f64>,
    pub regression: Option<Regression>,
}

fn panel(title: &str, x_label: &str, values: Vec<f64>) -> HistogramPanel {
    HistogramPanel {
        title: title.to_string(),
        x_label: x_label.to_string(),
        y_label: COUNT_LABEL.to_string(),
        values,
    }
}

/// Histograms of men's and women's school life expectancy, plus their means.
#[instrument(level = "info", skip_all)]
pub fn profile_data(
    store: &Store,
    charts: &dyn ChartRenderer,
    out: &mut dyn Write,
) -> Result<ProfileSummary> {
    let rows = store.sex_rows()?;
    if rows.is_empty() {
        writeln!(out, "No school life expectancy data stored; skipping profile")?;
        return Ok(ProfileSummary {
            count: 0,
            men_mean: None,
            women_mean: None,
        });
    }

    let men: Vec<f64> = rows.iter().map(|r| r.men).collect();
    let women: Vec<f64> = rows.iter().map(|r| r.women).collect();

    let path = charts
        .histograms(
            PROFILE_CHART,
            &[
                panel("Men: School Life Expectancy", YEARS_LABEL, men.clone()),
                panel("Women: School Life Expectancy", YEARS_LABEL, women.clone()),
            ],
        )
        .context("rendering school life expectancy histograms")?;
    info!(path = %path.display(), "wrote profile chart");

    let summary = ProfileSummary {
        count: rows.len(),
        men_mean: stats::mean(&men),
        women_mean: stats::mean(&women),
    };

    writeln!(
        out,
        "See '{}' for histograms of school life expectancy by sex",
        PROFILE_CHART
    )?;
    writeln!(out, "The 2 distributions appear roughly normal: use means")?;
    if let (Some(m), Some(w)) = (summary.men_mean, summary.women_mean) {
        writeln!(out, "Avg. School Life Expectancy for Men:\t{:.2}", m)?;
        writeln!(out, "Avg. School Life Expectancy for Women:\t{:.2}", w)?;
    }
    Ok(summary)
}

/// Correlate log GDP with total school life expectancy and fit `total ~ log_gdp`.
#[instrument(level = "info", skip_all)]
pub fn analyze_gdp(
    store: &Store,
    charts: &dyn ChartRenderer,
    out: &mut dyn Write,
) -> Result<GdpAnalysis> {
    let rows = store.gdp_rows()?;
    let mut analysis = GdpAnalysis {
        count: rows.len(),
        correlation: None,
        regression: None,
    };
    if rows.is_empty() {
        writeln!(out, "\nNo rows with GDP data; skipping GDP analysis")?;
        return Ok(analysis);
    }

    let totals: Vec<f64> = rows.iter().map(|r| r.total).collect();
    let gdps: Vec<f64> = rows.iter().map(|r| r.gdp).collect();
    charts
        .histograms(
            GDP_HIST_CHART,
            &[
                panel(
                    "Total School Life Expectancy (Both Sexes)",
                    YEARS_LABEL,
                    totals,
                ),
                panel("GDP of Many Countries", "GDP (current US$)", gdps),
            ],
        )
        .context("rendering GDP histograms")?;

    writeln!(
        out,
        "\nGDP is obviously right skewed (see '{}')",
        GDP_HIST_CHART
    )?;
    writeln!(out, "Log transforming the variable...")?;

    let mut log_gdp = Vec::with_capacity(rows.len());
    let mut total = Vec::with_capacity(rows.len());
    for r in &rows {
        if r.gdp > 0.0 {
            log_gdp.push(r.gdp.ln());
            total.push(r.total);
        } else {
            warn!(country = %r.country, gdp = r.gdp, "non-positive GDP has no logarithm; skipping");
        }
    }

    charts
        .scatter(
            SCATTER_CHART,
            &ScatterPlot {
                title: "Scatterplot of log(GDP) vs Educ. Life Expectancy".into(),
                x_label: "log(GDP)".into(),
                y_label: "Educ. Life Expectancy".into(),
                points: log_gdp.iter().copied().zip(total.iter().copied()).collect(),
            },
        )
        .context("rendering log GDP scatterplot")?;
    writeln!(
        out,
        "See scatterplot of log gdp vs. educ. life expectancy in '{}'",
        SCATTER_CHART
    )?;

    match stats::pearson(&log_gdp, &total) {
        Ok(r) => {
            writeln!(
                out,
                "\nCorrelation between log(GDP) and Educ. Life Expectancy: {:.3}",
                r
            )?;
            analysis.correlation = Some(r);
        }
        Err(e) => writeln!(out, "\nCannot compute correlation: {}", e)?,
    }

    writeln!(out, "Creating regression model...")?;
    match stats::ols(&log_gdp, &total, "log_gdp", "total") {
        Ok(fit) => {
            writeln!(out, "\nSummary of Regression Model:")?;
            writeln!(out, "{}", fit)?;
            analysis.regression = Some(fit);
        }
        Err(e) => writeln!(out, "Not enough data for a regression: {}", e)?,
    }

    Ok(analysis)
}
