// src/analysis/charts.rs

use anyhow::{anyhow, Result};
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::stats::{self, Bin};

/// One histogram panel of a stacked figure.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramPanel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPlot {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<(f64, f64)>,
}

/// Writes chart artifacts; returns the path of the file produced.
pub trait ChartRenderer {
    /// Stacked histograms sharing one y axis.
    fn histograms(&self, file_name: &str, panels: &[HistogramPanel]) -> Result<PathBuf>;
    fn scatter(&self, file_name: &str, plot: &ScatterPlot) -> Result<PathBuf>;
}

/// PNG output through the plotters bitmap backend.
#[derive(Debug, Clone)]
pub struct PlottersRenderer {
    out_dir: PathBuf,
    size: (u32, u32),
    bins: usize,
}

impl PlottersRenderer {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            size: (800, 900),
            bins: 10,
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

fn plot_err<E: std::fmt::Display>(e: E) -> anyhow::Error {
    anyhow!("chart drawing failed: {}", e)
}

/// `[lo, hi]` padded so a single point still gets a visible axis.
fn padded_range(lo: f64, hi: f64) -> (f64, f64) {
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 0.5 };
    (lo - pad, hi + pad)
}

impl ChartRenderer for PlottersRenderer {
    fn histograms(&self, file_name: &str, panels: &[HistogramPanel]) -> Result<PathBuf> {
        let path = self.out_dir.join(file_name);
        let binned: Vec<Vec<Bin>> = panels
            .iter()
            .map(|p| stats::histogram(&p.values, self.bins))
            .collect();
        let y_top = binned
            .iter()
            .flatten()
            .map(|b| b.count as u32)
            .max()
            .unwrap_or(0)
            + 1;

        {
            let root = BitMapBackend::new(&path, self.size).into_drawing_area();
            root.fill(&WHITE).map_err(plot_err)?;
            let areas = root.split_evenly((panels.len().max(1), 1));

            for ((area, panel), bins) in areas.iter().zip(panels).zip(&binned) {
                let (x0, x1) = match (bins.first(), bins.last()) {
                    (Some(first), Some(last)) => (first.lower, last.upper),
                    _ => (0.0, 1.0),
                };
                let mut chart = ChartBuilder::on(area)
                    .caption(&panel.title, ("sans-serif", 22))
                    .margin(12)
                    .x_label_area_size(40)
                    .y_label_area_size(50)
                    .build_cartesian_2d(x0..x1, 0u32..y_top)
                    .map_err(plot_err)?;
                chart
                    .configure_mesh()
                    .disable_x_mesh()
                    .x_desc(panel.x_label.as_str())
                    .y_desc(panel.y_label.as_str())
                    .draw()
                    .map_err(plot_err)?;
                chart
                    .draw_series(bins.iter().map(|b| {
                        Rectangle::new([(b.lower, 0), (b.upper, b.count as u32)], BLUE.mix(0.6).filled())
                    }))
                    .map_err(plot_err)?;
            }

            root.present().map_err(plot_err)?;
        }
        debug!(path = %path.display(), panels = panels.len(), "wrote histogram figure");
        Ok(path)
    }

    fn scatter(&self, file_name: &str, plot: &ScatterPlot) -> Result<PathBuf> {
        let path = self.out_dir.join(file_name);
        let (xs, ys): (Vec<f64>, Vec<f64>) = plot.points.iter().copied().unzip();
        let (x0, x1) = padded_range(
            xs.iter().copied().fold(f64::INFINITY, f64::min),
            xs.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        );
        let (y0, y1) = padded_range(
            ys.iter().copied().fold(f64::INFINITY, f64::min),
            ys.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        );

        {
            let root = BitMapBackend::new(&path, (800, 600)).into_drawing_area();
            root.fill(&WHITE).map_err(plot_err)?;
            let mut chart = ChartBuilder::on(&root)
                .caption(&plot.title, ("sans-serif", 22))
                .margin(12)
                .x_label_area_size(40)
                .y_label_area_size(50)
                .build_cartesian_2d(x0..x1, y0..y1)
                .map_err(plot_err)?;
            chart
                .configure_mesh()
                .x_desc(plot.x_label.as_str())
                .y_desc(plot.y_label.as_str())
                .draw()
                .map_err(plot_err)?;
            chart
                .draw_series(
                    plot.points
                        .iter()
                        .map(|&(x, y)| Circle::new((x, y), 4, BLUE.filled())),
                )
                .map_err(plot_err)?;

            root.present().map_err(plot_err)?;
        }
        debug!(path = %path.display(), points = plot.points.len(), "wrote scatterplot");
        Ok(path)
    }
}
