// src/analysis/stats.rs

use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatsError {
    #[error("need at least {needed} observations, got {got}")]
    NotEnoughData { needed: usize, got: usize },

    #[error("x and y have different lengths ({x} vs {y})")]
    LengthMismatch { x: usize, y: usize },

    #[error("{0} has zero variance")]
    ZeroVariance(&'static str),

    #[error("invalid distribution parameters: {0}")]
    Distribution(String),
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Centered sums `(x̄, ȳ, Sxx, Syy, Sxy)`.
fn moments(x: &[f64], y: &[f64]) -> (f64, f64, f64, f64, f64) {
    let n = x.len() as f64;
    let xbar = x.iter().sum::<f64>() / n;
    let ybar = y.iter().sum::<f64>() / n;
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - xbar;
        let dy = yi - ybar;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    (xbar, ybar, sxx, syy, sxy)
}

fn check_pairs(x: &[f64], y: &[f64], needed: usize) -> Result<(), StatsError> {
    if x.len() != y.len() {
        return Err(StatsError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    if x.len() < needed {
        return Err(StatsError::NotEnoughData {
            needed,
            got: x.len(),
        });
    }
    Ok(())
}

/// Pearson correlation coefficient.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64, StatsError> {
    check_pairs(x, y, 2)?;
    let (_, _, sxx, syy, sxy) = moments(x, y);
    if sxx == 0.0 {
        return Err(StatsError::ZeroVariance("x"));
    }
    if syy == 0.0 {
        return Err(StatsError::ZeroVariance("y"));
    }
    Ok(sxy / (sxx * syy).sqrt())
}

/// One equal-width histogram bucket; `upper` is exclusive except for the last bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width bins spanning `[min, max]` of the data.
///
/// A constant sample is spread over `[v - 0.5, v + 0.5]`.
pub fn histogram(values: &[f64], bins: usize) -> Vec<Bin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;

    let mut out: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            lower: lo + width * i as f64,
            upper: if i + 1 == bins {
                hi
            } else {
                lo + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect();
    for v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct Coefficient {
    pub name: String,
    pub estimate: f64,
    pub std_err: f64,
    pub t: f64,
    /// Two-sided.
    pub p_value: f64,
}

/// Ordinary least squares fit of `y = intercept + slope * x`.
#[derive(Debug, Clone, PartialEq)]
pub struct Regression {
    pub dependent: String,
    pub n: usize,
    pub intercept: Coefficient,
    pub slope: Coefficient,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub f_statistic: f64,
    pub f_p_value: f64,
    pub residual_std_err: f64,
}

impl Regression {
    pub fn df_residuals(&self) -> usize {
        self.n - 2
    }
}

/// Fit `y ~ x` by OLS. Needs three points and variation in both series.
pub fn ols(
    x: &[f64],
    y: &[f64],
    regressor: &str,
    dependent: &str,
) -> Result<Regression, StatsError> {
    check_pairs(x, y, 3)?;
    let n = x.len();
    let (xbar, ybar, sxx, syy, sxy) = moments(x, y);
    if sxx == 0.0 {
        return Err(StatsError::ZeroVariance("x"));
    }
    if syy == 0.0 {
        return Err(StatsError::ZeroVariance("y"));
    }

    let slope = sxy / sxx;
    let intercept = ybar - slope * xbar;

    let sse: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| {
            let r = yi - (intercept + slope * xi);
            r * r
        })
        .sum();
    let df = (n - 2) as f64;
    let sigma2 = sse / df;
    let se_slope = (sigma2 / sxx).sqrt();
    let se_intercept = (sigma2 * (1.0 / n as f64 + xbar * xbar / sxx)).sqrt();

    let t_dist =
        StudentsT::new(0.0, 1.0, df).map_err(|e| StatsError::Distribution(e.to_string()))?;
    let f_dist =
        FisherSnedecor::new(1.0, df).map_err(|e| StatsError::Distribution(e.to_string()))?;
    let two_sided = |t: f64| 2.0 * (1.0 - t_dist.cdf(t.abs()));

    let r_squared = 1.0 - sse / syy;
    let adj_r_squared = 1.0 - (1.0 - r_squared) * (n as f64 - 1.0) / df;
    let f_statistic = (syy - sse) / sigma2;

    let coef = |name: &str, estimate: f64, std_err: f64| {
        let t = estimate / std_err;
        Coefficient {
            name: name.to_string(),
            estimate,
            std_err,
            t,
            p_value: two_sided(t),
        }
    };

    Ok(Regression {
        dependent: dependent.to_string(),
        n,
        intercept: coef("Intercept", intercept, se_intercept),
        slope: coef(regressor, slope, se_slope),
        r_squared,
        adj_r_squared,
        f_statistic,
        f_p_value: 1.0 - f_dist.cdf(f_statistic),
        residual_std_err: sigma2.sqrt(),
    })
}

const RULE: &str =
    "==============================================================================";
const THIN_RULE: &str =
    "------------------------------------------------------------------------------";

impl fmt::Display for Regression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:^78}", "OLS Regression Results")?;
        writeln!(f, "{}", RULE)?;
        writeln!(
            f,
            "{:<16}{:>22}   {:<20}{:>17.3}",
            "Dep. Variable:", self.dependent, "R-squared:", self.r_squared
        )?;
        writeln!(
            f,
            "{:<16}{:>22}   {:<20}{:>17.3}",
            "Model:", "OLS", "Adj. R-squared:", self.adj_r_squared
        )?;
        writeln!(
            f,
            "{:<16}{:>22}   {:<20}{:>17.3}",
            "No. Observations:", self.n, "F-statistic:", self.f_statistic
        )?;
        writeln!(
            f,
            "{:<16}{:>22}   {:<20}{:>17.3e}",
            "Df Residuals:",
            self.df_residuals(),
            "Prob (F-statistic):",
            self.f_p_value
        )?;
        writeln!(
            f,
            "{:<16}{:>22}   {:<20}{:>17.3}",
            "Df Model:", 1, "Residual Std. Err.:", self.residual_std_err
        )?;
        writeln!(f, "{}", RULE)?;
        writeln!(
            f,
            "{:<16}{:>12}{:>12}{:>12}{:>12}",
            "", "coef", "std err", "t", "P>|t|"
        )?;
        writeln!(f, "{}", THIN_RULE)?;
        for c in [&self.intercept, &self.slope] {
            writeln!(
                f,
                "{:<16}{:>12.4}{:>12.3}{:>12.3}{:>12.3}",
                c.name, c.estimate, c.std_err, c.t, c.p_value
            )?;
        }
        write!(f, "{}", RULE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const X: [f64; 5] = [1.0, 2.0, 3.0, 4.0, 5.0];
    const Y: [f64; 5] = [2.0, 4.0, 5.0, 4.0, 5.0];

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[10.0, 12.0, 14.0]), Some(12.0));
    }

    #[test]
    fn pearson_matches_hand_computation() -> Result<(), StatsError> {
        let r = pearson(&X, &Y)?;
        assert!(close(r, 6.0 / 60f64.sqrt(), 1e-12));
        assert!(close(pearson(&X, &X)?, 1.0, 1e-12));
        Ok(())
    }

    #[test]
    fn pearson_rejects_degenerate_input() {
        assert_eq!(
            pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]),
            Err(StatsError::ZeroVariance("x"))
        );
        assert_eq!(
            pearson(&[1.0], &[1.0]),
            Err(StatsError::NotEnoughData { needed: 2, got: 1 })
        );
        assert_eq!(
            pearson(&[1.0, 2.0], &[1.0]),
            Err(StatsError::LengthMismatch { x: 2, y: 1 })
        );
    }

    #[test]
    fn ols_matches_hand_computation() -> Result<(), StatsError> {
        let fit = ols(&X, &Y, "x", "y")?;
        assert!(close(fit.slope.estimate, 0.6, 1e-12));
        assert!(close(fit.intercept.estimate, 2.2, 1e-12));
        assert!(close(fit.r_squared, 0.6, 1e-12));
        assert!(close(fit.slope.std_err, 0.08f64.sqrt(), 1e-12));
        assert!(close(fit.intercept.std_err, 0.88f64.sqrt(), 1e-12));
        assert!(close(fit.f_statistic, 4.5, 1e-9));
        assert!(close(fit.f_statistic, fit.slope.t * fit.slope.t, 1e-9));
        // F(1, df) and t(df) tests of the slope agree
        assert!(close(fit.f_p_value, fit.slope.p_value, 1e-6));
        assert!(fit.slope.p_value > 0.1 && fit.slope.p_value < 0.15);
        assert_eq!(fit.df_residuals(), 3);
        Ok(())
    }

    #[test]
    fn r_squared_is_correlation_squared() -> Result<(), StatsError> {
        let x = [22.1, 23.4, 24.9, 25.3, 26.8, 27.0, 28.2];
        let y = [9.5, 11.0, 12.2, 13.9, 14.1, 15.8, 16.0];
        let r = pearson(&x, &y)?;
        let fit = ols(&x, &y, "log_gdp", "total")?;
        assert!(close(fit.r_squared, r * r, 1e-12));
        Ok(())
    }

    #[test]
    fn fits_are_bit_for_bit_reproducible() -> Result<(), StatsError> {
        let x = [21.3, 22.8, 23.1, 24.6, 25.0, 26.2, 27.9, 29.4];
        let y = [8.0, 10.0, 11.0, 12.0, 12.0, 14.0, 15.0, 16.0];
        let a = ols(&x, &y, "log_gdp", "total")?;
        let b = ols(&x, &y, "log_gdp", "total")?;
        assert_eq!(a.slope.estimate.to_bits(), b.slope.estimate.to_bits());
        assert_eq!(a.intercept.estimate.to_bits(), b.intercept.estimate.to_bits());
        assert_eq!(pearson(&x, &y)?.to_bits(), pearson(&x, &y)?.to_bits());
        Ok(())
    }

    #[test]
    fn ols_needs_three_points() {
        assert_eq!(
            ols(&[1.0, 2.0], &[3.0, 4.0], "x", "y"),
            Err(StatsError::NotEnoughData { needed: 3, got: 2 })
        );
    }

    #[test]
    fn histogram_uses_equal_width_bins() {
        let bins = histogram(&[1.0, 2.0, 2.0, 3.0, 10.0], 3);
        let counts: Vec<usize> = bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![4, 0, 1]);
        assert_eq!(bins[0].lower, 1.0);
        assert_eq!(bins[2].upper, 10.0);
    }

    #[test]
    fn histogram_of_constant_sample() {
        let bins = histogram(&[4.0, 4.0], 10);
        assert_eq!(bins.len(), 10);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
        assert!(close(bins[0].lower, 3.5, 1e-12));
        assert!(histogram(&[], 10).is_empty());
    }

    #[test]
    fn summary_lists_both_coefficients() -> Result<(), StatsError> {
        let text = ols(&X, &Y, "log_gdp", "total")?.to_string();
        assert!(text.contains("OLS Regression Results"));
        assert!(text.contains("Intercept"));
        assert!(text.contains("log_gdp"));
        assert!(text.contains("R-squared:"));
        Ok(())
    }
}
