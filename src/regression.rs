//! Closed-form ordinary least squares over a single feature.

use serde::Serialize;

use crate::error::AnalyticsError;
use crate::stats;

/// Parameters of a fitted line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    pub fn predict_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.predict(x)).collect()
    }
}

/// Fits a least-squares line through the paired samples.
///
/// When every `x` is identical the slope is 0.0 and the line passes through
/// the mean of `y`. When every `y` is identical, r² is 1.0.
pub fn fit(x: &[f64], y: &[f64]) -> Result<LinearFit, AnalyticsError> {
    if x.is_empty() || y.is_empty() {
        return Err(AnalyticsError::EmptyInput);
    }
    if x.len() != y.len() {
        return Err(AnalyticsError::DimensionMismatch {
            left: x.len(),
            right: y.len(),
        });
    }

    let x_mean = stats::mean(x);
    let y_mean = stats::mean(y);
    let dx = stats::center(x, x_mean);
    let dy = stats::center(y, y_mean);

    let numerator = stats::dot(&dx, &dy)?;
    let denominator = stats::sum(&stats::power(&dx, 2));

    let slope = if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    };
    let intercept = y_mean - slope * x_mean;

    let partial = LinearFit {
        slope,
        intercept,
        r_squared: 0.0,
    };
    let residuals = stats::subtract(y, &partial.predict_many(x))?;
    let ss_res = stats::sum(&stats::power(&residuals, 2));
    let ss_tot = stats::sum(&stats::power(&dy, 2));
    let r_squared = if ss_tot == 0.0 {
        1.0
    } else {
        1.0 - ss_res / ss_tot
    };

    Ok(LinearFit {
        r_squared,
        ..partial
    })
}
