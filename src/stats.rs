use crate::error::AnalyticsError;

pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        sum(values) / values.len() as f64
    }
}

/// Square root of the mean squared deviation (population variance).
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mu = mean(values);
    let variance = values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn check_dimensions(left: &[f64], right: &[f64]) -> Result<(), AnalyticsError> {
    if left.len() != right.len() {
        return Err(AnalyticsError::DimensionMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    Ok(())
}

pub fn subtract(left: &[f64], right: &[f64]) -> Result<Vec<f64>, AnalyticsError> {
    check_dimensions(left, right)?;
    Ok(left.iter().zip(right).map(|(a, b)| a - b).collect())
}

pub fn multiply(left: &[f64], right: &[f64]) -> Result<Vec<f64>, AnalyticsError> {
    check_dimensions(left, right)?;
    Ok(left.iter().zip(right).map(|(a, b)| a * b).collect())
}

pub fn dot(left: &[f64], right: &[f64]) -> Result<f64, AnalyticsError> {
    Ok(sum(&multiply(left, right)?))
}

/// Raises every value to `exponent`.
pub fn power(values: &[f64], exponent: i32) -> Vec<f64> {
    values.iter().map(|v| v.powi(exponent)).collect()
}

/// Subtracts a scalar from every value.
pub fn center(values: &[f64], offset: f64) -> Vec<f64> {
    values.iter().map(|v| v - offset).collect()
}
