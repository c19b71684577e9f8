//! Descriptive statistics and likelihood helpers

use crate::{MathError, Result};
use std::f64::consts::PI;

/// Arithmetic mean
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot take the mean of an empty slice".to_string(),
        ));
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance (divides by `n`)
pub fn variance(values: &[f64]) -> Result<f64> {
    let m = mean(values)?;
    Ok(values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64)
}

/// Concentrated Gaussian log-likelihood of `n` residuals with variance `sigma2`.
///
/// Uses the maximum-likelihood variance, so the quadratic term collapses to `n / 2`.
pub fn gaussian_log_likelihood(sigma2: f64, n: usize) -> Result<f64> {
    if n == 0 {
        return Err(MathError::InsufficientData(
            "Likelihood needs at least one residual".to_string(),
        ));
    }
    if !(sigma2.is_finite() && sigma2 > 0.0) {
        return Err(MathError::CalculationError(format!(
            "Residual variance must be positive and finite, got {}",
            sigma2
        )));
    }
    let n = n as f64;
    Ok(-0.5 * n * ((2.0 * PI * sigma2).ln() + 1.0))
}

/// `2k - 2 ln L`
pub fn akaike_information_criterion(log_likelihood: f64, params: usize) -> f64 {
    2.0 * params as f64 - 2.0 * log_likelihood
}
