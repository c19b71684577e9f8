//! ARIMA models fitted by conditional sum of squares
//!
//! The series is differenced `d` times, an ARMA(p, q) is fitted to the result by
//! minimising the conditional sum of squared one-step errors with a bounded
//! Nelder-Mead search, and the Gaussian likelihood of those errors gives the AIC.
//! A constant is estimated only when `d == 0`; differenced models are drift-free.
//!
//! Errors are summed from a conditioning start on the original time axis. Models
//! compared by AIC must share that start so their likelihoods cover the same
//! observations; [`ArimaModel::with_conditioning`] sets it.

use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, PointForecast, TrainedForecastModel};
use crate::series::MonthlySeries;
use serde::{Deserialize, Serialize};
use series_math::{
    akaike_information_criterion, difference, gaussian_log_likelihood, integrate, mean,
    nelder_mead, NelderMeadConfig,
};
use std::fmt;

/// AR and MA coefficients are kept inside this box during estimation
const COEFFICIENT_BOUND: f64 = 0.99;

/// Residual variance floor, relative to the mean square of the series, so exact fits keep a
/// finite likelihood
const VARIANCE_FLOOR: f64 = 1e-10;

/// ARIMA order (p, d, q)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArimaOrder {
    /// Autoregressive lag count
    pub p: usize,
    /// Differencing degree
    pub d: usize,
    /// Moving-average lag count
    pub q: usize,
}

impl ArimaOrder {
    /// Create an order
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// ARIMA(0,1,0): a random walk without drift
    pub fn random_walk() -> Self {
        Self::new(0, 1, 0)
    }

    /// Whether the model carries a constant term
    pub fn has_constant(&self) -> bool {
        self.d == 0
    }

    /// Parameters in the mean equation (constant, AR and MA coefficients)
    pub fn mean_params(&self) -> usize {
        self.p + self.q + usize::from(self.has_constant())
    }

    /// Free parameters counted by the information criterion, including the innovation variance
    pub fn num_params(&self) -> usize {
        self.mean_params() + 1
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.p, self.d, self.q)
    }
}

/// ARIMA model (AutoRegressive Integrated Moving Average)
#[derive(Debug, Clone)]
pub struct ArimaModel {
    /// Name of the model
    name: String,
    /// Model order
    order: ArimaOrder,
    /// Settings for coefficient estimation
    optimizer: NelderMeadConfig,
    /// First observation whose one-step error enters the likelihood
    conditioning: Option<usize>,
}

/// Trained ARIMA model
#[derive(Debug, Clone)]
pub struct TrainedArimaModel {
    name: String,
    order: ArimaOrder,
    constant: f64,
    ar_coefficients: Vec<f64>,
    ma_coefficients: Vec<f64>,
    /// Training values on the original scale
    history: Vec<f64>,
    /// Training values after differencing
    differenced: Vec<f64>,
    /// One-step errors on the differenced scale (zero before the first conditioned point)
    residuals: Vec<f64>,
    /// Errors entering the likelihood
    n_effective: usize,
    sigma2: f64,
    log_likelihood: f64,
    aic: f64,
}

impl ArimaModel {
    /// Create a new ARIMA model
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self::from_order(ArimaOrder::new(p, d, q))
    }

    /// Create a model for an existing order
    pub fn from_order(order: ArimaOrder) -> Self {
        Self {
            name: format!("ARIMA{}", order),
            order,
            optimizer: NelderMeadConfig::default(),
            conditioning: None,
        }
    }

    /// Use custom optimiser settings
    pub fn with_optimizer(mut self, optimizer: NelderMeadConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Sum errors from observation `start` onwards.
    ///
    /// The start never falls below `p + d`, the first observation with a full set of lags.
    pub fn with_conditioning(mut self, start: usize) -> Self {
        self.conditioning = Some(start);
        self
    }

    /// Model order
    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    /// Index of the first observation whose error enters the likelihood
    pub fn conditioning_start(&self) -> usize {
        let own = self.order.p + self.order.d;
        self.conditioning.map_or(own, |start| start.max(own))
    }

    /// Fit the model to raw values in time order
    pub fn fit(&self, values: &[f64]) -> Result<TrainedArimaModel> {
        let d = self.order.d;

        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ModelError(format!(
                "{}: series contains non-finite values",
                self.name
            )));
        }

        let start = self.conditioning_start();
        let n_effective = values.len().saturating_sub(start);
        if n_effective == 0 || n_effective <= self.order.mean_params() {
            return Err(ForecastError::ModelError(format!(
                "{}: {} observations leave {} usable errors for {} coefficients",
                self.name,
                values.len(),
                n_effective,
                self.order.mean_params()
            )));
        }

        // on the differenced axis the first scored error sits at `start - d`
        let first = start - d;
        let differenced = difference(values, d);
        let scale = root_mean_square(values);
        let (constant, ar_coefficients, ma_coefficients) =
            self.estimate(&differenced, first, scale)?;
        let residuals = conditional_residuals(
            &differenced,
            constant,
            &ar_coefficients,
            &ma_coefficients,
        );
        let css: f64 = residuals[first..].iter().map(|e| e * e).sum();
        if !css.is_finite() {
            return Err(ForecastError::ModelError(format!(
                "{}: sum of squares is not finite",
                self.name
            )));
        }

        let floor = VARIANCE_FLOOR * scale * scale;
        let sigma2 = (css / n_effective as f64).max(floor);
        let log_likelihood = gaussian_log_likelihood(sigma2, n_effective)?;
        let aic = akaike_information_criterion(log_likelihood, self.order.num_params());
        if !aic.is_finite() {
            return Err(ForecastError::ModelError(format!(
                "{}: information criterion is not finite",
                self.name
            )));
        }

        Ok(TrainedArimaModel {
            name: self.name.clone(),
            order: self.order,
            constant,
            ar_coefficients,
            ma_coefficients,
            history: values.to_vec(),
            differenced,
            residuals,
            n_effective,
            sigma2,
            log_likelihood,
            aic,
        })
    }

    /// Estimate (constant, AR, MA) on the differenced scale.
    ///
    /// The simplex works on `x / scale` so its tolerance means the same thing at any
    /// price level; the returned constant is back in the units of `x`.
    fn estimate(
        &self,
        x: &[f64],
        first: usize,
        scale: f64,
    ) -> Result<(f64, Vec<f64>, Vec<f64>)> {
        let ArimaOrder { p, q, .. } = self.order;
        let with_constant = self.order.has_constant();

        if p == 0 && q == 0 {
            let constant = if with_constant { mean(&x[first..])? } else { 0.0 };
            return Ok((constant, Vec::new(), Vec::new()));
        }

        let x: Vec<f64> = x.iter().map(|v| v / scale).collect();
        let start_constant = if with_constant { mean(&x)? } else { 0.0 };

        let offset = usize::from(with_constant);
        let mut initial = Vec::with_capacity(offset + p + q);
        let mut bounds = Vec::with_capacity(offset + p + q);
        if with_constant {
            initial.push(start_constant);
            bounds.push((f64::NEG_INFINITY, f64::INFINITY));
        }
        for i in 0..p {
            initial.push(0.1 / (i + 1) as f64);
            bounds.push((-COEFFICIENT_BOUND, COEFFICIENT_BOUND));
        }
        for i in 0..q {
            initial.push(0.1 / (i + 1) as f64);
            bounds.push((-COEFFICIENT_BOUND, COEFFICIENT_BOUND));
        }

        let split = |params: &[f64]| {
            let constant = if with_constant { params[0] } else { 0.0 };
            let ar = params[offset..offset + p].to_vec();
            let ma = params[offset + p..].to_vec();
            (constant, ar, ma)
        };

        let result = nelder_mead(
            |params| {
                let (constant, ar, ma) = split(params);
                conditional_residuals(&x, constant, &ar, &ma)[first..]
                    .iter()
                    .map(|e| e * e)
                    .sum()
            },
            &initial,
            Some(&bounds),
            self.optimizer,
        );

        if !result.optimal_value.is_finite() {
            return Err(ForecastError::ModelError(format!(
                "{}: optimiser found no finite sum of squares after {} iterations",
                self.name, result.iterations
            )));
        }

        let (constant, ar, ma) = split(&result.optimal_point);
        Ok((constant * scale, ar, ma))
    }
}

impl ForecastModel for ArimaModel {
    type Trained = TrainedArimaModel;

    fn train(&self, series: &MonthlySeries) -> Result<TrainedArimaModel> {
        self.fit(&series.values())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedArimaModel {
    /// Assemble a model from known coefficients without fitting
    #[cfg(test)]
    pub(crate) fn from_parts(
        order: ArimaOrder,
        constant: f64,
        ar_coefficients: Vec<f64>,
        ma_coefficients: Vec<f64>,
        history: Vec<f64>,
    ) -> Self {
        let differenced = difference(&history, order.d);
        let residuals = vec![0.0; differenced.len()];
        Self {
            name: format!("ARIMA{}", order),
            order,
            constant,
            ar_coefficients,
            ma_coefficients,
            n_effective: differenced.len(),
            history,
            differenced,
            residuals,
            sigma2: 1.0,
            log_likelihood: 0.0,
            aic: 0.0,
        }
    }

    /// Model order
    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    /// Akaike information criterion
    pub fn aic(&self) -> f64 {
        self.aic
    }

    /// Maximised (concentrated) log-likelihood
    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// Innovation variance estimate
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Constant on the differenced scale (zero when `d > 0`)
    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Fitted AR coefficients
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    /// Fitted MA coefficients
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    /// One-step errors on the differenced scale
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Number of training observations
    pub fn n_obs(&self) -> usize {
        self.history.len()
    }

    /// Number of one-step errors the likelihood was computed over
    pub fn n_effective(&self) -> usize {
        self.n_effective
    }
}

impl TrainedForecastModel for TrainedArimaModel {
    fn forecast(&self, steps: usize) -> Result<PointForecast> {
        let mut x = self.differenced.clone();
        let mut errors = self.residuals.clone();

        for _ in 0..steps {
            let t = x.len();
            let mut prediction = self.constant;
            for (i, phi) in self.ar_coefficients.iter().enumerate() {
                if t > i {
                    prediction += phi * (x[t - 1 - i] - self.constant);
                }
            }
            for (j, theta) in self.ma_coefficients.iter().enumerate() {
                if t > j {
                    prediction += theta * errors[t - 1 - j];
                }
            }
            x.push(prediction);
            errors.push(0.0);
        }

        let ahead = &x[self.differenced.len()..];
        let values = integrate(ahead, &self.history, self.order.d);
        PointForecast::new(values, steps)
    }

    fn score(&self) -> f64 {
        self.aic
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Root mean square of `values`, or 1 for an all-zero series
fn root_mean_square(values: &[f64]) -> f64 {
    let rms = (values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64).sqrt();
    if rms.is_finite() && rms > 0.0 {
        rms
    } else {
        1.0
    }
}

/// One-step errors of an ARMA on `x`, conditioning on the first `ar.len()` points
fn conditional_residuals(x: &[f64], constant: f64, ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let p = ar.len();
    let mut residuals = vec![0.0; x.len()];
    for t in p..x.len() {
        let mut prediction = constant;
        for (i, phi) in ar.iter().enumerate() {
            prediction += phi * (x[t - 1 - i] - constant);
        }
        for (j, theta) in ma.iter().enumerate() {
            if t > j {
                prediction += theta * residuals[t - 1 - j];
            }
        }
        residuals[t] = x[t] - prediction;
    }
    residuals
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn parameter_count_includes_constant_only_without_differencing() {
        assert_eq!(ArimaOrder::new(1, 0, 1).num_params(), 4);
        assert_eq!(ArimaOrder::new(1, 1, 1).num_params(), 3);
        assert_eq!(ArimaOrder::random_walk().num_params(), 1);
    }

    #[test]
    fn random_walk_repeats_last_value() {
        let model = ArimaModel::from_order(ArimaOrder::random_walk())
            .fit(&[10.0, 12.0, 11.0, 13.0, 12.0, 14.0])
            .unwrap();

        let forecast = model.forecast(2).unwrap();

        assert_eq!(forecast.values(), &[14.0, 14.0]);
    }

    #[test]
    fn white_noise_forecasts_the_mean() {
        let values = [5.0, 7.0, 5.0, 7.0, 5.0, 7.0];
        let model = ArimaModel::new(0, 0, 0).fit(&values).unwrap();

        assert_approx_eq!(model.constant(), 6.0);
        assert_eq!(model.forecast(3).unwrap().values(), &[6.0, 6.0, 6.0]);
    }

    #[test]
    fn ar1_recovers_persistence() {
        // x_t = 0.6 x_{t-1} around zero, started far from the mean
        let mut values = vec![10.0];
        for _ in 0..30 {
            let last = *values.last().unwrap();
            values.push(0.6 * last);
        }
        let model = ArimaModel::new(1, 0, 0).fit(&values).unwrap();

        assert_approx_eq!(model.ar_coefficients()[0], 0.6, 0.05);
    }

    #[test]
    fn conditioning_start_never_precedes_own_lags() {
        assert_eq!(ArimaModel::new(2, 1, 0).conditioning_start(), 3);
        assert_eq!(ArimaModel::new(2, 1, 0).with_conditioning(1).conditioning_start(), 3);
        assert_eq!(ArimaModel::new(0, 0, 1).with_conditioning(4).conditioning_start(), 4);
    }

    #[test]
    fn shared_start_scores_the_same_observations() {
        let values = [10.0, 12.0, 11.0, 13.0, 12.0, 14.0, 13.0, 15.0];
        let white_noise = ArimaModel::new(0, 0, 0)
            .with_conditioning(4)
            .fit(&values)
            .unwrap();
        let ar1 = ArimaModel::new(1, 1, 0)
            .with_conditioning(4)
            .fit(&values)
            .unwrap();

        assert_eq!(white_noise.n_effective(), 4);
        assert_eq!(ar1.n_effective(), 4);
        // mean of the scored window, not of the whole series
        assert_approx_eq!(white_noise.constant(), 13.5);
    }

    #[test]
    fn too_short_for_lags_is_an_error() {
        let result = ArimaModel::new(3, 1, 3).fit(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert!(matches!(result, Err(ForecastError::ModelError(_))));
    }

    #[test]
    fn non_finite_input_is_an_error() {
        let result = ArimaModel::new(0, 0, 0).fit(&[1.0, f64::NAN, 3.0]);
        assert!(result.is_err());
    }

    #[test]
    fn residuals_condition_on_ar_lags() {
        let residuals = conditional_residuals(&[1.0, 2.0, 3.0], 0.0, &[1.0], &[]);
        assert_eq!(residuals, vec![0.0, 1.0, 1.0]);
    }
}
