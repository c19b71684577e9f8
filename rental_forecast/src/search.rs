//! Grid search over ARIMA orders by Akaike information criterion
//!
//! Candidates are visited in a fixed nested order: p outermost, then d, then q.
//! A fit that fails for any reason is recorded and skipped. A candidate only
//! replaces the incumbent when its AIC is strictly lower, so on ties the
//! earliest candidate in that order wins.
//!
//! Every candidate is scored from the same observation, `max(p) + max(d)`, so
//! the AIC values are computed over one common set of one-step errors.

use crate::error::{ForecastError, Result};
use crate::models::arima::{ArimaModel, ArimaOrder, TrainedArimaModel};
use crate::series::MonthlySeries;
use serde::{Deserialize, Serialize};
use series_math::NelderMeadConfig;
use tracing::trace;

/// Inclusive range of one order component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRange {
    pub min: usize,
    pub max: usize,
}

impl OrderRange {
    /// Create an inclusive range
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// Values in ascending order
    pub fn iter(&self) -> impl Iterator<Item = usize> {
        self.min..=self.max
    }

    /// Check membership
    pub fn contains(&self, value: usize) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Number of values in the range
    pub fn len(&self) -> usize {
        if self.max < self.min {
            0
        } else {
            self.max - self.min + 1
        }
    }

    /// Check if the range holds no values
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ranges of p, d and q explored by the search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSpace {
    pub p: OrderRange,
    pub d: OrderRange,
    pub q: OrderRange,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            p: OrderRange::new(0, 3),
            d: OrderRange::new(0, 1),
            q: OrderRange::new(0, 3),
        }
    }
}

impl SearchSpace {
    /// Create a search space from three inclusive ranges
    pub fn new(p: OrderRange, d: OrderRange, q: OrderRange) -> Self {
        Self { p, d, q }
    }

    /// Total number of candidate orders
    pub fn len(&self) -> usize {
        self.p.len() * self.d.len() * self.q.len()
    }

    /// Check if the space holds no candidates
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First observation with a full set of lags for every candidate
    pub fn conditioning_start(&self) -> usize {
        self.p.max + self.d.max
    }

    /// Check whether an order lies inside all three ranges
    pub fn contains(&self, order: ArimaOrder) -> bool {
        self.p.contains(order.p) && self.d.contains(order.d) && self.q.contains(order.q)
    }

    /// Reject inverted ranges
    pub fn validate(&self) -> Result<()> {
        for (name, range) in [("p", self.p), ("d", self.d), ("q", self.q)] {
            if range.is_empty() {
                return Err(ForecastError::InvalidParameter(format!(
                    "{} range is empty: min {} > max {}",
                    name, range.min, range.max
                )));
            }
        }
        Ok(())
    }
}

/// Result of fitting one candidate
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateOutcome {
    pub order: ArimaOrder,
    /// AIC of the fit, or `None` when the fit failed
    pub aic: Option<f64>,
}

/// Everything the search learned about one training series
#[derive(Debug, Clone)]
pub struct SearchReport {
    /// Lowest-AIC fit, if any candidate succeeded
    pub best: Option<TrainedArimaModel>,
    /// Every candidate in visiting order
    pub candidates: Vec<CandidateOutcome>,
}

impl SearchReport {
    /// Order of the winning fit
    pub fn best_order(&self) -> Option<ArimaOrder> {
        self.best.as_ref().map(TrainedArimaModel::order)
    }

    /// Number of candidates whose fit failed
    pub fn failures(&self) -> usize {
        self.candidates.iter().filter(|c| c.aic.is_none()).count()
    }

    /// Split into (model, order)
    pub fn into_parts(self) -> (Option<TrainedArimaModel>, Option<ArimaOrder>) {
        let order = self.best_order();
        (self.best, order)
    }
}

/// Exhaustive ARIMA order search
#[derive(Debug, Clone, Default)]
pub struct OrderSearch {
    space: SearchSpace,
    optimizer: NelderMeadConfig,
}

impl OrderSearch {
    /// Create a search over `space`
    pub fn new(space: SearchSpace) -> Self {
        Self {
            space,
            optimizer: NelderMeadConfig::default(),
        }
    }

    /// Use custom optimiser settings for every candidate
    pub fn with_optimizer(mut self, optimizer: NelderMeadConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Search space in use
    pub fn space(&self) -> &SearchSpace {
        &self.space
    }

    /// Fit every candidate to `train` and keep the lowest AIC
    pub fn run(&self, train: &MonthlySeries) -> SearchReport {
        let values = train.values();
        let start = self.space.conditioning_start();
        let mut best: Option<TrainedArimaModel> = None;
        let mut candidates = Vec::with_capacity(self.space.len());

        for p in self.space.p.iter() {
            for d in self.space.d.iter() {
                for q in self.space.q.iter() {
                    let order = ArimaOrder::new(p, d, q);
                    let fitted = ArimaModel::from_order(order)
                        .with_optimizer(self.optimizer)
                        .with_conditioning(start)
                        .fit(&values);

                    match fitted {
                        Ok(model) => {
                            candidates.push(CandidateOutcome {
                                order,
                                aic: Some(model.aic()),
                            });
                            let improves = best
                                .as_ref()
                                .map_or(true, |incumbent| model.aic() < incumbent.aic());
                            if improves {
                                best = Some(model);
                            }
                        }
                        Err(err) => {
                            trace!(group = train.group_key(), %order, error = %err, "candidate rejected");
                            candidates.push(CandidateOutcome { order, aic: None });
                        }
                    }
                }
            }
        }

        SearchReport { best, candidates }
    }
}

/// Search the Cartesian product of the three ranges and return the best fit and its order.
///
/// Returns `(None, None)` when every candidate failed.
pub fn grid_search(
    train: &MonthlySeries,
    p_range: OrderRange,
    d_range: OrderRange,
    q_range: OrderRange,
) -> (Option<TrainedArimaModel>, Option<ArimaOrder>) {
    OrderSearch::new(SearchSpace::new(p_range, d_range, q_range))
        .run(train)
        .into_parts()
}
