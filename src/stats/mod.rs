//! Online statistics for π estimation.
//!
//! # Governing Equations
//!
//! ```text
//! mean_i     = Σv / i
//! estimate_i = s · mean_i                      s = 4 (quarter circle) or 1 (integral)
//! var_i      = max(0, Σv² / i − mean_i²)       plug-in estimator
//! SE_i       = √(var_i / i)
//! band_i     = estimate_i ± s · SE_i
//! ```
//!
//! [`RunningAggregate`] holds the three sums and is updated one value at a
//! time; every derived quantity is computed on demand from a snapshot.

pub mod compare;
pub mod trace;

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::sampling::{SampleBatch, ScalingRule};

pub use compare::{compare, StrategyComparison};
pub use trace::ConvergenceTrace;

/// Running count, sum and sum of squares of observed values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningAggregate {
    /// Number of values observed.
    pub count: u64,
    /// Sum of values.
    pub sum: f64,
    /// Sum of squared values.
    pub sum_of_squares: f64,
}

impl RunningAggregate {
    /// Empty aggregate.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            sum_of_squares: 0.0,
        }
    }

    /// Aggregate of `values`.
    #[must_use]
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut aggregate = Self::new();
        aggregate.extend(values);
        aggregate
    }

    /// Append one value.
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.sum_of_squares += value * value;
    }

    /// Append values in order.
    pub fn extend(&mut self, values: impl IntoIterator<Item = f64>) {
        for value in values {
            self.push(value);
        }
    }

    /// Append every value of a batch.
    pub fn extend_batch(&mut self, batch: &SampleBatch) {
        self.extend(batch.values());
    }

    /// Combine with an aggregate of values observed after this one's.
    #[must_use]
    pub fn merge(self, later: Self) -> Self {
        Self {
            count: self.count + later.count,
            sum: self.sum + later.sum,
            sum_of_squares: self.sum_of_squares + later.sum_of_squares,
        }
    }

    /// Whether no values have been observed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Sample mean, `None` when empty.
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(self.sum / self.count as f64)
    }

    /// Plug-in variance, clamped at zero. `None` when empty.
    #[must_use]
    pub fn variance(&self) -> Option<f64> {
        let mean = self.mean()?;
        Some((self.sum_of_squares / self.count as f64 - mean * mean).max(0.0))
    }

    /// Standard error of the mean, `None` when empty.
    #[must_use]
    pub fn standard_error(&self) -> Option<f64> {
        Some((self.variance()? / self.count as f64).sqrt())
    }

    /// π estimate under `rule`, `None` when empty.
    #[must_use]
    pub fn estimate(&self, rule: ScalingRule) -> Option<f64> {
        self.mean().map(|m| rule.factor() * m)
    }

    /// Convergence point for the current prefix, `None` when empty.
    #[must_use]
    pub fn point(&self, rule: ScalingRule) -> Option<ConvergencePoint> {
        let estimate = self.estimate(rule)?;
        let standard_error = rule.factor() * self.standard_error()?;
        Some(ConvergencePoint {
            index: self.count,
            estimate,
            standard_error,
            lower_bound: estimate - standard_error,
            upper_bound: estimate + standard_error,
        })
    }
}

/// Estimate and one-standard-error band at a prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergencePoint {
    /// Prefix length (1-based).
    pub index: u64,
    /// π estimate.
    pub estimate: f64,
    /// Standard error on the π scale.
    pub standard_error: f64,
    /// `estimate − standard_error`.
    pub lower_bound: f64,
    /// `estimate + standard_error`.
    pub upper_bound: f64,
}

impl ConvergencePoint {
    /// `|estimate − π|`.
    #[must_use]
    pub fn absolute_error(&self) -> f64 {
        (self.estimate - PI).abs()
    }

    /// Whether `value` lies inside the band.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.lower_bound..=self.upper_bound).contains(&value)
    }
}

/// Final estimate formatted for display, `N/A` when there is no data.
#[must_use]
pub fn format_estimate(estimate: Option<f64>) -> String {
    estimate.map_or_else(|| "N/A".to_string(), |e| format!("{e:.4}"))
}
