//! Per-prefix convergence trace.
//!
//! Records one [`ConvergencePoint`] for every prefix of the value stream,
//! which is what a convergence plot draws. The trace is built incrementally
//! so each arriving batch costs time proportional to its own length.

use serde::{Deserialize, Serialize};

use super::{ConvergencePoint, RunningAggregate};
use crate::sampling::ScalingRule;

/// Convergence points for every prefix of a value stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceTrace {
    rule: ScalingRule,
    aggregate: RunningAggregate,
    points: Vec<ConvergencePoint>,
}

impl ConvergenceTrace {
    /// Empty trace for a strategy with `rule`.
    #[must_use]
    pub fn new(rule: ScalingRule) -> Self {
        Self {
            rule,
            aggregate: RunningAggregate::new(),
            points: Vec::new(),
        }
    }

    /// Trace of `values`.
    #[must_use]
    pub fn from_values(values: impl IntoIterator<Item = f64>, rule: ScalingRule) -> Self {
        let mut trace = Self::new(rule);
        trace.extend(values);
        trace
    }

    /// Append values in arrival order, one point per value.
    pub fn extend(&mut self, values: impl IntoIterator<Item = f64>) {
        let values = values.into_iter();
        self.points.reserve(values.size_hint().0);
        for value in values {
            self.aggregate.push(value);
            if let Some(point) = self.aggregate.point(self.rule) {
                self.points.push(point);
            }
        }
    }

    /// Scaling rule in effect.
    #[must_use]
    pub const fn rule(&self) -> ScalingRule {
        self.rule
    }

    /// Aggregate over everything seen so far.
    #[must_use]
    pub const fn aggregate(&self) -> &RunningAggregate {
        &self.aggregate
    }

    /// All points, index 1 first.
    #[must_use]
    pub fn points(&self) -> &[ConvergencePoint] {
        &self.points
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the trace is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Latest point, `None` when empty.
    #[must_use]
    pub fn last(&self) -> Option<&ConvergencePoint> {
        self.points.last()
    }

    /// Final estimate, `None` when empty.
    #[must_use]
    pub fn final_estimate(&self) -> Option<f64> {
        self.last().map(|p| p.estimate)
    }

    /// Smallest lower bound and largest upper bound over the trace.
    #[must_use]
    pub fn extent(&self) -> Option<(f64, f64)> {
        let first = self.points.first()?;
        Some(self.points.iter().fold(
            (first.lower_bound, first.upper_bound),
            |(lo, hi), p| (lo.min(p.lower_bound), hi.max(p.upper_bound)),
        ))
    }

    /// Log-log least-squares slope of `|estimate − π|` against the index.
    ///
    /// Pseudo-random strategies give roughly −0.5; low-discrepancy ones are
    /// steeper. Points with zero error are skipped. Returns 0 when fewer than
    /// three usable points exist.
    #[must_use]
    pub fn convergence_slope(&self) -> f64 {
        let points: Vec<(f64, f64)> = self
            .points
            .iter()
            .filter(|p| p.absolute_error() > f64::EPSILON)
            .map(|p| ((p.index as f64).ln(), p.absolute_error().ln()))
            .collect();

        if points.len() < 3 {
            return 0.0;
        }

        let n = points.len() as f64;
        let sum_x: f64 = points.iter().map(|(x, _)| x).sum();
        let sum_y: f64 = points.iter().map(|(_, y)| y).sum();
        let sum_xy: f64 = points.iter().map(|(x, y)| x * y).sum();
        let sum_x2: f64 = points.iter().map(|(x, _)| x * x).sum();

        let denominator = n * sum_x2 - sum_x * sum_x;
        if denominator.abs() < f64::EPSILON {
            return 0.0;
        }

        (n * sum_xy - sum_x * sum_y) / denominator
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::engine::rng::SimRng;
    use crate::sampling::{QuarterStrategy, QuasiStrategy, SamplingStrategy};
    use std::f64::consts::PI;

    #[test]
    fn test_one_point_per_value() {
        let trace = ConvergenceTrace::from_values([1.0, 0.0, 1.0, 1.0], ScalingRule::QuarterCircle);
        assert_eq!(trace.len(), 4);
        let estimates: Vec<f64> = trace.points().iter().map(|p| p.estimate).collect();
        assert_eq!(estimates, vec![4.0, 2.0, 4.0 * 2.0 / 3.0, 3.0]);
        let indices: Vec<u64> = trace.points().iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_empty_trace() {
        let trace = ConvergenceTrace::new(ScalingRule::DirectIntegral);
        assert!(trace.is_empty());
        assert_eq!(trace.final_estimate(), None);
        assert_eq!(trace.extent(), None);
        assert!(trace.convergence_slope().abs() < f64::EPSILON);
    }

    #[test]
    fn test_incremental_matches_bulk() {
        let values: Vec<f64> = (0..50).map(|i| if i % 3 == 0 { 0.0 } else { 1.0 }).collect();
        let bulk = ConvergenceTrace::from_values(values.iter().copied(), ScalingRule::QuarterCircle);
        let mut incremental = ConvergenceTrace::new(ScalingRule::QuarterCircle);
        for chunk in values.chunks(7) {
            incremental.extend(chunk.iter().copied());
        }
        assert_eq!(bulk, incremental);
    }

    #[test]
    fn test_direct_integral_unscaled() {
        let trace = ConvergenceTrace::from_values([4.0, 2.0], ScalingRule::DirectIntegral);
        let last = trace.last().expect("point");
        assert!((last.estimate - 3.0).abs() < f64::EPSILON);
        // var = (16+4)/2 − 9 = 1, SE = √(1/2)
        assert!((last.standard_error - 0.5_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_extent_covers_bands() {
        let trace = ConvergenceTrace::from_values([1.0, 0.0, 0.0, 1.0], ScalingRule::QuarterCircle);
        let (lo, hi) = trace.extent().expect("extent");
        for p in trace.points() {
            assert!(lo <= p.lower_bound && p.upper_bound <= hi);
        }
    }

    #[test]
    fn test_quarter_band_covers_pi_eventually() {
        let mut rng = SimRng::new(7);
        let batch = QuarterStrategy.sample(&mut rng, 100_000).expect("sample");
        let trace = ConvergenceTrace::from_values(batch.values(), ScalingRule::QuarterCircle);
        let last = trace.last().expect("point");
        // 4σ band
        assert!((last.estimate - PI).abs() < 4.0 * last.standard_error);
    }

    #[test]
    fn test_quasi_error_below_pseudo_random_band() {
        let mut rng = SimRng::new(0);
        let n = 50_000;
        let quasi = QuasiStrategy.sample(&mut rng, n).expect("sample");
        let trace = ConvergenceTrace::from_values(quasi.values(), ScalingRule::QuarterCircle);
        let last = trace.last().expect("point");
        // The band is the pseudo-random 1σ scale at the same n.
        assert!(last.absolute_error() < last.standard_error);
    }

    #[test]
    fn test_slope_from_synthetic_history() {
        // |error| = n^-1 exactly → slope −1
        let points: Vec<ConvergencePoint> = (1..=20u64)
            .map(|i| {
                let n = 10 * i;
                let estimate = PI + 1.0 / n as f64;
                ConvergencePoint {
                    index: n,
                    estimate,
                    standard_error: 0.0,
                    lower_bound: estimate,
                    upper_bound: estimate,
                }
            })
            .collect();
        let trace = ConvergenceTrace {
            rule: ScalingRule::DirectIntegral,
            aggregate: RunningAggregate::new(),
            points,
        };
        assert!((trace.convergence_slope() + 1.0).abs() < 1e-6);
    }
}
