//! Side-by-side standard-error comparison across strategies.
//!
//! Every registered strategy is sampled at the same request size with its
//! own independent random stream and reduced batch by batch to a single
//! [`RunningAggregate`](super::RunningAggregate). Deterministic strategies
//! reproduce across calls; the others do not unless the caller reuses the
//! seed.

use serde::Serialize;

use crate::engine::rng::SimRng;
use crate::error::PiResult;
use crate::executor::BatchExecutor;
use crate::sampling::{SampleCount, ScalingRule, StrategyKey, StrategyRegistry};

/// Samples reduced per batch; bounds memory for large grid sides.
pub const COMPARE_BATCH: usize = 65_536;

/// Comparison row for one strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyComparison {
    /// Strategy key.
    pub key: StrategyKey,
    /// Scaling rule used for the π-scale figures.
    pub scaling: ScalingRule,
    /// Number of values produced (`n²` for the grid).
    pub samples: u64,
    /// π estimate, `None` without data.
    pub estimate: Option<f64>,
    /// Standard error on the π scale, `None` without data.
    pub standard_error: Option<f64>,
}

/// Sample every registered strategy at `n` and report its standard error.
///
/// # Errors
///
/// Fails on the first strategy that cannot run; no partial table is
/// returned.
pub fn compare(
    registry: &StrategyRegistry,
    n: usize,
    rng: &mut SimRng,
) -> PiResult<Vec<StrategyComparison>> {
    let keys: Vec<StrategyKey> = registry.keys().collect();
    let streams = rng.partition(keys.len());

    keys.into_iter()
        .zip(streams)
        .map(|(key, mut stream)| {
            let strategy = registry.get(key);
            let scaling = strategy.descriptor().scaling;
            let aggregate = BatchExecutor::new(
                strategy,
                SampleCount::new(n),
                SampleCount::new(COMPARE_BATCH),
                stream,
            )?
            .aggregate()?;
            tracing::debug!(strategy = %key, samples = aggregate.count, "compared");
            Ok(StrategyComparison {
                key,
                scaling,
                samples: aggregate.count,
                estimate: aggregate.estimate(scaling),
                standard_error: aggregate.standard_error().map(|se| scaling.factor() * se),
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::PiError;
    use crate::sampling::{ExecutionBackend, ExecutionEnvironment};
    use crate::stats::RunningAggregate;

    #[test]
    fn test_one_row_per_strategy() {
        let registry = StrategyRegistry::new();
        let rows = compare(&registry, 1000, &mut SimRng::new(42)).expect("compare");
        let keys: Vec<StrategyKey> = rows.iter().map(|r| r.key).collect();
        assert_eq!(keys, StrategyKey::ALL.to_vec());
        for row in &rows {
            let expected = if row.key == StrategyKey::GpuGrid { 1_000_000 } else { 1000 };
            assert_eq!(row.samples, expected);
            assert!(row.standard_error.expect("se") >= 0.0);
        }
    }

    #[test]
    fn test_zero_samples_has_no_data() {
        let registry = StrategyRegistry::new();
        let rows = compare(&registry, 0, &mut SimRng::new(1)).expect("compare");
        assert!(rows.iter().all(|r| r.estimate.is_none() && r.standard_error.is_none()));
    }

    #[test]
    fn test_quarter_standard_error_scaled() {
        let registry = StrategyRegistry::new();
        let rows = compare(&registry, 10_000, &mut SimRng::new(5)).expect("compare");
        let quarter = &rows[StrategyKey::Quarter.index()];
        // √(p(1−p)/n)·4 with p = π/4
        let p = std::f64::consts::FRAC_PI_4;
        let expected = 4.0 * (p * (1.0 - p) / 10_000.0).sqrt();
        let se = quarter.standard_error.expect("se");
        assert!((se - expected).abs() < 0.002, "se {se}, expected {expected}");
    }

    #[test]
    fn test_polar_has_zero_error() {
        let registry = StrategyRegistry::new();
        let rows = compare(&registry, 500, &mut SimRng::new(5)).expect("compare");
        let polar = &rows[StrategyKey::Polar.index()];
        assert!(polar.standard_error.expect("se").abs() < f64::EPSILON);
    }

    #[test]
    fn test_deterministic_rows_reproduce() {
        let registry = StrategyRegistry::new();
        let a = compare(&registry, 300, &mut SimRng::new(1)).expect("compare");
        let b = compare(&registry, 300, &mut SimRng::new(2)).expect("compare");
        for key in [StrategyKey::Quasi, StrategyKey::GpuGrid] {
            assert_eq!(a[key.index()], b[key.index()]);
        }
        assert_ne!(
            a[StrategyKey::Quarter.index()].estimate,
            b[StrategyKey::Quarter.index()].estimate
        );
    }

    #[test]
    fn test_fresh_draws_per_call() {
        let registry = StrategyRegistry::new();
        let mut rng = SimRng::new(9);
        let a = compare(&registry, 300, &mut rng).expect("compare");
        let b = compare(&registry, 300, &mut rng).expect("compare");
        assert_ne!(
            a[StrategyKey::Integral.index()].estimate,
            b[StrategyKey::Integral.index()].estimate
        );
    }

    #[test]
    fn test_unsupported_backend_fails() {
        let registry = StrategyRegistry::with_grid_backend(
            ExecutionBackend::Accelerator,
            ExecutionEnvironment::detect(),
        );
        let err = compare(&registry, 10, &mut SimRng::new(1)).unwrap_err();
        assert!(matches!(err, PiError::UnsupportedExecutionEnvironment { .. }));
    }

    #[test]
    fn test_matches_single_batch_reduction() {
        let registry = StrategyRegistry::new();
        let rows = compare(&registry, 300, &mut SimRng::new(8)).expect("compare");
        let grid = registry
            .sample("gpuGrid", 300, &mut SimRng::new(0))
            .expect("sample");
        let whole = RunningAggregate::from_values(grid.values());
        let row = &rows[StrategyKey::GpuGrid.index()];
        assert_eq!(row.samples, 90_000);
        assert_eq!(row.estimate, whole.estimate(ScalingRule::QuarterCircle));
    }

    #[test]
    fn test_large_grid_side_reduced_in_batches() {
        let registry = StrategyRegistry::new();
        let side = 4_000;
        let rows = compare(&registry, side, &mut SimRng::new(1)).expect("compare");
        let grid = &rows[StrategyKey::GpuGrid.index()];
        assert_eq!(grid.samples, (side * side) as u64);
        assert!(grid.samples > 100 * COMPARE_BATCH as u64);
        let estimate = grid.estimate.expect("estimate");
        assert!((estimate - std::f64::consts::PI).abs() < 1e-3, "estimate {estimate}");
    }
}
