//! Deterministic grid quadrature.
//!
//! A request of `n` is the grid side: the strategy covers the `n × n` cell
//! centres of the unit square in row-major order, so its logical sequence
//! holds `n²` samples.
//!
//! ```text
//! i ∈ [0, n²):  x = (i mod n + ½)/n,  y = (⌊i/n⌋ + ½)/n
//! ```
//!
//! The strategy is modelled after a GPU kernel with one thread per cell.
//! Every cell is independent, so the CPU backend is a plain loop with
//! identical results. Requesting the accelerator backend where none is
//! available fails before any sampling work.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{
    inside_quarter_circle, Sample, SamplingStrategy, ScalingRule, StrategyDescriptor,
    StrategyKey,
};
use crate::engine::rng::UniformSource;
use crate::error::{PiError, PiResult};

/// Execution backend for grid evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionBackend {
    /// Sequential CPU loop.
    #[default]
    Cpu,
    /// Hardware accelerator.
    Accelerator,
}

impl fmt::Display for ExecutionBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => f.write_str("cpu"),
            Self::Accelerator => f.write_str("accelerator"),
        }
    }
}

/// Capabilities of the host the engine runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutionEnvironment {
    accelerator: bool,
}

impl ExecutionEnvironment {
    /// Environment of the current process.
    ///
    /// This build carries no accelerator runtime, so only the CPU backend is
    /// reported.
    #[must_use]
    pub const fn detect() -> Self {
        Self { accelerator: false }
    }

    /// Environment with explicit accelerator availability.
    #[must_use]
    pub const fn with_accelerator(accelerator: bool) -> Self {
        Self { accelerator }
    }

    /// Whether `backend` can run here.
    #[must_use]
    pub const fn supports(&self, backend: ExecutionBackend) -> bool {
        match backend {
            ExecutionBackend::Cpu => true,
            ExecutionBackend::Accelerator => self.accelerator,
        }
    }
}

/// `n × n` grid of cell centres.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridStrategy {
    backend: ExecutionBackend,
    environment: ExecutionEnvironment,
}

impl GridStrategy {
    /// Grid strategy on the given backend and environment.
    #[must_use]
    pub const fn new(backend: ExecutionBackend, environment: ExecutionEnvironment) -> Self {
        Self {
            backend,
            environment,
        }
    }

    /// Configured backend.
    #[must_use]
    pub const fn backend(&self) -> ExecutionBackend {
        self.backend
    }
}

impl SamplingStrategy for GridStrategy {
    fn descriptor(&self) -> StrategyDescriptor {
        StrategyDescriptor {
            key: StrategyKey::GpuGrid,
            label: "Grid quadrature",
            scaling: ScalingRule::QuarterCircle,
            deterministic: true,
            position_dependent: true,
        }
    }

    fn stream_len(&self, requested: usize) -> PiResult<usize> {
        requested
            .checked_mul(requested)
            .ok_or_else(|| PiError::invalid_count(format!("grid side {requested} overflows")))
    }

    fn ensure_supported(&self) -> PiResult<()> {
        if self.environment.supports(self.backend) {
            Ok(())
        } else {
            tracing::warn!(backend = %self.backend, "grid backend unavailable");
            Err(PiError::unsupported(
                StrategyKey::GpuGrid.as_str(),
                self.backend.to_string(),
            ))
        }
    }

    fn draw(&self, _source: &mut dyn UniformSource, index: usize, requested: usize) -> Sample {
        let side = requested as f64;
        let x = ((index % requested) as f64 + 0.5) / side;
        let y = ((index / requested) as f64 + 0.5) / side;
        Sample::at(x, y, inside_quarter_circle(x, y))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::engine::rng::SimRng;
    use crate::sampling::SampleSpan;
    use std::f64::consts::PI;

    fn cpu() -> GridStrategy {
        GridStrategy::default()
    }

    #[test]
    fn test_side_squared_samples() {
        let mut rng = SimRng::new(0);
        for n in [0, 1, 2, 7, 32] {
            assert_eq!(cpu().sample(&mut rng, n).expect("sample").len(), n * n);
        }
    }

    #[test]
    fn test_cell_centres_row_major() {
        let mut rng = SimRng::new(0);
        let batch = cpu().sample(&mut rng, 2).expect("sample");
        let points: Vec<(f64, f64)> = batch.points().flatten().collect();
        assert_eq!(
            points,
            vec![(0.25, 0.25), (0.75, 0.25), (0.25, 0.75), (0.75, 0.75)]
        );
        let values: Vec<f64> = batch.values().collect();
        assert_eq!(values, vec![1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_deterministic() {
        let a = cpu().sample(&mut SimRng::new(1), 50).expect("sample");
        let b = cpu().sample(&mut SimRng::new(2), 50).expect("sample");
        assert_eq!(a, b);
    }

    #[test]
    fn test_span_matches_full_grid() {
        let mut rng = SimRng::new(0);
        let full = cpu().sample(&mut rng, 10).expect("sample");
        let slice = cpu()
            .sample_range(
                &mut rng,
                SampleSpan {
                    requested: 10,
                    offset: 37,
                    len: 25,
                },
            )
            .expect("sample");
        assert_eq!(slice.samples(), &full.samples()[37..62]);
    }

    #[test]
    fn test_estimate_converges() {
        let mut rng = SimRng::new(0);
        let n = 400;
        let batch = cpu().sample(&mut rng, n).expect("sample");
        let estimate = 4.0 * batch.values().sum::<f64>() / (n * n) as f64;
        assert!((estimate - PI).abs() < 0.01, "estimate {estimate}");
    }

    #[test]
    fn test_accelerator_unavailable() {
        let strategy =
            GridStrategy::new(ExecutionBackend::Accelerator, ExecutionEnvironment::detect());
        let err = strategy.sample(&mut SimRng::new(0), 4).unwrap_err();
        assert!(matches!(
            err,
            PiError::UnsupportedExecutionEnvironment { ref backend, .. } if backend == "accelerator"
        ));
    }

    #[test]
    fn test_accelerator_matches_cpu() {
        let accel = GridStrategy::new(
            ExecutionBackend::Accelerator,
            ExecutionEnvironment::with_accelerator(true),
        );
        let mut rng = SimRng::new(0);
        assert_eq!(
            accel.sample(&mut rng, 16).expect("sample"),
            cpu().sample(&mut rng, 16).expect("sample")
        );
    }

    #[test]
    fn test_overflowing_side_rejected() {
        assert!(matches!(
            cpu().stream_len(usize::MAX),
            Err(PiError::InvalidSampleCount { .. })
        ));
    }

    #[test]
    fn test_backend_serde() {
        let backend: ExecutionBackend = serde_yaml::from_str("accelerator").expect("parse");
        assert_eq!(backend, ExecutionBackend::Accelerator);
        assert_eq!(ExecutionBackend::Cpu.to_string(), "cpu");
    }
}
