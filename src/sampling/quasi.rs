//! Quasi-Monte Carlo rejection sampling on the Halton(2, 3) point set.
//!
//! Logical index `k` maps to Halton index `k + 1`, so a batch that starts at
//! offset `o` continues the sequence at `o + 1` rather than restarting.
//! Discrepancy of the point set is `O(log² n / n)`, which beats the
//! `O(n^{-1/2})` error of pseudo-random sampling.

use super::{
    halton, inside_quarter_circle, Sample, SamplingStrategy, ScalingRule, StrategyDescriptor,
    StrategyKey,
};
use crate::engine::rng::UniformSource;

/// Halton base for the x coordinate.
pub const BASE_X: u32 = 2;
/// Halton base for the y coordinate.
pub const BASE_Y: u32 = 3;

/// Low-discrepancy quarter-circle sampling.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuasiStrategy;

impl SamplingStrategy for QuasiStrategy {
    fn descriptor(&self) -> StrategyDescriptor {
        StrategyDescriptor {
            key: StrategyKey::Quasi,
            label: "Halton quasi-random",
            scaling: ScalingRule::QuarterCircle,
            deterministic: true,
            position_dependent: true,
        }
    }

    fn draw(&self, _source: &mut dyn UniformSource, index: usize, _requested: usize) -> Sample {
        let i = index as u64 + 1;
        let x = halton(i, BASE_X);
        let y = halton(i, BASE_Y);
        Sample::at(x, y, inside_quarter_circle(x, y))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::engine::rng::{ScriptedSource, SimRng};
    use crate::sampling::SampleSpan;
    use std::f64::consts::PI;

    #[test]
    fn test_first_points() {
        let mut rng = SimRng::new(0);
        let batch = QuasiStrategy.sample(&mut rng, 3).expect("sample");
        let points: Vec<(f64, f64)> = batch.points().flatten().collect();
        assert!((points[0].0 - 0.5).abs() < 1e-15);
        assert!((points[0].1 - 1.0 / 3.0).abs() < 1e-15);
        assert!((points[1].0 - 0.25).abs() < 1e-15);
        assert!((points[1].1 - 2.0 / 3.0).abs() < 1e-15);
        assert!((points[2].0 - 0.75).abs() < 1e-15);
        assert!((points[2].1 - 1.0 / 9.0).abs() < 1e-15);
    }

    #[test]
    fn test_deterministic_regardless_of_source() {
        let a = QuasiStrategy
            .sample(&mut SimRng::new(1), 500)
            .expect("sample");
        let b = QuasiStrategy
            .sample(&mut ScriptedSource::new(vec![0.3]), 500)
            .expect("sample");
        assert_eq!(a, b);
    }

    #[test]
    fn test_does_not_consume_draws() {
        let mut source = ScriptedSource::new(vec![0.3]);
        let _ = QuasiStrategy.sample(&mut source, 100).expect("sample");
        assert_eq!(source.consumed(), 0);
    }

    #[test]
    fn test_span_continues_sequence() {
        let mut rng = SimRng::new(0);
        let whole = QuasiStrategy.sample(&mut rng, 10).expect("sample");
        let tail = QuasiStrategy
            .sample_range(
                &mut rng,
                SampleSpan {
                    requested: 10,
                    offset: 6,
                    len: 4,
                },
            )
            .expect("sample");
        assert_eq!(tail.offset(), 6);
        assert_eq!(tail.samples(), &whole.samples()[6..]);
    }

    #[test]
    fn test_converges_faster_than_pseudo_random_bound() {
        let mut rng = SimRng::new(0);
        let n = 100_000;
        let batch = QuasiStrategy.sample(&mut rng, n).expect("sample");
        let estimate = 4.0 * batch.values().sum::<f64>() / n as f64;
        // Pseudo-random 1σ at this n is ~0.005.
        assert!((estimate - PI).abs() < 2e-3, "estimate {estimate}");
    }
}
