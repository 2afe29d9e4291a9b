//! Pseudo-random strategies.
//!
//! Every strategy here is position independent: the logical index is ignored
//! and each sample consumes fresh draws from the source, in a fixed order.
//!
//! # Governing Equations
//!
//! ```text
//! quarter:     P(x²+y² < 1) = π/4                       x,y ~ U(0,1)
//! polar:       P(r < 1) with r ~ U(0,1), θ ~ U(0,π/2)   (always inside)
//! integral:    E[4√(1−x²)] = π                           x ~ U(0,1)
//! buffon:      P(d ≤ ½ sin θ) = 2/π                      d ~ U(0,½), θ ~ U(0,π)
//! importance:  E_p[2π(1−x²)] = π      p(x) = 2/(π√(1−x²)), x = sin(πu/2)
//! ```

use std::f64::consts::{FRAC_PI_2, PI};

use super::{
    inside_quarter_circle, Sample, SamplingStrategy, ScalingRule, StrategyDescriptor,
    StrategyKey,
};
use crate::engine::rng::UniformSource;

/// Uniform rejection sampling in the unit square.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuarterStrategy;

impl SamplingStrategy for QuarterStrategy {
    fn descriptor(&self) -> StrategyDescriptor {
        StrategyDescriptor {
            key: StrategyKey::Quarter,
            label: "Uniform rejection",
            scaling: ScalingRule::QuarterCircle,
            deterministic: false,
            position_dependent: false,
        }
    }

    fn draw(&self, source: &mut dyn UniformSource, _index: usize, _requested: usize) -> Sample {
        let x = source.next_f64();
        let y = source.next_f64();
        Sample::at(x, y, inside_quarter_circle(x, y))
    }
}

/// Direct quadrature of `4·√(1−x²)` over `[0, 1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegralStrategy;

impl SamplingStrategy for IntegralStrategy {
    fn descriptor(&self) -> StrategyDescriptor {
        StrategyDescriptor {
            key: StrategyKey::Integral,
            label: "Direct integral",
            scaling: ScalingRule::DirectIntegral,
            deterministic: false,
            position_dependent: false,
        }
    }

    fn draw(&self, source: &mut dyn UniformSource, _index: usize, _requested: usize) -> Sample {
        let x = source.next_f64();
        Sample::scalar(4.0 * (1.0 - x * x).max(0.0).sqrt())
    }
}

/// Buffon's needle in `(d, θ)` coordinates.
///
/// Values are crossing indicators with mean `2/π`. They are scaled by the
/// ×4 quarter-circle convention shared with the other indicator strategies,
/// so the raw estimate converges to `8/π`, not π.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuffonStrategy;

impl SamplingStrategy for BuffonStrategy {
    fn descriptor(&self) -> StrategyDescriptor {
        StrategyDescriptor {
            key: StrategyKey::Buffon,
            label: "Buffon's needle",
            scaling: ScalingRule::QuarterCircle,
            deterministic: false,
            position_dependent: false,
        }
    }

    fn draw(&self, source: &mut dyn UniformSource, _index: usize, _requested: usize) -> Sample {
        let d = source.next_range(0.0, 0.5);
        let theta = source.next_range(0.0, PI);
        let crosses = if d <= 0.5 * theta.sin() { 1.0 } else { 0.0 };
        Sample::at(d, theta, crosses)
    }
}

/// Uniform `(r, θ)` mapped to Cartesian coordinates.
///
/// Points cluster toward the origin and `r < 1` always holds, so every value
/// is 1. Kept as a demonstration of a biased sampler.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolarStrategy;

impl SamplingStrategy for PolarStrategy {
    fn descriptor(&self) -> StrategyDescriptor {
        StrategyDescriptor {
            key: StrategyKey::Polar,
            label: "Polar uniform",
            scaling: ScalingRule::QuarterCircle,
            deterministic: false,
            position_dependent: false,
        }
    }

    fn draw(&self, source: &mut dyn UniformSource, _index: usize, _requested: usize) -> Sample {
        let theta = source.next_range(0.0, FRAC_PI_2);
        let r = source.next_f64();
        let x = r * theta.cos();
        let y = r * theta.sin();
        Sample::at(x, y, inside_quarter_circle(x, y))
    }
}

/// Importance sampling with density `2/(π√(1−x²))`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportanceStrategy;

impl SamplingStrategy for ImportanceStrategy {
    fn descriptor(&self) -> StrategyDescriptor {
        StrategyDescriptor {
            key: StrategyKey::Importance,
            label: "Importance sampling",
            scaling: ScalingRule::DirectIntegral,
            deterministic: false,
            position_dependent: false,
        }
    }

    fn draw(&self, source: &mut dyn UniformSource, _index: usize, _requested: usize) -> Sample {
        let u = source.next_f64();
        let x = (FRAC_PI_2 * u).sin();
        Sample::at(x, 0.0, 2.0 * PI * (1.0 - x * x))
    }
}
