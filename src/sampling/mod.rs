//! Sampling strategies for π estimation.
//!
//! Each strategy turns uniform draws into a sequence of [`Sample`]s: an
//! optional 2D point for plotting plus the scalar value that feeds the
//! estimator. How the mean of those values becomes π is described by the
//! strategy's [`ScalingRule`].
//!
//! # Strategies
//!
//! | Key | Technique | Scaling |
//! |---|---|---|
//! | `quarter` | uniform rejection in the unit square | ×4 |
//! | `quasi` | Halton(2, 3) low-discrepancy points | ×4 |
//! | `integral` | plain quadrature of `4·√(1−x²)` | ×1 |
//! | `buffon` | needle drop `(d, θ)` | ×4 |
//! | `polar` | `(r, θ)` uniform in polar coordinates | ×4 |
//! | `importance` | inverse-CDF draw from `2/(π√(1−x²))` | ×1 |
//! | `gpuGrid` | deterministic `n × n` cell centres | ×4 |
//!
//! Strategies are addressed by a logical sample index. A batch is a
//! contiguous [`SampleSpan`] of that index space, so splitting a run into
//! batches never restarts position-dependent sequences.

mod count;
pub mod grid;
pub mod halton;
pub mod quasi;
pub mod registry;
pub mod uniform;

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::engine::rng::UniformSource;
use crate::error::{PiError, PiResult};

pub use count::SampleCount;
pub use grid::{ExecutionBackend, ExecutionEnvironment, GridStrategy};
pub use halton::{halton, HaltonSequence};
pub use quasi::QuasiStrategy;
pub use registry::StrategyRegistry;
pub use uniform::{
    BuffonStrategy, ImportanceStrategy, IntegralStrategy, PolarStrategy, QuarterStrategy,
};

/// How the mean of raw sample values converts to a π estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScalingRule {
    /// Values are quarter-circle indicators; mean × 4 estimates π.
    QuarterCircle,
    /// The mean of the values already estimates π.
    DirectIntegral,
}

impl ScalingRule {
    /// Multiplier applied to both the mean and its standard error.
    #[must_use]
    pub const fn factor(self) -> f64 {
        match self {
            Self::QuarterCircle => 4.0,
            Self::DirectIntegral => 1.0,
        }
    }
}

/// Registry key of a sampling strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StrategyKey {
    /// Uniform rejection sampling.
    Quarter,
    /// Halton low-discrepancy sampling.
    Quasi,
    /// Direct quadrature.
    Integral,
    /// Buffon's needle.
    Buffon,
    /// Polar-uniform sampling.
    Polar,
    /// Importance sampling.
    Importance,
    /// Deterministic grid quadrature.
    GpuGrid,
}

impl StrategyKey {
    /// All keys in registration order.
    pub const ALL: [Self; 7] = [
        Self::Quarter,
        Self::Quasi,
        Self::Integral,
        Self::Buffon,
        Self::Polar,
        Self::Importance,
        Self::GpuGrid,
    ];

    /// Wire name of the key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quarter => "quarter",
            Self::Quasi => "quasi",
            Self::Integral => "integral",
            Self::Buffon => "buffon",
            Self::Polar => "polar",
            Self::Importance => "importance",
            Self::GpuGrid => "gpuGrid",
        }
    }

    /// Exact lookup by wire name.
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }

    /// Lookup by wire name, falling back to [`StrategyKey::Quarter`].
    #[must_use]
    pub fn resolve(key: &str) -> Self {
        Self::parse(key).unwrap_or(Self::Quarter)
    }

    /// Position in [`StrategyKey::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for StrategyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StrategyDescriptor {
    /// Unique registry key.
    pub key: StrategyKey,
    /// Human-readable name.
    pub label: &'static str,
    /// How values convert to a π estimate.
    pub scaling: ScalingRule,
    /// Same request always yields bit-identical samples.
    pub deterministic: bool,
    /// Output depends on the absolute logical index.
    pub position_dependent: bool,
}

/// One generated sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Point for visualization, if the strategy has one.
    pub point: Option<(f64, f64)>,
    /// Scalar fed to the estimator.
    pub value: f64,
}

impl Sample {
    /// Sample with a plottable point.
    #[must_use]
    pub const fn at(x: f64, y: f64, value: f64) -> Self {
        Self {
            point: Some((x, y)),
            value,
        }
    }

    /// Sample without a point.
    #[must_use]
    pub const fn scalar(value: f64) -> Self {
        Self { point: None, value }
    }
}

/// Quarter-circle membership test shared by the rejection-style strategies.
#[inline]
pub(crate) fn inside_quarter_circle(x: f64, y: f64) -> f64 {
    if x * x + y * y < 1.0 {
        1.0
    } else {
        0.0
    }
}

/// Ordered samples produced by one strategy call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleBatch {
    /// Logical index of the first sample.
    offset: usize,
    samples: Vec<Sample>,
}

impl SampleBatch {
    /// Create a batch starting at logical index `offset`.
    #[must_use]
    pub fn new(offset: usize, samples: Vec<Sample>) -> Self {
        Self { offset, samples }
    }

    /// Logical index of the first sample.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Logical index one past the last sample.
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + self.samples.len()
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples in generation order.
    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Scalar values in generation order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.value)
    }

    /// Points in generation order, `None` for point-less samples.
    pub fn points(&self) -> impl Iterator<Item = Option<(f64, f64)>> + '_ {
        self.samples.iter().map(|s| s.point)
    }

    /// Append `next`, which must start where this batch ends.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSampleCount` if the batches are not contiguous.
    pub fn append(&mut self, next: Self) -> PiResult<()> {
        if next.offset != self.end() {
            return Err(PiError::invalid_count(format!(
                "batch at offset {} does not continue stream ending at {}",
                next.offset,
                self.end()
            )));
        }
        self.samples.extend(next.samples);
        Ok(())
    }

    /// Consume the batch, returning its samples.
    #[must_use]
    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }
}

/// A contiguous slice of a strategy's logical sample sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSpan {
    /// Caller's requested count (grid side for `gpuGrid`).
    pub requested: usize,
    /// Logical index of the first sample.
    pub offset: usize,
    /// Number of samples in the slice.
    pub len: usize,
}

impl SampleSpan {
    /// Span covering the whole logical sequence.
    #[must_use]
    pub const fn full(requested: usize, logical_len: usize) -> Self {
        Self {
            requested,
            offset: 0,
            len: logical_len,
        }
    }

    /// Logical indices covered by the span.
    #[must_use]
    pub const fn indices(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }

    fn check(&self, logical_len: usize) -> PiResult<()> {
        match self.offset.checked_add(self.len) {
            Some(end) if end <= logical_len => Ok(()),
            _ => Err(PiError::invalid_count(format!(
                "span {}..{} exceeds logical length {logical_len}",
                self.offset,
                self.offset.saturating_add(self.len)
            ))),
        }
    }
}

/// A π sampling strategy.
///
/// Implementors provide [`draw`](Self::draw) for one logical index; batching,
/// span validation and the capability check are shared.
pub trait SamplingStrategy: Send + Sync + fmt::Debug {
    /// Static description.
    fn descriptor(&self) -> StrategyDescriptor;

    /// Logical sequence length for a request of `requested`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSampleCount` if the length is not representable.
    fn stream_len(&self, requested: usize) -> PiResult<usize> {
        Ok(requested)
    }

    /// Fail fast when the strategy cannot run in the current environment.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedExecutionEnvironment` when a required backend is
    /// missing.
    fn ensure_supported(&self) -> PiResult<()> {
        Ok(())
    }

    /// Produce the sample at logical `index` of a request of `requested`.
    fn draw(&self, source: &mut dyn UniformSource, index: usize, requested: usize) -> Sample;

    /// Produce the samples of `span` in order.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedExecutionEnvironment` if the strategy cannot run
    /// here, or `InvalidSampleCount` if the span leaves the logical sequence.
    fn sample_range(&self, source: &mut dyn UniformSource, span: SampleSpan) -> PiResult<SampleBatch> {
        self.ensure_supported()?;
        span.check(self.stream_len(span.requested)?)?;
        let samples = span
            .indices()
            .map(|index| self.draw(source, index, span.requested))
            .collect();
        Ok(SampleBatch::new(span.offset, samples))
    }

    /// Produce the full sequence for a request of `n`.
    ///
    /// # Errors
    ///
    /// Same as [`sample_range`](Self::sample_range).
    fn sample(&self, source: &mut dyn UniformSource, n: usize) -> PiResult<SampleBatch> {
        let len = self.stream_len(n)?;
        self.sample_range(source, SampleSpan::full(n, len))
    }
}
