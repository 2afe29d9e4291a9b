//! # montepi
//!
//! Monte Carlo and quasi-Monte Carlo estimation of π.
//!
//! Seven interchangeable sampling strategies feed a batched, streaming
//! executor whose output is reduced online to a running estimate with a
//! one-standard-error band:
//! - pseudo-random: `quarter`, `integral`, `buffon`, `polar`, `importance`
//! - deterministic: `quasi` (Halton 2, 3) and `gpuGrid` (cell centres)
//!
//! ## Example
//!
//! ```rust
//! use montepi::prelude::*;
//!
//! let registry = StrategyRegistry::new();
//! let mut rng = SimRng::new(42);
//! let batch = registry.sample("quasi", 10_000, &mut rng).unwrap();
//! let aggregate = RunningAggregate::from_values(batch.values());
//! let estimate = aggregate.estimate(ScalingRule::QuarterCircle).unwrap();
//! assert!((estimate - std::f64::consts::PI).abs() < 0.01);
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suspicious_operation_groupings,  // variance = E[X²] - E[X]²
    clippy::suboptimal_flops,
    clippy::imprecise_flops,
    clippy::missing_const_for_fn,
)]

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod sampling;
pub mod session;
pub mod stats;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{PiConfig, PiConfigBuilder};
    pub use crate::engine::rng::{ScriptedSource, SimRng, UniformSource};
    pub use crate::error::{PiError, PiResult};
    pub use crate::executor::{
        plan, spawn_stream, BatchExecutor, StreamHandle, StreamMessage, StreamRequest,
    };
    pub use crate::sampling::{
        ExecutionBackend, ExecutionEnvironment, Sample, SampleBatch, SampleCount, ScalingRule,
        SamplingStrategy, StrategyKey, StrategyRegistry,
    };
    pub use crate::session::{RunSummary, SimulationRun, StepOutcome};
    pub use crate::stats::{compare, ConvergencePoint, ConvergenceTrace, RunningAggregate};
}

/// Re-export for public API
pub use error::{PiError, PiResult};
