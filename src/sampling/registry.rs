//! Strategy registry.
//!
//! A fixed table from [`StrategyKey`] to implementation. Lookups by name
//! never fail: unknown names resolve to `quarter`.

use std::sync::Arc;

use super::{
    BuffonStrategy, ExecutionBackend, ExecutionEnvironment, GridStrategy, ImportanceStrategy,
    IntegralStrategy, PolarStrategy, QuarterStrategy, QuasiStrategy, SampleBatch,
    SamplingStrategy, StrategyDescriptor, StrategyKey,
};
use crate::engine::rng::UniformSource;
use crate::error::PiResult;

/// Registered strategies in [`StrategyKey::ALL`] order.
#[derive(Debug, Clone)]
pub struct StrategyRegistry {
    strategies: Vec<Arc<dyn SamplingStrategy>>,
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StrategyRegistry {
    /// Registry with the grid strategy on the CPU backend.
    #[must_use]
    pub fn new() -> Self {
        Self::with_grid_backend(ExecutionBackend::Cpu, ExecutionEnvironment::detect())
    }

    /// Registry with the grid strategy bound to `backend`.
    ///
    /// An unavailable backend is not rejected here; the grid strategy fails
    /// with `UnsupportedExecutionEnvironment` when it is invoked.
    #[must_use]
    pub fn with_grid_backend(backend: ExecutionBackend, environment: ExecutionEnvironment) -> Self {
        let strategies = StrategyKey::ALL
            .into_iter()
            .map(|key| -> Arc<dyn SamplingStrategy> {
                match key {
                    StrategyKey::Quarter => Arc::new(QuarterStrategy),
                    StrategyKey::Quasi => Arc::new(QuasiStrategy),
                    StrategyKey::Integral => Arc::new(IntegralStrategy),
                    StrategyKey::Buffon => Arc::new(BuffonStrategy),
                    StrategyKey::Polar => Arc::new(PolarStrategy),
                    StrategyKey::Importance => Arc::new(ImportanceStrategy),
                    StrategyKey::GpuGrid => Arc::new(GridStrategy::new(backend, environment)),
                }
            })
            .collect();
        Self { strategies }
    }

    /// Strategy registered under `key`.
    #[must_use]
    pub fn get(&self, key: StrategyKey) -> Arc<dyn SamplingStrategy> {
        Arc::clone(&self.strategies[key.index()])
    }

    /// Strategy registered under `name`, or `quarter` if there is none.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Arc<dyn SamplingStrategy> {
        let key = StrategyKey::parse(name).unwrap_or_else(|| {
            tracing::debug!(requested = name, "unknown strategy, using quarter");
            StrategyKey::Quarter
        });
        self.get(key)
    }

    /// Registered keys in order.
    pub fn keys(&self) -> impl Iterator<Item = StrategyKey> + '_ {
        self.strategies.iter().map(|s| s.descriptor().key)
    }

    /// Descriptors of all registered strategies.
    #[must_use]
    pub fn descriptors(&self) -> Vec<StrategyDescriptor> {
        self.strategies.iter().map(|s| s.descriptor()).collect()
    }

    /// Sample `n` from the strategy named `name`.
    ///
    /// # Errors
    ///
    /// Propagates the strategy's error.
    pub fn sample(
        &self,
        name: &str,
        n: usize,
        source: &mut dyn UniformSource,
    ) -> PiResult<SampleBatch> {
        self.resolve(name).sample(source, n)
    }
}
