//! Configuration with YAML schema and validation.
//!
//! Mistakes are caught in three layers:
//! - typed structs with `deny_unknown_fields` reject misspelt keys,
//! - `validator` constraints reject out-of-range values,
//! - semantic validation rejects combinations the engine cannot run.
//!
//! ```yaml
//! schema_version: "1.0"
//! reproducibility:
//!   seed: 42
//! run:
//!   strategy: quasi
//!   total: 100000
//!   batch_size: 1000
//! stream:
//!   channel_capacity: 16
//! grid:
//!   backend: cpu
//! comparison:
//!   samples: 10000
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::engine::rng::SimRng;
use crate::error::{PiError, PiResult};
use crate::executor::StreamRequest;
use crate::sampling::{ExecutionBackend, ExecutionEnvironment, StrategyKey, StrategyRegistry};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PiConfig {
    /// Schema version for forward compatibility.
    #[validate(length(min = 1))]
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Reproducibility settings.
    #[validate(nested)]
    pub reproducibility: ReproducibilityConfig,

    /// Streaming run settings.
    #[validate(nested)]
    #[serde(default)]
    pub run: RunConfig,

    /// Async stream settings.
    #[validate(nested)]
    #[serde(default)]
    pub stream: StreamConfig,

    /// Grid strategy settings.
    #[serde(default)]
    pub grid: GridConfig,

    /// Strategy comparison settings.
    #[validate(nested)]
    #[serde(default)]
    pub comparison: ComparisonConfig,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

impl PiConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> PiResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> PiResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        config.validate_semantic()?;
        Ok(config)
    }

    /// Serialize to YAML.
    ///
    /// # Errors
    ///
    /// Returns `YamlParse` if serialization fails.
    pub fn to_yaml(&self) -> PiResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Create a builder for configuration.
    #[must_use]
    pub fn builder() -> PiConfigBuilder {
        PiConfigBuilder::default()
    }

    fn validate_semantic(&self) -> PiResult<()> {
        if !self.schema_version.starts_with("1.") && self.schema_version != "1" {
            return Err(PiError::config(format!(
                "unsupported schema version {}",
                self.schema_version
            )));
        }

        let key = StrategyKey::parse(&self.run.strategy).unwrap_or_else(|| {
            tracing::debug!(strategy = %self.run.strategy, "unknown strategy in config, using quarter");
            StrategyKey::Quarter
        });
        if key == StrategyKey::GpuGrid && self.run.total.checked_mul(self.run.total).is_none() {
            return Err(PiError::config(format!(
                "grid side {} is too large",
                self.run.total
            )));
        }
        if self
            .comparison
            .samples
            .checked_mul(self.comparison.samples)
            .is_none()
        {
            return Err(PiError::config(format!(
                "comparison size {} is too large for the grid strategy",
                self.comparison.samples
            )));
        }

        Ok(())
    }

    /// Streaming request described by the `run` section.
    #[must_use]
    pub fn stream_request(&self) -> StreamRequest {
        StreamRequest::new(&self.run.strategy, self.run.total, self.run.batch_size)
    }

    /// Strategy registry with the configured grid backend.
    #[must_use]
    pub fn registry(&self) -> StrategyRegistry {
        StrategyRegistry::with_grid_backend(self.grid.backend, ExecutionEnvironment::detect())
    }

    /// Master generator for the configured seed.
    #[must_use]
    pub fn rng(&self) -> SimRng {
        SimRng::new(self.reproducibility.seed)
    }
}

impl Default for PiConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            reproducibility: ReproducibilityConfig::default(),
            run: RunConfig::default(),
            stream: StreamConfig::default(),
            grid: GridConfig::default(),
            comparison: ComparisonConfig::default(),
        }
    }
}

/// Configuration builder for programmatic construction.
#[derive(Debug, Default)]
pub struct PiConfigBuilder {
    seed: Option<u64>,
    strategy: Option<String>,
    total: Option<usize>,
    batch_size: Option<usize>,
    channel_capacity: Option<usize>,
    backend: Option<ExecutionBackend>,
    comparison_samples: Option<usize>,
}

impl PiConfigBuilder {
    /// Set the random seed.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the strategy key.
    #[must_use]
    pub fn strategy(mut self, key: impl Into<String>) -> Self {
        self.strategy = Some(key.into());
        self
    }

    /// Set the requested total.
    #[must_use]
    pub const fn total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    /// Set the batch size.
    #[must_use]
    pub const fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Set the stream channel capacity.
    #[must_use]
    pub const fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = Some(capacity);
        self
    }

    /// Set the grid backend.
    #[must_use]
    pub const fn backend(mut self, backend: ExecutionBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set the comparison sample count.
    #[must_use]
    pub const fn comparison_samples(mut self, samples: usize) -> Self {
        self.comparison_samples = Some(samples);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> PiConfig {
        let mut config = PiConfig::default();

        if let Some(seed) = self.seed {
            config.reproducibility.seed = seed;
        }
        if let Some(strategy) = self.strategy {
            config.run.strategy = strategy;
        }
        if let Some(total) = self.total {
            config.run.total = total;
        }
        if let Some(batch_size) = self.batch_size {
            config.run.batch_size = batch_size;
        }
        if let Some(capacity) = self.channel_capacity {
            config.stream.channel_capacity = capacity;
        }
        if let Some(backend) = self.backend {
            config.grid.backend = backend;
        }
        if let Some(samples) = self.comparison_samples {
            config.comparison.samples = samples;
        }

        config
    }
}

/// Reproducibility settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ReproducibilityConfig {
    /// Master seed for all RNG.
    pub seed: u64,
}

impl Default for ReproducibilityConfig {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

/// Streaming run settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Strategy key; unknown keys fall back to `quarter`.
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// Requested total (grid side for `gpuGrid`).
    #[serde(default = "default_total")]
    pub total: usize,
    /// Samples per batch.
    #[validate(range(min = 1))]
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_strategy() -> String {
    StrategyKey::Quarter.as_str().to_string()
}

const fn default_total() -> usize {
    100_000
}

const fn default_batch_size() -> usize {
    1_000
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            total: default_total(),
            batch_size: default_batch_size(),
        }
    }
}

/// Async stream settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct StreamConfig {
    /// Messages buffered between producer and consumer.
    #[validate(range(min = 1))]
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

const fn default_channel_capacity() -> usize {
    16
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Grid strategy settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridConfig {
    /// Backend the grid strategy is bound to.
    #[serde(default)]
    pub backend: ExecutionBackend,
}

/// Strategy comparison settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ComparisonConfig {
    /// Samples per strategy (grid side for `gpuGrid`).
    #[serde(default = "default_comparison_samples")]
    pub samples: usize,
}

const fn default_comparison_samples() -> usize {
    10_000
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            samples: default_comparison_samples(),
        }
    }
}
