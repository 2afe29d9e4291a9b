//! Error types for montepi.
//!
//! Sampling is a pure computation, so there are no transient failures and
//! nothing is retried. Every fallible operation returns `PiResult<T>` and
//! errors are raised before any sampling work starts.

use thiserror::Error;

/// Result type alias for montepi operations.
pub type PiResult<T> = Result<T, PiError>;

/// Unified error type for all montepi operations.
#[derive(Debug, Error)]
pub enum PiError {
    // ===== Sampling Errors =====
    /// A strategy needs an execution backend the current environment lacks.
    #[error("Unsupported execution environment: strategy '{strategy}' requires the {backend} backend")]
    UnsupportedExecutionEnvironment {
        /// Key of the strategy that was invoked.
        strategy: String,
        /// Backend the strategy was configured for.
        backend: String,
    },

    /// Negative, non-integer or otherwise unusable sample count.
    #[error("Invalid sample count: {value}")]
    InvalidSampleCount {
        /// The rejected value as the caller supplied it.
        value: String,
    },

    // ===== Configuration Errors =====
    /// Invalid configuration parameter.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    // ===== I/O Errors =====
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    // ===== Streaming Errors =====
    /// The producer side of a stream went away before `Done` was delivered.
    #[error("Stream closed before completion")]
    StreamClosed,
}

impl PiError {
    /// Create an invalid sample count error from any displayable value.
    #[must_use]
    pub fn invalid_count(value: impl std::fmt::Display) -> Self {
        Self::InvalidSampleCount {
            value: value.to_string(),
        }
    }

    /// Create an unsupported execution environment error.
    #[must_use]
    pub fn unsupported(strategy: impl Into<String>, backend: impl Into<String>) -> Self {
        Self::UnsupportedExecutionEnvironment {
            strategy: strategy.into(),
            backend: backend.into(),
        }
    }

    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Check if this error was raised by request validation rather than
    /// by the execution environment.
    #[must_use]
    pub const fn is_request_error(&self) -> bool {
        matches!(self, Self::InvalidSampleCount { .. } | Self::Config { .. })
    }
}
