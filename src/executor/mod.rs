//! Batch executor.
//!
//! Drives one strategy over a large request in fixed-size batches. The
//! executor is a fused [`Iterator`]: every `next()` is one bounded unit of
//! work that samples the next contiguous slice of the strategy's logical
//! index space. After the last batch it yields [`StreamMessage::Done`] once
//! and then ends.
//!
//! ```text
//! total = 10, batch = 3:   [0..3) [3..6) [6..9) [9..10) Done
//! ```
//!
//! The running offset is threaded into every call, so position-dependent
//! strategies (`quasi`, `gpuGrid`) continue their sequence instead of
//! restarting in each batch.

pub mod stream;

use std::iter::FusedIterator;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::rng::{SimRng, UniformSource};
use crate::error::{PiError, PiResult};
use crate::sampling::{
    SampleBatch, SampleCount, SampleSpan, SamplingStrategy, StrategyDescriptor, StrategyRegistry,
};
use crate::stats::RunningAggregate;

pub use stream::{spawn_stream, RunControl, StreamHandle};

/// A streaming request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRequest {
    /// Strategy name; unknown names fall back to `quarter`.
    pub strategy_key: String,
    /// Requested count (grid side for `gpuGrid`).
    pub total: SampleCount,
    /// Samples per batch, at least one.
    pub batch_size: SampleCount,
}

impl StreamRequest {
    /// Build a request.
    #[must_use]
    pub fn new(strategy_key: impl Into<String>, total: usize, batch_size: usize) -> Self {
        Self {
            strategy_key: strategy_key.into(),
            total: SampleCount::new(total),
            batch_size: SampleCount::new(batch_size),
        }
    }
}

/// One message of a batch stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    /// The next batch in generation order.
    Batch(SampleBatch),
    /// Terminal message; nothing follows.
    Done,
}

impl StreamMessage {
    /// Wire form: `{ points, values }` or `{ done: true }`.
    #[must_use]
    pub fn to_wire(&self) -> WireMessage {
        match self {
            Self::Batch(batch) => WireMessage::Batch {
                points: batch.points().collect(),
                values: batch.values().collect(),
            },
            Self::Done => WireMessage::Done { done: true },
        }
    }
}

/// Serializable stream message for an external presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireMessage {
    /// A batch of points and values.
    Batch {
        /// Points, `null` where the strategy has none.
        points: Vec<Option<(f64, f64)>>,
        /// Scalar values.
        values: Vec<f64>,
    },
    /// Completion signal.
    Done {
        /// Always `true`.
        done: bool,
    },
}

/// Batch sizes a request would be split into.
///
/// # Errors
///
/// Returns `InvalidSampleCount` when `batch_size` is zero.
pub fn plan(total: usize, batch_size: usize) -> PiResult<Vec<usize>> {
    if batch_size == 0 {
        return Err(PiError::invalid_count(0));
    }
    let full = total / batch_size;
    let rest = total % batch_size;
    let mut sizes = vec![batch_size; full];
    if rest > 0 {
        sizes.push(rest);
    }
    Ok(sizes)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExecutorState {
    Running,
    Finished,
}

/// Iterator over the batches of one request.
#[derive(Debug)]
pub struct BatchExecutor<S = SimRng> {
    strategy: Arc<dyn SamplingStrategy>,
    source: S,
    requested: usize,
    logical_len: usize,
    batch_size: usize,
    offset: usize,
    state: ExecutorState,
}

impl<S: UniformSource> BatchExecutor<S> {
    /// Executor for `total` samples of `strategy` in batches of `batch_size`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSampleCount` for a zero batch size or an
    /// unrepresentable total, and `UnsupportedExecutionEnvironment` when the
    /// strategy cannot run here. Nothing is sampled in either case.
    pub fn new(
        strategy: Arc<dyn SamplingStrategy>,
        total: SampleCount,
        batch_size: SampleCount,
        source: S,
    ) -> PiResult<Self> {
        let batch_size = batch_size.positive()?.get();
        strategy.ensure_supported()?;
        let logical_len = strategy.stream_len(total.get())?;
        Ok(Self {
            strategy,
            source,
            requested: total.get(),
            logical_len,
            batch_size,
            offset: 0,
            state: ExecutorState::Running,
        })
    }

    /// Executor for a request, resolving the strategy through `registry`.
    ///
    /// # Errors
    ///
    /// Same as [`BatchExecutor::new`].
    pub fn from_request(
        registry: &StrategyRegistry,
        request: &StreamRequest,
        source: S,
    ) -> PiResult<Self> {
        Self::new(
            registry.resolve(&request.strategy_key),
            request.total,
            request.batch_size,
            source,
        )
    }

    /// Descriptor of the strategy being driven.
    #[must_use]
    pub fn descriptor(&self) -> StrategyDescriptor {
        self.strategy.descriptor()
    }

    /// Samples produced so far and the logical total.
    #[must_use]
    pub const fn progress(&self) -> (usize, usize) {
        (self.offset, self.logical_len)
    }

    /// Drain the remaining batches into one aggregate.
    ///
    /// Only the batch in flight is held in memory.
    ///
    /// # Errors
    ///
    /// Returns the first strategy error.
    pub fn aggregate(self) -> PiResult<RunningAggregate> {
        let mut aggregate = RunningAggregate::new();
        for message in self {
            if let StreamMessage::Batch(batch) = message? {
                aggregate.extend_batch(&batch);
            }
        }
        Ok(aggregate)
    }

    /// Whether the terminal message (or an error) has been yielded.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state == ExecutorState::Finished
    }
}

impl<S: UniformSource> Iterator for BatchExecutor<S> {
    type Item = PiResult<StreamMessage>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == ExecutorState::Finished {
            return None;
        }

        let remaining = self.logical_len - self.offset;
        if remaining == 0 {
            self.state = ExecutorState::Finished;
            return Some(Ok(StreamMessage::Done));
        }

        let span = SampleSpan {
            requested: self.requested,
            offset: self.offset,
            len: remaining.min(self.batch_size),
        };
        match self.strategy.sample_range(&mut self.source, span) {
            Ok(batch) => {
                self.offset += span.len;
                tracing::trace!(offset = span.offset, len = span.len, "batch emitted");
                Some(Ok(StreamMessage::Batch(batch)))
            }
            Err(e) => {
                self.state = ExecutorState::Finished;
                Some(Err(e))
            }
        }
    }
}

impl<S: UniformSource> FusedIterator for BatchExecutor<S> {}
