//! A single estimation run.
//!
//! [`SimulationRun`] owns the one active [`BatchExecutor`] together with the
//! running aggregate. Each [`step`](SimulationRun::step) pulls one batch and
//! applies it as a unit; a failing batch leaves the accumulated statistics
//! exactly as they were. Changing the strategy or count replaces the
//! executor and starts over.
//!
//! The per-prefix convergence trace and the plotted points grow with the
//! sample count, so they are only recorded for runs built
//! [`with_history`](SimulationRun::with_history).

use serde::Serialize;

use crate::engine::rng::SimRng;
use crate::error::{PiError, PiResult};
use crate::executor::{BatchExecutor, StreamMessage, StreamRequest};
use crate::sampling::{SampleBatch, ScalingRule, StrategyDescriptor, StrategyKey, StrategyRegistry};
use crate::stats::{ConvergencePoint, ConvergenceTrace, RunningAggregate};

/// Result of one [`SimulationRun::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A batch of this many samples was applied.
    Applied(usize),
    /// The run is paused; nothing was consumed.
    Paused,
    /// The run has completed.
    Finished,
}

/// Snapshot of a run for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Strategy that produced the samples.
    pub strategy: StrategyKey,
    /// Scaling rule of the strategy.
    pub scaling: ScalingRule,
    /// Samples applied.
    pub samples: u64,
    /// Latest convergence point, `None` without data.
    pub last: Option<ConvergencePoint>,
    /// Whether the executor has finished.
    pub finished: bool,
}

impl RunSummary {
    /// Summary of everything folded into `aggregate`.
    #[must_use]
    pub fn from_aggregate(
        strategy: StrategyKey,
        scaling: ScalingRule,
        aggregate: &RunningAggregate,
        finished: bool,
    ) -> Self {
        Self {
            strategy,
            scaling,
            samples: aggregate.count,
            last: aggregate.point(scaling),
            finished,
        }
    }

    /// Final π estimate, `None` without data.
    #[must_use]
    pub fn estimate(&self) -> Option<f64> {
        self.last.map(|p| p.estimate)
    }
}

/// One run of one strategy.
#[derive(Debug)]
pub struct SimulationRun {
    registry: StrategyRegistry,
    rng: SimRng,
    request: StreamRequest,
    descriptor: StrategyDescriptor,
    executor: Option<BatchExecutor>,
    aggregate: RunningAggregate,
    history: bool,
    trace: ConvergenceTrace,
    points: Vec<(f64, f64)>,
    applied: usize,
    paused: bool,
}

impl SimulationRun {
    /// Start a run of `request`.
    ///
    /// Every start draws a fresh random stream from `rng`.
    ///
    /// # Errors
    ///
    /// Returns the executor's construction error.
    pub fn new(registry: StrategyRegistry, request: StreamRequest, mut rng: SimRng) -> PiResult<Self> {
        let executor = Self::start(&registry, &request, &mut rng)?;
        let descriptor = executor.descriptor();
        Ok(Self {
            registry,
            rng,
            request,
            descriptor,
            executor: Some(executor),
            aggregate: RunningAggregate::new(),
            history: false,
            trace: ConvergenceTrace::new(descriptor.scaling),
            points: Vec::new(),
            applied: 0,
            paused: false,
        })
    }

    /// Also record the per-prefix trace and the plotted points.
    ///
    /// Takes effect for batches applied after the call, including those of
    /// later restarts.
    #[must_use]
    pub fn with_history(mut self) -> Self {
        self.history = true;
        self
    }

    fn start(
        registry: &StrategyRegistry,
        request: &StreamRequest,
        rng: &mut SimRng,
    ) -> PiResult<BatchExecutor> {
        let executor = BatchExecutor::from_request(registry, request, rng.fork())?;
        tracing::info!(
            strategy = %executor.descriptor().key,
            total = request.total.get(),
            batch_size = request.batch_size.get(),
            "run started"
        );
        Ok(executor)
    }

    /// Replace the request and start over.
    ///
    /// The previous executor and all accumulated data are dropped. On error
    /// the run is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns the new executor's construction error.
    pub fn restart(&mut self, request: StreamRequest) -> PiResult<()> {
        let executor = Self::start(&self.registry, &request, &mut self.rng)?;
        self.descriptor = executor.descriptor();
        self.executor = Some(executor);
        self.aggregate = RunningAggregate::new();
        self.trace = ConvergenceTrace::new(self.descriptor.scaling);
        self.points.clear();
        self.applied = 0;
        self.paused = false;
        self.request = request;
        Ok(())
    }

    /// Switch strategy, keeping the count and batch size.
    ///
    /// # Errors
    ///
    /// Same as [`restart`](Self::restart).
    pub fn set_strategy(&mut self, key: &str) -> PiResult<()> {
        let request = StreamRequest {
            strategy_key: key.to_string(),
            ..self.request.clone()
        };
        self.restart(request)
    }

    /// Pull and apply the next batch.
    ///
    /// # Errors
    ///
    /// Propagates a strategy error. The run is then finished and its
    /// statistics are those before the failing batch.
    pub fn step(&mut self) -> PiResult<StepOutcome> {
        if self.paused {
            return Ok(StepOutcome::Paused);
        }
        let Some(executor) = self.executor.as_mut() else {
            return Ok(StepOutcome::Finished);
        };

        match executor.next() {
            Some(Ok(StreamMessage::Batch(batch))) => {
                let len = batch.len();
                if let Err(e) = self.apply(batch) {
                    self.executor = None;
                    return Err(e);
                }
                Ok(StepOutcome::Applied(len))
            }
            Some(Ok(StreamMessage::Done)) | None => {
                self.executor = None;
                tracing::info!(
                    strategy = %self.descriptor.key,
                    samples = self.applied,
                    "run finished"
                );
                Ok(StepOutcome::Finished)
            }
            Some(Err(e)) => {
                self.executor = None;
                tracing::warn!(strategy = %self.descriptor.key, error = %e, "run aborted");
                Err(e)
            }
        }
    }

    fn apply(&mut self, batch: SampleBatch) -> PiResult<()> {
        if batch.offset() != self.applied {
            return Err(PiError::invalid_count(format!(
                "batch at offset {} does not continue run at {}",
                batch.offset(),
                self.applied
            )));
        }
        self.aggregate.extend_batch(&batch);
        if self.history {
            self.trace.extend(batch.values());
            self.points.extend(batch.points().flatten());
        }
        self.applied = batch.end();
        Ok(())
    }

    /// Step until finished.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the run is paused, or the first strategy error.
    pub fn run_to_completion(&mut self) -> PiResult<RunSummary> {
        loop {
            match self.step()? {
                StepOutcome::Applied(_) => {}
                StepOutcome::Finished => return Ok(self.summary()),
                StepOutcome::Paused => {
                    return Err(PiError::config("cannot run a paused simulation to completion"))
                }
            }
        }
    }

    /// Stop consuming batches. Nothing already applied is discarded.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Continue after [`pause`](Self::pause).
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Whether the run is paused.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether the executor has finished.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.executor.is_none()
    }

    /// Active request.
    #[must_use]
    pub const fn request(&self) -> &StreamRequest {
        &self.request
    }

    /// Descriptor of the active strategy.
    #[must_use]
    pub const fn descriptor(&self) -> StrategyDescriptor {
        self.descriptor
    }

    /// Aggregate over every applied sample.
    #[must_use]
    pub const fn aggregate(&self) -> &RunningAggregate {
        &self.aggregate
    }

    /// Convergence trace so far; empty unless the run keeps history.
    #[must_use]
    pub const fn trace(&self) -> &ConvergenceTrace {
        &self.trace
    }

    /// Plotted points so far, in generation order; empty unless the run
    /// keeps history.
    #[must_use]
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Final estimate so far, `None` without data.
    #[must_use]
    pub fn estimate(&self) -> Option<f64> {
        self.aggregate.estimate(self.descriptor.scaling)
    }

    /// Snapshot for reporting.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary::from_aggregate(
            self.descriptor.key,
            self.descriptor.scaling,
            &self.aggregate,
            self.is_finished(),
        )
    }
}
