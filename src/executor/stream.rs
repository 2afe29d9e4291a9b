//! Asynchronous batch streaming.
//!
//! A producer task drives a [`BatchExecutor`] on the tokio runtime and sends
//! every message over a bounded channel, yielding between batches so the
//! consumer stays responsive. The consumer steers the producer through a
//! watch channel.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::{BatchExecutor, StreamMessage, StreamRequest};
use crate::engine::rng::{SimRng, UniformSource};
use crate::error::{PiError, PiResult};
use crate::sampling::{SampleBatch, StrategyRegistry};

/// Producer control signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunControl {
    /// Produce batches.
    Running,
    /// Stop before the next batch; buffered batches stay available.
    Paused,
    /// Stop for good.
    Cancelled,
}

/// Spawn a producer for `request` on the current tokio runtime.
///
/// # Errors
///
/// Returns the executor's construction error; nothing is spawned then.
pub fn spawn_stream(
    registry: &StrategyRegistry,
    request: &StreamRequest,
    rng: SimRng,
    capacity: usize,
) -> PiResult<StreamHandle> {
    let executor = BatchExecutor::from_request(registry, request, rng)?;
    Ok(StreamHandle::spawn(executor, capacity))
}

/// Consumer side of a running stream.
///
/// Dropping the handle cancels the producer.
#[derive(Debug)]
pub struct StreamHandle {
    messages: mpsc::Receiver<PiResult<StreamMessage>>,
    control: watch::Sender<RunControl>,
    task: JoinHandle<()>,
}

impl StreamHandle {
    /// Drive `executor` on a new task with a channel of `capacity` messages.
    #[must_use]
    pub fn spawn<S>(executor: BatchExecutor<S>, capacity: usize) -> Self
    where
        S: UniformSource + Send + 'static,
    {
        let (tx, messages) = mpsc::channel(capacity.max(1));
        let (control, control_rx) = watch::channel(RunControl::Running);
        let task = tokio::spawn(produce(executor, tx, control_rx));
        Self {
            messages,
            control,
            task,
        }
    }

    /// Next message in generation order.
    ///
    /// Returns `None` once the producer is gone and the buffer is drained.
    pub async fn recv(&mut self) -> Option<PiResult<StreamMessage>> {
        self.messages.recv().await
    }

    /// Stop production before the next batch.
    pub fn pause(&self) {
        tracing::debug!("stream paused");
        self.control.send_replace(RunControl::Paused);
    }

    /// Continue after [`pause`](Self::pause).
    pub fn resume(&self) {
        tracing::debug!("stream resumed");
        self.control.send_replace(RunControl::Running);
    }

    /// Whether the producer is currently paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        *self.control.borrow() == RunControl::Paused
    }

    /// Stop the producer and wait for it to exit.
    pub async fn cancel(mut self) {
        tracing::debug!("stream cancelled");
        self.control.send_replace(RunControl::Cancelled);
        self.task.abort();
        let _ = (&mut self.task).await;
    }

    /// Receive until `Done` and return the batches in order.
    ///
    /// # Errors
    ///
    /// Propagates a strategy error, or returns `StreamClosed` if the
    /// producer stops without sending `Done`.
    pub async fn collect(mut self) -> PiResult<Vec<SampleBatch>> {
        let mut batches = Vec::new();
        while let Some(message) = self.recv().await {
            match message? {
                StreamMessage::Batch(batch) => batches.push(batch),
                StreamMessage::Done => return Ok(batches),
            }
        }
        Err(PiError::StreamClosed)
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn produce<S: UniformSource>(
    mut executor: BatchExecutor<S>,
    tx: mpsc::Sender<PiResult<StreamMessage>>,
    mut control: watch::Receiver<RunControl>,
) {
    let key = executor.descriptor().key;
    tracing::info!(strategy = %key, total = executor.progress().1, "stream started");

    loop {
        loop {
            let state = *control.borrow_and_update();
            match state {
                RunControl::Running => break,
                RunControl::Cancelled => return,
                RunControl::Paused => {
                    if control.changed().await.is_err() {
                        return;
                    }
                }
            }
        }

        let Some(message) = executor.next() else {
            return;
        };
        let last = !matches!(message, Ok(StreamMessage::Batch(_)));
        if let Ok(StreamMessage::Batch(batch)) = &message {
            tracing::debug!(offset = batch.offset(), len = batch.len(), "batch sent");
        }
        if tx.send(message).await.is_err() {
            tracing::debug!(strategy = %key, "consumer dropped");
            return;
        }
        if last {
            tracing::info!(strategy = %key, produced = executor.progress().0, "stream finished");
            return;
        }
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::sampling::{ExecutionBackend, ExecutionEnvironment};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Counts draws; the producer task holds one clone of the counter.
    #[derive(Debug)]
    struct CountingSource {
        draws: Arc<AtomicUsize>,
    }

    impl UniformSource for CountingSource {
        fn next_f64(&mut self) -> f64 {
            self.draws.fetch_add(1, Ordering::SeqCst);
            0.5
        }
    }

    fn request(key: &str, total: usize, batch: usize) -> StreamRequest {
        StreamRequest::new(key, total, batch)
    }

    #[tokio::test]
    async fn test_stream_delivers_in_order() {
        let handle = spawn_stream(
            &StrategyRegistry::new(),
            &request("quarter", 10, 3),
            SimRng::new(42),
            4,
        )
        .expect("spawn");
        let batches = handle.collect().await.expect("collect");
        let sizes: Vec<usize> = batches.iter().map(SampleBatch::len).collect();
        assert_eq!(sizes, vec![3, 3, 3, 1]);
        let offsets: Vec<usize> = batches.iter().map(SampleBatch::offset).collect();
        assert_eq!(offsets, vec![0, 3, 6, 9]);
    }

    #[tokio::test]
    async fn test_stream_matches_sync_executor() {
        let registry = StrategyRegistry::new();
        let streamed = spawn_stream(&registry, &request("buffon", 50, 8), SimRng::new(3), 2)
            .expect("spawn")
            .collect()
            .await
            .expect("collect");
        let direct: Vec<SampleBatch> =
            BatchExecutor::from_request(&registry, &request("buffon", 50, 8), SimRng::new(3))
                .expect("executor")
                .filter_map(|m| match m.expect("message") {
                    StreamMessage::Batch(b) => Some(b),
                    StreamMessage::Done => None,
                })
                .collect();
        assert_eq!(streamed, direct);
    }

    #[tokio::test]
    async fn test_empty_stream_sends_done() {
        let mut handle = spawn_stream(
            &StrategyRegistry::new(),
            &request("quasi", 0, 10),
            SimRng::new(1),
            1,
        )
        .expect("spawn");
        assert!(matches!(handle.recv().await, Some(Ok(StreamMessage::Done))));
        assert!(handle.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_pause_holds_production() {
        let mut handle = spawn_stream(
            &StrategyRegistry::new(),
            &request("quasi", 20, 5),
            SimRng::new(1),
            8,
        )
        .expect("spawn");
        handle.pause();
        assert!(handle.is_paused());

        let waited = tokio::time::timeout(Duration::from_millis(50), handle.recv()).await;
        assert!(waited.is_err(), "no batch while paused");

        handle.resume();
        let batches = handle.collect().await.expect("collect");
        assert_eq!(batches.len(), 4);
    }

    #[tokio::test]
    async fn test_pause_keeps_buffered_batches() {
        let mut handle = spawn_stream(
            &StrategyRegistry::new(),
            &request("integral", 100, 1),
            SimRng::new(8),
            16,
        )
        .expect("spawn");

        let mut offsets = Vec::new();
        for _ in 0..2 {
            if let Some(Ok(StreamMessage::Batch(b))) = handle.recv().await {
                offsets.push(b.offset());
            }
        }
        handle.pause();
        while let Ok(Some(Ok(StreamMessage::Batch(b)))) =
            tokio::time::timeout(Duration::from_millis(20), handle.recv()).await
        {
            offsets.push(b.offset());
        }
        assert!(offsets.len() < 100, "producer stopped before finishing");

        handle.resume();
        for batch in handle.collect().await.expect("collect") {
            offsets.push(batch.offset());
        }
        assert_eq!(offsets, (0..100).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_cancel_stops_producer() {
        let mut handle = spawn_stream(
            &StrategyRegistry::new(),
            &request("quarter", 1_000_000, 10),
            SimRng::new(1),
            1,
        )
        .expect("spawn");
        assert!(matches!(handle.recv().await, Some(Ok(StreamMessage::Batch(_)))));
        tokio::time::timeout(Duration::from_secs(1), handle.cancel())
            .await
            .expect("cancel completes");
    }

    #[tokio::test]
    async fn test_unsupported_backend_not_spawned() {
        let registry = StrategyRegistry::with_grid_backend(
            ExecutionBackend::Accelerator,
            ExecutionEnvironment::detect(),
        );
        let err = spawn_stream(&registry, &request("gpuGrid", 4, 2), SimRng::new(1), 1)
            .unwrap_err();
        assert!(matches!(err, PiError::UnsupportedExecutionEnvironment { .. }));
    }

    #[tokio::test]
    async fn test_bogus_key_streams_quarter() {
        let registry = StrategyRegistry::new();
        let bogus = spawn_stream(&registry, &request("bogus", 12, 5), SimRng::new(6), 2)
            .expect("spawn")
            .collect()
            .await
            .expect("collect");
        let quarter = spawn_stream(&registry, &request("quarter", 12, 5), SimRng::new(6), 2)
            .expect("spawn")
            .collect()
            .await
            .expect("collect");
        assert_eq!(bogus, quarter);
    }

    #[tokio::test]
    async fn test_drop_cancels_producer() {
        let draws = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            draws: Arc::clone(&draws),
        };
        let executor = BatchExecutor::from_request(
            &StrategyRegistry::new(),
            &request("quarter", 10_000_000, 10),
            source,
        )
        .expect("executor");
        let mut handle = StreamHandle::spawn(executor, 1);
        assert!(matches!(handle.recv().await, Some(Ok(StreamMessage::Batch(_)))));
        drop(handle);

        tokio::time::timeout(Duration::from_secs(1), async {
            while Arc::strong_count(&draws) > 1 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("producer task dropped");

        let after = draws.load(Ordering::SeqCst);
        assert!(after < 10_000_000 * 2, "producer stopped early");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(draws.load(Ordering::SeqCst), after);
    }
}
