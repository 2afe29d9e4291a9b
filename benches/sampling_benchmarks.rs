//! Sampling Benchmarks with 95% Confidence Intervals
//!
//! Measures per-strategy sampling throughput, batch streaming overhead and
//! online aggregation cost.
//!
//! Run with: cargo bench --bench sampling_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use montepi::prelude::*;

/// Per-strategy sampling throughput at fixed n.
fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("Strategy_Sample");
    group.sample_size(50);
    group.confidence_level(0.95);

    let registry = StrategyRegistry::new();
    let n = 10_000;
    for key in StrategyKey::ALL {
        // gpuGrid evaluates n² cells; use a side with a comparable cell count.
        let requested = if key == StrategyKey::GpuGrid { 100 } else { n };
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("sample", key), &requested, |b, &requested| {
            let strategy = registry.get(key);
            let mut rng = SimRng::new(42);
            b.iter(|| black_box(strategy.sample(&mut rng, requested)));
        });
    }

    group.finish();
}

/// Batch executor overhead as the batch size shrinks.
fn bench_executor_batches(c: &mut Criterion) {
    let mut group = c.benchmark_group("Executor_Batches");
    group.sample_size(50);
    group.confidence_level(0.95);

    let registry = StrategyRegistry::new();
    for batch in [100, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("quasi_100k", batch), &batch, |b, &batch| {
            b.iter(|| {
                let executor = BatchExecutor::from_request(
                    &registry,
                    &StreamRequest::new("quasi", 100_000, batch),
                    SimRng::new(42),
                );
                let mut aggregate = RunningAggregate::new();
                for message in executor.into_iter().flatten().flatten() {
                    if let StreamMessage::Batch(samples) = message {
                        aggregate.extend_batch(&samples);
                    }
                }
                black_box(aggregate)
            });
        });
    }

    group.finish();
}

/// Convergence trace construction, one point per value.
fn bench_trace(c: &mut Criterion) {
    let mut group = c.benchmark_group("Convergence_Trace");
    group.sample_size(50);

    for n in [1_000, 100_000] {
        let values = StrategyRegistry::new()
            .sample("quarter", n, &mut SimRng::new(7))
            .map(|batch| batch.values().collect::<Vec<_>>())
            .unwrap_or_default();
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("from_values", n), &values, |b, values| {
            b.iter(|| {
                black_box(ConvergenceTrace::from_values(
                    values.iter().copied(),
                    ScalingRule::QuarterCircle,
                ))
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_strategies,
    bench_executor_batches,
    bench_trace
);
criterion_main!(benches);
