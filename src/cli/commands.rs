//! CLI command handlers.
//!
//! Each handler does the work and returns its report; [`run_cli`] decides
//! how to print it and maps errors to the exit code.

use std::path::Path;
use std::process::ExitCode;

use super::output::{
    print_help, print_version, render_comparison, render_progress, render_strategies,
    render_summary, to_json,
};
use super::{Args, Command};
use crate::config::PiConfig;
use crate::engine::rng::SimRng;
use crate::error::{PiError, PiResult};
use crate::executor::{spawn_stream, StreamMessage, StreamRequest};
use crate::sampling::StrategyRegistry;
use crate::session::{RunSummary, SimulationRun};
use crate::stats::{compare, RunningAggregate, StrategyComparison};

/// Batch size used by one-shot estimates.
const ESTIMATE_BATCH: usize = 65_536;

/// Channel capacity for streams started from the command line.
const CLI_CHANNEL_CAPACITY: usize = 16;

/// Main CLI entry point.
///
/// Dispatches to the appropriate command handler based on parsed arguments.
pub async fn run_cli(args: Args) -> ExitCode {
    let result = match args.command {
        Command::Estimate {
            strategy,
            samples,
            seed,
            json,
        } => estimate(&StrategyRegistry::new(), &strategy, samples, rng_for(seed))
            .and_then(|summary| print_report(&summary, json, render_summary)),
        Command::Stream {
            strategy,
            total,
            batch_size,
            seed,
            json,
        } => {
            let request = StreamRequest::new(strategy, total, batch_size);
            let progress = if json { Progress::Json } else { Progress::Text };
            stream(
                &StrategyRegistry::new(),
                &request,
                rng_for(seed),
                CLI_CHANNEL_CAPACITY,
                progress,
            )
            .await
            .and_then(|summary| {
                if json {
                    Ok(())
                } else {
                    print_report(&summary, false, render_summary)
                }
            })
        }
        Command::Compare {
            samples,
            seed,
            json,
        } => compare(&StrategyRegistry::new(), samples, &mut rng_for(seed))
            .and_then(|rows| print_report(&rows, json, |r| render_comparison(r))),
        Command::Run {
            config_path,
            seed_override,
            json,
        } => run_config(&config_path, seed_override, json).await,
        Command::List => {
            print!("{}", render_strategies(&StrategyRegistry::new().descriptors()));
            Ok(())
        }
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Version => {
            print_version();
            Ok(())
        }
        Command::Invalid(message) => {
            eprintln!("Error: {message}\n");
            print_help();
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("Error: {e}");
            if e.is_request_error() {
                ExitCode::from(2)
            } else {
                ExitCode::from(1)
            }
        }
    }
}

fn rng_for(seed: Option<u64>) -> SimRng {
    seed.map_or_else(SimRng::from_entropy, SimRng::new)
}

fn print_report<T, F>(report: &T, json: bool, render: F) -> PiResult<()>
where
    T: serde::Serialize + ?Sized,
    F: FnOnce(&T) -> String,
{
    if json {
        println!("{}", to_json(report)?);
    } else {
        print!("{}", render(report));
    }
    Ok(())
}

/// Sample `samples` from `strategy` and summarize.
///
/// # Errors
///
/// Returns the run's error.
pub fn estimate(
    registry: &StrategyRegistry,
    strategy: &str,
    samples: usize,
    rng: SimRng,
) -> PiResult<RunSummary> {
    let request = StreamRequest::new(strategy, samples, ESTIMATE_BATCH);
    SimulationRun::new(registry.clone(), request, rng)?.run_to_completion()
}

/// How [`stream`] reports each message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// One progress line per batch.
    Text,
    /// The wire form of every message, one per line.
    Json,
    /// Nothing.
    Silent,
}

/// Stream `request`, reporting per `progress`.
///
/// Batches are folded into a running aggregate as they arrive, so memory
/// stays bounded by the channel capacity.
///
/// # Errors
///
/// Returns the stream's error, or `StreamClosed` if it ends without `Done`.
pub async fn stream(
    registry: &StrategyRegistry,
    request: &StreamRequest,
    rng: SimRng,
    capacity: usize,
    progress: Progress,
) -> PiResult<RunSummary> {
    let descriptor = registry.resolve(&request.strategy_key).descriptor();
    let mut aggregate = RunningAggregate::new();
    let mut handle = spawn_stream(registry, request, rng, capacity)?;
    let mut batches = 0;

    loop {
        let message = handle.recv().await.ok_or(PiError::StreamClosed)??;
        if progress == Progress::Json {
            println!(
                "{}",
                serde_json::to_string(&message.to_wire())
                    .map_err(|e| PiError::serialization(e.to_string()))?
            );
        }
        match message {
            StreamMessage::Batch(batch) => {
                batches += 1;
                aggregate.extend_batch(&batch);
                if progress == Progress::Text {
                    let point = aggregate.point(descriptor.scaling);
                    println!("{}", render_progress(batches, point.as_ref()));
                }
            }
            StreamMessage::Done => break,
        }
    }

    Ok(RunSummary::from_aggregate(
        descriptor.key,
        descriptor.scaling,
        &aggregate,
        true,
    ))
}

/// Report of a configuration-driven run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConfigReport {
    /// Streamed run.
    pub run: RunSummary,
    /// Comparison table.
    pub comparison: Vec<StrategyComparison>,
}

/// Execute a configuration file: stream the `run` section, then compare.
///
/// # Errors
///
/// Returns configuration, stream or comparison errors.
pub async fn run_config(path: &Path, seed_override: Option<u64>, json: bool) -> PiResult<()> {
    let mut config = PiConfig::load(path)?;
    if let Some(seed) = seed_override {
        config.reproducibility.seed = seed;
    }
    let report = execute_config(&config, json).await?;
    if json {
        println!("{}", to_json(&report)?);
    } else {
        print!("{}", render_summary(&report.run));
        println!();
        print!("{}", render_comparison(&report.comparison));
    }
    Ok(())
}

/// Stream and compare as `config` describes.
///
/// Progress lines are printed unless `quiet`.
///
/// # Errors
///
/// Returns stream or comparison errors.
pub async fn execute_config(config: &PiConfig, quiet: bool) -> PiResult<ConfigReport> {
    let registry = config.registry();
    let mut rng = config.rng();
    let request = config.stream_request();

    tracing::info!(
        seed = config.reproducibility.seed,
        strategy = %request.strategy_key,
        "running configuration"
    );
    let progress = if quiet { Progress::Silent } else { Progress::Text };
    let run = stream(
        &registry,
        &request,
        rng.fork(),
        config.stream.channel_capacity,
        progress,
    )
    .await?;
    let comparison = compare(&registry, config.comparison.samples, &mut rng)?;
    Ok(ConfigReport { run, comparison })
}
