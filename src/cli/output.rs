//! CLI output formatting.
//!
//! Every report is rendered to a `String` first so that tests can check the
//! exact text; the `print_*` wrappers only write it out.

use std::fmt::Write as _;

use serde::Serialize;

use crate::error::{PiError, PiResult};
use crate::sampling::{ScalingRule, StrategyDescriptor};
use crate::session::RunSummary;
use crate::stats::{format_estimate, ConvergencePoint, StrategyComparison};

/// Print version information.
pub fn print_version() {
    println!("{}", version_string());
}

/// Version line, with the commit hash when the build recorded one.
#[must_use]
pub fn version_string() -> String {
    match option_env!("MONTEPI_GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("montepi {} ({hash})", env!("CARGO_PKG_VERSION")),
        _ => format!("montepi {}", env!("CARGO_PKG_VERSION")),
    }
}

/// Print help message.
pub fn print_help() {
    println!(
        r"montepi - Monte Carlo and quasi-Monte Carlo estimation of π

USAGE:
    montepi <COMMAND> [OPTIONS]

COMMANDS:
    estimate <strategy> <n>     Sample n values and report the estimate
        --seed <N>              Seed the random stream
        --json                  Emit JSON

    stream <strategy> <total>   Stream batches with the running estimate
        --batch-size <B>        Samples per batch (default: 1000)
        --seed <N>              Seed the random stream
        --json                  Emit one wire message per line

    compare <n>                 Standard error of every strategy at n
        --seed <N>              Seed the random streams
        --json                  Emit JSON

    run <config.yaml>           Stream and compare per configuration
        --seed <N>              Override the configured seed

    list                        List registered strategies
    help                        Show this help message
    version                     Show version information

GLOBAL OPTIONS:
    -v, --verbose               Debug logging (RUST_LOG overrides)
    -q, --quiet                 Errors only

STRATEGIES:
    quarter, quasi, integral, buffon, polar, importance, gpuGrid
    Unknown names fall back to quarter. For gpuGrid, n is the grid side
    and n² cells are evaluated.

EXAMPLES:
    montepi estimate quasi 100000
    montepi stream quarter 1000000 --batch-size 10000 --seed 7
    montepi compare 10000 --json
"
    );
}

/// Serialize a report as pretty JSON.
///
/// # Errors
///
/// Returns `Serialization` if the value cannot be encoded.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> PiResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| PiError::serialization(e.to_string()))
}

fn scaling_label(rule: ScalingRule) -> &'static str {
    match rule {
        ScalingRule::QuarterCircle => "×4",
        ScalingRule::DirectIntegral => "×1",
    }
}

/// Render the final report of a run.
#[must_use]
pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Strategy: {} ({})",
        summary.strategy,
        scaling_label(summary.scaling)
    );
    let _ = writeln!(out, "Samples:  {}", summary.samples);
    let _ = writeln!(out, "Estimate: {}", format_estimate(summary.estimate()));
    if let Some(point) = &summary.last {
        let _ = writeln!(out, "Std err:  {:.6}", point.standard_error);
        let _ = writeln!(
            out,
            "Band:     [{:.6}, {:.6}]",
            point.lower_bound, point.upper_bound
        );
        let _ = writeln!(out, "|π − est|: {:.6}", point.absolute_error());
    }
    out
}

/// Render one progress line of a stream.
#[must_use]
pub fn render_progress(batch: usize, point: Option<&ConvergencePoint>) -> String {
    match point {
        Some(p) => format!(
            "batch {batch:>5}  n={:<10} estimate={:.6}  ±{:.6}",
            p.index, p.estimate, p.standard_error
        ),
        None => format!("batch {batch:>5}  n=0          estimate=N/A"),
    }
}

/// Render the comparison table.
#[must_use]
pub fn render_comparison(rows: &[StrategyComparison]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:>7} {:>12} {:>10} {:>12}",
        "strategy", "scale", "samples", "estimate", "std err"
    );
    for row in rows {
        let se = row
            .standard_error
            .map_or_else(|| "N/A".to_string(), |se| format!("{se:.6}"));
        let _ = writeln!(
            out,
            "{:<12} {:>7} {:>12} {:>10} {:>12}",
            row.key.as_str(),
            scaling_label(row.scaling),
            row.samples,
            format_estimate(row.estimate),
            se
        );
    }
    out
}

/// Render the strategy list.
#[must_use]
pub fn render_strategies(descriptors: &[StrategyDescriptor]) -> String {
    let mut out = String::new();
    for d in descriptors {
        let mut traits = Vec::new();
        if d.deterministic {
            traits.push("deterministic");
        }
        if d.position_dependent {
            traits.push("position-dependent");
        }
        let _ = writeln!(
            out,
            "{:<12} {:<3} {:<28} {}",
            d.key.as_str(),
            scaling_label(d.scaling),
            d.label,
            traits.join(", ")
        );
    }
    out
}
