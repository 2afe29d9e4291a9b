//! CLI module for montepi.
//!
//! All command-line logic lives here rather than in `main.rs` so that
//! argument parsing, command handlers and output formatting are testable.

mod args;
mod commands;
mod output;

pub use args::{Args, Command, Verbosity, DEFAULT_BATCH_SIZE};
pub use commands::{
    estimate, execute_config, run_cli, run_config, stream, ConfigReport, Progress,
};
pub use output::{
    print_help, print_version, render_comparison, render_progress, render_strategies,
    render_summary, to_json, version_string,
};
