//! CLI argument parsing.
//!
//! Hand-rolled so that every parse path can be driven from tests with a
//! plain iterator of strings.

use std::path::PathBuf;
use std::str::FromStr;

use crate::sampling::SampleCount;

/// Default batch size for `stream`.
pub const DEFAULT_BATCH_SIZE: usize = 1_000;

/// CLI arguments container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    /// The command to execute.
    pub command: Command,
    /// Log verbosity from `-v` / `-q`.
    pub verbosity: Verbosity,
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Warnings and above.
    #[default]
    Normal,
    /// Debug output from this crate.
    Verbose,
}

/// Available CLI commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// One-shot estimate with a single strategy.
    Estimate {
        /// Strategy key.
        strategy: String,
        /// Requested sample count (grid side for `gpuGrid`).
        samples: usize,
        /// Optional seed.
        seed: Option<u64>,
        /// Emit JSON.
        json: bool,
    },
    /// Stream batches and report the running estimate.
    Stream {
        /// Strategy key.
        strategy: String,
        /// Requested total (grid side for `gpuGrid`).
        total: usize,
        /// Samples per batch.
        batch_size: usize,
        /// Optional seed.
        seed: Option<u64>,
        /// Emit one wire message per line.
        json: bool,
    },
    /// Compare the standard error of every strategy.
    Compare {
        /// Samples per strategy.
        samples: usize,
        /// Optional seed.
        seed: Option<u64>,
        /// Emit JSON.
        json: bool,
    },
    /// Stream and compare as described by a YAML configuration.
    Run {
        /// Path to the configuration file.
        config_path: PathBuf,
        /// Optional seed override.
        seed_override: Option<u64>,
        /// Emit JSON.
        json: bool,
    },
    /// List registered strategies.
    List,
    /// Show help
    Help,
    /// Show version
    Version,
    /// Arguments could not be parsed.
    Invalid(String),
}

/// Flags and positionals following the command word.
#[derive(Debug, Default)]
struct Options {
    positionals: Vec<String>,
    seed: Option<u64>,
    batch_size: Option<usize>,
    json: bool,
}

impl Args {
    /// Parse command-line arguments from an iterator.
    ///
    /// The first item is the program name.
    #[must_use]
    pub fn parse_from<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut verbosity = Verbosity::Normal;
        let args: Vec<String> = args
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .filter(|arg| match arg.as_str() {
                "-v" | "--verbose" => {
                    verbosity = Verbosity::Verbose;
                    false
                }
                "-q" | "--quiet" => {
                    verbosity = Verbosity::Quiet;
                    false
                }
                _ => true,
            })
            .collect();

        let command = Self::parse_command(&args);
        Self { command, verbosity }
    }

    /// Parse command-line arguments from the environment.
    #[must_use]
    pub fn parse() -> Self {
        Self::parse_from(std::env::args())
    }

    fn parse_command(args: &[String]) -> Command {
        let Some(word) = args.get(1) else {
            return Command::Help;
        };

        let options = match Options::parse(&args[2..]) {
            Ok(options) => options,
            Err(message) => return Command::Invalid(message),
        };

        let result = match word.as_str() {
            "estimate" => Self::parse_estimate(options),
            "stream" => Self::parse_stream(options),
            "compare" => Self::parse_compare(options),
            "run" => Self::parse_run(options),
            "list" => Ok(Command::List),
            "-h" | "--help" | "help" => Ok(Command::Help),
            "-V" | "--version" | "version" => Ok(Command::Version),
            unknown => Err(format!("unknown command: {unknown}")),
        };
        result.unwrap_or_else(Command::Invalid)
    }

    fn parse_estimate(options: Options) -> Result<Command, String> {
        let [strategy, samples] = options.expect_positionals("estimate", ["<strategy>", "<n>"])?;
        Ok(Command::Estimate {
            strategy,
            samples: parse_count(&samples)?,
            seed: options.seed,
            json: options.json,
        })
    }

    fn parse_stream(options: Options) -> Result<Command, String> {
        let [strategy, total] = options.expect_positionals("stream", ["<strategy>", "<total>"])?;
        Ok(Command::Stream {
            strategy,
            total: parse_count(&total)?,
            batch_size: options.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
            seed: options.seed,
            json: options.json,
        })
    }

    fn parse_compare(options: Options) -> Result<Command, String> {
        let [samples] = options.expect_positionals("compare", ["<n>"])?;
        Ok(Command::Compare {
            samples: parse_count(&samples)?,
            seed: options.seed,
            json: options.json,
        })
    }

    fn parse_run(options: Options) -> Result<Command, String> {
        let [path] = options.expect_positionals("run", ["<config.yaml>"])?;
        Ok(Command::Run {
            config_path: PathBuf::from(path),
            seed_override: options.seed,
            json: options.json,
        })
    }
}

impl Options {
    fn parse(args: &[String]) -> Result<Self, String> {
        let mut options = Self::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--seed" => {
                    let value = iter.next().ok_or("--seed requires a value")?;
                    options.seed = Some(
                        value
                            .parse()
                            .map_err(|_| format!("invalid seed: {value}"))?,
                    );
                }
                "--batch-size" => {
                    let value = iter.next().ok_or("--batch-size requires a value")?;
                    let size = parse_count(value)?;
                    if size == 0 {
                        return Err("batch size must be at least 1".to_string());
                    }
                    options.batch_size = Some(size);
                }
                "--json" => options.json = true,
                flag if flag.starts_with("--") => return Err(format!("unknown option: {flag}")),
                _ => options.positionals.push(arg.clone()),
            }
        }
        Ok(options)
    }

    fn expect_positionals<const N: usize>(
        &self,
        command: &str,
        names: [&str; N],
    ) -> Result<[String; N], String> {
        <[String; N]>::try_from(self.positionals.clone())
            .map_err(|_| format!("'{command}' expects {}", names.join(" ")))
    }
}

fn parse_count(value: &str) -> Result<usize, String> {
    SampleCount::from_str(value)
        .map(SampleCount::get)
        .map_err(|e| e.to_string())
}
