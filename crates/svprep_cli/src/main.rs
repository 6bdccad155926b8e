//! svprep: prepares a hardware IR design for SystemVerilog emission.
//!
//! Reads a JSON-serialized design, legalizes every module under the given
//! lowering options, and prints the prepared IR of each module that can be
//! emitted. Modules that cannot be prepared are reported as diagnostics and
//! left out of the output.

#![warn(missing_docs)]

mod prepare;

use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Prepare hardware IR for SystemVerilog emission.
#[derive(Parser, Debug)]
#[command(name = "svprep", version, about = "Prepare hardware IR for SystemVerilog emission")]
pub struct Cli {
    /// Path to the JSON design to prepare.
    pub input: PathBuf,

    /// TOML file with a `[lowering]` table of options.
    #[arg(long, conflicts_with = "lowering")]
    pub options: Option<PathBuf>,

    /// Lowering options as a comma-separated list, e.g.
    /// `disallowLocalVariables,maximumNumberOfTermsPerExpression=64`.
    #[arg(long)]
    pub lowering: Option<String>,

    /// Output format for the prepared modules and diagnostics.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Print per-design rewrite statistics.
    #[arg(long)]
    pub stats: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// IR dump on stdout, rendered diagnostics on stderr.
    Text,
    /// A single JSON report on stdout.
    Json,
}

/// Returns the log filter for the verbosity flags; `RUST_LOG` wins when set.
fn log_filter(quiet: bool, verbose: bool) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    EnvFilter::new(level)
}

fn init_tracing(quiet: bool, verbose: bool) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(log_filter(quiet, verbose))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    let color = match cli.color {
        ColorChoice::Auto => std::env::var("TERM").is_ok(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    match prepare::run(&cli, color) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
