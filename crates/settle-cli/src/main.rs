//! # settle-cli
//!
//! Splits layered JSON settings files (`appsettings.json`,
//! `appsettings.Development.json`, ...) so that the base file holds every
//! setting and each environment file only holds what it overrides.
//!
//! This is the main entry point for the settle CLI tool. It handles argument
//! parsing, sets up logging and error reporting, and hands off to the command
//! handlers.

use camino::Utf8PathBuf;
use clap::Parser;
use std::ffi::OsString;
use std::process::ExitCode;
use tracing::{debug, error};

mod commands;
mod output;

use commands::CommandContext;
use output::errors::ErrorFormatter;

/// Split layered settings files into a merged base and minimal overrides
#[derive(Parser, Debug)]
#[command(
    name = "settle",
    version,
    long_version = concat!(
        env!("CARGO_PKG_VERSION"),
        " (built ",
        env!("BUILD_DATE"),
        ", ",
        env!("RUSTC_VERSION"),
        ")"
    ),
    about = "Split layered settings files into a merged base and minimal overrides"
)]
pub struct Cli {
    /// Settings files in order from most generic to most specific
    #[arg(value_name = "FILES")]
    pub files: Vec<Utf8PathBuf>,

    /// Print the reconciled documents instead of writing them
    #[arg(long, visible_alias = "no-write", env = "SETTLE_DRY_RUN")]
    pub dry_run: bool,

    /// Check that every reconciled pair still reads back as the original files
    #[arg(long, env = "SETTLE_VERIFY")]
    pub verify: bool,

    /// Set a value in the most specific file before reconciling it
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub assignments: Vec<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    setup_logging(cli.verbose);
    setup_panic_handler();

    debug!("Starting settle v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprint!("{}", ErrorFormatter::new().format_error(&err));
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> settle_core::SettleResult<()> {
    let ctx = CommandContext::new()?;
    commands::execute(cli, &ctx)
}

/// `--dry-run` is accepted in any letter case
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some(text) if text.eq_ignore_ascii_case("--dry-run") => OsString::from("--dry-run"),
            _ => arg,
        })
        .collect()
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "settle={},settle_config={},settle_core={}",
            level, level, level
        ))
    });

    // Reconciled documents go to stdout, so logs stay on stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("settle encountered an unexpected error: {}", panic_info);
        eprintln!("settle crashed! This is a bug.");
        eprintln!("Please report this at: https://github.com/settle-rs/settle/issues");
        eprintln!("Error: {}", panic_info);
    }));
}
