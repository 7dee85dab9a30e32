//! Command implementations and dispatch logic.
//!
//! settle has a single operation: reconcile the files it is given. With fewer
//! than two files there is nothing to reconcile and usage help is shown.

use camino::Utf8PathBuf;
use settle_core::error::{SettleError, SettleResult};
use tracing::info;

pub mod reconcile;


use crate::{output::OutputHandler, Cli};

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: Utf8PathBuf,
    pub output: OutputHandler,
}

impl CommandContext {
    /// Create a new command context
    pub fn new() -> SettleResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| SettleError::io("Failed to get current directory".to_string(), e))?;
        let cwd = Utf8PathBuf::try_from(cwd).map_err(|e| {
            SettleError::io(
                "Current directory is not valid UTF-8".to_string(),
                e.into_io_error(),
            )
        })?;

        let output = OutputHandler::new();

        Ok(Self { cwd, output })
    }
}

/// Run the command line request
pub fn execute(cli: Cli, ctx: &CommandContext) -> SettleResult<()> {
    if cli.files.len() < 2 {
        return show_help(ctx);
    }

    info!(
        "Reconciling {} files (dry_run: {}, verify: {})",
        cli.files.len(),
        cli.dry_run,
        cli.verify
    );
    let options = reconcile::ReconcileOptions {
        dry_run: cli.dry_run,
        verify: cli.verify,
        assignments: cli.assignments,
    };
    reconcile::execute(&cli.files, &options, ctx)
}

/// Show help information
pub fn show_help(ctx: &CommandContext) -> SettleResult<()> {
    ctx.output.info("settle - split layered settings files");
    ctx.output.info("");
    ctx.output.info("Usage: settle [OPTIONS] <FILES>...");
    ctx.output.info("");
    ctx.output.info("  FILES          settings files in order from most generic to most specific");
    ctx.output.info("");
    ctx.output.info("Options:");
    ctx.output.info("  --dry-run      print the results instead of writing the files");
    ctx.output.info("  --verify       check that both files of every pair still read back unchanged");
    ctx.output.info("  --set K=V      set a value in the most specific file before reconciling");
    ctx.output.info("  -v, --verbose  enable verbose output");
    ctx.output.info("");
    ctx.output.info("Example:");
    ctx.output.info("  settle appsettings.json appsettings.Development.json appsettings.Production.json");
    Ok(())
}
