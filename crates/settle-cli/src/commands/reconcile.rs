//! `settle <FILES>...` implementation.
//!
//! Reconciles each file against the base (the first file) and either writes
//! the results back or prints them.

use camino::Utf8PathBuf;
use settle_config::{LayerChain, PairOutcome, WriteMode};
use settle_core::error::SettleResult;
use tracing::warn;

use super::CommandContext;

/// Flags affecting a reconcile run
#[derive(Debug, Clone, Default)]
pub struct ReconcileOptions {
    pub dry_run: bool,
    pub verify: bool,
    /// `Section:Key=value` settings for the most specific file
    pub assignments: Vec<String>,
}

/// Execute the reconcile command
pub fn execute(files: &[Utf8PathBuf], options: &ReconcileOptions, ctx: &CommandContext) -> SettleResult<()> {
    let mode = if options.dry_run {
        WriteMode::DryRun
    } else {
        WriteMode::Commit
    };

    let chain = LayerChain::from_args(&ctx.cwd, files, mode)?
        .with_verification(options.verify)
        .with_assignments(&options.assignments)?;

    let pairs = chain.run(|outcome| {
        report_pair(outcome, mode, ctx);
        Ok(())
    })?;

    if mode == WriteMode::Commit {
        ctx.output.success(&format!("Reconciled {} settings files", pairs + 1));
    }
    Ok(())
}

fn report_pair(outcome: &PairOutcome, mode: WriteMode, ctx: &CommandContext) {
    match mode {
        WriteMode::DryRun => {
            ctx.output.document(outcome.base_path.as_str(), &outcome.base_content);
            ctx.output.document(outcome.override_path.as_str(), &outcome.override_content);
        }
        WriteMode::Commit => {
            let report = &outcome.report;
            ctx.output.step(
                "→",
                &format!(
                    "{}: {} moved to base, {} kept, {} removed",
                    outcome.override_path,
                    report.added.len(),
                    report.overridden.len(),
                    report.dropped.len()
                ),
            );
        }
    }

    let mismatches = &outcome.mismatches;
    let lost = mismatches
        .base
        .iter()
        .map(|key| (&outcome.base_path, key))
        .chain(mismatches.upper.iter().map(|key| (&outcome.override_path, key)));
    for (path, key) in lost {
        warn!("{} no longer reads back for {}", key, path);
        ctx.output.warn(&format!("{}: '{}' reads back differently after reconciling", path, key));
    }
}
