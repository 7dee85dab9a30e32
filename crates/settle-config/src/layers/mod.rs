//! Reconciling a chain of settings files, most generic first
//!
//! The first file is the base. Every following file is reconciled against the
//! base as updated by the previous pair, so keys flow down into the base and
//! each later file keeps only what it overrides.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use settle_core::{error::SettleError, utils::absolutize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use serde_json::Value;

use crate::{
    json::{load_from_file, serialize_document, StagedFile},
    key::Assignment,
    reconcile::{reconcile, verify_layering, Mismatches, ReconcileReport},
    tree::PathTreeBuilder,
    ConfigResult,
};

/// What to do with reconciled documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Write both documents of every pair back to their files
    #[default]
    Commit,
    /// Leave the files alone; updated base documents live in scratch files
    DryRun,
}

/// One reconciled pair, ready to be written or shown
#[derive(Debug, Clone)]
pub struct PairOutcome {
    /// Path of the base file (the first file of the chain)
    pub base_path: Utf8PathBuf,
    /// Path of the override file of this pair
    pub override_path: Utf8PathBuf,
    pub base_content: String,
    pub override_content: String,
    pub report: ReconcileReport,
    /// Settings that would read back differently; only filled when verifying
    pub mismatches: Mismatches,
}

/// An ordered chain of settings files
#[derive(Debug, Clone)]
pub struct LayerChain {
    files: Vec<Utf8PathBuf>,
    mode: WriteMode,
    verify: bool,
    assignments: Vec<Assignment>,
}

impl LayerChain {
    /// Create a chain from at least two files
    pub fn new(files: Vec<Utf8PathBuf>, mode: WriteMode) -> ConfigResult<Self> {
        if files.len() < 2 {
            return Err(SettleError::Usage {
                reason: format!("need at least two settings files, got {}", files.len()),
            });
        }
        Ok(Self {
            files,
            mode,
            verify: false,
            assignments: Vec::new(),
        })
    }

    /// Create a chain from command line paths, resolving relative ones against `cwd`
    pub fn from_args(cwd: &Utf8Path, args: &[Utf8PathBuf], mode: WriteMode) -> ConfigResult<Self> {
        let files = args.iter().map(|path| absolutize(cwd, path)).collect();
        Self::new(files, mode)
    }

    /// Check every pair with [`verify_layering`]
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Set `Section:Key=value` assignments in the most specific file before
    /// reconciling it. Every assignment is parsed up front, so a malformed one
    /// fails before any file is touched.
    pub fn with_assignments<S: AsRef<str>>(mut self, assignments: &[S]) -> ConfigResult<Self> {
        self.assignments = assignments
            .iter()
            .map(|text| Assignment::parse(text.as_ref()))
            .collect::<ConfigResult<_>>()?;
        Ok(self)
    }

    pub fn files(&self) -> &[Utf8PathBuf] {
        &self.files
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    /// Reconcile every pair in order, handing each outcome to `on_pair`.
    ///
    /// A pair is fully reconciled and serialized before anything is written.
    /// Returns the number of pairs processed.
    pub fn run<F>(&self, mut on_pair: F) -> ConfigResult<usize>
    where
        F: FnMut(&PairOutcome) -> ConfigResult<()>,
    {
        let (base_path, upper_paths) = self.files.split_first().ok_or_else(|| SettleError::Usage {
            reason: "no settings files given".to_string(),
        })?;

        let mut scratch = ScratchFile::default();
        let mut current_base = base_path.clone();

        for (index, upper_path) in upper_paths.iter().enumerate() {
            info!("Reconciling {} against {}", upper_path, base_path);
            let most_specific = index + 1 == upper_paths.len();
            let outcome = self.reconcile_pair(base_path, &current_base, upper_path, most_specific)?;

            match self.mode {
                WriteMode::Commit => {
                    // Both files are staged before either is replaced
                    let base_file = StagedFile::stage(base_path, &outcome.base_content)?;
                    let upper_file = StagedFile::stage(upper_path, &outcome.override_content)?;
                    base_file.commit()?;
                    upper_file.commit()?;
                    debug!("Wrote {} and {}", base_path, upper_path);
                }
                WriteMode::DryRun => {
                    current_base = scratch.replace(&outcome.base_content)?;
                    debug!("Stashed updated base in {}", current_base);
                }
            }

            on_pair(&outcome)?;
        }

        scratch.cleanup();
        Ok(upper_paths.len())
    }

    fn reconcile_pair(
        &self,
        base_path: &Utf8Path,
        current_base: &Utf8Path,
        upper_path: &Utf8Path,
        most_specific: bool,
    ) -> ConfigResult<PairOutcome> {
        let base = load_from_file(current_base)?;
        let mut upper = load_from_file(upper_path)?;
        if most_specific && !self.assignments.is_empty() {
            upper = self.apply_assignments(upper)?;
        }

        let result = reconcile(&base, &upper)?;
        let mismatches = if self.verify {
            verify_layering(&base, &upper, &result.base, &result.overrides)?
        } else {
            Mismatches::default()
        };

        Ok(PairOutcome {
            base_path: base_path.to_path_buf(),
            override_path: upper_path.to_path_buf(),
            base_content: serialize_document(&result.base)?,
            override_content: serialize_document(&result.overrides)?,
            report: result.report,
            mismatches,
        })
    }

    fn apply_assignments(&self, document: Value) -> ConfigResult<Value> {
        let mut builder = PathTreeBuilder::new(document)?;
        for assignment in &self.assignments {
            match builder.get(&assignment.key) {
                Some(previous) => debug!("Setting {} (was {})", assignment.key, previous),
                None => debug!("Setting {}", assignment.key),
            }
            builder.apply(assignment);
        }
        Ok(builder.into_document())
    }
}

/// Holds the latest dry-run base document; the file is removed on drop
#[derive(Debug, Default)]
struct ScratchFile {
    current: Option<NamedTempFile>,
}

impl ScratchFile {
    fn replace(&mut self, content: &str) -> ConfigResult<Utf8PathBuf> {
        let mut file = tempfile::Builder::new()
            .prefix("settle-")
            .suffix(".json")
            .tempfile()
            .map_err(|e| SettleError::io("Failed to create scratch file".to_string(), e))?;
        file.write_all(content.as_bytes())
            .map_err(|e| SettleError::io(format!("Failed to write {}", file.path().display()), e))?;

        let path = Utf8PathBuf::try_from(file.path().to_path_buf()).map_err(|e| {
            SettleError::io(
                "Scratch file path is not valid UTF-8".to_string(),
                e.into_io_error(),
            )
        })?;

        self.cleanup();
        self.current = Some(file);
        Ok(path)
    }

    /// Remove the current scratch file; failures only get logged
    fn cleanup(&mut self) {
        if let Some(file) = self.current.take() {
            let path = file.path().display().to_string();
            if let Err(e) = file.close() {
                warn!("Failed to remove scratch file {}: {}", path, e);
            }
        }
    }
}
