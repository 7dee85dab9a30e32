//! Layered settings reconciliation for settle
//!
//! This crate splits a chain of JSON settings files (base, then environment
//! overrides) so that every file only carries the keys that distinguish it from
//! the layers below.

pub mod key;
pub mod flatten;
pub mod tree;
pub mod reconcile;
pub mod json;
pub mod layers;

// Re-export main types
pub use key::{Assignment, FlatKey, KEY_SEPARATOR};
pub use flatten::{config_string, flatten, values_equal, FlatDocument};
pub use tree::{build, PathTreeBuilder};
pub use reconcile::{
    effective_settings, reconcile, verify_layering, Mismatches, ReconcileReport, Reconciliation,
};
pub use json::StagedFile;
pub use layers::{LayerChain, PairOutcome, WriteMode};

use settle_core::error::SettleError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, SettleError>;
