//! # settle-core
//!
//! Core types and utilities shared across all settle crates.
//!
//! This crate provides:
//! - SettleError enum for unified error handling
//! - Path helpers used when resolving layer files
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `error`: Error types and result aliases
//! - `utils`: Utility functions and helpers

pub mod error;
pub mod utils;

// Re-export commonly used types
pub use error::{SettleError, SettleResult};
