//! settle benchmarking suite
//!
//! Benchmarks for flattening, rebuilding and reconciling settings documents.

pub mod common;

pub use common::*;
