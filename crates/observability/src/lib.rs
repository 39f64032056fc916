//! `entrepot-observability` — shared tracing/logging setup.
//!
//! The engine crates emit structured events at their decision points
//! (skipped rules, advisory degradation, retry exhaustion); this crate
//! owns how those events leave the process.

pub mod tracing;

pub use tracing::{init, init_with_filter};
