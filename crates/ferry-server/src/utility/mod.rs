//! Shared helpers.

mod tracing_targets;

pub use tracing_targets::*;
