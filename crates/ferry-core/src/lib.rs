#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for mime detection.
pub const TRACING_TARGET_MIME: &str = "ferry_core::mime";

/// Tracing target for resource budget adaptation.
pub const TRACING_TARGET_BUDGET: &str = "ferry_core::budget";

/// Tracing target for file resolution.
pub const TRACING_TARGET_FILE: &str = "ferry_core::file";

mod error;

pub mod budget;
pub mod disposition;
pub mod file;
pub mod mime;
pub mod size;
pub mod transfer;

pub use error::{BoxedError, Error, ErrorKind, Result};
