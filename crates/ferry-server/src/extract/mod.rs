//! Request extractors whose rejections render as JSON [`Error`] responses.
//!
//! [`Error`]: crate::handler::Error

mod path;
mod query;

pub use self::path::Path;
pub use self::query::Query;
