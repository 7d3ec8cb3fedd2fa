//! Response types for HTTP handlers.

mod errors;
mod metadata;
mod monitors;

pub use errors::*;
pub use metadata::*;
pub use monitors::*;
