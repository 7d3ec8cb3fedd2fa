//! Middleware for `axum::Router` and HTTP request processing.
//!
//! - Observability: request IDs and tracing spans
//! - Recovery: panics, timeouts and service errors
//! - Security: response headers and download-aware compression
//!
//! ```rust,no_run
//! use axum::Router;
//! use ferry_server::middleware::{
//!     RouterObservabilityExt, RouterRecoveryExt, RouterSecurityExt,
//! };
//!
//! let app: Router = Router::new()
//!     .with_default_security()
//!     .with_observability()
//!     .with_default_recovery();
//! ```

mod compression;
mod observability;
mod recovery;
mod security;

pub use compression::{CompressionPredicate, SkipCompression, compression_predicate};
pub use observability::RouterObservabilityExt;
pub use recovery::{RecoveryConfig, RouterRecoveryExt};
pub use security::{RouterSecurityExt, SecurityConfig};
