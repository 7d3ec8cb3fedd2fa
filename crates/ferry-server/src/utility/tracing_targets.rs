//! Tracing target constants for structured logging.
//!
//! Targets are kept in one place so subscriber filters such as
//! `ferry_server::transport=debug` stay stable.

/// Transfer orchestration: validation, header emission and outcomes.
pub const TRACING_TARGET_TRANSFER: &str = "ferry_server::transfer";

/// Body delivery, both offloaded and streamed.
pub const TRACING_TARGET_TRANSPORT: &str = "ferry_server::transport";

/// Service state construction from configuration.
pub const TRACING_TARGET_SERVICE: &str = "ferry_server::service";

/// Request handlers.
pub const TRACING_TARGET_HANDLER: &str = "ferry_server::handler";

/// Error recovery including middleware errors and request failures.
pub const TRACING_TARGET_RECOVERY_ERROR: &str = "ferry_server::recovery::error";

/// Panic recovery including handler panics and service failures.
pub const TRACING_TARGET_RECOVERY_PANIC: &str = "ferry_server::recovery::panic";
