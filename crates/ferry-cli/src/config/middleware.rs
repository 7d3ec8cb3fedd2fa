//! Middleware configuration for the HTTP server.
//!
//! Both groups are defined in `ferry-server` and support CLI arguments as
//! well as environment variables.
//!
//! # Example
//!
//! ```bash
//! ferry --compression false --request-timeout 60
//! ```

use clap::Args;
use ferry_server::middleware::{RecoveryConfig, SecurityConfig};
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// Middleware configuration combining security and recovery settings.
#[derive(Debug, Clone, Default, Args, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Response header and compression configuration.
    #[clap(flatten)]
    pub security: SecurityConfig,

    /// Recovery middleware configuration.
    ///
    /// Controls request timeout and panic recovery behavior.
    #[clap(flatten)]
    pub recovery: RecoveryConfig,
}

impl MiddlewareConfig {
    /// Logs middleware configuration at info level.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            compression = self.security.compression,
            request_timeout_secs = self.recovery.request_timeout,
            "middleware configuration"
        );
    }
}
