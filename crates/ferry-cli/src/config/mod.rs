//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── server: ServerConfig         # Host, port, shutdown
//! ├── middleware: MiddlewareConfig # Security headers, recovery/timeouts
//! ├── service: ServiceConfig       # Storage root, transport, memory, mime
//! └── log_format: LogFormat        # Text or JSON log lines
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! ferry --storage-root /srv/files --transport offload --port 8080
//!
//! # Or via environment variables
//! STORAGE_ROOT=/srv/files TRANSPORT=offload PORT=8080 ferry
//! ```

mod middleware;
mod server;

use std::process;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use ferry_server::service::ServiceConfig;
pub use middleware::MiddlewareConfig;
use serde::{Deserialize, Serialize};
pub use server::ServerConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_SERVER_STARTUP};

/// Output format of log lines.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines with ANSI colors.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "ferry")]
#[command(about = "Serves stored files as HTTP downloads")]
#[command(version)]
pub struct Cli {
    /// Server network and lifecycle configuration.
    #[clap(flatten)]
    pub server: ServerConfig,

    /// HTTP middleware configuration (security headers, timeouts).
    #[clap(flatten)]
    pub middleware: MiddlewareConfig,

    /// Download delivery configuration.
    #[clap(flatten)]
    pub service: ServiceConfig,

    /// Log line format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is loaded first so clap can use its values as defaults.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let text = (self.log_format == LogFormat::Text).then(tracing_subscriber::fmt::layer);
        let json = (self.log_format == LogFormat::Json)
            .then(|| tracing_subscriber::fmt::layer().json());

        tracing_subscriber::registry()
            .with(filter)
            .with(text)
            .with(json)
            .init();
    }

    /// Logs build information at debug level.
    fn log_build_info() {
        tracing::info!(
            target: TRACING_TARGET_SERVER_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            "starting ferry server"
        );

        tracing::debug!(
            target: TRACING_TARGET_SERVER_STARTUP,
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "build information"
        );
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server
            .validate()
            .context("invalid server configuration")?;
        self.service
            .validate()
            .context("invalid service configuration")?;
        Ok(())
    }

    /// Logs configuration at startup.
    pub fn log(&self) {
        Self::log_build_info();
        self.server.log();
        self.middleware.log();

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            storage_root = %self.service.storage_root.display(),
            transport = %self.service.transport,
            memory_limit = %self.service.memory_limit,
            oversize_policy = %self.service.oversize_policy,
            sniff_downloads = self.service.sniff_downloads,
            default_locale = %self.service.default_locale,
            "service configuration"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
