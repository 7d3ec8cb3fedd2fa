use std::path::PathBuf;
use std::str::FromStr;

use axum::http::HeaderName;
#[cfg(feature = "config")]
use clap::Args;
use derive_builder::Builder;
use ferry_core::budget::{MemoryLimit, OversizePolicy};
use ferry_core::disposition::LegacyClients;
use serde::{Deserialize, Serialize};

use crate::transport::TransportKind;
use crate::{Error, Result};

/// Default values for configuration options.
mod defaults {
    use std::path::PathBuf;

    use ferry_core::disposition::DEFAULT_LEGACY_TOKEN;
    use ferry_core::mime::DEFAULT_MIME_TYPES_PATH;

    /// Directive header understood by Apache `mod_xsendfile`.
    pub const OFFLOAD_HEADER: &str = "X-Sendfile";

    /// Locale used when a request does not name one.
    pub const LOCALE: &str = "en_US";

    /// Directory served when none is configured.
    pub fn storage_root() -> PathBuf {
        ".".into()
    }

    /// System mime type database.
    pub fn mime_types_path() -> PathBuf {
        DEFAULT_MIME_TYPES_PATH.into()
    }

    /// User agent tokens receiving form-encoded filenames.
    pub fn legacy_user_agents() -> Vec<String> {
        vec![DEFAULT_LEGACY_TOKEN.to_owned()]
    }
}

/// App [`state`] configuration.
///
/// [`state`]: crate::service::ServiceState
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
#[builder(
    pattern = "owned",
    setter(into, prefix = "with"),
    build_fn(validate = "Self::validate")
)]
pub struct ServiceConfig {
    /// Directory downloads are served from.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "STORAGE_ROOT", default_value = ".")
    )]
    #[builder(default = "defaults::storage_root()")]
    pub storage_root: PathBuf,

    /// How file bodies are delivered: `stream` or `offload`.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "TRANSPORT", default_value = "stream")
    )]
    #[builder(default)]
    pub transport: TransportKind,

    /// Directive header naming the file when offloading.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "OFFLOAD_HEADER", default_value = "X-Sendfile")
    )]
    #[builder(default = "defaults::OFFLOAD_HEADER.to_owned()")]
    pub offload_header: String,

    /// Memory limit each transfer starts from, e.g. `128M` or `-1`.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "MEMORY_LIMIT", default_value = "128M")
    )]
    #[builder(default)]
    pub memory_limit: MemoryLimit,

    /// What to do with files needing more than the memory ceiling:
    /// `proceed` or `reject`.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "OVERSIZE_POLICY", default_value = "proceed")
    )]
    #[builder(default)]
    pub oversize_policy: OversizePolicy,

    /// User agent substrings that receive form-encoded filenames.
    #[cfg_attr(
        feature = "config",
        arg(
            long,
            env = "LEGACY_USER_AGENTS",
            value_delimiter = ',',
            default_value = "MSIE"
        )
    )]
    #[builder(default = "defaults::legacy_user_agents()")]
    pub legacy_user_agents: Vec<String>,

    /// System mime type database, skipped when absent.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "MIME_TYPES_PATH", default_value = "/etc/mime.types")
    )]
    #[builder(default = "defaults::mime_types_path()")]
    pub mime_types_path: PathBuf,

    /// Whether downloads without an explicit mime type are sniffed.
    #[cfg_attr(
        feature = "config",
        arg(
            long,
            env = "SNIFF_DOWNLOADS",
            default_value = "true",
            action = clap::ArgAction::Set
        )
    )]
    #[builder(default = "true")]
    pub sniff_downloads: bool,

    /// Locale used to format sizes when a request names none.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "DEFAULT_LOCALE", default_value = "en_US")
    )]
    #[builder(default = "defaults::LOCALE.to_owned()")]
    pub default_locale: String,
}

impl ServiceConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Parses the offload directive header name.
    pub fn offload_header(&self) -> Result<HeaderName> {
        HeaderName::from_str(&self.offload_header).map_err(|e| {
            Error::config(format!("invalid offload header: {}", self.offload_header))
                .with_source(e)
        })
    }

    /// Returns the legacy client matcher.
    pub fn legacy_clients(&self) -> LegacyClients {
        LegacyClients::new(self.legacy_user_agents.iter().map(String::as_str))
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        self.offload_header()?;

        if self.default_locale.trim().is_empty() {
            return Err(Error::config("default locale must not be empty"));
        }

        Ok(())
    }
}

impl ServiceConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(header) = &self.offload_header
            && HeaderName::from_str(header).is_err()
        {
            return Err(format!("invalid offload header: {header}"));
        }

        if let Some(locale) = &self.default_locale
            && locale.trim().is_empty()
        {
            return Err("default locale must not be empty".to_owned());
        }

        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            storage_root: defaults::storage_root(),
            transport: TransportKind::default(),
            offload_header: defaults::OFFLOAD_HEADER.to_owned(),
            memory_limit: MemoryLimit::default(),
            oversize_policy: OversizePolicy::default(),
            legacy_user_agents: defaults::legacy_user_agents(),
            mime_types_path: defaults::mime_types_path(),
            sniff_downloads: true,
            default_locale: defaults::LOCALE.to_owned(),
        }
    }
}
