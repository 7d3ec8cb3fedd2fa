//! Security headers and response compression.

use axum::Router;
use axum::http::header::{self, HeaderValue};
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tower_http::compression::CompressionLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use super::compression::compression_predicate;

/// Extension trait for `axum::`[`Router`] to apply security middleware.
pub trait RouterSecurityExt<S> {
    /// Layers security headers and, when enabled, response compression.
    ///
    /// Compression skips responses marked with [`SkipCompression`].
    ///
    /// [`SkipCompression`]: crate::middleware::SkipCompression
    fn with_security(self, config: &SecurityConfig) -> Self;

    /// Layers security middlewares with default configuration.
    fn with_default_security(self) -> Self;
}

impl<S> RouterSecurityExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_security(self, config: &SecurityConfig) -> Self {
        let mut router = self
            .layer(SetResponseHeaderLayer::overriding(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("DENY"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::REFERRER_POLICY,
                HeaderValue::from_static("no-referrer"),
            ));

        if config.compression {
            router = router.layer(CompressionLayer::new().compress_when(compression_predicate()));
        }

        router
    }

    fn with_default_security(self) -> Self {
        self.with_security(&SecurityConfig::default())
    }
}

/// Security middleware configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct SecurityConfig {
    /// Whether to compress eligible responses such as JSON metadata.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "compression",
            env = "COMPRESSION",
            default_value = "true",
            action = clap::ArgAction::Set
        )
    )]
    pub compression: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self { compression: true }
    }
}
