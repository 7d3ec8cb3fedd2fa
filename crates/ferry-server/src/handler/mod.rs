//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! ```rust,no_run
//! use ferry_server::handler::routes;
//! use ferry_server::service::{ServiceConfig, ServiceState};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ServiceConfig::default();
//! let state = ServiceState::from_config(&config).await?;
//! let router = routes(state);
//! # Ok(())
//! # }
//! ```
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod error;
mod files;
mod metadata;
mod monitors;
mod request;
mod response;

use axum::Router;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
pub use crate::handler::request::{DownloadQuery, MetadataQuery};
pub use crate::handler::response::{ErrorResponse, FileMetadata, HealthStatus};
use crate::service::ServiceState;

#[inline]
async fn fallback() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Returns a [`Router`] with all routes and the given state.
pub fn routes(state: ServiceState) -> Router {
    Router::new()
        .merge(files::routes())
        .merge(metadata::routes())
        .merge(monitors::routes())
        .fallback(fallback)
        .with_state(state)
}

#[cfg(test)]
mod test {
    use axum_test::TestServer;

    use crate::handler::routes;
    use crate::service::{ServiceConfig, ServiceState};

    /// Returns a new [`TestServer`] with all routes for the given config.
    pub async fn create_test_server_with_config(
        config: &ServiceConfig,
    ) -> anyhow::Result<TestServer> {
        let state = ServiceState::from_config(config).await?;
        let server = TestServer::new(routes(state))?;
        Ok(server)
    }

    #[tokio::test]
    async fn unknown_route_is_json_not_found() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let config = ServiceConfig::builder()
            .with_storage_root(dir.path())
            .build()?;
        let server = create_test_server_with_config(&config).await?;

        let response = server.get("/unknown").await;
        response.assert_status_not_found();
        assert_eq!(response.json::<serde_json::Value>()["name"], "not_found");
        Ok(())
    }
}
