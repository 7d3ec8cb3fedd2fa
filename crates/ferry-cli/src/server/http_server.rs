//! HTTP server startup.

use std::future::IntoFuture;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::TRACING_TARGET_SERVER_STARTUP;
use crate::config::ServerConfig;
use crate::server::lifecycle::serve_with_shutdown;
use crate::server::shutdown::{drain_deadline, shutdown_signal};
use crate::server::{ServerError, ServerResult};

/// Binds the configured address and serves `app` until shutdown.
///
/// After a shutdown signal the server stops accepting connections and waits
/// up to the shutdown timeout for in-flight responses.
pub async fn serve_http(app: Router, server_config: ServerConfig) -> ServerResult<()> {
    if let Err(validation_error) = server_config.validate() {
        tracing::error!(
            target: TRACING_TARGET_SERVER_STARTUP,
            error = %validation_error,
            "invalid server configuration"
        );

        return Err(ServerError::invalid_config(&validation_error));
    }

    let server_addr = server_config.server_addr();
    let listener = TcpListener::bind(server_addr).await.map_err(|err| {
        tracing::error!(
            target: TRACING_TARGET_SERVER_STARTUP,
            addr = %server_addr,
            error = %err,
            "failed to bind to address"
        );
        ServerError::bind_error(server_addr, err)
    })?;

    let (signalled_tx, signalled_rx) = oneshot::channel();
    let shutdown_timeout = server_config.shutdown_timeout();
    let signal = async move {
        shutdown_signal(shutdown_timeout).await;
        let _ = signalled_tx.send(());
    };

    serve_with_shutdown(&server_config, || async move {
        let server = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(signal)
        .into_future();

        tokio::select! {
            result = server => result,
            () = drain_deadline(signalled_rx, shutdown_timeout) => Ok(()),
        }
    })
    .await
}
