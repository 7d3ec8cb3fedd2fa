//! Graceful shutdown signal handling.

use std::time::Duration;

use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix;
use tokio::sync::oneshot;

use crate::TRACING_TARGET_SERVER_SHUTDOWN;

/// Waits for SIGTERM (Unix) or SIGINT/Ctrl+C.
pub async fn shutdown_signal(shutdown_timeout: Duration) {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            tracing::error!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                error = %e,
                "failed to install Ctrl+C handler"
            );
            std::future::pending::<()>().await;
        } else {
            tracing::info!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                "received Ctrl+C signal, initiating graceful shutdown"
            );
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match unix::signal(unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                tracing::info!(
                    target: TRACING_TARGET_SERVER_SHUTDOWN,
                    "received SIGTERM signal, initiating graceful shutdown"
                );
            }
            Err(e) => {
                tracing::error!(
                    target: TRACING_TARGET_SERVER_SHUTDOWN,
                    error = %e,
                    "failed to install SIGTERM handler"
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!(
        target: TRACING_TARGET_SERVER_SHUTDOWN,
        timeout_secs = shutdown_timeout.as_secs(),
        "graceful shutdown initiated"
    );
}

/// Completes `shutdown_timeout` after `signalled` fires.
///
/// Never completes if the sender is dropped without signalling.
pub async fn drain_deadline(signalled: oneshot::Receiver<()>, shutdown_timeout: Duration) {
    if signalled.await.is_err() {
        std::future::pending::<()>().await;
    }

    tokio::time::sleep(shutdown_timeout).await;

    tracing::warn!(
        target: TRACING_TARGET_SERVER_SHUTDOWN,
        timeout_secs = shutdown_timeout.as_secs(),
        "shutdown timeout elapsed, dropping in-flight connections"
    );
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::oneshot;
    use tokio::time::timeout;

    use super::drain_deadline;

    #[tokio::test(start_paused = true)]
    async fn deadline_starts_after_signal() {
        let (tx, rx) = oneshot::channel();
        let deadline = tokio::spawn(drain_deadline(rx, Duration::from_secs(5)));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(!deadline.is_finished());

        tx.send(()).unwrap();
        timeout(Duration::from_secs(6), deadline).await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_sender_never_completes() {
        let (tx, rx) = oneshot::channel::<()>();
        drop(tx);

        let deadline = drain_deadline(rx, Duration::from_secs(1));
        let result = timeout(Duration::from_secs(600), deadline).await;
        assert!(result.is_err());
    }
}
