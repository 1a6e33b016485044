//! Graceful shutdown for gRPC servers.
//!
//! A server is started with a [`ShutdownSignal`]; on SIGINT/SIGTERM the
//! coordinator fires the signal and the server gets a bounded window to
//! drain in-flight requests.

use crate::error::PlatformError;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Fires a shutdown signal to every subscriber.
#[derive(Debug)]
pub struct ShutdownCoordinator {
    shutdown_tx: watch::Sender<bool>,
}

impl ShutdownCoordinator {
    /// Creates a coordinator that has not fired yet.
    #[must_use]
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self { shutdown_tx }
    }

    /// Gets a shutdown receiver
    #[must_use]
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            receiver: self.shutdown_tx.subscribe(),
        }
    }

    /// Fires the signal. Subscribers created afterwards see it immediately.
    pub fn trigger(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Whether the signal has fired.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.shutdown_tx.borrow()
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Shutdown signal receiver
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Waits for the shutdown signal. Also resolves if the coordinator is
    /// dropped.
    pub async fn recv(mut self) {
        let _ = self.receiver.wait_for(|fired| *fired).await;
    }
}

/// Waits for SIGTERM or SIGINT
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}

/// Runs a server until SIGINT/SIGTERM, then drains it for at most
/// `drain_timeout`.
///
/// `serve` receives the signal the server must stop on, typically by
/// passing `signal.recv()` to `serve_with_shutdown`.
///
/// # Errors
///
/// Returns `Internal` if the server itself fails.
pub async fn run_with_graceful_shutdown<F, Fut, E>(
    serve: F,
    drain_timeout: Duration,
) -> Result<(), PlatformError>
where
    F: FnOnce(ShutdownSignal) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Display,
{
    run_until(serve, wait_for_signal(), drain_timeout).await
}

/// Same as [`run_with_graceful_shutdown`] with an explicit stop trigger.
///
/// # Errors
///
/// Returns `Internal` if the server itself fails.
pub async fn run_until<F, Fut, E, S>(
    serve: F,
    stop: S,
    drain_timeout: Duration,
) -> Result<(), PlatformError>
where
    F: FnOnce(ShutdownSignal) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Display,
    S: Future<Output = ()>,
{
    let coordinator = ShutdownCoordinator::new();
    let server = serve(coordinator.subscribe());
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            info!("Server stopped before shutdown signal");
            return result.map_err(|e| PlatformError::Internal(format!("server error: {e}")));
        }
        () = stop => {
            info!("Shutdown signal received");
        }
    }

    coordinator.trigger();

    match tokio::time::timeout(drain_timeout, server).await {
        Ok(Ok(())) => {
            info!("Server drained");
            Ok(())
        }
        Ok(Err(e)) => Err(PlatformError::Internal(format!("server error: {e}"))),
        Err(_) => {
            warn!(timeout = ?drain_timeout, "Shutdown timeout reached, dropping in-flight requests");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_signal_reaches_subscribers() {
        let coordinator = ShutdownCoordinator::new();
        let signal = coordinator.subscribe();
        assert!(!coordinator.is_triggered());

        coordinator.trigger();

        signal.recv().await;
        assert!(coordinator.is_triggered());
    }

    #[test]
    fn test_signal_pending_until_triggered() {
        let coordinator = ShutdownCoordinator::new();
        let mut recv = tokio_test::task::spawn(coordinator.subscribe().recv());

        tokio_test::assert_pending!(recv.poll());
        coordinator.trigger();
        assert!(recv.is_woken());
        tokio_test::assert_ready!(recv.poll());
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_fired_signal() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.trigger();
        coordinator.subscribe().recv().await;
    }

    #[tokio::test]
    async fn test_dropped_coordinator_releases_signal() {
        let coordinator = ShutdownCoordinator::new();
        let signal = coordinator.subscribe();
        drop(coordinator);
        signal.recv().await;
    }

    #[tokio::test]
    async fn test_run_until_drains_server() {
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let run = run_until(
            |signal| async move {
                signal.recv().await;
                Ok::<(), String>(())
            },
            async {
                let _ = stop_rx.await;
            },
            Duration::from_secs(1),
        );

        let _ = stop_tx.send(());
        assert!(run.await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_gives_up_after_drain_timeout() {
        let result = run_until(
            |_signal| async {
                std::future::pending::<()>().await;
                Ok::<(), String>(())
            },
            async {},
            Duration::from_secs(5),
        )
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_server_failure_is_reported() {
        let result = run_until(
            |_signal| async { Err::<(), _>("address in use") },
            std::future::pending::<()>(),
            Duration::from_secs(1),
        )
        .await;

        assert!(matches!(result, Err(PlatformError::Internal(msg)) if msg.contains("address in use")));
    }
}
