//! Shutdown signal handling
//!
//! `shutdown_with_deadline` pairs the future handed to axum's graceful
//! shutdown with a deadline that fires a grace period after the signal, so a
//! service can bound how long it waits for in-flight work.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{info, warn};

/// Signal that stopped the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// Ctrl+C / SIGINT
    Interrupt,
    /// SIGTERM
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => write!(f, "SIGINT"),
            Self::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Wait for Ctrl+C, or SIGTERM on Unix
pub async fn wait_for_shutdown() -> ShutdownSignal {
    #[cfg(unix)]
    let received = {
        use tokio::signal::unix::{signal, SignalKind};

        let mut term = match signal(SignalKind::terminate()) {
            Ok(sig) => Some(sig),
            Err(e) => {
                warn!("SIGTERM handler unavailable ({}); only Ctrl+C stops the service", e);
                None
            },
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => ShutdownSignal::Interrupt,
            _ = async {
                match term.as_mut() {
                    Some(sig) => {
                        sig.recv().await;
                    },
                    None => std::future::pending::<()>().await,
                }
            } => ShutdownSignal::Terminate,
        }
    };
    #[cfg(not(unix))]
    let received = {
        let _ = tokio::signal::ctrl_c().await;
        ShutdownSignal::Interrupt
    };

    info!("{} received, shutting down", received);
    received
}

/// Split `signal` into a graceful-shutdown trigger and a drain deadline
///
/// The first future completes when `signal` does. The second completes
/// `grace` later, and never if the trigger is dropped before firing.
pub fn with_drain_deadline<F>(
    signal: F,
    grace: Duration,
) -> (impl Future<Output = ()>, impl Future<Output = ()>)
where
    F: Future<Output = ShutdownSignal>,
{
    let (tx, rx) = oneshot::channel();

    let trigger = async move {
        let received = signal.await;
        let _ = tx.send(received);
    };

    let deadline = async move {
        match rx.await {
            Ok(_) => tokio::time::sleep(grace).await,
            Err(_) => std::future::pending::<()>().await,
        }
    };

    (trigger, deadline)
}

/// `with_drain_deadline` over the process signals
pub fn shutdown_with_deadline(
    grace: Duration,
) -> (impl Future<Output = ()>, impl Future<Output = ()>) {
    with_drain_deadline(wait_for_shutdown(), grace)
}
