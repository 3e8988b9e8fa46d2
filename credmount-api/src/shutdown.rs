//! Graceful shutdown handling
//!
//! SIGTERM or SIGINT flips a watch channel; the server's shutdown future
//! resolves on it and axum drains in-flight requests before returning.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

/// Shutdown coordinator for graceful termination
#[derive(Clone)]
pub struct ShutdownCoordinator {
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
    is_shutting_down: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
            is_shutting_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a receiver for shutdown signals
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.is_shutting_down.load(Ordering::SeqCst)
    }

    /// Initiate graceful shutdown; later calls are no-ops
    pub fn shutdown(&self) {
        if self.is_shutting_down.swap(true, Ordering::SeqCst) {
            return;
        }

        info!("Initiating graceful shutdown...");
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait for SIGTERM or SIGINT, then trigger shutdown.
    ///
    /// If the handlers cannot be installed the error is logged and shutdown
    /// is only reachable through [`ShutdownCoordinator::shutdown`].
    pub async fn wait_for_signal(&self) {
        match Self::recv_signal().await {
            Ok(name) => {
                info!("Received {}", name);
                self.shutdown();
            }
            Err(e) => error!("Failed to register signal handlers: {}", e),
        }
    }

    #[cfg(unix)]
    async fn recv_signal() -> std::io::Result<&'static str> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        Ok(name)
    }

    #[cfg(not(unix))]
    async fn recv_signal() -> std::io::Result<&'static str> {
        tokio::signal::ctrl_c().await?;
        Ok("Ctrl+C")
    }

    /// Future for `axum::serve(..).with_graceful_shutdown`
    pub fn signal(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut rx = self.subscribe();

        async move {
            while !*rx.borrow() {
                if rx.changed().await.is_err() {
                    break;
                }
            }
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
