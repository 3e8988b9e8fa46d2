use std::sync::Arc;

use anyhow::Context;
use credmount_api::config::AppConfig;
use credmount_api::kubernetes::client::{K8sClient, KubeCluster};
use credmount_api::shutdown::ShutdownCoordinator;
use credmount_api::{router, AppState};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    // Dropping the guard stops the file writer
    let _log_guard = config.logging.init()?;

    info!("Starting credmount v{}", env!("CARGO_PKG_VERSION"));

    let client = K8sClient::connect()
        .await
        .context("Could not configure Kubernetes client")?;
    info!(
        source = %client.source(),
        api_server = client.api_server(),
        namespace = %config.kubernetes.namespace,
        "Kubernetes client ready"
    );

    let cluster = KubeCluster::new(client, config.kubernetes.namespace.clone());
    let addr = config.server.bind_address();
    let state = Arc::new(AppState::new(Arc::new(cluster), config));
    let app = router(state);

    let shutdown = ShutdownCoordinator::new();
    let signals = shutdown.clone();
    tokio::spawn(async move { signals.wait_for_signal().await });

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("credmount listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
