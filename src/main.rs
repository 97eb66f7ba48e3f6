//! metro-relay: MQTT telemetry in, live dashboard snapshots out.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;

use metro_relay::adapters::{
    relay_router, MqttTelemetrySubscriber, RelayState, SnapshotStore, ViewerRegistry,
};
use metro_relay::application::IngestTelemetryHandler;
use metro_relay::config::{init_logging, AppConfig, ConfigError, ValidationError};

/// How long to wait for the broker connection to close on shutdown.
const SUBSCRIBER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_logging(&config.server.log_level, config.server.log_format)?;

    let store = Arc::new(SnapshotStore::new());
    let viewers = Arc::new(ViewerRegistry::new(
        store.clone(),
        config.server.session_buffer,
    ));
    let handler = Arc::new(IngestTelemetryHandler::new(store, viewers.clone()));
    let subscriber = MqttTelemetrySubscriber::new(config.broker.clone(), handler);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut subscriber_task = tokio::spawn(async move { subscriber.run(shutdown_rx).await });

    let addr = config.server.socket_addr()?;
    let state = RelayState::new(viewers.clone(), config.server.allowed_origin_header()?);
    let app = relay_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;

    tracing::info!(
        addr = %addr,
        allowed_origin = %config.server.allowed_origin,
        topic = %config.broker.topic,
        "Metro relay listening"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown(viewers))
        .await
        .map_err(StartupError::Serve)?;

    // Viewers are gone and the listener is closed; the broker goes last.
    let _ = shutdown_tx.send(true);

    match tokio::time::timeout(SUBSCRIBER_SHUTDOWN_TIMEOUT, &mut subscriber_task).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => tracing::error!("Broker subscriber failed: {}", e),
        Ok(Err(e)) => tracing::error!("Broker subscriber task panicked: {}", e),
        Err(_) => {
            tracing::warn!("Broker subscriber did not stop in time");
            subscriber_task.abort();
        }
    }

    tracing::info!("Metro relay stopped");
    Ok(())
}

/// Resolves on SIGINT/SIGTERM once the registry refuses new viewers and
/// every open viewer has been told to close.
async fn shutdown(viewers: Arc<ViewerRegistry>) {
    wait_for_signal().await;

    tracing::info!("Shutdown signal received");
    let closed = viewers.close_all().await;
    tracing::info!(viewers = closed, "Closed viewer sessions");
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
