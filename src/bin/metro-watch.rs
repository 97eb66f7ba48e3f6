//! metro-watch: headless dashboard that logs what a viewer would see.
//!
//! Exits with status 1 when the client gives up connecting.

use std::process::ExitCode;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;

use metro_relay::client::{
    ClientEvent, ClientOptions, ResilientClient, TungsteniteTransport, ViewState,
};
use metro_relay::config::{init_logging, AppConfig, ConfigError};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("metro-watch: {}", e);
            ExitCode::from(2)
        }
    }
}

async fn run() -> Result<ExitCode, ConfigError> {
    let config = AppConfig::load()?;
    config.client.validate()?;
    init_logging(&config.server.log_level, config.server.log_format)?;

    let transport = Arc::new(TungsteniteTransport::new(config.client.server_url.clone()));
    let client = ResilientClient::spawn(ClientOptions::from(&config.client), transport);

    let mut events = client.subscribe();
    let mut view = client.view();
    if let Err(e) = client.connect_socket() {
        tracing::error!("{}", e);
        return Ok(ExitCode::FAILURE);
    }

    tracing::info!(
        url = %config.client.server_url,
        give_up_ms = config.client.give_up_timeout_ms,
        "Watching relay"
    );

    let mut last_view = ViewState::default();
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(ClientEvent::Update(snapshot)) => {
                    tracing::info!(
                        central_waiting = snapshot.central_station.waiting,
                        north_waiting = snapshot.north_station.waiting,
                        train_occupied = snapshot.next_train.occupied,
                        train_capacity = snapshot.next_train.capacity,
                        daily_total = snapshot.central_station.daily_total,
                        last_updated = %snapshot.last_updated,
                        "Snapshot"
                    );
                }
                Ok(ClientEvent::GaveUp) => {
                    tracing::error!(url = %config.client.server_url, "Could not connect to relay, giving up");
                    return Ok(ExitCode::FAILURE);
                }
                Ok(other) => tracing::debug!(event = ?other, "Client event"),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event listener lagged");
                }
                Err(RecvError::Closed) => return Ok(ExitCode::FAILURE),
            },

            changed = view.changed() => {
                if changed.is_err() {
                    return Ok(ExitCode::FAILURE);
                }
                let current = view.borrow_and_update().clone();
                if (current.connected, current.loading, current.connection_failed)
                    != (last_view.connected, last_view.loading, last_view.connection_failed)
                {
                    tracing::info!(
                        connected = current.connected,
                        loading = current.loading,
                        connection_failed = current.connection_failed,
                        "View state changed"
                    );
                }
                last_view = current;
            }

            _ = tokio::signal::ctrl_c() => {
                client.disconnect_socket().ok();
                tracing::info!("Stopped watching");
                return Ok(ExitCode::SUCCESS);
            }
        }
    }
}
