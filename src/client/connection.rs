//! One logical connection object: a task that keeps a transport open.
//!
//! A handle is created per `connect_socket()` from Idle or GivenUp and is
//! never reused after it is closed. Every event it reports carries its
//! generation so the driver can ignore handles it has already replaced.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

use crate::adapters::websocket::ServerMessage;
use crate::domain::telemetry::Snapshot;
use crate::ports::Transport;

/// What a connection task reports to the driver.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ConnectionEvent {
    Connected,
    Payload(Snapshot),
    Disconnected { reason: String },
    AttemptFailed { reason: String },
}

pub(crate) type ConnectionEventSender = mpsc::UnboundedSender<(u64, ConnectionEvent)>;

pub(crate) struct ConnectionHandle {
    generation: u64,
    connect_now: Arc<Notify>,
    task: JoinHandle<()>,
}

impl ConnectionHandle {
    /// Start connecting right away, reconnecting after every failure or
    /// drop with a fixed delay, without an attempt limit.
    pub(crate) fn spawn(
        generation: u64,
        transport: Arc<dyn Transport>,
        reconnection_delay: Duration,
        events: ConnectionEventSender,
    ) -> Self {
        let connect_now = Arc::new(Notify::new());
        let task = tokio::spawn(run_connection(
            generation,
            transport,
            reconnection_delay,
            connect_now.clone(),
            events,
        ));

        Self {
            generation,
            connect_now,
            task,
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Skip the remaining reconnection delay, if any.
    ///
    /// Only wakes a task that is currently waiting out the delay; a request
    /// made while connected does not shorten the next one.
    pub(crate) fn request_connect(&self) {
        self.connect_now.notify_waiters();
    }

    /// Stop reconnecting and drop the transport.
    pub(crate) fn close(self) {
        self.task.abort();
    }
}

async fn run_connection(
    generation: u64,
    transport: Arc<dyn Transport>,
    reconnection_delay: Duration,
    connect_now: Arc<Notify>,
    events: ConnectionEventSender,
) {
    let emit = |event: ConnectionEvent| events.send((generation, event)).is_ok();

    loop {
        match transport.open().await {
            Ok(mut frames) => {
                if !emit(ConnectionEvent::Connected) {
                    return;
                }

                let reason = loop {
                    match frames.next().await {
                        Some(Ok(text)) => match serde_json::from_str::<ServerMessage>(&text) {
                            Ok(ServerMessage::MetroUpdate(snapshot)) => {
                                if !emit(ConnectionEvent::Payload(snapshot)) {
                                    return;
                                }
                            }
                            Ok(ServerMessage::Pong(_)) => {}
                            Err(e) => {
                                tracing::debug!(generation, "Ignoring undecodable frame: {}", e);
                            }
                        },
                        Some(Err(e)) => break e.to_string(),
                        None => break "connection closed".to_string(),
                    }
                };

                if !emit(ConnectionEvent::Disconnected { reason }) {
                    return;
                }
            }
            Err(e) => {
                if !emit(ConnectionEvent::AttemptFailed {
                    reason: e.to_string(),
                }) {
                    return;
                }
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(reconnection_delay) => {}
            _ = connect_now.notified() => {}
        }
    }
}
