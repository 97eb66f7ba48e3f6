//! The resilient client and the event loop that drives it.
//!
//! All transitions happen on one task. API calls, connection events and
//! the give-up deadline are serialized through a single `select!`, so no
//! lock guards the state and a cancelled deadline can never fire.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::Instant;

use crate::config::ClientConfig;
use crate::domain::foundation::StateMachine;
use crate::ports::Transport;

use super::connection::{ConnectionEvent, ConnectionEventSender, ConnectionHandle};
use super::{ClientError, ClientEvent, ConnectionState, ViewState};

/// Capacity of the client event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Timing knobs of the resilient client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    /// `None` disables give-up.
    pub give_up_timeout: Option<Duration>,
    pub reconnection_delay: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            give_up_timeout: Some(Duration::from_secs(10)),
            reconnection_delay: Duration::from_secs(1),
        }
    }
}

impl From<&ClientConfig> for ClientOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            give_up_timeout: config.give_up_timeout(),
            reconnection_delay: config.reconnection_delay(),
        }
    }
}

enum Command {
    Connect,
    Disconnect,
}

/// Dashboard-side connection manager with bounded give-up.
///
/// Listeners registered through [`subscribe`](Self::subscribe) or
/// [`view`](Self::view) keep receiving events across every connection
/// object the client creates. Dropping the client tears the connection down.
pub struct ResilientClient {
    commands: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<ClientEvent>,
    view: watch::Receiver<ViewState>,
    state: watch::Receiver<ConnectionState>,
}

impl ResilientClient {
    /// Start the event loop. The client starts Idle.
    pub fn spawn(options: ClientOptions, transport: Arc<dyn Transport>) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (connection_tx, connection_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (view_tx, view_rx) = watch::channel(ViewState::default());
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);

        let driver = Driver {
            state: ConnectionState::Idle,
            handle: None,
            generation: 0,
            give_up_deadline: None,
            options,
            transport,
            connection_tx,
            events: events.clone(),
            view: view_tx,
            state_tx,
        };
        tokio::spawn(driver.run(commands_rx, connection_rx));

        Self {
            commands: commands_tx,
            events,
            view: view_rx,
            state: state_rx,
        }
    }

    /// Start (or restart) connecting and arm the give-up timer.
    pub fn connect_socket(&self) -> Result<(), ClientError> {
        self.commands
            .send(Command::Connect)
            .map_err(|_| ClientError::Stopped)
    }

    /// Tear down the connection and cancel the give-up timer. Idempotent.
    pub fn disconnect_socket(&self) -> Result<(), ClientError> {
        self.commands
            .send(Command::Disconnect)
            .map_err(|_| ClientError::Stopped)
    }

    /// Receive every event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Watch the derived view state.
    pub fn view(&self) -> watch::Receiver<ViewState> {
        self.view.clone()
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch connection state changes.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }
}

struct Driver {
    state: ConnectionState,
    handle: Option<ConnectionHandle>,
    generation: u64,
    give_up_deadline: Option<Instant>,
    options: ClientOptions,
    transport: Arc<dyn Transport>,
    connection_tx: ConnectionEventSender,
    events: broadcast::Sender<ClientEvent>,
    view: watch::Sender<ViewState>,
    state_tx: watch::Sender<ConnectionState>,
}

impl Driver {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut connection_events: mpsc::UnboundedReceiver<(u64, ConnectionEvent)>,
    ) {
        loop {
            let deadline = self.give_up_deadline;

            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Connect) => self.on_connect(),
                    Some(Command::Disconnect) => self.on_disconnect(),
                    None => {
                        // Client dropped
                        self.on_disconnect();
                        return;
                    }
                },

                Some((generation, event)) = connection_events.recv() => {
                    self.on_connection_event(generation, event);
                }

                _ = give_up_timer(deadline) => self.on_give_up(),
            }
        }
    }

    fn on_connect(&mut self) {
        self.view.send_modify(ViewState::on_connect_requested);

        match self.state {
            ConnectionState::Idle | ConnectionState::GivenUp => {
                self.generation += 1;
                let handle = ConnectionHandle::spawn(
                    self.generation,
                    self.transport.clone(),
                    self.options.reconnection_delay,
                    self.connection_tx.clone(),
                );
                self.handle = Some(handle);
                self.arm_give_up();

                tracing::info!(
                    generation = self.generation,
                    endpoint = %self.transport.endpoint(),
                    "Connection created"
                );
                self.emit(ClientEvent::ConnectionCreated {
                    generation: self.generation,
                });
                self.transition(ConnectionState::Connecting);
            }
            ConnectionState::Connecting | ConnectionState::Connected => {
                if let Some(handle) = &self.handle {
                    handle.request_connect();
                }
                self.arm_give_up();
            }
        }
    }

    fn on_disconnect(&mut self) {
        if let Some(handle) = self.handle.take() {
            tracing::info!(generation = handle.generation(), "Connection closed");
            handle.close();
        }
        self.give_up_deadline = None;
        self.view.send_modify(ViewState::on_disconnect_requested);
        self.transition(ConnectionState::Idle);
    }

    fn on_connection_event(&mut self, generation: u64, event: ConnectionEvent) {
        let current = self.handle.as_ref().map(ConnectionHandle::generation);
        if current != Some(generation) {
            tracing::trace!(generation, ?current, "Dropping event from stale connection");
            return;
        }

        match event {
            ConnectionEvent::Connected => {
                self.give_up_deadline = None;
                self.transition(ConnectionState::Connected);
                tracing::info!(generation, "Connected");
                self.emit(ClientEvent::Connected);
            }
            ConnectionEvent::Payload(snapshot) => {
                self.emit(ClientEvent::Update(snapshot));
            }
            ConnectionEvent::Disconnected { reason } => {
                if self.state == ConnectionState::Connected {
                    self.transition(ConnectionState::Connecting);
                }
                tracing::warn!(generation, reason = %reason, "Disconnected, reconnecting");
                self.emit(ClientEvent::Disconnected { reason });
            }
            ConnectionEvent::AttemptFailed { reason } => {
                tracing::debug!(generation, reason = %reason, "Connection attempt failed");
            }
        }
    }

    fn on_give_up(&mut self) {
        self.give_up_deadline = None;
        if self.state == ConnectionState::Connected {
            return;
        }

        if let Some(handle) = self.handle.take() {
            handle.close();
        }
        tracing::warn!(
            endpoint = %self.transport.endpoint(),
            timeout_ms = self.options.give_up_timeout.map(|d| d.as_millis() as u64),
            "Giving up on connection"
        );
        self.transition(ConnectionState::GivenUp);
        self.emit(ClientEvent::GaveUp);
    }

    fn arm_give_up(&mut self) {
        self.give_up_deadline = self.options.give_up_timeout.map(|d| Instant::now() + d);
    }

    fn transition(&mut self, target: ConnectionState) {
        if self.state == target {
            return;
        }
        match self.state.transition_to(target) {
            Ok(next) => {
                self.state = next;
                self.state_tx.send_replace(next);
            }
            Err(e) => tracing::warn!("Ignoring connection state change: {}", e),
        }
    }

    fn emit(&self, event: ClientEvent) {
        self.view.send_modify(|view| view.apply(&event));
        // No listeners is fine
        let _ = self.events.send(event);
    }
}

async fn give_up_timer(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FrameStream, TransportError};
    use async_trait::async_trait;

    struct Hanging;

    #[async_trait]
    impl Transport for Hanging {
        async fn open(&self) -> Result<FrameStream, TransportError> {
            std::future::pending().await
        }

        fn endpoint(&self) -> &str {
            "hanging"
        }
    }

    fn driver() -> (Driver, mpsc::UnboundedReceiver<(u64, ConnectionEvent)>) {
        let (connection_tx, connection_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (view, _) = watch::channel(ViewState::default());
        let (state_tx, _) = watch::channel(ConnectionState::Idle);
        let driver = Driver {
            state: ConnectionState::Idle,
            handle: None,
            generation: 0,
            give_up_deadline: None,
            options: ClientOptions::default(),
            transport: Arc::new(Hanging),
            connection_tx,
            events,
            view,
            state_tx,
        };
        (driver, connection_rx)
    }

    #[tokio::test]
    async fn connect_from_idle_creates_generation_and_arms_timer() {
        let (mut driver, _rx) = driver();

        driver.on_connect();

        assert_eq!(driver.state, ConnectionState::Connecting);
        assert_eq!(driver.generation, 1);
        assert!(driver.handle.is_some());
        assert!(driver.give_up_deadline.is_some());
    }

    #[tokio::test]
    async fn connect_while_connecting_keeps_handle() {
        let (mut driver, _rx) = driver();
        driver.on_connect();
        driver.on_connect();

        assert_eq!(driver.generation, 1);
        assert_eq!(driver.state, ConnectionState::Connecting);
    }

    #[tokio::test]
    async fn stale_generation_events_are_ignored() {
        let (mut driver, _rx) = driver();
        driver.on_connect();
        driver.on_give_up();
        driver.on_connect();
        assert_eq!(driver.generation, 2);

        driver.on_connection_event(1, ConnectionEvent::Connected);

        assert_eq!(driver.state, ConnectionState::Connecting);
        assert!(driver.give_up_deadline.is_some());
    }

    #[tokio::test]
    async fn connected_clears_deadline_and_give_up_is_noop() {
        let (mut driver, _rx) = driver();
        driver.on_connect();

        driver.on_connection_event(1, ConnectionEvent::Connected);
        assert!(driver.give_up_deadline.is_none());

        driver.on_give_up();
        assert_eq!(driver.state, ConnectionState::Connected);
        assert!(driver.handle.is_some());
    }

    #[tokio::test]
    async fn give_up_clears_handle() {
        let (mut driver, _rx) = driver();
        driver.on_connect();

        driver.on_give_up();

        assert_eq!(driver.state, ConnectionState::GivenUp);
        assert!(driver.handle.is_none());
        assert!(driver.give_up_deadline.is_none());
    }

    #[tokio::test]
    async fn disconnect_is_idempotent() {
        let (mut driver, _rx) = driver();
        driver.on_connect();

        driver.on_disconnect();
        driver.on_disconnect();

        assert_eq!(driver.state, ConnectionState::Idle);
        assert!(driver.handle.is_none());
        assert!(driver.give_up_deadline.is_none());
    }

    #[tokio::test]
    async fn drop_after_connected_does_not_rearm_give_up() {
        let (mut driver, _rx) = driver();
        driver.on_connect();
        driver.on_connection_event(1, ConnectionEvent::Connected);

        driver.on_connection_event(
            1,
            ConnectionEvent::Disconnected {
                reason: "reset".to_string(),
            },
        );

        assert_eq!(driver.state, ConnectionState::Connecting);
        assert!(driver.give_up_deadline.is_none());
    }

    #[test]
    fn options_from_config() {
        let config = ClientConfig {
            give_up_timeout_ms: 0,
            reconnection_delay_ms: 250,
            ..Default::default()
        };
        let options = ClientOptions::from(&config);
        assert_eq!(options.give_up_timeout, None);
        assert_eq!(options.reconnection_delay, Duration::from_millis(250));
    }
}
