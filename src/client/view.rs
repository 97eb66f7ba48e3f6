//! Consumer-facing view state derived from client events.

use crate::domain::telemetry::Snapshot;

use super::ClientEvent;

/// What a dashboard renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    /// Last snapshot received, kept across reconnects.
    pub snapshot: Option<Snapshot>,
    pub connected: bool,
    /// Waiting for the first snapshot of the current attempt.
    pub loading: bool,
    /// The last attempt was abandoned by the give-up timer.
    pub connection_failed: bool,
}

impl ViewState {
    /// `connect_socket()` was called.
    pub(crate) fn on_connect_requested(&mut self) {
        self.connection_failed = false;
        self.loading = !self.connected;
    }

    /// `disconnect_socket()` was called.
    pub(crate) fn on_disconnect_requested(&mut self) {
        self.connected = false;
        self.loading = false;
    }

    pub(crate) fn apply(&mut self, event: &ClientEvent) {
        match event {
            ClientEvent::ConnectionCreated { .. } => {}
            ClientEvent::Connected => {
                self.connected = true;
                self.loading = true;
            }
            ClientEvent::Update(snapshot) => {
                self.snapshot = Some(snapshot.clone());
                self.loading = false;
                self.connection_failed = false;
            }
            ClientEvent::Disconnected { .. } => {
                self.connected = false;
            }
            ClientEvent::GaveUp => {
                self.connected = false;
                self.loading = false;
                self.connection_failed = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_starts_loading() {
        let mut view = ViewState::default();
        view.on_connect_requested();
        assert!(view.loading);
        assert!(!view.connection_failed);
    }

    #[test]
    fn loading_lasts_until_first_snapshot_after_connect() {
        let mut view = ViewState::default();
        view.on_connect_requested();
        view.apply(&ClientEvent::Connected);
        assert!(view.connected);
        assert!(view.loading);

        view.apply(&ClientEvent::Update(Snapshot::initial("10:00:00")));
        assert!(!view.loading);
        assert!(view.snapshot.is_some());
    }

    #[test]
    fn give_up_sets_failed_until_next_connect() {
        let mut view = ViewState::default();
        view.on_connect_requested();
        view.apply(&ClientEvent::GaveUp);
        assert!(view.connection_failed);
        assert!(!view.loading);
        assert!(!view.connected);

        view.on_connect_requested();
        assert!(!view.connection_failed);
        assert!(view.loading);
    }

    #[test]
    fn reconnect_while_connected_does_not_start_loading() {
        let mut view = ViewState::default();
        view.on_connect_requested();
        view.apply(&ClientEvent::Connected);
        view.apply(&ClientEvent::Update(Snapshot::initial("10:00:00")));

        view.on_connect_requested();
        assert!(!view.loading);
    }

    #[test]
    fn drop_keeps_last_snapshot() {
        let mut view = ViewState::default();
        view.apply(&ClientEvent::Connected);
        view.apply(&ClientEvent::Update(Snapshot::initial("10:00:00")));
        view.apply(&ClientEvent::Disconnected {
            reason: "closed".to_string(),
        });

        assert!(!view.connected);
        assert_eq!(view.snapshot, Some(Snapshot::initial("10:00:00")));
    }

    #[test]
    fn disconnect_clears_connected_and_loading() {
        let mut view = ViewState::default();
        view.on_connect_requested();
        view.apply(&ClientEvent::Connected);
        view.on_disconnect_requested();
        assert!(!view.connected);
        assert!(!view.loading);
    }
}
