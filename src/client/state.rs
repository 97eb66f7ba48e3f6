//! Connection state of the resilient dashboard client.

use std::fmt;

use crate::domain::foundation::StateMachine;

/// Lifecycle of the client's logical connection.
///
/// ```text
///            connect_socket
///   Idle ───────────────────▶ Connecting ◀──────┐
///    ▲                         │      │         │ transport drop
///    │ disconnect_socket       │      │ open    │
///    │               give-up   │      ▼         │
///    │   GivenUp ◀─────────────┘   Connected ───┘
///    │      │
///    └──────┘ (connect_socket → Connecting)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Connected,
    GivenUp,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::GivenUp => "given_up",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for ConnectionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConnectionState::*;
        matches!(
            (self, target),
            (Idle, Connecting)
                | (Connecting, Connected)
                | (Connecting, GivenUp)
                | (Connecting, Idle)
                | (Connected, Connecting)
                | (Connected, Idle)
                | (GivenUp, Connecting)
                | (GivenUp, Idle)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConnectionState::*;
        match self {
            Idle => vec![Connecting],
            Connecting => vec![Connected, GivenUp, Idle],
            Connected => vec![Connecting, Idle],
            GivenUp => vec![Connecting, Idle],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_can_only_start_connecting() {
        assert_eq!(
            ConnectionState::Idle.valid_transitions(),
            vec![ConnectionState::Connecting]
        );
        assert!(ConnectionState::Idle
            .transition_to(ConnectionState::Connected)
            .is_err());
    }

    #[test]
    fn connected_cannot_give_up() {
        assert!(!ConnectionState::Connected.can_transition_to(&ConnectionState::GivenUp));
    }

    #[test]
    fn given_up_can_retry() {
        assert_eq!(
            ConnectionState::GivenUp.transition_to(ConnectionState::Connecting),
            Ok(ConnectionState::Connecting)
        );
    }

    #[test]
    fn every_state_can_reach_idle_except_idle() {
        for state in [
            ConnectionState::Connecting,
            ConnectionState::Connected,
            ConnectionState::GivenUp,
        ] {
            assert!(state.can_transition_to(&ConnectionState::Idle), "{}", state);
        }
    }

    #[test]
    fn valid_transitions_agree_with_can_transition_to() {
        use ConnectionState::*;
        for from in [Idle, Connecting, Connected, GivenUp] {
            for to in [Idle, Connecting, Connected, GivenUp] {
                assert_eq!(
                    from.can_transition_to(&to),
                    from.valid_transitions().contains(&to),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn no_state_is_terminal() {
        assert!(!ConnectionState::GivenUp.is_terminal());
    }
}
