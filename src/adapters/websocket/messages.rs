//! WebSocket message types for the live dashboard feed.
//!
//! Defines the protocol between the relay and connected viewers:
//! - Server → Viewer: snapshot pushes (`metro_update`), heartbeat replies
//! - Viewer → Server: heartbeats, explicit resync requests

use serde::{Deserialize, Serialize};

use crate::domain::telemetry::Snapshot;

/// Event name of a snapshot push.
pub const METRO_UPDATE_EVENT: &str = "metro_update";

// ============================================
// Server → Viewer Messages
// ============================================

/// All messages the relay sends to a viewer.
///
/// Serialized as `{"event": "<name>", "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Current snapshot.
    MetroUpdate(Snapshot),

    /// Heartbeat response.
    Pong(PongMessage),
}

/// Heartbeat response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PongMessage {
    pub timestamp: String,
}

// ============================================
// Viewer → Server Messages
// ============================================

/// All messages that can be received from a viewer.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Heartbeat request.
    Ping,

    /// Resend the current snapshot to this viewer only.
    RequestState,
}

// ============================================
// Internal Types
// ============================================

/// What sits in a viewer's outbound queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Snapshot(Snapshot),
    Pong,
}

impl Outbound {
    /// Convert to a server message for sending to the viewer.
    pub fn into_server_message(self) -> ServerMessage {
        match self {
            Outbound::Snapshot(snapshot) => ServerMessage::MetroUpdate(snapshot),
            Outbound::Pong => ServerMessage::Pong(PongMessage {
                timestamp: chrono::Utc::now().to_rfc3339(),
            }),
        }
    }
}
