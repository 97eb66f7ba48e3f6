//! WebSocket adapters for the live dashboard feed.
//!
//! # Architecture
//!
//! ```text
//!   IngestTelemetryHandler
//!            │ publish(snapshot)
//!            ▼
//! ┌───────────────────────────────────────────────┐
//! │                ViewerRegistry                  │
//! │   viewer-a queue   viewer-b queue   viewer-c   │
//! └───────────────────────────────────────────────┘
//!            │ one socket task per viewer
//!            ▼
//!     GET /ws  (ws_handler)
//! ```
//!
//! # Components
//!
//! - [`messages`] - WebSocket message protocol types
//! - [`viewers`] - Viewer registry and broadcast fanout
//! - [`handler`] - Axum WebSocket upgrade handler and router

pub mod handler;
pub mod messages;
pub mod viewers;

pub use handler::{relay_router, ws_handler, RelayState};
pub use messages::{ClientMessage, Outbound, PongMessage, ServerMessage, METRO_UPDATE_EVENT};
pub use viewers::{ViewerRegistry, DEFAULT_SESSION_BUFFER};
