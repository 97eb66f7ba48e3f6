//! WebSocket upgrade handler for live dashboard viewers.
//!
//! Handles the HTTP → WebSocket upgrade and manages the connection lifecycle:
//! 1. Check the browser origin
//! 2. Upgrade to WebSocket
//! 3. Register with the viewer registry (queues the current snapshot)
//! 4. Send/receive messages until disconnect
//! 5. Deregister

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::domain::foundation::ViewerId;

use super::{
    messages::{ClientMessage, Outbound, ServerMessage},
    viewers::ViewerRegistry,
};

/// State shared by the relay's HTTP handlers.
#[derive(Clone)]
pub struct RelayState {
    pub viewers: Arc<ViewerRegistry>,
    /// The one browser origin allowed to open a viewer session.
    pub allowed_origin: HeaderValue,
}

impl RelayState {
    pub fn new(viewers: Arc<ViewerRegistry>, allowed_origin: HeaderValue) -> Self {
        Self {
            viewers,
            allowed_origin,
        }
    }

    /// Requests without an `Origin` header come from non-browser clients
    /// and are let through.
    fn origin_allowed(&self, headers: &HeaderMap) -> bool {
        match headers.get(header::ORIGIN) {
            Some(origin) => *origin == self.allowed_origin,
            None => true,
        }
    }
}

/// Handle WebSocket upgrade requests for the live feed.
///
/// Route: `GET /ws`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<RelayState>,
) -> Response {
    if !state.origin_allowed(&headers) {
        tracing::warn!(
            origin = ?headers.get(header::ORIGIN),
            "Rejected viewer from disallowed origin"
        );
        return (StatusCode::FORBIDDEN, "Origin not allowed").into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state.viewers))
}

/// Handle an established WebSocket connection.
///
/// Runs for the lifetime of the connection:
/// - Forwarding the viewer's queue to the socket
/// - Answering heartbeats and resync requests
/// - Deregistering exactly once on disconnect
async fn handle_socket(socket: WebSocket, viewers: Arc<ViewerRegistry>) {
    let (mut sender, mut receiver) = socket.split();

    let viewer_id = ViewerId::new();
    let mut outbound = viewers.on_session_opened(viewer_id).await;

    tracing::info!(viewer_id = %viewer_id, "Viewer connected");

    // Forward the viewer's queue to the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            let msg = message.into_server_message();
            if let Err(e) = send_message(&mut sender, &msg).await {
                tracing::debug!(viewer_id = %viewer_id, "Send error, closing connection: {}", e);
                return;
            }
        }

        // Queue closed by the registry (shutdown or slow viewer)
        let _ = sender.send(Message::Close(None)).await;
    });

    // Handle incoming messages from the viewer
    let recv_viewers = viewers.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Ping) => {
                        tracing::trace!(viewer_id = %viewer_id, "Received ping");
                        recv_viewers.send_to(&viewer_id, Outbound::Pong).await;
                    }
                    Ok(ClientMessage::RequestState) => {
                        tracing::debug!(viewer_id = %viewer_id, "Viewer requested current state");
                        recv_viewers.send_current(&viewer_id).await;
                    }
                    Err(e) => {
                        tracing::debug!(viewer_id = %viewer_id, "Ignoring unknown message: {}", e);
                    }
                },
                Ok(Message::Binary(_)) => {
                    tracing::warn!(viewer_id = %viewer_id, "Received unsupported binary message");
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // Protocol-level, answered by axum
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!(viewer_id = %viewer_id, "Viewer sent close frame");
                    break;
                }
                Err(e) => {
                    tracing::debug!(viewer_id = %viewer_id, "Receive error: {}", e);
                    break;
                }
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    viewers.on_session_closed(&viewer_id).await;
    tracing::info!(viewer_id = %viewer_id, "Viewer disconnected");
}

/// Send a JSON message over the WebSocket.
async fn send_message(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).map_err(axum::Error::new)?;
    sender.send(Message::Text(json)).await
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    viewers: usize,
}

/// Route: `GET /health`
async fn health_handler(State(state): State<RelayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        viewers: state.viewers.viewer_count().await,
    })
}

/// Build the relay's HTTP router: `/ws`, `/health`, CORS and request tracing.
pub fn relay_router(state: RelayState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(state.allowed_origin.clone())
        .allow_methods([Method::GET, Method::POST]);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
