//! `WebSocket` handler for real-time snapshot streaming.
//!
//! Clients connect to `GET /ws` and receive one JSON-encoded snapshot per
//! tick. When auth is enabled the credential is checked before the
//! upgrade, taken from the `?token=` query parameter or the
//! `Sec-WebSocket-Protocol` header; a missing or invalid credential
//! refuses the upgrade. An offered subprotocol is echoed back in the
//! handshake response, since browsers abort the connection when the
//! protocol they offered is not selected.
//!
//! After the upgrade the connection task forwards frames from its hub
//! channel to the socket and reads inbound frames solely to detect
//! disconnection. It exits on read error, write error, a close frame,
//! or the process shutdown signal.

use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for the `GET /ws` endpoint.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Optional bearer credential (alternative to the protocol header).
    pub token: Option<String>,
}

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming snapshots.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_stream(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let protocol = offered_protocol(&headers);

    // Credential refusal takes precedence over upgrade mechanics, so a
    // caller without access learns nothing about the endpoint.
    if state.auth.enabled() {
        let Some(token) = query.token.as_deref().or(protocol.as_deref()) else {
            return ApiError::Unauthorized(String::from("missing credential")).into_response();
        };
        if let Err(e) = state.auth.validate_credential(token) {
            return ApiError::Unauthorized(e.to_string()).into_response();
        }
    }

    let upgrade = match ws {
        Ok(upgrade) => upgrade,
        Err(rejection) => return rejection.into_response(),
    };
    upgrade
        .protocols(protocol)
        .on_upgrade(|socket| handle_socket(socket, state))
}

/// The client's offered `Sec-WebSocket-Protocol` value, if any.
fn offered_protocol(headers: &HeaderMap) -> Option<String> {
    headers
        .get("sec-websocket-protocol")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// Handle the `WebSocket` lifecycle: register with the hub and forward
/// each frame to the socket until the viewer or the process goes away.
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let (viewer_id, mut frames) = state.hub.register();
    let mut shutdown = state.shutdown.clone();
    debug!(viewer = %viewer_id, "WebSocket viewer connected");

    loop {
        tokio::select! {
            // A frame broadcast by the hub.
            frame = frames.recv() => {
                match frame {
                    Some(frame) => {
                        let msg = Message::Text(frame.as_ref().into());
                        if socket.send(msg).await.is_err() {
                            debug!(viewer = %viewer_id, "Viewer disconnected (send failed)");
                            break;
                        }
                    }
                    // The hub dropped this sink (failed write or close_all).
                    None => break,
                }
            }
            // Inbound traffic is read only to detect disconnection.
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(viewer = %viewer_id, "Viewer disconnected");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(viewer = %viewer_id, "Viewer disconnected (pong failed)");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(viewer = %viewer_id, "WebSocket error: {e}");
                        break;
                    }
                    _ => {
                        // Ignore text/binary from the client.
                    }
                }
            }
            _ = shutdown.changed() => {
                debug!(viewer = %viewer_id, "Shutdown observed, closing viewer");
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
        }
    }

    state.hub.unregister(viewer_id);
}
