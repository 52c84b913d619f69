//! Producer WebSocket handler
//!
//! Each `/draw` connection is one producer. Every text frame carries one
//! draw event as JSON; valid events go straight into the engine's queue.
//! Malformed frames are logged and skipped without closing the connection.

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket},
        Extension, WebSocketUpgrade,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use overdraw_core::{DrawEvent, EventSender};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::server::AppState;

/// WebSocket upgrade handler for producers.
///
/// The Origin gate runs before the upgrade is validated, so a disallowed
/// origin always gets 403.
pub async fn draw_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    headers: HeaderMap,
    Extension(state): Extension<Arc<AppState>>,
) -> Response {
    let origin = headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok());

    if !state.origin_allowed(origin) {
        warn!(origin = ?origin, "Rejected draw connection from disallowed origin");
        return (StatusCode::FORBIDDEN, "origin not allowed").into_response();
    }

    let sender = state.engine.sender();
    if sender.is_closed() {
        return (StatusCode::SERVICE_UNAVAILABLE, "engine stopped").into_response();
    }

    match ws {
        Ok(ws) => ws.on_upgrade(move |socket| handle_socket(socket, sender)),
        Err(rejection) => rejection.into_response(),
    }
}

/// Outcome of one inbound frame
#[derive(Debug, PartialEq, Eq)]
enum FrameOutcome {
    Submitted,
    Skipped,
    Closed,
}

/// Handle a producer connection until it closes
async fn handle_socket(mut socket: WebSocket, sender: EventSender) {
    let connection_id = Uuid::new_v4();
    info!(connection_id = %connection_id, "Producer connected");

    let mut submitted = 0u64;
    while let Some(msg) = socket.recv().await {
        let outcome = match msg {
            Ok(Message::Text(text)) => submit_frame(&text, &sender, connection_id),
            Ok(Message::Binary(data)) => match std::str::from_utf8(&data) {
                Ok(text) => submit_frame(text, &sender, connection_id),
                Err(e) => {
                    warn!(connection_id = %connection_id, error = %e, "Non UTF-8 frame skipped");
                    FrameOutcome::Skipped
                }
            },
            Ok(Message::Ping(data)) => {
                let _ = socket.send(Message::Pong(data)).await;
                FrameOutcome::Skipped
            }
            Ok(Message::Pong(_)) => FrameOutcome::Skipped,
            Ok(Message::Close(_)) => {
                debug!(connection_id = %connection_id, "WebSocket closed by client");
                FrameOutcome::Closed
            }
            Err(e) => {
                warn!(connection_id = %connection_id, error = %e, "WebSocket error");
                FrameOutcome::Closed
            }
        };

        match outcome {
            FrameOutcome::Submitted => submitted += 1,
            FrameOutcome::Skipped => {}
            FrameOutcome::Closed => break,
        }
    }

    info!(connection_id = %connection_id, submitted, "Producer disconnected");
}

/// Decode one frame and hand it to the engine
fn submit_frame(text: &str, sender: &EventSender, connection_id: Uuid) -> FrameOutcome {
    let event = match DrawEvent::from_json(text) {
        Ok(event) => event,
        Err(e) => {
            warn!(connection_id = %connection_id, error = %e, "Malformed draw event skipped");
            return FrameOutcome::Skipped;
        }
    };

    match sender.submit(event) {
        Ok(()) => FrameOutcome::Submitted,
        Err(e) if e.is_recoverable() => {
            warn!(connection_id = %connection_id, error = %e, "Draw event rejected");
            FrameOutcome::Skipped
        }
        Err(e) => {
            warn!(connection_id = %connection_id, error = %e, "Engine stopped, closing producer");
            FrameOutcome::Closed
        }
    }
}
