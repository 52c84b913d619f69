//! Viewer WebSocket handler
//!
//! `/view?width=W&height=H` streams render frames to a remote display. Each
//! connection runs its own redraw relay; the relay paints into a one-slot
//! frame buffer and the socket writer always sends the newest frame, so a
//! slow viewer skips frames instead of queueing them.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Extension, Query, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use overdraw_core::{spawn_redraw_relay, DrawOp, Surface};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::server::AppState;

/// Largest accepted surface edge in pixels
const MAX_DIMENSION: u32 = 16_384;

/// Viewer surface size
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ViewParams {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_width() -> u32 {
    1920
}

fn default_height() -> u32 {
    1080
}

/// Messages sent to viewers
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ViewMessage<'a> {
    /// Full repaint
    Frame {
        /// Draw operations in order
        ops: &'a [DrawOp],
    },
}

/// Surface that publishes each repaint as the latest frame
struct FrameSurface {
    width: u32,
    height: u32,
    frames: watch::Sender<Arc<Vec<DrawOp>>>,
}

impl Surface for FrameSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn repaint(&mut self, ops: &[DrawOp]) {
        self.frames.send_replace(Arc::new(ops.to_vec()));
    }
}

/// WebSocket upgrade handler for viewers
pub async fn view_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ViewParams>,
    Extension(state): Extension<Arc<AppState>>,
) -> impl IntoResponse {
    let width = params.width.clamp(1, MAX_DIMENSION);
    let height = params.height.clamp(1, MAX_DIMENSION);
    ws.on_upgrade(move |socket| handle_socket(socket, width, height, state))
}

/// Stream frames to one viewer until it disconnects or the engine stops
async fn handle_socket(socket: WebSocket, width: u32, height: u32, state: Arc<AppState>) {
    let connection_id = Uuid::new_v4();
    info!(connection_id = %connection_id, width, height, "Viewer connected");

    let (frames_tx, mut frames_rx) = watch::channel(Arc::new(Vec::new()));
    let surface = FrameSurface {
        width,
        height,
        frames: frames_tx,
    };
    let relay = spawn_redraw_relay(&state.engine, surface, state.pen);

    let (mut sender, mut receiver) = socket.split();
    let mut sent = 0u64;

    loop {
        tokio::select! {
            changed = frames_rx.changed() => {
                if changed.is_err() {
                    debug!(connection_id = %connection_id, "Relay ended");
                    break;
                }
                let frame = Arc::clone(&frames_rx.borrow_and_update());
                let json = match serde_json::to_string(&ViewMessage::Frame { ops: &frame }) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!(error = %e, "Failed to encode frame");
                        continue;
                    }
                };
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
                sent += 1;
            }
            msg = receiver.next() => match msg {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(Message::Ping(data))) => {
                    let _ = sender.send(Message::Pong(data)).await;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(connection_id = %connection_id, error = %e, "WebSocket error");
                    break;
                }
            },
        }
    }

    relay.abort();
    info!(connection_id = %connection_id, frames = sent, "Viewer disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use overdraw_core::{DrawEngine, DrawEvent, EngineConfig, Pen, Point, StrokeKey};
    use std::time::Duration;

    #[test]
    fn test_frame_message_shape() {
        let ops = vec![DrawOp::Clear];
        let json = serde_json::to_value(ViewMessage::Frame { ops: &ops }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "frame", "ops": [{"op": "clear"}]})
        );
    }

    #[tokio::test]
    async fn test_frame_surface_keeps_latest() {
        let engine = DrawEngine::start(EngineConfig::default());
        let (frames_tx, mut frames_rx) = watch::channel(Arc::new(Vec::new()));
        let surface = FrameSurface {
            width: 100,
            height: 100,
            frames: frames_tx,
        };
        let relay = spawn_redraw_relay(&engine, surface, Pen::default());

        engine
            .submit(DrawEvent::new(StrokeKey::new(1, 255, 0, 0), Point::new(0.5, 0.5)))
            .unwrap();
        engine.flush().await.unwrap();

        loop {
            frames_rx.changed().await.unwrap();
            let frame = Arc::clone(&frames_rx.borrow_and_update());
            if frame.len() == 2 {
                assert!(matches!(frame[1], DrawOp::Point { x: 50, y: 50, .. }));
                break;
            }
        }

        relay.abort();
    }

    #[tokio::test]
    async fn test_frames_end_when_engine_stops() {
        let engine = DrawEngine::start(EngineConfig::default());
        let (frames_tx, mut frames_rx) = watch::channel(Arc::new(Vec::new()));
        let surface = FrameSurface {
            width: 100,
            height: 100,
            frames: frames_tx,
        };
        let relay = spawn_redraw_relay(&engine, surface, Pen::default());

        engine.shutdown().await;
        relay.await.unwrap();

        let drained = tokio::time::timeout(Duration::from_secs(2), async {
            while frames_rx.changed().await.is_ok() {}
        })
        .await;
        assert!(drained.is_ok(), "frame stream stayed open after shutdown");
    }
}
