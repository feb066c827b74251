//! Live tick stream at `GET /ws/ticks`.
//!
//! A client first receives a `hello` frame with the KPIs of the latest
//! snapshot, then one `tick` frame per completed tick. A client that falls
//! more than the channel capacity behind gets a `lagged` frame with the
//! number of ticks it missed and continues from the newest one.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use pitfleet_types::FleetKpis;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::{AppState, TickBroadcast};

/// One text frame on the tick stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamFrame {
    /// Sent once on connect.
    Hello {
        /// Tick of the latest published snapshot.
        tick: u64,
        /// KPIs of that snapshot.
        kpis: FleetKpis,
    },
    /// A completed tick.
    Tick(TickBroadcast),
    /// Ticks dropped because the client read too slowly.
    Lagged {
        /// Number of ticks skipped.
        skipped: u64,
    },
}

/// Upgrade to a `WebSocket` and start streaming.
pub async fn ws_ticks(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(|socket| stream_ticks(socket, state))
}

async fn stream_ticks(mut socket: WebSocket, state: Arc<AppState>) {
    // Subscribe before reading the snapshot so no tick falls between them.
    let mut rx = state.subscribe();
    let snapshot = state.controller.snapshot().await;
    let hello = StreamFrame::Hello {
        tick: snapshot.tick,
        kpis: snapshot.kpis.clone(),
    };
    if !send_frame(&mut socket, &hello).await {
        return;
    }
    debug!(tick = snapshot.tick, "Tick stream client connected");

    loop {
        tokio::select! {
            received = rx.recv() => {
                let frame = match received {
                    Ok(tick) => StreamFrame::Tick(tick),
                    Err(RecvError::Lagged(skipped)) => StreamFrame::Lagged { skipped },
                    Err(RecvError::Closed) => {
                        debug!("Tick channel closed, ending stream");
                        return;
                    }
                };
                if !send_frame(&mut socket, &frame).await {
                    return;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            return;
                        }
                    }
                    Some(Ok(Message::Close(_)) | Err(_)) | None => {
                        debug!("Tick stream client disconnected");
                        return;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

/// Serialize and send one frame. Returns `false` once the client is gone.
async fn send_frame(socket: &mut WebSocket, frame: &StreamFrame) -> bool {
    let text = match serde_json::to_string(frame) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "Failed to encode stream frame");
            return true;
        }
    };
    socket.send(Message::Text(text.into())).await.is_ok()
}
