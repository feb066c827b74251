//! Operator REST API handlers for run control.
//!
//! These act on the whole run rather than on individual vehicles; fleet
//! commands go through `POST /api/commands` instead.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/operator/pause` | Pause the tick loop |
//! | `POST` | `/api/operator/resume` | Resume the tick loop |
//! | `POST` | `/api/operator/speed` | Set tick interval (ms) |
//! | `GET` | `/api/operator/status` | Current run status |
//! | `POST` | `/api/operator/stop` | Stop the run |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use pitfleet_core::operator::{MIN_TICK_INTERVAL_MS, OperatorState};

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /api/operator/speed`.
#[derive(Debug, serde::Deserialize)]
pub struct SetSpeedRequest {
    /// New tick interval in milliseconds (minimum 100).
    pub tick_interval_ms: u64,
}

/// Run control flags after an operator action.
#[derive(Debug, serde::Serialize)]
struct ControlResponse {
    ok: bool,
    paused: bool,
    stop_requested: bool,
    tick_interval_ms: u64,
}

fn control_response(operator: &OperatorState) -> Json<ControlResponse> {
    let control = operator.control();
    Json(ControlResponse {
        ok: true,
        paused: control.paused,
        stop_requested: control.stop_requested,
        tick_interval_ms: operator.tick_interval_ms(),
    })
}

// ---------------------------------------------------------------------------
// POST /api/operator/pause
// ---------------------------------------------------------------------------

/// Pause the tick loop. Vehicle state is held as-is until resumed.
pub async fn pause(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let operator = state.controller.operator();
    operator.pause();
    control_response(operator)
}

// ---------------------------------------------------------------------------
// POST /api/operator/resume
// ---------------------------------------------------------------------------

/// Resume the tick loop after a pause.
pub async fn resume(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let operator = state.controller.operator();
    operator.resume();
    control_response(operator)
}

// ---------------------------------------------------------------------------
// POST /api/operator/speed
// ---------------------------------------------------------------------------

/// Change the wall-clock tick interval at runtime.
///
/// Simulated seconds per tick are unchanged, so vehicle dynamics do not
/// depend on the chosen speed.
pub async fn set_speed(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetSpeedRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    state
        .controller
        .operator()
        .set_tick_interval_ms(body.tick_interval_ms)
        .map_or_else(
            || {
                Err(ObserverError::InvalidRequest(format!(
                    "tick_interval_ms must be at least {MIN_TICK_INTERVAL_MS}"
                )))
            },
            |prev| {
                Ok(Json(serde_json::json!({
                    "ok": true,
                    "message": format!("Tick interval changed from {}ms to {}ms", prev, body.tick_interval_ms),
                    "previous_interval_ms": prev,
                    "new_interval_ms": body.tick_interval_ms,
                })))
            },
        )
}

// ---------------------------------------------------------------------------
// GET /api/operator/status
// ---------------------------------------------------------------------------

/// Return the current run status: tick, pause state, speed, bounds and
/// fleet counts.
pub async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.controller.status().await)
}

// ---------------------------------------------------------------------------
// POST /api/operator/stop
// ---------------------------------------------------------------------------

/// Stop the run.
///
/// The tick loop exits without waiting out its interval. The HTTP server
/// keeps serving the last snapshot.
pub async fn stop(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let operator = state.controller.operator();
    operator.request_stop();
    control_response(operator)
}
