//! REST API endpoint handlers for the Observer server.
//!
//! Reads are served from the controller's latest snapshot. The command
//! endpoint only queues; the command takes effect on the next tick.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/fleet` | All vehicles, ordered by id |
//! | `GET` | `/api/fleet/{id}` | Single vehicle |
//! | `GET` | `/api/kpis` | Fleet KPIs |
//! | `GET` | `/api/queues` | All admission queues |
//! | `GET` | `/api/queues/{site_id}` | Single admission queue |
//! | `POST` | `/api/commands` | Queue a fleet command |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use pitfleet_types::{FleetCommand, Phase, SiteId, VehicleId};

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for the `GET /api/fleet` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct FleetQuery {
    /// Only return vehicles in this phase (e.g. `HAULING`).
    pub phase: Option<Phase>,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing the run's headline numbers.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.controller.snapshot().await;
    let tick = snapshot.tick;
    let kpis = &snapshot.kpis;
    let status = if state.controller.operator().is_paused() {
        "PAUSED"
    } else {
        "RUNNING"
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Pitfleet Observer</title>
    <style>
        body {{ background: #0d1117; color: #c9d1d9; font-family: monospace; padding: 2rem; }}
        h1 {{ color: #58a6ff; }}
        .metric {{ display: inline-block; border: 1px solid #30363d; padding: 1rem; margin: 0.25rem; }}
        a {{ color: #58a6ff; }}
    </style>
</head>
<body>
    <h1>Pitfleet Observer</h1>
    <p>Status: {status}</p>
    <div class="metric">Tick {tick}</div>
    <div class="metric">Vehicles {total}</div>
    <div class="metric">Active {active}</div>
    <div class="metric">Hauling {hauling}</div>
    <div class="metric">Dumped {dumped:.0} t</div>
    <ul>
        <li><a href="/api/fleet">/api/fleet</a></li>
        <li><a href="/api/kpis">/api/kpis</a></li>
        <li><a href="/api/queues">/api/queues</a></li>
        <li><a href="/api/operator/status">/api/operator/status</a></li>
    </ul>
</body>
</html>"#,
        total = kpis.total,
        active = kpis.active,
        hauling = kpis.hauling,
        dumped = kpis.tons_dumped_total,
    ))
}

// ---------------------------------------------------------------------------
// GET /api/fleet -- list vehicles
// ---------------------------------------------------------------------------

/// List vehicles from the latest snapshot, optionally filtered by phase.
pub async fn list_fleet(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FleetQuery>,
) -> impl IntoResponse {
    let snapshot = state.controller.snapshot().await;
    let vehicles: Vec<_> = snapshot
        .vehicles
        .iter()
        .filter(|v| params.phase.is_none_or(|p| v.phase == p))
        .collect();

    Json(serde_json::json!({
        "tick": snapshot.tick,
        "sim_time_s": snapshot.sim_time_s,
        "count": vehicles.len(),
        "vehicles": vehicles,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/fleet/{id} -- single vehicle
// ---------------------------------------------------------------------------

/// Return one vehicle from the latest snapshot.
pub async fn get_vehicle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let vehicle = state
        .controller
        .vehicle(&VehicleId::new(id.as_str()))
        .await
        .ok_or_else(|| ObserverError::NotFound(format!("vehicle {id}")))?;
    Ok(Json(vehicle))
}

// ---------------------------------------------------------------------------
// GET /api/kpis
// ---------------------------------------------------------------------------

/// Return fleet KPIs from the latest snapshot.
pub async fn get_kpis(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ObserverError> {
    let snapshot = state.controller.snapshot().await;
    Ok(Json(serde_json::json!({
        "tick": snapshot.tick,
        "kpis": serde_json::to_value(&snapshot.kpis)?,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/queues, GET /api/queues/{site_id}
// ---------------------------------------------------------------------------

/// List every admission queue, ordered by site id.
pub async fn list_queues(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let queues = state.controller.queues().await;
    Json(serde_json::json!({
        "count": queues.len(),
        "queues": queues,
    }))
}

/// Return one site's admission queue.
pub async fn get_queue(
    State(state): State<Arc<AppState>>,
    Path(site_id): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let queue = state
        .controller
        .queue(&SiteId::new(site_id.as_str()))
        .await
        .ok_or_else(|| ObserverError::NotFound(format!("queue for site {site_id}")))?;
    Ok(Json(queue))
}

// ---------------------------------------------------------------------------
// POST /api/commands
// ---------------------------------------------------------------------------

/// Queue a fleet command for the next tick.
///
/// Responds `202 Accepted`: validation happens when the command is applied,
/// and a command naming an unknown id is a no-op.
pub async fn submit_command(
    State(state): State<Arc<AppState>>,
    Json(command): Json<FleetCommand>,
) -> impl IntoResponse {
    let kind = command.kind();
    state.controller.submit(command).await;
    let pending = state.controller.operator().pending_commands().await;
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "ok": true,
            "queued": kind,
            "pending_commands": pending,
        })),
    )
}
