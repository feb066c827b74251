//! Integration tests for the Observer API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use pitfleet_core::config::{SimulationBoundsConfig, SimulationConfig};
use pitfleet_core::controller::FleetController;
use pitfleet_core::operator::OperatorState;
use pitfleet_core::seeding::seed_fleet;
use pitfleet_core::snapshot::build_snapshot;
use pitfleet_core::tick::SimulationState;
use pitfleet_observer::router::build_router;
use pitfleet_observer::state::{AppState, TickBroadcast};
use pitfleet_types::{FleetCommand, VehicleDirective};
use pitfleet_world::create_whaleback;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde_json::Value;
use tower::ServiceExt;

fn seeded_state() -> SimulationState {
    let scenario = create_whaleback().unwrap();
    let mut rng = SmallRng::seed_from_u64(42);
    let fleet = seed_fleet(&scenario, 4, &mut rng, Utc::now()).unwrap();
    SimulationState::new(scenario, fleet, &SimulationConfig::default(), rng).unwrap()
}

fn make_test_state() -> Arc<AppState> {
    let operator = Arc::new(OperatorState::new(1000, &SimulationBoundsConfig::default()));
    let controller = FleetController::with_snapshot(operator, build_snapshot(&seeded_state()));
    Arc::new(AppState::new(controller))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(state: Arc<AppState>, path: &str) -> (StatusCode, Value) {
    let response = build_router(state)
        .oneshot(Request::get(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn post_json(state: Arc<AppState>, path: &str, body: &Value) -> (StatusCode, Value) {
    let response = build_router(state)
        .oneshot(
            Request::post(path)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_index_returns_html() {
    let response = build_router(make_test_state())
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("text/html"));
}

#[tokio::test]
async fn test_list_fleet_is_ordered_by_id() {
    let (status, json) = get(make_test_state(), "/api/fleet").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["tick"], 0);
    assert_eq!(json["count"], 4);
    assert_eq!(json["vehicles"][0]["id"], "TRK-01");
    assert_eq!(json["vehicles"][3]["id"], "TRK-04");
}

#[tokio::test]
async fn test_list_fleet_filters_by_phase() {
    let (status, json) = get(make_test_state(), "/api/fleet?phase=DISPATCHED").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 4);

    let (_, json) = get(make_test_state(), "/api/fleet?phase=MAINT").await;
    assert_eq!(json["count"], 0);
}

#[tokio::test]
async fn test_get_vehicle() {
    let (status, json) = get(make_test_state(), "/api/fleet/TRK-02").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], "TRK-02");
    assert_eq!(json["phase"], "DISPATCHED");
    assert!(json["telemetry"]["fuel_pct"].is_number());
}

#[tokio::test]
async fn test_get_vehicle_not_found() {
    let (status, json) = get(make_test_state(), "/api/fleet/TRK-99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn test_get_kpis() {
    let (status, json) = get(make_test_state(), "/api/kpis").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["kpis"]["total"], 4);
    assert_eq!(json["kpis"]["active"], 4);
    assert_eq!(json["kpis"]["by_phase"]["DISPATCHED"], 4);
    assert_eq!(json["kpis"]["by_phase"]["FAULT"], 0);
}

#[tokio::test]
async fn test_list_queues_and_single_queue() {
    let (status, json) = get(make_test_state(), "/api/queues").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 4);
    assert_eq!(json["queues"][0]["site_id"], "DIG-A");

    let (status, json) = get(make_test_state(), "/api/queues/DUMP-B").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["slots"]["capacity"], 3);
    assert_eq!(json["slots"]["used"], 0);

    let (status, _) = get(make_test_state(), "/api/queues/NOPE").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_submit_command_is_accepted_and_queued() {
    let state = make_test_state();
    let body = serde_json::json!({
        "command": "vehicle",
        "directive": "pause",
        "target": "TRK-01",
    });
    let (status, json) = post_json(Arc::clone(&state), "/api/commands", &body).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["queued"], "vehicle");
    assert_eq!(json["pending_commands"], 1);

    let drained = state.controller.operator().drain_commands().await;
    assert_eq!(drained, vec![FleetCommand::vehicle(VehicleDirective::Pause, "TRK-01")]);

    // Queued, not applied: the published snapshot is unchanged.
    let (_, json) = get(state, "/api/fleet/TRK-01").await;
    assert_eq!(json["phase"], "DISPATCHED");
}

#[tokio::test]
async fn test_submit_stop_all_is_queued() {
    let state = make_test_state();
    let body = serde_json::json!({ "command": "stop_all" });
    let (status, json) = post_json(Arc::clone(&state), "/api/commands", &body).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["queued"], "stop_all");

    let drained = state.controller.operator().drain_commands().await;
    assert_eq!(drained, vec![FleetCommand::StopAll]);
}

#[tokio::test]
async fn test_submit_malformed_command_is_rejected() {
    let state = make_test_state();
    let body = serde_json::json!({ "command": "teleport" });
    let response = build_router(Arc::clone(&state))
        .oneshot(
            Request::post("/api/commands")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.status().is_client_error());
    assert_eq!(state.controller.operator().pending_commands().await, 0);
}

#[tokio::test]
async fn test_operator_pause_resume_stop() {
    let state = make_test_state();
    let (status, json) = post_json(Arc::clone(&state), "/api/operator/pause", &Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["paused"], true);
    assert_eq!(json["stop_requested"], false);
    assert!(state.controller.operator().is_paused());

    let (_, json) = get(Arc::clone(&state), "/api/operator/status").await;
    assert_eq!(json["paused"], true);
    assert_eq!(json["tick"], 0);
    assert_eq!(json["vehicles_total"], 4);

    post_json(Arc::clone(&state), "/api/operator/resume", &Value::Null).await;
    assert!(!state.controller.operator().is_paused());

    let (_, json) = post_json(Arc::clone(&state), "/api/operator/stop", &Value::Null).await;
    assert_eq!(json["stop_requested"], true);
    assert!(state.controller.operator().is_stop_requested());
}

#[tokio::test]
async fn test_operator_speed_enforces_minimum() {
    let state = make_test_state();
    let (status, json) = post_json(
        Arc::clone(&state),
        "/api/operator/speed",
        &serde_json::json!({ "tick_interval_ms": 250 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["previous_interval_ms"], 1000);
    assert_eq!(state.controller.operator().tick_interval_ms(), 250);

    let (status, _) = post_json(
        Arc::clone(&state),
        "/api/operator/speed",
        &serde_json::json!({ "tick_interval_ms": 10 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(state.controller.operator().tick_interval_ms(), 250);
}

#[tokio::test]
async fn test_broadcast_channel() {
    let state = make_test_state();
    let mut rx = state.subscribe();

    let summary = TickBroadcast {
        tick: 42,
        sim_time_s: 42.0,
        phase_changes: 3,
        commands_applied: 1,
        tons_dumped: 0.0,
    };
    assert_eq!(state.broadcast(&summary), 1);

    let received = rx.recv().await.unwrap();
    assert_eq!(received, summary);
}

#[tokio::test]
async fn test_nonexistent_route_returns_404() {
    let response = build_router(make_test_state())
        .oneshot(Request::get("/api/nonexistent").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
