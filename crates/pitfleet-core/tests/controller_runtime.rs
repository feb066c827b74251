//! Runner, controller and snapshot publication working together.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pitfleet_core::config::{SimulationBoundsConfig, SimulationConfig};
use pitfleet_core::controller::{FleetController, SnapshotPublisher};
use pitfleet_core::operator::{OperatorState, SimulationEndReason};
use pitfleet_core::runner::{SimulationHandle, TickCallback};
use pitfleet_core::seeding::seed_fleet;
use pitfleet_core::snapshot::build_snapshot;
use pitfleet_core::tick::{SimulationState, run_tick};
use pitfleet_types::{CommandTarget, FleetCommand, Phase, SiteId, VehicleDirective, VehicleId};
use pitfleet_world::create_whaleback;
use rand::SeedableRng;
use rand::rngs::SmallRng;

fn seeded_state(count: u32) -> SimulationState {
    let scenario = create_whaleback().unwrap();
    let mut rng = SmallRng::seed_from_u64(42);
    let fleet = seed_fleet(&scenario, count, &mut rng, Utc::now()).unwrap();
    SimulationState::new(scenario, fleet, &SimulationConfig::default(), rng).unwrap()
}

fn start(state: SimulationState, max_ticks: u64, interval_ms: u64) -> (FleetController, SimulationHandle) {
    let bounds = SimulationBoundsConfig {
        max_ticks,
        max_real_time_seconds: 0,
    };
    let operator = Arc::new(OperatorState::new(interval_ms, &bounds));
    let controller = FleetController::with_snapshot(Arc::clone(&operator), build_snapshot(&state));
    let publisher = SnapshotPublisher::new(controller.clone());
    let handle = SimulationHandle::spawn(state, operator, Box::new(publisher));
    (controller, handle)
}

#[tokio::test]
async fn commands_submitted_between_ticks_apply_on_the_next_tick() {
    let state = seeded_state(3);
    let bounds = SimulationBoundsConfig {
        max_ticks: 1,
        max_real_time_seconds: 0,
    };
    let operator = Arc::new(OperatorState::new(0, &bounds));
    let controller = FleetController::with_snapshot(Arc::clone(&operator), build_snapshot(&state));

    controller
        .directive(VehicleDirective::Pause, CommandTarget::Vehicle(VehicleId::from("TRK-02")))
        .await;

    // Nothing changes until a tick runs.
    let before = controller.vehicle(&VehicleId::from("TRK-02")).await.unwrap();
    assert_eq!(before.phase, Phase::Dispatched);

    let publisher = SnapshotPublisher::new(controller.clone());
    let handle = SimulationHandle::spawn(state, operator, Box::new(publisher));
    let (state, result) = handle.join().await.unwrap();
    assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);

    let after = controller.vehicle(&VehicleId::from("TRK-02")).await.unwrap();
    assert_eq!(after.phase, Phase::Paused);
    assert_eq!(after.prev_phase, Some(Phase::Dispatched));
    assert_eq!(
        state.vehicles.get(&VehicleId::from("TRK-02")).unwrap().phase,
        Phase::Paused
    );
    assert_eq!(controller.snapshot().await.tick, 1);
}

#[tokio::test]
async fn published_snapshots_follow_the_tick_counter() {
    let (controller, handle) = start(seeded_state(4), 25, 0);
    let (state, result) = handle.join().await.unwrap();
    assert_eq!(result.total_ticks, 25);

    let snap = controller.snapshot().await;
    assert_eq!(snap.tick, 25);
    assert_eq!(snap.tick, state.clock.tick());
    assert_eq!(snap.kpis.total, 4);
    let ids: Vec<&str> = snap.vehicles.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["TRK-01", "TRK-02", "TRK-03", "TRK-04"]);
    assert_eq!(snap.kpis.by_phase.values().sum::<u32>(), 4);
}

#[tokio::test]
async fn stop_returns_final_state_and_keeps_last_snapshot() {
    let (controller, handle) = start(seeded_state(2), 0, 100);
    tokio::time::sleep(Duration::from_millis(250)).await;

    let (state, result) = tokio::time::timeout(Duration::from_secs(2), handle.stop())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.end_reason, SimulationEndReason::OperatorStop);
    assert!(result.total_ticks >= 1);

    let snap = controller.snapshot().await;
    assert_eq!(snap.tick, state.clock.tick());
    let status = controller.status().await;
    assert!(status.stop_requested);
    assert_eq!(status.end_reason, Some(SimulationEndReason::OperatorStop));
}

#[tokio::test]
async fn queue_commands_flow_through_the_controller() {
    let mut state = seeded_state(6);
    for v in state.vehicles.values_mut() {
        v.phase = Phase::Loading;
        v.dwell_remaining_s = 20.0;
    }
    let operator = Arc::new(OperatorState::new(0, &SimulationBoundsConfig::default()));
    let controller = FleetController::new(Arc::clone(&operator));
    let mut publisher = SnapshotPublisher::new(controller.clone());

    // The first tick queues TRK-01, TRK-03 and TRK-05 at DIG-A.
    let summary = run_tick(&mut state, &[]).unwrap();
    publisher.on_tick(&summary, &state);
    let dig_a = SiteId::from("DIG-A");
    let queue = controller.queue(&dig_a).await.unwrap();
    assert_eq!(queue.active, Some(VehicleId::from("TRK-01")));

    controller
        .submit(FleetCommand::BumpToBack {
            site_id: dig_a.clone(),
            vehicle_id: VehicleId::from("TRK-01"),
        })
        .await;
    let commands = operator.drain_commands().await;
    let summary = run_tick(&mut state, &commands).unwrap();
    publisher.on_tick(&summary, &state);

    let queue = controller.queue(&dig_a).await.unwrap();
    let order: Vec<&str> = queue.consumer_ids.iter().map(VehicleId::as_str).collect();
    assert_eq!(order, vec!["TRK-03", "TRK-05", "TRK-01"]);
    assert_eq!(queue.active, Some(VehicleId::from("TRK-03")));
    assert_eq!(queue.slots.used, 3);
}
