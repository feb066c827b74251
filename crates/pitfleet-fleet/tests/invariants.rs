//! Long-running randomized checks on single-vehicle mechanics.
//!
//! A handful of vehicles are stepped over the built-in scenario for
//! thousands of ticks while operator directives are fired at random. Every
//! tick the telemetry ranges and the overlay bookkeeping are checked.

#![allow(clippy::unwrap_used)]

use chrono::Utc;
use pitfleet_fleet::{
    FleetConfig, QueueStatus, StepContext, apply_directive, dwell_site, step_vehicle,
};
use pitfleet_types::{LatLng, Phase, Telemetry, Vehicle, VehicleDirective, VehicleId};
use pitfleet_world::create_whaleback;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const DIRECTIVES: [VehicleDirective; 7] = [
    VehicleDirective::Dispatch,
    VehicleDirective::Pause,
    VehicleDirective::Resume,
    VehicleDirective::RaiseFault,
    VehicleDirective::ClearFault,
    VehicleDirective::SendToFuel,
    VehicleDirective::SendToMaint,
];

fn assert_in_range(v: &Vehicle, cfg: &FleetConfig) {
    let t = v.telemetry;
    assert!((0.0..=60.0).contains(&t.speed_kph), "speed {t:?}");
    assert!((0.0..=cfg.max_payload_tons).contains(&t.payload_tons), "payload {t:?}");
    assert!((0.0..=100.0).contains(&t.fuel_pct), "fuel {t:?}");
    assert!((0.0..=100.0).contains(&t.health_pct), "health {t:?}");
    assert!((60.0..=125.0).contains(&t.engine_temp_c), "temp {t:?}");
    assert!((0.0..360.0).contains(&v.heading_deg), "heading {}", v.heading_deg);
    assert!(v.dwell_remaining_s >= 0.0);
    assert!(v.position.is_valid());
    assert!(!v.prev_phase.is_some_and(Phase::is_overlay));
    if !v.phase.is_overlay() {
        assert!(v.prev_phase.is_none());
    }
}

#[test]
fn telemetry_stays_in_range_under_random_directives() {
    let scenario = create_whaleback().unwrap();
    let cfg = FleetConfig::default();
    let mut rng = SmallRng::seed_from_u64(42);

    let mut fleet: Vec<Vehicle> = scenario
        .routes
        .values()
        .cycle()
        .take(6)
        .enumerate()
        .map(|(i, route)| Vehicle {
            id: VehicleId::new(format!("TRK-{:02}", i + 1)),
            name: format!("Truck {}", i + 1),
            phase: Phase::Dispatched,
            prev_phase: None,
            position: route.home(),
            heading_deg: 0.0,
            telemetry: Telemetry {
                speed_kph: 30.0,
                payload_tons: 0.0,
                fuel_pct: 40.0,
                health_pct: 50.0,
                engine_temp_c: 80.0,
            },
            route_id: route.id().clone(),
            dig_id: route.dig_id().cloned(),
            dump_id: route.dump_id().cloned(),
            tip_edge_id: route
                .dump_id()
                .and_then(|d| scenario.sites.default_tip_edge(d))
                .cloned(),
            progress_m: 0.0,
            progress_t: 0.0,
            dwell_remaining_s: 0.0,
            last_update: Utc::now(),
        })
        .collect();

    let mut phases_seen = std::collections::BTreeSet::new();
    for _ in 0..5000 {
        for v in &mut fleet {
            if rng.random_bool(0.01) {
                let pick = rng.random_range(0..DIRECTIVES.len());
                if let Some(&directive) = DIRECTIVES.get(pick) {
                    apply_directive(v, directive, Utc::now());
                    assert_in_range(v, &cfg);
                }
            }
            let route = scenario.route(&v.route_id).unwrap();
            let ctx = StepContext {
                config: &cfg,
                route,
                sites: &scenario.sites,
                zones: &scenario.zones,
                default_speed_limit_kph: 40.0,
                dt_s: 1.0,
                now: Utc::now(),
            };
            let status = if dwell_site(v).is_some() {
                QueueStatus {
                    queued: true,
                    at_front: true,
                }
            } else {
                QueueStatus::default()
            };
            *v = step_vehicle(v, status, &ctx, &mut rng).vehicle;
            assert_in_range(v, &cfg);
            assert!((0.0..route.length_m()).contains(&v.progress_m));
            assert!((0.0..1.0).contains(&v.progress_t));
            phases_seen.insert(v.phase);
        }
    }

    for phase in [Phase::Loading, Phase::Hauling, Phase::Dumping, Phase::Returning] {
        assert!(phases_seen.contains(&phase), "never reached {phase}");
    }
}

#[test]
fn paused_vehicle_holds_position() {
    let scenario = create_whaleback().unwrap();
    let cfg = FleetConfig::default();
    let route = scenario.routes.values().next().unwrap();
    let mut rng = SmallRng::seed_from_u64(7);
    let mut v = Vehicle {
        id: VehicleId::from("TRK-01"),
        name: "Truck 1".to_owned(),
        phase: Phase::Hauling,
        prev_phase: None,
        position: LatLng::new(0.0, 0.0),
        heading_deg: 0.0,
        telemetry: Telemetry {
            speed_kph: 35.0,
            payload_tons: 280.0,
            fuel_pct: 70.0,
            health_pct: 90.0,
            engine_temp_c: 90.0,
        },
        route_id: route.id().clone(),
        dig_id: route.dig_id().cloned(),
        dump_id: route.dump_id().cloned(),
        tip_edge_id: None,
        progress_m: 100.0,
        progress_t: 0.0,
        dwell_remaining_s: 0.0,
        last_update: Utc::now(),
    };
    let ctx = StepContext {
        config: &cfg,
        route,
        sites: &scenario.sites,
        zones: &scenario.zones,
        default_speed_limit_kph: 40.0,
        dt_s: 1.0,
        now: Utc::now(),
    };
    v = step_vehicle(&v, QueueStatus::default(), &ctx, &mut rng).vehicle;
    apply_directive(&mut v, VehicleDirective::Pause, Utc::now());
    let parked = v.clone();
    for _ in 0..50 {
        v = step_vehicle(&v, QueueStatus::default(), &ctx, &mut rng).vehicle;
    }
    assert_eq!(v.position, parked.position);
    assert!(v.telemetry.speed_kph.abs() < f64::EPSILON);
    apply_directive(&mut v, VehicleDirective::Resume, Utc::now());
    assert_eq!(v.phase, Phase::Hauling);
}
