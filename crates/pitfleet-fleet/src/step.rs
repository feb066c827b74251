//! Advance a single vehicle by one tick.
//!
//! [`step_vehicle`] is a pure function of the previous vehicle state, the
//! vehicle's standing in its site queue, and the static world. It never
//! touches a queue directly: queue joins and departures are returned as
//! [`QueueEffect`]s and applied by the caller after the whole fleet has been
//! stepped.

use chrono::{DateTime, Utc};
use pitfleet_types::{LatLng, Phase, SiteId, Vehicle, VehicleId};
use pitfleet_world::{Route, SiteRegistry, SpeedZoneIndex};
use rand::Rng;
use tracing::debug;

use crate::config::FleetConfig;
use crate::overlay::dwell_site;
use crate::phase::{PhaseInputs, resolve_phase};
use crate::telemetry::{TickActivity, converge_speed, evolve, target_speed};

/// Meters per second in one km/h.
const KPH_TO_MPS: f64 = 1.0 / 3.6;

/// Static inputs shared by every vehicle in a tick.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    /// Vehicle mechanics.
    pub config: &'a FleetConfig,
    /// The vehicle's route.
    pub route: &'a Route,
    /// Site lookups.
    pub sites: &'a SiteRegistry,
    /// Speed zones.
    pub zones: &'a SpeedZoneIndex,
    /// Cap applied outside every zone, in km/h.
    pub default_speed_limit_kph: f64,
    /// Simulated seconds per tick.
    pub dt_s: f64,
    /// Wall-clock time stamped on updated vehicles.
    pub now: DateTime<Utc>,
}

/// A vehicle's standing in the queue of the site it is dwelling at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStatus {
    /// The vehicle holds a job in the queue.
    pub queued: bool,
    /// The vehicle's job is at the front.
    pub at_front: bool,
}

/// A queue change requested by a vehicle step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEffect {
    /// Append a job for the vehicle if it holds none.
    Join {
        /// Queue to join.
        site_id: SiteId,
        /// Joining vehicle.
        vehicle_id: VehicleId,
    },
    /// Withdraw the vehicle's jobs.
    Leave {
        /// Queue to leave.
        site_id: SiteId,
        /// Departing vehicle.
        vehicle_id: VehicleId,
    },
}

/// Result of stepping one vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// The vehicle's next state.
    pub vehicle: Vehicle,
    /// Queue changes to apply after the fold.
    pub effects: Vec<QueueEffect>,
    /// Tonnes tipped this tick.
    pub tons_dumped: f64,
    /// Phase change committed this tick, as `(from, to)`.
    pub transition: Option<(Phase, Phase)>,
}

/// Where a moving vehicle is heading.
pub fn travel_target(vehicle: &Vehicle, route: &Route, sites: &SiteRegistry) -> Option<LatLng> {
    match vehicle.phase {
        Phase::Dispatched => vehicle
            .dig_id
            .as_ref()
            .and_then(|id| sites.dig(id))
            .map(|dig| dig.location),
        Phase::Hauling => vehicle
            .tip_edge_id
            .as_ref()
            .or_else(|| vehicle.dump_id.as_ref().and_then(|d| sites.default_tip_edge(d)))
            .and_then(|edge| sites.tip_point(edge)),
        Phase::Returning => Some(route.home()),
        _ => None,
    }
}

/// Advance one vehicle by one tick.
pub fn step_vehicle<R: Rng>(
    prev: &Vehicle,
    queue: QueueStatus,
    ctx: &StepContext<'_>,
    rng: &mut R,
) -> StepOutcome {
    let mut v = prev.clone();
    v.last_update = ctx.now;

    if prev.phase.is_overlay() {
        return StepOutcome {
            vehicle: v,
            effects: Vec::new(),
            tons_dumped: 0.0,
            transition: None,
        };
    }

    let cfg = ctx.config;
    let route = ctx.route;
    let dt = ctx.dt_s.max(0.0);
    let phase = prev.phase;
    let mut effects = Vec::new();

    // --- Motion --------------------------------------------------------------
    let mut distance_m = 0.0;
    let mut arrived = false;
    if phase.is_moving() {
        let limit = ctx
            .zones
            .speed_limit_at(prev.position, ctx.default_speed_limit_kph);
        let target = target_speed(phase, cfg, rng);
        v.telemetry.speed_kph = converge_speed(
            prev.telemetry.speed_kph,
            target,
            cfg.max_accel_kph_per_s * dt,
            limit,
        );
        let travel = v.telemetry.speed_kph * KPH_TO_MPS * dt;

        let stop = travel_target(prev, route, ctx.sites).map(|p| route.stop_for(p));
        let remaining = stop.map(|s| route.forward_distance(prev.progress_m, s));
        let along = match (stop, remaining) {
            (Some(s), Some(rem)) if travel >= rem - cfg.arrival_radius_m => {
                arrived = true;
                distance_m = travel.min(rem);
                s
            }
            _ => {
                distance_m = travel;
                prev.progress_m + travel
            }
        };

        if arrived {
            v.position = route.position_at_clamped(along);
            v.heading_deg = route.heading_at(along);
        } else {
            v.position = route.position_at(along);
            v.heading_deg = route.heading_at(route.wrap(along));
        }
        v.progress_m = route.wrap(along);
        v.progress_t = route.fraction(v.progress_m);
    } else {
        v.telemetry.speed_kph = 0.0;
    }

    // --- Dwell ---------------------------------------------------------------
    let mut serviced = false;
    if phase.is_dwell() {
        let site = dwell_site(prev).cloned();
        serviced = queue.at_front || site.is_none();
        if serviced {
            v.dwell_remaining_s = (prev.dwell_remaining_s - dt).max(0.0);
        }
        if let Some(site_id) = site {
            if !queue.queued {
                effects.push(QueueEffect::Join {
                    site_id,
                    vehicle_id: prev.id.clone(),
                });
            }
        }
    }

    // --- Telemetry -----------------------------------------------------------
    let evolved = evolve(
        v.telemetry,
        &TickActivity {
            phase,
            distance_m,
            dt_s: dt,
            serviced,
        },
        cfg,
    );
    v.telemetry = evolved.telemetry;

    // --- Phase ---------------------------------------------------------------
    let dispatch_triggered = phase == Phase::Idle && cfg.unattended && {
        let p = cfg.auto_dispatch_chance * dt;
        p.is_finite() && rng.random_bool(p.clamp(0.0, 1.0))
    };
    let (next, preempted) = resolve_phase(
        phase,
        &PhaseInputs {
            dispatch_triggered,
            arrived,
            dwell_remaining_s: v.dwell_remaining_s,
            telemetry: v.telemetry,
        },
        cfg,
    );

    let mut transition = None;
    if next != phase {
        if let Some(site_id) = dwell_site(prev).cloned() {
            effects.retain(|e| !matches!(e, QueueEffect::Join { .. }));
            effects.push(QueueEffect::Leave {
                site_id,
                vehicle_id: prev.id.clone(),
            });
            v.dwell_remaining_s = 0.0;
        }
        v.phase = next;
        match next {
            Phase::Loading => v.dwell_remaining_s = cfg.load_dwell_s,
            Phase::Dumping => v.dwell_remaining_s = cfg.dump_dwell_s,
            _ => {}
        }
        if let Some(site_id) = dwell_site(&v).cloned() {
            effects.push(QueueEffect::Join {
                site_id,
                vehicle_id: v.id.clone(),
            });
        }
        if !next.is_moving() {
            v.telemetry.speed_kph = 0.0;
        }
        debug!(
            vehicle = %v.id,
            from = %phase,
            to = %next,
            preempted,
            "Phase transition"
        );
        transition = Some((phase, next));
    }

    StepOutcome {
        vehicle: v,
        effects,
        tons_dumped: evolved.tons_dumped,
        transition,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pitfleet_types::{DigEquipment, RouteId, Telemetry, TipEdgeId, TipNodeId};
    use pitfleet_world::{
        DigFace, DumpDef, RouteDef, Scenario, ScenarioDef, SpeedZone, TipEdge, TipNode, ZoneShape,
    };
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    /// Straight east-west line along the equator, roughly 1112 m long.
    fn scenario(zones: Vec<SpeedZone>) -> Scenario {
        let dump = SiteId::from("DUMP");
        Scenario::build(ScenarioDef {
            name: "line".to_owned(),
            routes: vec![RouteDef {
                id: RouteId::from("LINE"),
                name: "Line".to_owned(),
                waypoints: vec![LatLng::new(0.0, 0.0), LatLng::new(0.0, 0.01)],
                dig_id: Some(SiteId::from("DIG")),
                dump_id: Some(dump.clone()),
                home: None,
            }],
            dig_faces: vec![DigFace {
                id: SiteId::from("DIG"),
                name: "Dig".to_owned(),
                equipment: DigEquipment::Shovel,
                model: None,
                location: LatLng::new(0.0, 0.005),
            }],
            dumps: vec![DumpDef {
                id: dump.clone(),
                name: "Dump".to_owned(),
                outline: vec![
                    LatLng::new(-0.001, 0.009),
                    LatLng::new(-0.001, 0.011),
                    LatLng::new(0.001, 0.011),
                    LatLng::new(0.001, 0.009),
                ],
                default_tip_edge_id: TipEdgeId::from("TE"),
            }],
            tip_nodes: vec![
                TipNode {
                    id: TipNodeId::from("TN-1"),
                    dump_id: dump.clone(),
                    location: LatLng::new(0.0005, 0.0095),
                },
                TipNode {
                    id: TipNodeId::from("TN-2"),
                    dump_id: dump.clone(),
                    location: LatLng::new(0.0, 0.01),
                },
            ],
            tip_edges: vec![TipEdge {
                id: TipEdgeId::from("TE"),
                dump_id: dump,
                from: TipNodeId::from("TN-1"),
                to: TipNodeId::from("TN-2"),
                path: Vec::new(),
            }],
            zones,
            aux_sites: Vec::new(),
        })
        .unwrap()
    }

    fn config() -> FleetConfig {
        FleetConfig {
            hauling_speed: crate::config::SpeedRange::new(36.0, 36.0),
            dispatched_speed: crate::config::SpeedRange::new(36.0, 36.0),
            returning_speed: crate::config::SpeedRange::new(36.0, 36.0),
            max_accel_kph_per_s: 100.0,
            unattended: false,
            ..FleetConfig::default()
        }
    }

    fn vehicle(phase: Phase) -> Vehicle {
        Vehicle {
            id: VehicleId::from("TRK-01"),
            name: "Truck 1".to_owned(),
            phase,
            prev_phase: None,
            position: LatLng::new(0.0, 0.0),
            heading_deg: 0.0,
            telemetry: Telemetry {
                speed_kph: 0.0,
                payload_tons: 0.0,
                fuel_pct: 80.0,
                health_pct: 95.0,
                engine_temp_c: 80.0,
            },
            route_id: RouteId::from("LINE"),
            dig_id: Some(SiteId::from("DIG")),
            dump_id: Some(SiteId::from("DUMP")),
            tip_edge_id: Some(TipEdgeId::from("TE")),
            progress_m: 0.0,
            progress_t: 0.0,
            dwell_remaining_s: 0.0,
            last_update: Utc::now(),
        }
    }

    fn ctx<'a>(scenario: &'a Scenario, config: &'a FleetConfig) -> StepContext<'a> {
        StepContext {
            config,
            route: scenario.route(&RouteId::from("LINE")).unwrap(),
            sites: &scenario.sites,
            zones: &scenario.zones,
            default_speed_limit_kph: 40.0,
            dt_s: 1.0,
            now: Utc::now(),
        }
    }

    #[test]
    fn hauling_vehicle_moves_east_at_target_speed() {
        let s = scenario(Vec::new());
        let cfg = config();
        let mut rng = SmallRng::seed_from_u64(42);
        let out = step_vehicle(&vehicle(Phase::Hauling), QueueStatus::default(), &ctx(&s, &cfg), &mut rng);
        assert!((out.vehicle.telemetry.speed_kph - 36.0).abs() < 1e-9);
        assert!((out.vehicle.progress_m - 10.0).abs() < 1e-6);
        assert!((out.vehicle.heading_deg - 90.0).abs() < 0.01);
        assert!(out.vehicle.position.lng > 0.0);
        assert!(out.transition.is_none());
    }

    #[test]
    fn arrival_snaps_to_tip_point_and_joins_dump_queue() {
        let s = scenario(Vec::new());
        let cfg = config();
        let c = ctx(&s, &cfg);
        let mut v = vehicle(Phase::Hauling);
        v.telemetry.payload_tons = 280.0;
        v.telemetry.speed_kph = 36.0;
        v.progress_m = c.route.length_m() - 30.0;
        let mut rng = SmallRng::seed_from_u64(42);
        let out = step_vehicle(&v, QueueStatus::default(), &c, &mut rng);

        assert_eq!(out.transition, Some((Phase::Hauling, Phase::Dumping)));
        assert!((out.vehicle.position.lng - 0.01).abs() < 1e-9);
        assert!(out.vehicle.telemetry.speed_kph.abs() < f64::EPSILON);
        assert!((out.vehicle.dwell_remaining_s - cfg.dump_dwell_s).abs() < f64::EPSILON);
        assert_eq!(
            out.effects,
            vec![QueueEffect::Join {
                site_id: SiteId::from("DUMP"),
                vehicle_id: VehicleId::from("TRK-01"),
            }]
        );
    }

    #[test]
    fn dispatched_vehicle_stops_at_dig_face() {
        let s = scenario(Vec::new());
        let cfg = config();
        let c = ctx(&s, &cfg);
        let mut v = vehicle(Phase::Dispatched);
        v.telemetry.speed_kph = 36.0;
        let mut rng = SmallRng::seed_from_u64(42);
        let mut ticks = 0;
        while v.phase == Phase::Dispatched && ticks < 200 {
            v = step_vehicle(&v, QueueStatus::default(), &c, &mut rng).vehicle;
            ticks += 1;
        }
        assert_eq!(v.phase, Phase::Loading);
        assert!((v.position.lng - 0.005).abs() < 1e-6);
        // Half the line at 10 m/s, less the arrival radius.
        assert!((53..=56).contains(&ticks));
    }

    #[test]
    fn waiting_vehicle_is_not_loaded_and_keeps_trying_to_join() {
        let s = scenario(Vec::new());
        let cfg = config();
        let mut v = vehicle(Phase::Loading);
        v.dwell_remaining_s = 20.0;
        let mut rng = SmallRng::seed_from_u64(42);
        let out = step_vehicle(&v, QueueStatus::default(), &ctx(&s, &cfg), &mut rng);
        assert!(out.vehicle.telemetry.payload_tons.abs() < f64::EPSILON);
        assert!((out.vehicle.dwell_remaining_s - 20.0).abs() < f64::EPSILON);
        assert!(matches!(out.effects.as_slice(), [QueueEffect::Join { .. }]));

        let queued_behind = QueueStatus {
            queued: true,
            at_front: false,
        };
        let out = step_vehicle(&v, queued_behind, &ctx(&s, &cfg), &mut rng);
        assert!(out.effects.is_empty());
    }

    #[test]
    fn finished_loading_leaves_the_dig_queue() {
        let s = scenario(Vec::new());
        let cfg = config();
        let mut v = vehicle(Phase::Loading);
        v.telemetry.payload_tons = 280.0;
        v.dwell_remaining_s = 1.0;
        let front = QueueStatus {
            queued: true,
            at_front: true,
        };
        let mut rng = SmallRng::seed_from_u64(42);
        let out = step_vehicle(&v, front, &ctx(&s, &cfg), &mut rng);
        assert_eq!(out.transition, Some((Phase::Loading, Phase::Hauling)));
        assert_eq!(
            out.effects,
            vec![QueueEffect::Leave {
                site_id: SiteId::from("DIG"),
                vehicle_id: VehicleId::from("TRK-01"),
            }]
        );
    }

    #[test]
    fn overlays_do_not_move_or_change_telemetry() {
        let s = scenario(Vec::new());
        let cfg = config();
        let mut rng = SmallRng::seed_from_u64(42);
        for phase in [Phase::Paused, Phase::Fault] {
            let mut v = vehicle(phase);
            v.progress_m = 300.0;
            let out = step_vehicle(&v, QueueStatus::default(), &ctx(&s, &cfg), &mut rng);
            assert_eq!(out.vehicle.phase, phase);
            assert_eq!(out.vehicle.position, v.position);
            assert_eq!(out.vehicle.telemetry, v.telemetry);
            assert!((out.vehicle.progress_m - 300.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn speed_zone_caps_vehicle_speed() {
        let s = scenario(vec![SpeedZone {
            name: "Start".to_owned(),
            shape: ZoneShape::Circle {
                center: LatLng::new(0.0, 0.0),
                radius_m: 100.0,
            },
            speed_limit_kph: 12.0,
        }]);
        let cfg = config();
        let mut rng = SmallRng::seed_from_u64(42);
        let out = step_vehicle(&vehicle(Phase::Hauling), QueueStatus::default(), &ctx(&s, &cfg), &mut rng);
        assert!((out.vehicle.telemetry.speed_kph - 12.0).abs() < 1e-9);
    }

    #[test]
    fn unattended_idle_vehicle_dispatches_itself() {
        let s = scenario(Vec::new());
        let cfg = FleetConfig {
            unattended: true,
            auto_dispatch_chance: 1.0,
            ..config()
        };
        let mut rng = SmallRng::seed_from_u64(42);
        let out = step_vehicle(&vehicle(Phase::Idle), QueueStatus::default(), &ctx(&s, &cfg), &mut rng);
        assert_eq!(out.vehicle.phase, Phase::Dispatched);
    }

    #[test]
    fn low_fuel_sends_idle_vehicle_to_refuel() {
        let s = scenario(Vec::new());
        let cfg = config();
        let mut v = vehicle(Phase::Idle);
        v.telemetry.fuel_pct = 5.0;
        let mut rng = SmallRng::seed_from_u64(42);
        let out = step_vehicle(&v, QueueStatus::default(), &ctx(&s, &cfg), &mut rng);
        assert_eq!(out.vehicle.phase, Phase::Refuel);
    }
}
