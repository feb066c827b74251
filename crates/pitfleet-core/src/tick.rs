//! Tick cycle: the fold that advances the whole fleet by one step.
//!
//! Each tick runs through these stages:
//!
//! 1. **Commands** -- apply operator commands queued since the last tick,
//!    in submission order.
//!
//! 2. **Clock** -- advance the tick counter.
//!
//! 3. **Fold** -- step every vehicle in id order. Each step reads only the
//!    previous fleet state and the queues as they stood when the fold
//!    began; queue changes are collected rather than applied.
//!
//! 4. **Queue effects** -- apply the collected joins and departures in
//!    vehicle-id order.
//!
//! The tick is deterministic given the same initial state, seed and
//! commands.

use std::collections::BTreeMap;

use chrono::Utc;
use pitfleet_fleet::{FleetConfig, FleetConfigError, QueueEffect, QueueStatus, StepContext, dwell_site, step_vehicle};
use pitfleet_types::{FleetCommand, Phase, SiteId, Vehicle, VehicleId};
use pitfleet_world::{AdmissionJob, AdmissionQueue, EnqueueOutcome, Scenario};
use rand::rngs::SmallRng;
use serde_json::json;
use tracing::debug;

use crate::clock::{ClockError, SimClock};
use crate::commands::apply_command;
use crate::config::SimulationConfig;

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Errors that can occur while assembling a [`SimulationState`].
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// `world.seconds_per_tick` is invalid.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// The fleet mechanics configuration is invalid.
    #[error("invalid fleet config: {source}")]
    Fleet {
        /// The underlying validation error.
        #[from]
        source: FleetConfigError,
    },
}

/// A phase change recorded during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseTransition {
    /// Vehicle that changed phase.
    pub vehicle_id: VehicleId,
    /// Phase before the tick.
    pub from: Phase,
    /// Phase after the tick.
    pub to: Phase,
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Simulated seconds elapsed at the end of the tick.
    pub sim_time_s: f64,
    /// Number of commands drained this tick.
    pub commands_received: usize,
    /// Number of state changes those commands produced.
    pub commands_applied: usize,
    /// Phase changes committed by the fold.
    pub transitions: Vec<PhaseTransition>,
    /// Tonnes tipped this tick.
    pub tons_dumped: f64,
    /// Queue joins refused under a rejecting capacity policy.
    pub rejected_joins: usize,
}

/// The mutable simulation state passed through the tick cycle.
///
/// Owned by the runner; no global state.
#[derive(Debug)]
pub struct SimulationState {
    /// The validated mine layout.
    pub scenario: Scenario,
    /// Vehicles keyed (and therefore ordered) by id.
    pub vehicles: BTreeMap<VehicleId, Vehicle>,
    /// One admission queue per dig face and dump.
    pub queues: BTreeMap<SiteId, AdmissionQueue>,
    /// The simulation clock.
    pub clock: SimClock,
    /// Vehicle mechanics.
    pub fleet_config: FleetConfig,
    /// Speed cap outside every zone, in km/h.
    pub default_speed_limit_kph: f64,
    /// Source of speed jitter and unattended dispatch.
    pub rng: SmallRng,
    /// Tonnes tipped since the run started.
    pub tons_dumped_total: f64,
}

impl SimulationState {
    /// Assemble a state from a scenario, a seeded fleet and configuration.
    ///
    /// One queue is created per dig face and dump with the configured
    /// capacity and policy.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Clock`] if `world.seconds_per_tick` is invalid,
    /// or [`StateError::Fleet`] if the fleet configuration fails validation.
    pub fn new(
        scenario: Scenario,
        vehicles: Vec<Vehicle>,
        config: &SimulationConfig,
        rng: SmallRng,
    ) -> Result<Self, StateError> {
        config.fleet.validate()?;
        let queues = scenario
            .sites
            .queued_site_ids()
            .into_iter()
            .map(|site_id| {
                let queue = AdmissionQueue::new(site_id.clone(), config.queues.capacity, config.queues.policy);
                (site_id, queue)
            })
            .collect();
        Ok(Self {
            scenario,
            vehicles: vehicles.into_iter().map(|v| (v.id.clone(), v)).collect(),
            queues,
            clock: SimClock::new(config.world.seconds_per_tick)?,
            fleet_config: config.fleet.clone(),
            default_speed_limit_kph: config.zones.default_speed_limit_kph,
            rng,
            tons_dumped_total: 0.0,
        })
    }

    /// The vehicle's standing in the queue of the site it is dwelling at.
    pub fn queue_status(&self, vehicle: &Vehicle) -> QueueStatus {
        dwell_site(vehicle)
            .and_then(|site| self.queues.get(site))
            .map_or_else(QueueStatus::default, |q| QueueStatus {
                queued: q.contains(&vehicle.id),
                at_front: q.is_front(&vehicle.id),
            })
    }
}

/// Execute one complete tick of the simulation.
///
/// `commands` are applied first, in order, before the fleet is folded.
///
/// # Errors
///
/// Returns [`TickError::Clock`] if the tick counter overflows.
pub fn run_tick(state: &mut SimulationState, commands: &[FleetCommand]) -> Result<TickSummary, TickError> {
    let now = Utc::now();

    // --- Stage 1: Commands ---
    let commands_applied: usize = commands
        .iter()
        .map(|command| apply_command(state, command, now))
        .sum();

    // --- Stage 2: Clock ---
    let tick = state.clock.advance()?;
    let dt_s = state.clock.seconds_per_tick();

    // --- Stage 3: Fold ---
    let mut next = BTreeMap::new();
    let mut effects = Vec::new();
    let mut transitions = Vec::new();
    let mut tons_dumped = 0.0;
    for (id, vehicle) in &state.vehicles {
        let Some(route) = state.scenario.route(&vehicle.route_id) else {
            debug!(vehicle = %id, route = %vehicle.route_id, "Vehicle route missing, holding state");
            next.insert(id.clone(), vehicle.clone());
            continue;
        };
        let ctx = StepContext {
            config: &state.fleet_config,
            route,
            sites: &state.scenario.sites,
            zones: &state.scenario.zones,
            default_speed_limit_kph: state.default_speed_limit_kph,
            dt_s,
            now,
        };
        let status = state.queue_status(vehicle);
        let outcome = step_vehicle(vehicle, status, &ctx, &mut state.rng);
        if let Some((from, to)) = outcome.transition {
            transitions.push(PhaseTransition {
                vehicle_id: id.clone(),
                from,
                to,
            });
        }
        tons_dumped += outcome.tons_dumped;
        effects.extend(outcome.effects);
        next.insert(id.clone(), outcome.vehicle);
    }
    state.vehicles = next;
    state.tons_dumped_total += tons_dumped;

    // --- Stage 4: Queue effects ---
    let rejected_joins = apply_queue_effects(state, effects, tick);

    debug!(
        tick,
        transitions = transitions.len(),
        commands = commands.len(),
        tons_dumped,
        "Tick complete"
    );

    Ok(TickSummary {
        tick,
        sim_time_s: state.clock.sim_time_s(),
        commands_received: commands.len(),
        commands_applied,
        transitions,
        tons_dumped,
        rejected_joins,
    })
}

/// Apply queue effects in vehicle-id order. Returns the number of refused joins.
fn apply_queue_effects(state: &mut SimulationState, mut effects: Vec<QueueEffect>, tick: u64) -> usize {
    // Stable: a vehicle's own leave-then-join order is preserved.
    effects.sort_by(|a, b| effect_vehicle(a).cmp(effect_vehicle(b)));

    let mut rejected = 0;
    for effect in effects {
        match effect {
            QueueEffect::Leave {
                site_id,
                vehicle_id,
            } => {
                if let Some(queue) = state.queues.get_mut(&site_id) {
                    queue.withdraw(&vehicle_id);
                }
            }
            QueueEffect::Join {
                site_id,
                vehicle_id,
            } => {
                let Some(queue) = state.queues.get_mut(&site_id) else {
                    continue;
                };
                if queue.contains(&vehicle_id) {
                    continue;
                }
                let phase = state.vehicles.get(&vehicle_id).map(|v| v.phase);
                let job = AdmissionJob::new(vehicle_id.clone(), json!({ "phase": phase, "tick": tick }));
                match queue.enqueue(job) {
                    EnqueueOutcome::Accepted { over_capacity, .. } => {
                        debug!(site = %site_id, vehicle = %vehicle_id, over_capacity, "Vehicle queued");
                    }
                    EnqueueOutcome::Rejected => {
                        debug!(site = %site_id, vehicle = %vehicle_id, "Queue full, vehicle waiting");
                        rejected += 1;
                    }
                }
            }
        }
    }
    rejected
}

const fn effect_vehicle(effect: &QueueEffect) -> &VehicleId {
    match effect {
        QueueEffect::Join { vehicle_id, .. } | QueueEffect::Leave { vehicle_id, .. } => vehicle_id,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pitfleet_types::{Telemetry, VehicleDirective};
    use pitfleet_world::{CapacityPolicy, create_whaleback};
    use rand::SeedableRng;

    use super::*;
    use crate::seeding::seed_fleet;

    fn make_state(count: u32) -> SimulationState {
        let scenario = create_whaleback().unwrap();
        let mut rng = SmallRng::seed_from_u64(42);
        let fleet = seed_fleet(&scenario, count, &mut rng, Utc::now()).unwrap();
        SimulationState::new(scenario, fleet, &SimulationConfig::default(), rng).unwrap()
    }

    /// Park every vehicle in LOADING at its dig face.
    fn park_loading(state: &mut SimulationState) {
        for v in state.vehicles.values_mut() {
            v.phase = Phase::Loading;
            v.dwell_remaining_s = 20.0;
            v.telemetry = Telemetry {
                payload_tons: 0.0,
                ..v.telemetry
            };
        }
    }

    #[test]
    fn tick_advances_clock_and_keeps_id_order() {
        let mut state = make_state(4);
        let summary = run_tick(&mut state, &[]).unwrap();
        assert_eq!(summary.tick, 1);
        assert!((summary.sim_time_s - 1.0).abs() < f64::EPSILON);
        let ids: Vec<_> = state.vehicles.keys().map(VehicleId::as_str).collect();
        assert_eq!(ids, vec!["TRK-01", "TRK-02", "TRK-03", "TRK-04"]);
    }

    #[test]
    fn vehicles_join_their_dig_queue_in_id_order() {
        let mut state = make_state(6);
        park_loading(&mut state);
        run_tick(&mut state, &[]).unwrap();

        let dig_a = state.queues.get(&SiteId::from("DIG-A")).unwrap();
        let ids: Vec<String> = dig_a.consumer_ids().iter().map(ToString::to_string).collect();
        assert_eq!(ids, vec!["TRK-01", "TRK-03", "TRK-05"]);
        // Advisory capacity: a fourth truck would still be admitted.
        assert_eq!(dig_a.slots().free, 0);
    }

    #[test]
    fn only_the_front_vehicle_is_loaded() {
        let mut state = make_state(6);
        park_loading(&mut state);
        run_tick(&mut state, &[]).unwrap();
        run_tick(&mut state, &[]).unwrap();

        let payload = |id: &str| state.vehicles.get(&VehicleId::from(id)).unwrap().telemetry.payload_tons;
        assert!(payload("TRK-01") > 0.0);
        assert!(payload("TRK-03").abs() < f64::EPSILON);
        assert!(payload("TRK-05").abs() < f64::EPSILON);
    }

    #[test]
    fn rejecting_policy_leaves_late_vehicles_waiting() {
        let scenario = create_whaleback().unwrap();
        let mut rng = SmallRng::seed_from_u64(42);
        let fleet = seed_fleet(&scenario, 6, &mut rng, Utc::now()).unwrap();
        let mut config = SimulationConfig::default();
        config.queues.capacity = 2;
        config.queues.policy = CapacityPolicy::Reject;
        let mut state = SimulationState::new(scenario, fleet, &config, rng).unwrap();
        park_loading(&mut state);

        let summary = run_tick(&mut state, &[]).unwrap();
        assert_eq!(summary.rejected_joins, 2);
        let dig_a = state.queues.get(&SiteId::from("DIG-A")).unwrap();
        assert_eq!(dig_a.len(), 2);
        assert!(!dig_a.contains(&VehicleId::from("TRK-05")));
        assert_eq!(
            state.vehicles.get(&VehicleId::from("TRK-05")).unwrap().phase,
            Phase::Loading
        );
    }

    #[test]
    fn commands_apply_before_the_fold() {
        let mut state = make_state(2);
        let summary = run_tick(
            &mut state,
            &[FleetCommand::vehicle(VehicleDirective::Pause, "TRK-01")],
        )
        .unwrap();
        assert_eq!(summary.commands_received, 1);
        assert_eq!(summary.commands_applied, 1);
        let v = state.vehicles.get(&VehicleId::from("TRK-01")).unwrap();
        assert_eq!(v.phase, Phase::Paused);
        assert!(v.telemetry.speed_kph.abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_fleet_config_is_refused_at_construction() {
        let scenario = create_whaleback().unwrap();
        let mut rng = SmallRng::seed_from_u64(42);
        let fleet = seed_fleet(&scenario, 1, &mut rng, Utc::now()).unwrap();
        let mut config = SimulationConfig::default();
        config.fleet.load_threshold_pct = 101.0;

        let result = SimulationState::new(scenario, fleet, &config, rng);
        assert!(matches!(
            result,
            Err(StateError::Fleet {
                source: FleetConfigError::PercentOutOfRange { .. }
            })
        ));
    }

    #[test]
    fn same_seed_same_run() {
        let mut a = make_state(5);
        let mut b = make_state(5);
        for _ in 0..200 {
            run_tick(&mut a, &[]).unwrap();
            run_tick(&mut b, &[]).unwrap();
        }
        for (va, vb) in a.vehicles.values().zip(b.vehicles.values()) {
            assert_eq!(va.phase, vb.phase);
            assert_eq!(va.position, vb.position);
            assert_eq!(va.telemetry, vb.telemetry);
        }
    }
}
