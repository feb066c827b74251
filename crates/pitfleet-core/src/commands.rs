//! Command application at the tick boundary.
//!
//! Every command is validated against the current state. Unknown ids and
//! refused transitions are no-ops, logged at `debug`.

use chrono::{DateTime, Utc};
use pitfleet_fleet::{DirectiveOutcome, apply_directive, stop_to_idle};
use pitfleet_types::{CommandTarget, FleetCommand, Phase, SiteId, TipEdgeId, Vehicle, VehicleDirective, VehicleId};
use tracing::debug;

use crate::tick::SimulationState;

/// Apply one command. Returns the number of entities it changed.
pub fn apply_command(state: &mut SimulationState, command: &FleetCommand, now: DateTime<Utc>) -> usize {
    match command {
        FleetCommand::Vehicle { directive, target } => apply_vehicle_directive(state, *directive, target, now),
        FleetCommand::StopAll => stop_all(state, now),
        FleetCommand::BumpToBack {
            site_id,
            vehicle_id,
        } => {
            let bumped = state
                .queues
                .get_mut(site_id)
                .is_some_and(|q| q.bump_to_back(vehicle_id));
            if !bumped {
                debug!(site = %site_id, vehicle = %vehicle_id, "Bump ignored: no such job");
            }
            usize::from(bumped)
        }
        FleetCommand::SetQueueCapacity { site_id, capacity } => match state.queues.get_mut(site_id) {
            Some(queue) => {
                queue.set_capacity(*capacity);
                1
            }
            None => {
                debug!(site = %site_id, "Capacity change ignored: unknown site");
                0
            }
        },
        FleetCommand::AssignDig { vehicle_id, dig_id } => assign_dig(state, vehicle_id, dig_id, now),
        FleetCommand::AssignDump { vehicle_id, dump_id } => assign_dump(state, vehicle_id, dump_id, now),
        FleetCommand::AssignTipEdge {
            vehicle_id,
            tip_edge_id,
        } => assign_tip_edge(state, vehicle_id, tip_edge_id, now),
        FleetCommand::SetDumpDefaultTipEdge { dump_id, tip_edge_id } => {
            match state.scenario.sites.set_dump_default_tip_edge(dump_id, tip_edge_id) {
                Ok(()) => 1,
                Err(error) => {
                    debug!(dump = %dump_id, tip_edge = %tip_edge_id, %error, "Default tip edge change refused");
                    0
                }
            }
        }
    }
}

fn apply_vehicle_directive(
    state: &mut SimulationState,
    directive: VehicleDirective,
    target: &CommandTarget,
    now: DateTime<Utc>,
) -> usize {
    let SimulationState { vehicles, queues, .. } = state;
    let mut changed = 0;
    let mut apply = |vehicle: &mut Vehicle| match apply_directive(vehicle, directive, now) {
        DirectiveOutcome::Applied { left_site } => {
            if let Some(queue) = left_site.and_then(|site| queues.get_mut(&site)) {
                queue.withdraw(&vehicle.id);
            }
            changed += 1;
        }
        DirectiveOutcome::Unchanged => {}
        DirectiveOutcome::Refused(reason) => {
            debug!(
                vehicle = %vehicle.id,
                ?directive,
                phase = %vehicle.phase,
                reason = reason.as_str(),
                "Directive refused"
            );
        }
    };
    match target {
        CommandTarget::All => vehicles.values_mut().for_each(&mut apply),
        CommandTarget::Vehicle(id) => match vehicles.get_mut(id) {
            Some(vehicle) => apply(vehicle),
            None => debug!(vehicle = %id, ?directive, "Directive ignored: unknown vehicle"),
        },
    }
    changed
}

fn stop_all(state: &mut SimulationState, now: DateTime<Utc>) -> usize {
    let SimulationState { vehicles, queues, .. } = state;
    let mut changed = 0;
    for vehicle in vehicles.values_mut() {
        if let DirectiveOutcome::Applied { left_site } = stop_to_idle(vehicle, now) {
            if let Some(queue) = left_site.and_then(|site| queues.get_mut(&site)) {
                queue.withdraw(&vehicle.id);
            }
            changed += 1;
        }
    }
    debug!(changed, "Fleet stopped to idle");
    changed
}

/// Whether the vehicle is, or is paused or faulted while, dwelling in `phase`.
fn dwelling_in(vehicle: &Vehicle, phase: Phase) -> bool {
    vehicle.phase == phase || vehicle.prev_phase == Some(phase)
}

fn assign_dig(state: &mut SimulationState, vehicle_id: &VehicleId, dig_id: &SiteId, now: DateTime<Utc>) -> usize {
    if state.scenario.sites.dig(dig_id).is_none() {
        debug!(vehicle = %vehicle_id, dig = %dig_id, "Dig assignment ignored: unknown dig face");
        return 0;
    }
    let Some(vehicle) = state.vehicles.get_mut(vehicle_id) else {
        debug!(vehicle = %vehicle_id, "Dig assignment ignored: unknown vehicle");
        return 0;
    };
    if dwelling_in(vehicle, Phase::Loading) {
        debug!(vehicle = %vehicle_id, dig = %dig_id, "Dig assignment refused while loading");
        return 0;
    }
    vehicle.dig_id = Some(dig_id.clone());
    vehicle.last_update = now;
    1
}

fn assign_dump(state: &mut SimulationState, vehicle_id: &VehicleId, dump_id: &SiteId, now: DateTime<Utc>) -> usize {
    let Some(default_edge) = state.scenario.sites.default_tip_edge(dump_id).cloned() else {
        debug!(vehicle = %vehicle_id, dump = %dump_id, "Dump assignment ignored: unknown dump");
        return 0;
    };
    let Some(vehicle) = state.vehicles.get_mut(vehicle_id) else {
        debug!(vehicle = %vehicle_id, "Dump assignment ignored: unknown vehicle");
        return 0;
    };
    if dwelling_in(vehicle, Phase::Dumping) {
        debug!(vehicle = %vehicle_id, dump = %dump_id, "Dump assignment refused while dumping");
        return 0;
    }
    vehicle.dump_id = Some(dump_id.clone());
    vehicle.tip_edge_id = Some(default_edge);
    vehicle.last_update = now;
    1
}

fn assign_tip_edge(
    state: &mut SimulationState,
    vehicle_id: &VehicleId,
    tip_edge_id: &TipEdgeId,
    now: DateTime<Utc>,
) -> usize {
    let sites = &state.scenario.sites;
    let Some(vehicle) = state.vehicles.get_mut(vehicle_id) else {
        debug!(vehicle = %vehicle_id, "Tip edge assignment ignored: unknown vehicle");
        return 0;
    };
    let on_dump = vehicle
        .dump_id
        .as_ref()
        .is_some_and(|dump| sites.edge_on_dump(tip_edge_id, dump));
    if !on_dump {
        debug!(vehicle = %vehicle_id, tip_edge = %tip_edge_id, "Tip edge assignment ignored: edge not on vehicle's dump");
        return 0;
    }
    if dwelling_in(vehicle, Phase::Dumping) {
        debug!(vehicle = %vehicle_id, tip_edge = %tip_edge_id, "Tip edge assignment refused while dumping");
        return 0;
    }
    vehicle.tip_edge_id = Some(tip_edge_id.clone());
    vehicle.last_update = now;
    1
}
