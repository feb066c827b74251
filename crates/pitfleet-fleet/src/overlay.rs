//! Operator directives: pause, resume, fault handling and forced jumps.
//!
//! Directives are validated against the vehicle's current phase. A refused
//! directive leaves the vehicle untouched and reports why; the caller logs
//! it and moves on.

use chrono::{DateTime, Utc};
use pitfleet_types::{Phase, SiteId, Vehicle, VehicleDirective};

use crate::telemetry::{MAX_ENGINE_TEMP_C, MIN_ENGINE_TEMP_C};

/// Engine temperature a vehicle reports at least when a fault is raised.
pub const FAULT_ENGINE_TEMP_C: f64 = 110.0;
/// Health lost when a fault is raised.
pub const FAULT_HEALTH_PENALTY_PCT: f64 = 10.0;
/// Health restored when a fault is cleared.
pub const CLEAR_FAULT_HEALTH_BONUS_PCT: f64 = 5.0;
/// Engine cooling applied when a fault is cleared.
pub const CLEAR_FAULT_COOLDOWN_C: f64 = 5.0;

/// Why a directive was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    /// The vehicle is already paused.
    AlreadyPaused,
    /// The vehicle is in fault.
    Faulted,
    /// The vehicle is paused.
    Paused,
    /// Resume requires a paused vehicle.
    NotPaused,
    /// Clear fault requires a faulted vehicle.
    NotFaulted,
}

impl Refusal {
    /// Short reason used in log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AlreadyPaused => "already_paused",
            Self::Faulted => "faulted",
            Self::Paused => "paused",
            Self::NotPaused => "not_paused",
            Self::NotFaulted => "not_faulted",
        }
    }
}

/// Result of applying a directive to one vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveOutcome {
    /// The vehicle changed phase.
    Applied {
        /// Site whose queue the vehicle must leave, if it abandoned a dwell.
        left_site: Option<SiteId>,
    },
    /// The vehicle was already in the requested phase.
    Unchanged,
    /// The directive is not valid for the vehicle's phase.
    Refused(Refusal),
}

/// The site a vehicle holds a queue claim on in its current phase.
pub fn dwell_site(vehicle: &Vehicle) -> Option<&SiteId> {
    match vehicle.phase {
        Phase::Loading => vehicle.dig_id.as_ref(),
        Phase::Dumping => vehicle.dump_id.as_ref(),
        _ => None,
    }
}

/// Apply an operator directive.
pub fn apply_directive(
    vehicle: &mut Vehicle,
    directive: VehicleDirective,
    now: DateTime<Utc>,
) -> DirectiveOutcome {
    let outcome = match directive {
        VehicleDirective::Pause => pause(vehicle),
        VehicleDirective::Resume => resume(vehicle),
        VehicleDirective::RaiseFault => raise_fault(vehicle),
        VehicleDirective::ClearFault => clear_fault(vehicle),
        VehicleDirective::Dispatch => jump(vehicle, Phase::Dispatched),
        VehicleDirective::SendToFuel => jump(vehicle, Phase::Refuel),
        VehicleDirective::SendToMaint => jump(vehicle, Phase::Maint),
    };
    if matches!(outcome, DirectiveOutcome::Applied { .. }) {
        vehicle.last_update = now;
    }
    outcome
}

/// Send a vehicle to idle as part of a fleet-wide stop.
///
/// A faulted vehicle is left alone. A paused vehicle stays paused but will
/// resume into idle; if it was paused mid-dwell its queue claim is released.
pub fn stop_to_idle(vehicle: &mut Vehicle, now: DateTime<Utc>) -> DirectiveOutcome {
    let outcome = match vehicle.phase {
        Phase::Fault => DirectiveOutcome::Refused(Refusal::Faulted),
        Phase::Idle => DirectiveOutcome::Unchanged,
        Phase::Paused => {
            let left_site = match vehicle.prev_phase.replace(Phase::Idle) {
                Some(Phase::Idle) => return DirectiveOutcome::Unchanged,
                Some(Phase::Loading) => vehicle.dig_id.clone(),
                Some(Phase::Dumping) => vehicle.dump_id.clone(),
                _ => None,
            };
            vehicle.dwell_remaining_s = 0.0;
            DirectiveOutcome::Applied { left_site }
        }
        _ => {
            let left_site = dwell_site(vehicle).cloned();
            vehicle.phase = Phase::Idle;
            vehicle.dwell_remaining_s = 0.0;
            vehicle.telemetry.speed_kph = 0.0;
            DirectiveOutcome::Applied { left_site }
        }
    };
    if matches!(outcome, DirectiveOutcome::Applied { .. }) {
        vehicle.last_update = now;
    }
    outcome
}

fn pause(v: &mut Vehicle) -> DirectiveOutcome {
    match v.phase {
        Phase::Paused => DirectiveOutcome::Refused(Refusal::AlreadyPaused),
        Phase::Fault => DirectiveOutcome::Refused(Refusal::Faulted),
        phase => {
            v.prev_phase = Some(phase);
            v.phase = Phase::Paused;
            v.telemetry.speed_kph = 0.0;
            DirectiveOutcome::Applied { left_site: None }
        }
    }
}

fn resume(v: &mut Vehicle) -> DirectiveOutcome {
    if v.phase != Phase::Paused {
        return DirectiveOutcome::Refused(Refusal::NotPaused);
    }
    v.phase = restored_phase(v.prev_phase.take());
    DirectiveOutcome::Applied { left_site: None }
}

fn raise_fault(v: &mut Vehicle) -> DirectiveOutcome {
    match v.phase {
        Phase::Fault => return DirectiveOutcome::Refused(Refusal::Faulted),
        // A paused vehicle keeps the phase it was paused from.
        Phase::Paused => {}
        phase => v.prev_phase = Some(phase),
    }
    v.phase = Phase::Fault;
    v.telemetry.speed_kph = 0.0;
    v.telemetry.engine_temp_c = v
        .telemetry
        .engine_temp_c
        .max(FAULT_ENGINE_TEMP_C)
        .clamp(MIN_ENGINE_TEMP_C, MAX_ENGINE_TEMP_C);
    v.telemetry.health_pct = (v.telemetry.health_pct - FAULT_HEALTH_PENALTY_PCT).clamp(0.0, 100.0);
    DirectiveOutcome::Applied { left_site: None }
}

fn clear_fault(v: &mut Vehicle) -> DirectiveOutcome {
    if v.phase != Phase::Fault {
        return DirectiveOutcome::Refused(Refusal::NotFaulted);
    }
    v.phase = restored_phase(v.prev_phase.take());
    v.telemetry.speed_kph = 0.0;
    v.telemetry.engine_temp_c = (v.telemetry.engine_temp_c - CLEAR_FAULT_COOLDOWN_C)
        .clamp(MIN_ENGINE_TEMP_C, MAX_ENGINE_TEMP_C);
    v.telemetry.health_pct = (v.telemetry.health_pct + CLEAR_FAULT_HEALTH_BONUS_PCT).clamp(0.0, 100.0);
    DirectiveOutcome::Applied { left_site: None }
}

fn jump(v: &mut Vehicle, target: Phase) -> DirectiveOutcome {
    match v.phase {
        Phase::Paused => return DirectiveOutcome::Refused(Refusal::Paused),
        Phase::Fault => return DirectiveOutcome::Refused(Refusal::Faulted),
        phase if phase == target => return DirectiveOutcome::Unchanged,
        _ => {}
    }
    let left_site = dwell_site(v).cloned();
    v.phase = target;
    v.dwell_remaining_s = 0.0;
    if !target.is_moving() {
        v.telemetry.speed_kph = 0.0;
    }
    DirectiveOutcome::Applied { left_site }
}

fn restored_phase(prev: Option<Phase>) -> Phase {
    match prev {
        Some(p) if !p.is_overlay() => p,
        _ => Phase::Idle,
    }
}
