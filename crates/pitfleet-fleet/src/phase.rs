//! The nominal phase transition function and the watermark override.
//!
//! [`next_phase`] is total over [`Phase`]: every phase maps to a phase, and
//! the overlays PAUSED and FAULT map to themselves. Overlays are entered and
//! left only through operator directives (see [`crate::overlay`]).

use pitfleet_types::{Phase, Telemetry};

use crate::config::FleetConfig;

/// Everything the transition function looks at for one vehicle in one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseInputs {
    /// An idle vehicle was triggered to dispatch this tick.
    pub dispatch_triggered: bool,
    /// The vehicle reached its stop this tick.
    pub arrived: bool,
    /// Dwell time still owed at the current site.
    pub dwell_remaining_s: f64,
    /// Telemetry after this tick's update.
    pub telemetry: Telemetry,
}

/// Nominal transition for one tick.
pub fn next_phase(phase: Phase, inputs: &PhaseInputs, config: &FleetConfig) -> Phase {
    let t = &inputs.telemetry;
    let dwell_done = inputs.dwell_remaining_s <= 0.0;
    match phase {
        Phase::Idle if inputs.dispatch_triggered => Phase::Dispatched,
        Phase::Dispatched if inputs.arrived => Phase::Loading,
        Phase::Loading if dwell_done && t.payload_tons >= config.full_load_tons() => Phase::Hauling,
        Phase::Hauling if inputs.arrived => Phase::Dumping,
        Phase::Dumping if dwell_done && t.payload_tons <= config.empty_threshold_tons => {
            Phase::Returning
        }
        Phase::Returning if inputs.arrived => Phase::Idle,
        Phase::Refuel if t.fuel_pct >= config.refuel_high_pct => Phase::Idle,
        Phase::Maint if t.health_pct >= config.maint_high_pct => Phase::Idle,
        other => other,
    }
}

/// Low-watermark override applied to a committed phase.
///
/// Low fuel wins over low health. Service phases and overlays are never
/// overridden.
pub fn watermark_override(committed: Phase, telemetry: &Telemetry, config: &FleetConfig) -> Option<Phase> {
    if committed.is_service() || committed.is_overlay() {
        return None;
    }
    if telemetry.fuel_pct <= config.fuel_low_pct {
        Some(Phase::Refuel)
    } else if telemetry.health_pct <= config.health_low_pct {
        Some(Phase::Maint)
    } else {
        None
    }
}

/// Resolve the phase a vehicle commits to at the end of a tick.
///
/// Returns the committed phase and whether a watermark override cut short a
/// dwell still in progress.
pub fn resolve_phase(phase: Phase, inputs: &PhaseInputs, config: &FleetConfig) -> (Phase, bool) {
    let nominal = next_phase(phase, inputs, config);
    let Some(forced) = watermark_override(nominal, &inputs.telemetry, config) else {
        return (nominal, false);
    };
    let dwell_in_progress = phase.is_dwell() && nominal == phase;
    if dwell_in_progress {
        if config.override_preempts_dwell {
            (forced, true)
        } else {
            (nominal, false)
        }
    } else {
        (forced, false)
    }
}
