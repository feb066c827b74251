//! Snapshot and KPI derivation.
//!
//! A [`FleetSnapshot`] is a read-only copy of the state after a tick. KPIs
//! are computed from the snapshot's own vehicle list, so they always agree
//! with it.

use chrono::Utc;
use pitfleet_types::{FleetKpis, FleetSnapshot, Phase, Vehicle};

use crate::tick::SimulationState;

/// Compute fleet KPIs from a vehicle list.
///
/// Averages are zero for an empty fleet. `by_phase` carries an entry for
/// every phase.
pub fn compute_kpis<'a>(vehicles: impl IntoIterator<Item = &'a Vehicle>, tons_dumped_total: f64) -> FleetKpis {
    let mut kpis = FleetKpis {
        by_phase: Phase::ALL.iter().map(|&p| (p, 0)).collect(),
        tons_dumped_total,
        ..FleetKpis::default()
    };
    let (mut fuel, mut health, mut speed) = (0.0, 0.0, 0.0);

    for v in vehicles {
        kpis.total = kpis.total.saturating_add(1);
        if let Some(count) = kpis.by_phase.get_mut(&v.phase) {
            *count = count.saturating_add(1);
        }
        if v.phase.is_overlay() {
            kpis.paused_or_fault = kpis.paused_or_fault.saturating_add(1);
        } else {
            kpis.active = kpis.active.saturating_add(1);
        }
        let counter = match v.phase {
            Phase::Hauling => Some(&mut kpis.hauling),
            Phase::Returning => Some(&mut kpis.returning),
            Phase::Refuel => Some(&mut kpis.refuel),
            Phase::Maint => Some(&mut kpis.maint),
            Phase::Fault => Some(&mut kpis.fault),
            _ => None,
        };
        if let Some(counter) = counter {
            *counter = counter.saturating_add(1);
        }

        kpis.total_payload_tons += v.telemetry.payload_tons;
        fuel += v.telemetry.fuel_pct;
        health += v.telemetry.health_pct;
        speed += v.telemetry.speed_kph;
    }

    if kpis.total > 0 {
        let n = f64::from(kpis.total);
        kpis.avg_fuel_pct = fuel / n;
        kpis.avg_health_pct = health / n;
        kpis.avg_speed_kph = speed / n;
    }
    kpis
}

/// Build the snapshot published after a tick.
pub fn build_snapshot(state: &SimulationState) -> FleetSnapshot {
    let vehicles: Vec<Vehicle> = state.vehicles.values().cloned().collect();
    let kpis = compute_kpis(&vehicles, state.tons_dumped_total);
    FleetSnapshot {
        tick: state.clock.tick(),
        sim_time_s: state.clock.sim_time_s(),
        taken_at: Utc::now(),
        vehicles,
        kpis,
        queues: state.queues.values().map(pitfleet_world::AdmissionQueue::view).collect(),
    }
}
