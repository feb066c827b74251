//! Per-tick telemetry evolution.
//!
//! Order of operations for one vehicle in one tick:
//!
//! 1. Speed converges towards a target drawn from the phase's range, limited
//!    by the acceleration bound, then capped by the speed zone (moving
//!    phases only; stationary phases stop outright)
//! 2. Payload rises or falls while the vehicle is serviced at a dig face or dump
//! 3. Fuel and health change with time, distance and service
//! 4. Engine temperature relaxes towards a phase-dependent target
//! 5. Every field is clamped to its range

use pitfleet_types::{Phase, Telemetry};
use rand::Rng;

use crate::config::{FleetConfig, SpeedRange};

/// Hard ceiling on vehicle speed in km/h.
pub const MAX_SPEED_KPH: f64 = 60.0;
/// Lowest reportable engine temperature in degrees Celsius.
pub const MIN_ENGINE_TEMP_C: f64 = 60.0;
/// Highest reportable engine temperature in degrees Celsius.
pub const MAX_ENGINE_TEMP_C: f64 = 125.0;

/// Speed range for a phase, or `None` for stationary phases.
pub const fn speed_range(phase: Phase, config: &FleetConfig) -> Option<SpeedRange> {
    match phase {
        Phase::Dispatched => Some(config.dispatched_speed),
        Phase::Hauling => Some(config.hauling_speed),
        Phase::Returning => Some(config.returning_speed),
        _ => None,
    }
}

/// Draw a target speed for a phase. Stationary phases target zero.
pub fn target_speed<R: Rng>(phase: Phase, config: &FleetConfig, rng: &mut R) -> f64 {
    match speed_range(phase, config) {
        Some(range) if range.max_kph > range.min_kph => rng.random_range(range.min_kph..=range.max_kph),
        Some(range) => range.min_kph,
        None => 0.0,
    }
}

/// Move `current` towards `target` by at most `max_delta`, cap at `limit`,
/// and clamp into `[0, 60]`.
pub fn converge_speed(current: f64, target: f64, max_delta: f64, limit: f64) -> f64 {
    let max_delta = max_delta.max(0.0);
    let step = (target - current).clamp(-max_delta, max_delta);
    (current + step).min(limit).clamp(0.0, MAX_SPEED_KPH)
}

/// Clamp every field into its documented range.
pub fn clamp(t: Telemetry, config: &FleetConfig) -> Telemetry {
    Telemetry {
        speed_kph: finite_or(t.speed_kph, 0.0).clamp(0.0, MAX_SPEED_KPH),
        payload_tons: finite_or(t.payload_tons, 0.0).clamp(0.0, config.max_payload_tons.max(0.0)),
        fuel_pct: finite_or(t.fuel_pct, 0.0).clamp(0.0, 100.0),
        health_pct: finite_or(t.health_pct, 0.0).clamp(0.0, 100.0),
        engine_temp_c: finite_or(t.engine_temp_c, MIN_ENGINE_TEMP_C)
            .clamp(MIN_ENGINE_TEMP_C, MAX_ENGINE_TEMP_C),
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

/// What happened to a vehicle during one tick, as far as telemetry cares.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickActivity {
    /// Phase the vehicle spent the tick in.
    pub phase: Phase,
    /// Distance travelled in meters.
    pub distance_m: f64,
    /// Simulated seconds elapsed.
    pub dt_s: f64,
    /// Whether the vehicle was at the front of its site queue.
    pub serviced: bool,
}

/// Result of [`evolve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evolved {
    /// Updated, clamped telemetry.
    pub telemetry: Telemetry,
    /// Tonnes tipped this tick.
    pub tons_dumped: f64,
}

/// Evolve payload, fuel, health and temperature for one tick.
///
/// Speed is set by the caller before the move and is only clamped here.
pub fn evolve(prev: Telemetry, activity: &TickActivity, config: &FleetConfig) -> Evolved {
    let dt = activity.dt_s.max(0.0);
    let km = activity.distance_m.max(0.0) / 1000.0;
    let load_frac = if config.max_payload_tons > 0.0 {
        (prev.payload_tons / config.max_payload_tons).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let mut t = prev;
    let mut tons_dumped = 0.0;

    // Payload
    match activity.phase {
        Phase::Loading if activity.serviced => {
            t.payload_tons = (t.payload_tons + config.load_rate_tps * dt).min(config.max_payload_tons);
        }
        Phase::Dumping if activity.serviced => {
            let after = (t.payload_tons - config.dump_rate_tps * dt).max(0.0);
            tons_dumped = t.payload_tons - after;
            t.payload_tons = after;
        }
        _ => {}
    }

    // Fuel
    let burn = config.idle_burn_pct_per_s * dt
        + config.burn_pct_per_km * km * config.load_burn_factor.mul_add(load_frac, 1.0);
    t.fuel_pct -= burn;
    if activity.phase == Phase::Refuel {
        t.fuel_pct += config.refuel_rate_pct_per_s * dt;
    }

    // Health
    if activity.phase == Phase::Maint {
        t.health_pct += config.repair_rate_pct_per_s * dt;
    } else {
        t.health_pct -= config.base_wear_pct_per_s * dt + config.wear_pct_per_km * km;
    }

    // Engine temperature
    let (target_c, response) = match activity.phase {
        p if p.is_moving() && km > 0.0 => (
            config.temp_load_rise_c.mul_add(load_frac, config.temp_moving_c),
            config.temp_response_per_s,
        ),
        p if p.is_dwell() => (config.temp_dwell_c, config.temp_response_per_s),
        Phase::Refuel => (
            config.temp_rest_c,
            config.temp_response_per_s * config.refuel_cooling_factor,
        ),
        _ => (config.temp_rest_c, config.temp_response_per_s),
    };
    let closed = (response * dt).clamp(0.0, 1.0);
    t.engine_temp_c += (target_c - t.engine_temp_c) * closed;

    Evolved {
        telemetry: clamp(t, config),
        tons_dumped,
    }
}
