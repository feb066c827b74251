//! Tunables for vehicle phase and telemetry mechanics.
//!
//! Every rate is expressed per simulated second so the dynamics do not
//! depend on the wall-clock tick interval. The engine builds this from the
//! `fleet` section of `pitfleet-config.yaml`; tests construct it directly
//! and override individual fields. [`FleetConfig::validate`] rejects
//! values the phase machine cannot make progress with.

use serde::Deserialize;

/// A [`FleetConfig`] value the mechanics cannot run with.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FleetConfigError {
    /// A rate, capacity or radius is zero, negative or not finite.
    #[error("fleet.{field} must be positive, got {value}")]
    NotPositive {
        /// Offending field.
        field: &'static str,
        /// Configured value.
        value: f64,
    },

    /// A duration or per-distance cost is negative or not finite.
    #[error("fleet.{field} must not be negative, got {value}")]
    Negative {
        /// Offending field.
        field: &'static str,
        /// Configured value.
        value: f64,
    },

    /// A percentage falls outside `(0, 100]`.
    #[error("fleet.{field} must be in (0, 100], got {value}")]
    PercentOutOfRange {
        /// Offending field.
        field: &'static str,
        /// Configured value.
        value: f64,
    },

    /// A low watermark is not below the level that ends its service.
    #[error("fleet.{low_field} ({low}) must be below fleet.{high_field} ({high})")]
    WatermarkAboveRecovery {
        /// Low watermark field.
        low_field: &'static str,
        /// Low watermark value.
        low: f64,
        /// Recovery level field.
        high_field: &'static str,
        /// Recovery level value.
        high: f64,
    },

    /// A speed range has a non-positive lower bound or is inverted.
    #[error("fleet.{field} must satisfy 0 < min_kph <= max_kph, got {min_kph} to {max_kph}")]
    InvalidSpeedRange {
        /// Offending range.
        field: &'static str,
        /// Configured lower bound.
        min_kph: f64,
        /// Configured upper bound.
        max_kph: f64,
    },

    /// The auto-dispatch probability is outside `[0, 1]`.
    #[error("fleet.auto_dispatch_chance must be in [0, 1], got {0}")]
    ChanceOutOfRange(f64),

    /// Dumping would end at or above the payload that ends loading.
    #[error("fleet.empty_threshold_tons ({empty_tons}) must be below the full load of {full_tons} t")]
    EmptyNotBelowFull {
        /// Configured empty threshold.
        empty_tons: f64,
        /// Payload that ends loading.
        full_tons: f64,
    },
}

/// Inclusive speed range a moving phase draws its target speed from.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SpeedRange {
    /// Lower bound in km/h.
    pub min_kph: f64,
    /// Upper bound in km/h.
    pub max_kph: f64,
}

impl SpeedRange {
    /// Construct a range.
    pub const fn new(min_kph: f64, max_kph: f64) -> Self {
        Self { min_kph, max_kph }
    }
}

/// Configuration for per-vehicle mechanics applied each tick.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Tray capacity in tonnes (default: 290).
    pub max_payload_tons: f64,
    /// Payload, as a percentage of capacity, that ends loading (default: 95).
    pub load_threshold_pct: f64,
    /// Payload at or below which dumping ends, in tonnes (default: 0.5).
    pub empty_threshold_tons: f64,
    /// Loading rate in tonnes per second while at the front of the queue (default: 11).
    pub load_rate_tps: f64,
    /// Dumping rate in tonnes per second while at the front of the queue (default: 17).
    pub dump_rate_tps: f64,
    /// Minimum serviced loading time in seconds (default: 20).
    pub load_dwell_s: f64,
    /// Minimum serviced dumping time in seconds (default: 10).
    pub dump_dwell_s: f64,

    /// Fuel gained per second while refuelling (default: 2.5).
    pub refuel_rate_pct_per_s: f64,
    /// Fuel level that ends refuelling (default: 95).
    pub refuel_high_pct: f64,
    /// Health gained per second in maintenance (default: 0.8).
    pub repair_rate_pct_per_s: f64,
    /// Health level that ends maintenance (default: 90).
    pub maint_high_pct: f64,
    /// Fuel level that forces refuelling (default: 12).
    pub fuel_low_pct: f64,
    /// Health level that forces maintenance (default: 30).
    pub health_low_pct: f64,
    /// Whether a low watermark interrupts a loading or dumping dwell
    /// (default: false, the override waits for the dwell to finish).
    pub override_preempts_dwell: bool,

    /// Distance under which a vehicle is at its stop, in meters (default: 25).
    pub arrival_radius_m: f64,
    /// Whether idle vehicles dispatch themselves without an operator (default: true).
    pub unattended: bool,
    /// Per-second probability an idle vehicle self-dispatches (default: 0.35).
    pub auto_dispatch_chance: f64,

    /// Target speeds while dispatched empty (default: 36 to 48).
    pub dispatched_speed: SpeedRange,
    /// Target speeds while hauling loaded (default: 32 to 42).
    pub hauling_speed: SpeedRange,
    /// Target speeds while returning empty (default: 36 to 48).
    pub returning_speed: SpeedRange,
    /// Maximum speed change per second (default: 8).
    pub max_accel_kph_per_s: f64,

    /// Fuel burned per second regardless of motion (default: 0.01).
    pub idle_burn_pct_per_s: f64,
    /// Fuel burned per kilometre travelled empty (default: 0.35).
    pub burn_pct_per_km: f64,
    /// Extra burn per kilometre at full payload, as a fraction (default: 0.6).
    pub load_burn_factor: f64,
    /// Health lost per second regardless of motion (default: 0.0008).
    pub base_wear_pct_per_s: f64,
    /// Health lost per kilometre travelled (default: 0.02).
    pub wear_pct_per_km: f64,

    /// Engine temperature approached while moving empty (default: 86).
    pub temp_moving_c: f64,
    /// Additional temperature at full payload while moving (default: 14).
    pub temp_load_rise_c: f64,
    /// Temperature approached during a loading or dumping dwell (default: 80).
    pub temp_dwell_c: f64,
    /// Temperature approached while stationary (default: 70).
    pub temp_rest_c: f64,
    /// Fraction of the gap to the target temperature closed per second (default: 0.05).
    pub temp_response_per_s: f64,
    /// Cooling speed-up while refuelling (default: 2).
    pub refuel_cooling_factor: f64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            max_payload_tons: 290.0,
            load_threshold_pct: 95.0,
            empty_threshold_tons: 0.5,
            load_rate_tps: 11.0,
            dump_rate_tps: 17.0,
            load_dwell_s: 20.0,
            dump_dwell_s: 10.0,
            refuel_rate_pct_per_s: 2.5,
            refuel_high_pct: 95.0,
            repair_rate_pct_per_s: 0.8,
            maint_high_pct: 90.0,
            fuel_low_pct: 12.0,
            health_low_pct: 30.0,
            override_preempts_dwell: false,
            arrival_radius_m: 25.0,
            unattended: true,
            auto_dispatch_chance: 0.35,
            dispatched_speed: SpeedRange::new(36.0, 48.0),
            hauling_speed: SpeedRange::new(32.0, 42.0),
            returning_speed: SpeedRange::new(36.0, 48.0),
            max_accel_kph_per_s: 8.0,
            idle_burn_pct_per_s: 0.01,
            burn_pct_per_km: 0.35,
            load_burn_factor: 0.6,
            base_wear_pct_per_s: 0.0008,
            wear_pct_per_km: 0.02,
            temp_moving_c: 86.0,
            temp_load_rise_c: 14.0,
            temp_dwell_c: 80.0,
            temp_rest_c: 70.0,
            temp_response_per_s: 0.05,
            refuel_cooling_factor: 2.0,
        }
    }
}

impl FleetConfig {
    /// Payload at which loading may end, in tonnes.
    pub fn full_load_tons(&self) -> f64 {
        self.max_payload_tons * self.load_threshold_pct / 100.0
    }

    /// Reject values under which a vehicle could never leave a phase.
    ///
    /// # Errors
    ///
    /// Returns the first offending field as a [`FleetConfigError`].
    pub fn validate(&self) -> Result<(), FleetConfigError> {
        positive("max_payload_tons", self.max_payload_tons)?;
        positive("load_rate_tps", self.load_rate_tps)?;
        positive("dump_rate_tps", self.dump_rate_tps)?;
        positive("refuel_rate_pct_per_s", self.refuel_rate_pct_per_s)?;
        positive("repair_rate_pct_per_s", self.repair_rate_pct_per_s)?;
        positive("arrival_radius_m", self.arrival_radius_m)?;
        positive("max_accel_kph_per_s", self.max_accel_kph_per_s)?;
        positive("temp_response_per_s", self.temp_response_per_s)?;

        non_negative("load_dwell_s", self.load_dwell_s)?;
        non_negative("dump_dwell_s", self.dump_dwell_s)?;
        non_negative("empty_threshold_tons", self.empty_threshold_tons)?;
        non_negative("idle_burn_pct_per_s", self.idle_burn_pct_per_s)?;
        non_negative("burn_pct_per_km", self.burn_pct_per_km)?;
        non_negative("load_burn_factor", self.load_burn_factor)?;
        non_negative("base_wear_pct_per_s", self.base_wear_pct_per_s)?;
        non_negative("wear_pct_per_km", self.wear_pct_per_km)?;
        non_negative("refuel_cooling_factor", self.refuel_cooling_factor)?;

        percent("load_threshold_pct", self.load_threshold_pct)?;
        percent("refuel_high_pct", self.refuel_high_pct)?;
        percent("maint_high_pct", self.maint_high_pct)?;
        below("fuel_low_pct", self.fuel_low_pct, "refuel_high_pct", self.refuel_high_pct)?;
        below("health_low_pct", self.health_low_pct, "maint_high_pct", self.maint_high_pct)?;

        speed_range("dispatched_speed", self.dispatched_speed)?;
        speed_range("hauling_speed", self.hauling_speed)?;
        speed_range("returning_speed", self.returning_speed)?;

        if !(0.0..=1.0).contains(&self.auto_dispatch_chance) {
            return Err(FleetConfigError::ChanceOutOfRange(self.auto_dispatch_chance));
        }

        let full_tons = self.full_load_tons();
        if self.empty_threshold_tons >= full_tons {
            return Err(FleetConfigError::EmptyNotBelowFull {
                empty_tons: self.empty_threshold_tons,
                full_tons,
            });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), FleetConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FleetConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), FleetConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(FleetConfigError::Negative { field, value })
    }
}

fn percent(field: &'static str, value: f64) -> Result<(), FleetConfigError> {
    if value > 0.0 && value <= 100.0 {
        Ok(())
    } else {
        Err(FleetConfigError::PercentOutOfRange { field, value })
    }
}

fn below(low_field: &'static str, low: f64, high_field: &'static str, high: f64) -> Result<(), FleetConfigError> {
    if low < high {
        Ok(())
    } else {
        Err(FleetConfigError::WatermarkAboveRecovery {
            low_field,
            low,
            high_field,
            high,
        })
    }
}

fn speed_range(field: &'static str, range: SpeedRange) -> Result<(), FleetConfigError> {
    if range.min_kph > 0.0 && range.min_kph <= range.max_kph && range.max_kph.is_finite() {
        Ok(())
    } else {
        Err(FleetConfigError::InvalidSpeedRange {
            field,
            min_kph: range.min_kph,
            max_kph: range.max_kph,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_full_load_is_95_percent_of_290() {
        let cfg = FleetConfig::default();
        assert!((cfg.full_load_tons() - 275.5).abs() < 1e-9);
    }

    #[test]
    fn partial_overrides_keep_defaults() {
        let cfg: FleetConfig =
            serde_json::from_str(r#"{"fuel_low_pct": 20.0, "hauling_speed": {"min_kph": 30.0, "max_kph": 30.0}}"#)
                .unwrap_or_default();
        assert!((cfg.fuel_low_pct - 20.0).abs() < f64::EPSILON);
        assert!((cfg.hauling_speed.max_kph - 30.0).abs() < f64::EPSILON);
        assert!((cfg.max_payload_tons - 290.0).abs() < f64::EPSILON);
    }

    #[test]
    fn defaults_validate() {
        assert_eq!(FleetConfig::default().validate(), Ok(()));
    }

    #[test]
    fn load_threshold_above_capacity_is_rejected() {
        let cfg = FleetConfig {
            load_threshold_pct: 101.0,
            ..FleetConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(FleetConfigError::PercentOutOfRange {
                field: "load_threshold_pct",
                value: 101.0
            })
        );
        let cfg = FleetConfig {
            load_threshold_pct: 0.0,
            ..FleetConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(FleetConfigError::PercentOutOfRange { .. })));
    }

    #[test]
    fn inverted_speed_range_is_rejected() {
        let cfg = FleetConfig {
            hauling_speed: SpeedRange::new(42.0, 32.0),
            ..FleetConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(FleetConfigError::InvalidSpeedRange { field: "hauling_speed", .. })
        ));
        // A fixed speed is fine.
        let cfg = FleetConfig {
            hauling_speed: SpeedRange::new(30.0, 30.0),
            ..FleetConfig::default()
        };
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn non_positive_rates_are_rejected() {
        for cfg in [
            FleetConfig {
                load_rate_tps: 0.0,
                ..FleetConfig::default()
            },
            FleetConfig {
                dump_rate_tps: -1.0,
                ..FleetConfig::default()
            },
            FleetConfig {
                refuel_rate_pct_per_s: f64::NAN,
                ..FleetConfig::default()
            },
        ] {
            assert!(matches!(cfg.validate(), Err(FleetConfigError::NotPositive { .. })));
        }
    }

    #[test]
    fn empty_threshold_must_stay_below_full_load() {
        let cfg = FleetConfig {
            max_payload_tons: 10.0,
            empty_threshold_tons: 9.5,
            ..FleetConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, FleetConfigError::EmptyNotBelowFull { .. }));
        assert!(err.to_string().contains("empty_threshold_tons"));
    }

    #[test]
    fn low_watermark_must_sit_below_recovery() {
        let cfg = FleetConfig {
            fuel_low_pct: 96.0,
            ..FleetConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(FleetConfigError::WatermarkAboveRecovery { low_field: "fuel_low_pct", .. })
        ));
    }
}
