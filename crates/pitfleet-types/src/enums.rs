//! Enumeration types for the pitfleet simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Vehicle phase
// ---------------------------------------------------------------------------

/// The discrete operational state of a vehicle in its haul cycle.
///
/// The nominal cycle is `Idle -> Dispatched -> Loading -> Hauling ->
/// Dumping -> Returning -> Idle`. [`Phase::Refuel`] and [`Phase::Maint`]
/// are service phases entered by watermark overrides or operator
/// directives. [`Phase::Paused`] and [`Phase::Fault`] are overlays that
/// remember the phase they interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum Phase {
    /// Parked at the home anchor waiting for dispatch.
    Idle,
    /// Travelling empty towards the assigned dig face.
    Dispatched,
    /// Queued at or being loaded by the dig face's shovel.
    Loading,
    /// Travelling loaded towards the assigned tip point.
    Hauling,
    /// Queued at or tipping on the assigned dump.
    Dumping,
    /// Travelling empty back to the home anchor.
    Returning,
    /// Stationary while taking on fuel.
    Refuel,
    /// Stationary while being repaired.
    Maint,
    /// Operator hold; the interrupted phase is kept in `prev_phase`.
    Paused,
    /// Fault hold; the interrupted phase is kept in `prev_phase`.
    Fault,
}

impl Phase {
    /// Every phase, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Idle,
        Self::Dispatched,
        Self::Loading,
        Self::Hauling,
        Self::Dumping,
        Self::Returning,
        Self::Refuel,
        Self::Maint,
        Self::Paused,
        Self::Fault,
    ];

    /// Whether this phase is an operator/fault overlay.
    pub const fn is_overlay(self) -> bool {
        matches!(self, Self::Paused | Self::Fault)
    }

    /// Whether the vehicle travels along its route in this phase.
    pub const fn is_moving(self) -> bool {
        matches!(self, Self::Dispatched | Self::Hauling | Self::Returning)
    }

    /// Whether this phase is a timed dwell at a shared site resource.
    pub const fn is_dwell(self) -> bool {
        matches!(self, Self::Loading | Self::Dumping)
    }

    /// Whether this phase is a service phase (refuel or maintenance).
    pub const fn is_service(self) -> bool {
        matches!(self, Self::Refuel | Self::Maint)
    }

    /// Upper-case label used in logs and dashboards.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Dispatched => "DISPATCHED",
            Self::Loading => "LOADING",
            Self::Hauling => "HAULING",
            Self::Dumping => "DUMPING",
            Self::Returning => "RETURNING",
            Self::Refuel => "REFUEL",
            Self::Maint => "MAINT",
            Self::Paused => "PAUSED",
            Self::Fault => "FAULT",
        }
    }
}

impl core::fmt::Display for Phase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Sites
// ---------------------------------------------------------------------------

/// The role a site plays in the mine layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum SiteKind {
    /// A dig face worked by a shovel or excavator.
    Dig,
    /// A waste dump or ROM pad with tip edges.
    Dump,
    /// A fuel bay.
    Fuel,
    /// The maintenance workshop.
    Workshop,
    /// A crusher feed point.
    Crusher,
}

/// Loading equipment working a dig face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum DigEquipment {
    /// Hydraulic excavator.
    Excavator,
    /// Rope or electric shovel.
    Shovel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_flags_partition_the_cycle() {
        for phase in Phase::ALL {
            let flags = [
                phase.is_overlay(),
                phase.is_moving(),
                phase.is_dwell(),
                phase.is_service(),
            ];
            let set = flags.iter().filter(|f| **f).count();
            // Idle is the only phase with no flag set.
            if phase == Phase::Idle {
                assert_eq!(set, 0);
            } else {
                assert_eq!(set, 1, "{phase} should have exactly one flag");
            }
        }
    }

    #[test]
    fn phase_serializes_upper_case() {
        let json = serde_json::to_string(&Phase::Dispatched).ok();
        assert_eq!(json.as_deref(), Some("\"DISPATCHED\""));
        assert_eq!(Phase::Maint.to_string(), "MAINT");
    }
}
