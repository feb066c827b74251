//! Operator command types.
//!
//! Commands are submitted by collaborators (the HTTP observer, tests, an
//! embedding application) and queued until the start of the next tick, where
//! the core validates and applies them. Refused or unknown-target commands are
//! no-ops.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{SiteId, TipEdgeId, VehicleId};

/// The literal used on the wire to address every vehicle.
pub const ALL_VEHICLES: &str = "ALL";

/// A per-vehicle phase directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum VehicleDirective {
    /// Send an idle or serviced vehicle to its dig face.
    Dispatch,
    /// Hold the vehicle in place.
    Pause,
    /// Release a paused vehicle.
    Resume,
    /// Put the vehicle into fault.
    RaiseFault,
    /// Clear a fault and restore the interrupted phase.
    ClearFault,
    /// Send the vehicle to refuel.
    SendToFuel,
    /// Send the vehicle to maintenance.
    SendToMaint,
}

/// Which vehicles a directive applies to.
///
/// Serialized as the vehicle id, or `"ALL"` for the whole fleet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CommandTarget {
    /// Every vehicle, applied in id order.
    All,
    /// A single vehicle.
    Vehicle(VehicleId),
}

impl From<String> for CommandTarget {
    fn from(raw: String) -> Self {
        if raw.eq_ignore_ascii_case(ALL_VEHICLES) {
            Self::All
        } else {
            Self::Vehicle(VehicleId(raw))
        }
    }
}

impl From<CommandTarget> for String {
    fn from(target: CommandTarget) -> Self {
        match target {
            CommandTarget::All => ALL_VEHICLES.to_owned(),
            CommandTarget::Vehicle(id) => id.0,
        }
    }
}

impl From<VehicleId> for CommandTarget {
    fn from(id: VehicleId) -> Self {
        Self::Vehicle(id)
    }
}

/// A command accepted by the fleet controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "command", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum FleetCommand {
    /// Apply a phase directive to one vehicle or the whole fleet.
    Vehicle {
        /// The directive to apply.
        directive: VehicleDirective,
        /// Vehicle id or `"ALL"`.
        #[ts(type = "string")]
        target: CommandTarget,
    },
    /// Send every vehicle not in fault to idle; paused vehicles resume into idle.
    StopAll,
    /// Move a vehicle's job to the back of a site queue.
    BumpToBack {
        /// Dig face or dump whose queue is reordered.
        site_id: SiteId,
        /// Vehicle whose job is moved.
        vehicle_id: VehicleId,
    },
    /// Change a site queue's capacity (floored at 1).
    SetQueueCapacity {
        /// Dig face or dump whose queue is resized.
        site_id: SiteId,
        /// New capacity.
        capacity: u32,
    },
    /// Reassign a vehicle to another dig face.
    AssignDig {
        /// Vehicle to reassign.
        vehicle_id: VehicleId,
        /// New dig face.
        dig_id: SiteId,
    },
    /// Reassign a vehicle to another dump; its tip edge resets to the dump default.
    AssignDump {
        /// Vehicle to reassign.
        vehicle_id: VehicleId,
        /// New dump site.
        dump_id: SiteId,
    },
    /// Reassign a vehicle to another tip edge of its current dump.
    AssignTipEdge {
        /// Vehicle to reassign.
        vehicle_id: VehicleId,
        /// New tip edge.
        tip_edge_id: TipEdgeId,
    },
    /// Change a dump's default tip edge. Existing assignments are kept.
    SetDumpDefaultTipEdge {
        /// Dump site to update.
        dump_id: SiteId,
        /// New default tip edge; must belong to the dump.
        tip_edge_id: TipEdgeId,
    },
}

impl FleetCommand {
    /// Shorthand for a directive aimed at a single vehicle.
    pub fn vehicle(directive: VehicleDirective, id: impl Into<VehicleId>) -> Self {
        Self::Vehicle {
            directive,
            target: CommandTarget::Vehicle(id.into()),
        }
    }

    /// Shorthand for a directive aimed at every vehicle.
    pub const fn all(directive: VehicleDirective) -> Self {
        Self::Vehicle {
            directive,
            target: CommandTarget::All,
        }
    }

    /// Short name used in log fields.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Vehicle { .. } => "vehicle",
            Self::StopAll => "stop_all",
            Self::BumpToBack { .. } => "bump_to_back",
            Self::SetQueueCapacity { .. } => "set_queue_capacity",
            Self::AssignDig { .. } => "assign_dig",
            Self::AssignDump { .. } => "assign_dump",
            Self::AssignTipEdge { .. } => "assign_tip_edge",
            Self::SetDumpDefaultTipEdge { .. } => "set_dump_default_tip_edge",
        }
    }
}
