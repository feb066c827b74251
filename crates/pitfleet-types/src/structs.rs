//! Core entity structs for the pitfleet simulation.
//!
//! Covers the vehicle record and its telemetry, geographic points, and the
//! read-only snapshot types published to collaborators each tick.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::Phase;
use crate::ids::{RouteId, SiteId, TipEdgeId, VehicleId};

// ---------------------------------------------------------------------------
// Geography
// ---------------------------------------------------------------------------

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LatLng {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lng: f64,
}

impl LatLng {
    /// Construct a point from latitude and longitude.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both components are finite and within WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

// ---------------------------------------------------------------------------
// Vehicle
// ---------------------------------------------------------------------------

/// Per-vehicle sensor readings evolved every tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Telemetry {
    /// Ground speed in km/h, within `[0, 60]`.
    pub speed_kph: f64,
    /// Tray payload in tonnes, within `[0, max_payload_tons]`.
    pub payload_tons: f64,
    /// Fuel level as a percentage, within `[0, 100]`.
    pub fuel_pct: f64,
    /// Mechanical health as a percentage, within `[0, 100]`.
    pub health_pct: f64,
    /// Engine temperature in degrees Celsius, within `[60, 125]`.
    pub engine_temp_c: f64,
}

/// A haul vehicle with its phase, position, telemetry and assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Vehicle {
    /// Stable vehicle identifier.
    pub id: VehicleId,
    /// Display name.
    pub name: String,
    /// Current operational phase.
    pub phase: Phase,
    /// Phase interrupted by a pause or fault. Never itself an overlay.
    pub prev_phase: Option<Phase>,
    /// Current geographic position.
    pub position: LatLng,
    /// Heading in degrees clockwise from north, within `[0, 360)`.
    pub heading_deg: f64,
    /// Current telemetry readings.
    pub telemetry: Telemetry,
    /// Route the vehicle travels.
    pub route_id: RouteId,
    /// Assigned dig face.
    pub dig_id: Option<SiteId>,
    /// Assigned dump site.
    pub dump_id: Option<SiteId>,
    /// Assigned tip edge on the dump site.
    pub tip_edge_id: Option<TipEdgeId>,
    /// Arc distance travelled along the route in meters, within `[0, length)`.
    pub progress_m: f64,
    /// Progress as a fraction of route length, within `[0, 1)`.
    pub progress_t: f64,
    /// Simulated seconds of loading or dumping dwell still required.
    pub dwell_remaining_s: f64,
    /// Wall-clock time of the last state update.
    pub last_update: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Snapshot views
// ---------------------------------------------------------------------------

/// Aggregate fleet indicators derived from a single tick's vehicle list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FleetKpis {
    /// Number of vehicles in the fleet.
    pub total: u32,
    /// Vehicles not paused and not faulted.
    pub active: u32,
    /// Vehicles that are paused or faulted.
    pub paused_or_fault: u32,
    /// Vehicles currently hauling.
    pub hauling: u32,
    /// Vehicles currently returning.
    pub returning: u32,
    /// Vehicles refuelling.
    pub refuel: u32,
    /// Vehicles in maintenance.
    pub maint: u32,
    /// Vehicles in fault.
    pub fault: u32,
    /// Vehicle count for every phase, including zero entries.
    pub by_phase: BTreeMap<Phase, u32>,
    /// Sum of payload across the fleet in tonnes.
    pub total_payload_tons: f64,
    /// Mean fuel level; zero for an empty fleet.
    pub avg_fuel_pct: f64,
    /// Mean health; zero for an empty fleet.
    pub avg_health_pct: f64,
    /// Mean speed; zero for an empty fleet.
    pub avg_speed_kph: f64,
    /// Cumulative tonnes tipped since the run started.
    pub tons_dumped_total: f64,
}

/// Occupancy of an admission queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct QueueSlots {
    /// Configured capacity, at least 1.
    pub capacity: u32,
    /// Number of jobs currently held.
    pub used: u32,
    /// `max(0, capacity - used)`.
    pub free: u32,
}

/// Read-only view of one site's admission queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct QueueView {
    /// Site the queue arbitrates.
    pub site_id: SiteId,
    /// Queued vehicles, front first.
    pub consumer_ids: Vec<VehicleId>,
    /// Vehicle currently being serviced (the front of the queue).
    pub active: Option<VehicleId>,
    /// Capacity and occupancy.
    pub slots: QueueSlots,
}

/// Immutable fleet state published after every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FleetSnapshot {
    /// Tick number that produced this snapshot.
    pub tick: u64,
    /// Simulated seconds elapsed since the run started.
    pub sim_time_s: f64,
    /// Wall-clock time the snapshot was taken.
    pub taken_at: DateTime<Utc>,
    /// Vehicles ordered by id.
    pub vehicles: Vec<Vehicle>,
    /// Aggregate indicators.
    pub kpis: FleetKpis,
    /// One view per dig face and dump site, ordered by site id.
    pub queues: Vec<QueueView>,
}

impl FleetSnapshot {
    /// An empty snapshot used before the first tick completes.
    pub fn empty() -> Self {
        Self {
            tick: 0,
            sim_time_s: 0.0,
            taken_at: Utc::now(),
            vehicles: Vec::new(),
            kpis: FleetKpis::default(),
            queues: Vec::new(),
        }
    }

    /// Look up a vehicle by id.
    pub fn vehicle(&self, id: &VehicleId) -> Option<&Vehicle> {
        self.vehicles
            .binary_search_by(|v| v.id.cmp(id))
            .ok()
            .and_then(|idx| self.vehicles.get(idx))
    }

    /// Look up a queue view by site id.
    pub fn queue(&self, site_id: &SiteId) -> Option<&QueueView> {
        self.queues.iter().find(|q| &q.site_id == site_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latlng_validation_rejects_out_of_range() {
        assert!(LatLng::new(-23.36, 119.67).is_valid());
        assert!(!LatLng::new(91.0, 0.0).is_valid());
        assert!(!LatLng::new(0.0, f64::NAN).is_valid());
        assert!(!LatLng::new(0.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn empty_snapshot_has_no_vehicles() {
        let snap = FleetSnapshot::empty();
        assert_eq!(snap.tick, 0);
        assert!(snap.vehicle(&VehicleId::from("TRK-01")).is_none());
        assert!(snap.queue(&SiteId::from("DIG-A")).is_none());
    }

    #[test]
    fn phase_keys_serialize_in_kpi_map() {
        let mut kpis = FleetKpis::default();
        kpis.by_phase.insert(Phase::Hauling, 3);
        let json = serde_json::to_value(&kpis).ok();
        let count = json
            .as_ref()
            .and_then(|v| v.get("by_phase"))
            .and_then(|m| m.get("HAULING"))
            .and_then(serde_json::Value::as_u64);
        assert_eq!(count, Some(3));
    }
}
