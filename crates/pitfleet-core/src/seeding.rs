//! Initial fleet placement.
//!
//! Trucks are spread round-robin over the scenario's routes and placed in
//! the first quarter of their loop, already dispatched towards their dig
//! face. Each truck takes its route's own dig face and dump when the route
//! names them, and otherwise the next site in id order.

use chrono::{DateTime, Utc};
use pitfleet_types::{Phase, SiteId, Telemetry, Vehicle, VehicleId};
use pitfleet_world::Scenario;
use rand::Rng;
use tracing::info;

/// Fraction of the route length new trucks are spread over.
const SEED_SPREAD: f64 = 0.25;

/// Errors that can occur while seeding the fleet.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    /// The scenario has no routes to place trucks on.
    #[error("cannot seed fleet: scenario has no routes")]
    NoRoutes,

    /// The scenario has no dig faces to assign.
    #[error("cannot seed fleet: scenario has no dig faces")]
    NoDigFaces,

    /// The scenario has no dumps to assign.
    #[error("cannot seed fleet: scenario has no dumps")]
    NoDumps,
}

/// Minimum digits in a seeded vehicle number.
const MIN_ID_DIGITS: usize = 2;

/// Vehicle id for the 0-based seeding index `i` in a fleet of `count`.
///
/// Numbers are zero-padded to the width of `count` (at least two digits),
/// so ids sort lexically in seeding order: `TRK-01`..`TRK-99`, or
/// `TRK-001`..`TRK-120` for a fleet of 120.
pub fn vehicle_id(i: usize, count: u32) -> VehicleId {
    let width = count.to_string().len().max(MIN_ID_DIGITS);
    VehicleId::new(format!("TRK-{:0width$}", i.saturating_add(1)))
}

/// Create `count` trucks placed along the scenario's routes.
///
/// # Errors
///
/// Returns [`SeedError`] if `count > 0` and the scenario lacks routes, dig
/// faces, or dumps.
pub fn seed_fleet<R: Rng>(
    scenario: &Scenario,
    count: u32,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<Vec<Vehicle>, SeedError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let routes: Vec<_> = scenario.routes.values().collect();
    let digs: Vec<SiteId> = scenario.sites.digs().map(|d| d.id.clone()).collect();
    let dumps: Vec<SiteId> = scenario.sites.dumps().map(|d| d.id.clone()).collect();
    if routes.is_empty() {
        return Err(SeedError::NoRoutes);
    }
    if digs.is_empty() {
        return Err(SeedError::NoDigFaces);
    }
    if dumps.is_empty() {
        return Err(SeedError::NoDumps);
    }

    let mut fleet = Vec::new();
    for i in 0..usize::try_from(count).unwrap_or(usize::MAX) {
        let (Some(route), Some(fallback_dig), Some(fallback_dump)) = (
            routes.get(i % routes.len()),
            digs.get(i % digs.len()),
            dumps.get(i % dumps.len()),
        ) else {
            continue;
        };
        let dig_id = route.dig_id().unwrap_or(fallback_dig).clone();
        let dump_id = route.dump_id().unwrap_or(fallback_dump).clone();
        let tip_edge_id = scenario.sites.default_tip_edge(&dump_id).cloned();

        let progress_m = route.wrap(rng.random_range(0.0..SEED_SPREAD) * route.length_m());
        fleet.push(Vehicle {
            id: vehicle_id(i, count),
            name: format!("Truck {}", i.saturating_add(1)),
            phase: Phase::Dispatched,
            prev_phase: None,
            position: route.position_at(progress_m),
            heading_deg: route.heading_at(progress_m),
            telemetry: Telemetry {
                speed_kph: rng.random_range(28.0..=38.0),
                payload_tons: 0.0,
                fuel_pct: rng.random_range(65.0..=95.0),
                health_pct: rng.random_range(85.0..=100.0),
                engine_temp_c: rng.random_range(75.0..=85.0),
            },
            route_id: route.id().clone(),
            dig_id: Some(dig_id),
            dump_id: Some(dump_id),
            tip_edge_id,
            progress_m,
            progress_t: route.fraction(progress_m),
            dwell_remaining_s: 0.0,
            last_update: now,
        });
    }

    info!(
        vehicles = fleet.len(),
        routes = routes.len(),
        scenario = %scenario.name,
        "Fleet seeded"
    );
    Ok(fleet)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pitfleet_world::create_whaleback;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    #[test]
    fn seeds_requested_count_with_sequential_ids() {
        let scenario = create_whaleback().unwrap();
        let mut rng = SmallRng::seed_from_u64(42);
        let fleet = seed_fleet(&scenario, 5, &mut rng, Utc::now()).unwrap();
        let ids: Vec<&str> = fleet.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["TRK-01", "TRK-02", "TRK-03", "TRK-04", "TRK-05"]);
        assert_eq!(fleet.first().unwrap().name, "Truck 1");
    }

    #[test]
    fn large_fleets_widen_ids_to_keep_numeric_order() {
        let scenario = create_whaleback().unwrap();
        let mut rng = SmallRng::seed_from_u64(42);
        let fleet = seed_fleet(&scenario, 120, &mut rng, Utc::now()).unwrap();
        assert_eq!(fleet.first().unwrap().id.as_str(), "TRK-001");
        assert_eq!(fleet.get(9).unwrap().id.as_str(), "TRK-010");
        assert_eq!(fleet.get(99).unwrap().id.as_str(), "TRK-100");
        assert_eq!(fleet.last().unwrap().id.as_str(), "TRK-120");

        // Keyed by id, the fleet iterates in seeding order.
        let seeded: Vec<String> = fleet.iter().map(|v| v.name.clone()).collect();
        let keyed: std::collections::BTreeMap<VehicleId, String> =
            fleet.into_iter().map(|v| (v.id, v.name)).collect();
        assert_eq!(keyed.into_values().collect::<Vec<_>>(), seeded);
    }

    #[test]
    fn id_width_follows_fleet_size() {
        assert_eq!(vehicle_id(0, 5).as_str(), "TRK-01");
        assert_eq!(vehicle_id(98, 99).as_str(), "TRK-99");
        assert_eq!(vehicle_id(8, 100).as_str(), "TRK-009");
        assert_eq!(vehicle_id(999, 1000).as_str(), "TRK-1000");
    }

    #[test]
    fn trucks_alternate_routes_and_use_route_sites() {
        let scenario = create_whaleback().unwrap();
        let mut rng = SmallRng::seed_from_u64(42);
        let fleet = seed_fleet(&scenario, 4, &mut rng, Utc::now()).unwrap();
        for v in &fleet {
            let route = scenario.route(&v.route_id).unwrap();
            assert_eq!(v.dig_id.as_ref(), route.dig_id());
            assert_eq!(v.dump_id.as_ref(), route.dump_id());
            let dump = v.dump_id.as_ref().unwrap();
            assert_eq!(v.tip_edge_id.as_ref(), scenario.sites.default_tip_edge(dump));
            assert!(v.progress_m < route.length_m() * SEED_SPREAD);
            assert_eq!(v.phase, Phase::Dispatched);
        }
        let first = fleet.first().unwrap();
        let second = fleet.get(1).unwrap();
        assert_ne!(first.route_id, second.route_id);
    }

    #[test]
    fn seeded_telemetry_is_in_range() {
        let scenario = create_whaleback().unwrap();
        let mut rng = SmallRng::seed_from_u64(9);
        for v in seed_fleet(&scenario, 20, &mut rng, Utc::now()).unwrap() {
            let t = v.telemetry;
            assert!((65.0..=95.0).contains(&t.fuel_pct));
            assert!((85.0..=100.0).contains(&t.health_pct));
            assert!((28.0..=38.0).contains(&t.speed_kph));
            assert!((75.0..=85.0).contains(&t.engine_temp_c));
            assert!(t.payload_tons.abs() < f64::EPSILON);
        }
    }

    #[test]
    fn same_seed_gives_same_fleet() {
        let scenario = create_whaleback().unwrap();
        let now = Utc::now();
        let a = seed_fleet(&scenario, 6, &mut SmallRng::seed_from_u64(1), now).unwrap();
        let b = seed_fleet(&scenario, 6, &mut SmallRng::seed_from_u64(1), now).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_trucks_is_empty() {
        let scenario = create_whaleback().unwrap();
        let mut rng = SmallRng::seed_from_u64(42);
        assert!(seed_fleet(&scenario, 0, &mut rng, Utc::now()).unwrap().is_empty());
    }
}
