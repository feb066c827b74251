//! Haul routes: validated polylines with cached arc-length tables.
//!
//! A route is the path a vehicle follows through its whole cycle. Progress is
//! tracked as an arc distance in `[0, length)` and loops modulo the length.
//! Routes are closed loops by convention (first waypoint equals the last); an
//! open route implicitly jumps back to its start when progress wraps.

use pitfleet_types::{LatLng, RouteId, SiteId};

use crate::error::WorldError;
use crate::geometry::{
    self, Projection, cumulative_table, heading_at_distance, position_at_distance,
};

/// Two endpoints closer than this are treated as the same point, in meters.
pub const CLOSED_LOOP_TOLERANCE_M: f64 = 1.0;

/// A validated haul route.
///
/// The cumulative table and length are derived from the waypoints and are
/// recomputed by [`Route::set_waypoints`]; there is no other way to mutate
/// the geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    id: RouteId,
    name: String,
    waypoints: Vec<LatLng>,
    cumulative_m: Vec<f64>,
    length_m: f64,
    closed: bool,
    dig_id: Option<SiteId>,
    dump_id: Option<SiteId>,
    home: Option<LatLng>,
}

impl Route {
    /// Build a route from at least two valid waypoints.
    pub fn new(
        id: RouteId,
        name: impl Into<String>,
        waypoints: Vec<LatLng>,
    ) -> Result<Self, WorldError> {
        let mut route = Self {
            id,
            name: name.into(),
            waypoints: Vec::new(),
            cumulative_m: Vec::new(),
            length_m: 0.0,
            closed: false,
            dig_id: None,
            dump_id: None,
            home: None,
        };
        route.set_waypoints(waypoints)?;
        Ok(route)
    }

    /// Attach the dig face and dump this route serves.
    #[must_use]
    pub fn with_sites(mut self, dig_id: Option<SiteId>, dump_id: Option<SiteId>) -> Self {
        self.dig_id = dig_id;
        self.dump_id = dump_id;
        self
    }

    /// Override the home anchor (defaults to the first waypoint).
    pub fn with_home(mut self, home: LatLng) -> Result<Self, WorldError> {
        if !home.is_valid() {
            return Err(WorldError::coordinate(
                format!("home of route {}", self.id),
                home.lat,
                home.lng,
            ));
        }
        self.home = Some(home);
        Ok(self)
    }

    /// Replace the waypoints and recompute the arc-length table.
    pub fn set_waypoints(&mut self, waypoints: Vec<LatLng>) -> Result<(), WorldError> {
        if waypoints.len() < 2 {
            return Err(WorldError::RouteTooShort {
                route: self.id.clone(),
                count: waypoints.len(),
            });
        }
        if let Some(bad) = waypoints.iter().find(|p| !p.is_valid()) {
            return Err(WorldError::coordinate(
                format!("route {}", self.id),
                bad.lat,
                bad.lng,
            ));
        }
        self.cumulative_m = cumulative_table(&waypoints);
        self.length_m = self.cumulative_m.last().copied().unwrap_or(0.0);
        self.closed = match (waypoints.first(), waypoints.last()) {
            (Some(a), Some(b)) => geometry::segment_distance_m(*a, *b) <= CLOSED_LOOP_TOLERANCE_M,
            _ => false,
        };
        self.waypoints = waypoints;
        Ok(())
    }

    /// Route identifier.
    pub const fn id(&self) -> &RouteId {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered waypoints.
    pub fn waypoints(&self) -> &[LatLng] {
        &self.waypoints
    }

    /// Cumulative arc length at each waypoint.
    pub fn cumulative_m(&self) -> &[f64] {
        &self.cumulative_m
    }

    /// Total route length in meters.
    pub const fn length_m(&self) -> f64 {
        self.length_m
    }

    /// Whether the last waypoint coincides with the first.
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Dig face this route serves, if declared.
    pub const fn dig_id(&self) -> Option<&SiteId> {
        self.dig_id.as_ref()
    }

    /// Dump this route serves, if declared.
    pub const fn dump_id(&self) -> Option<&SiteId> {
        self.dump_id.as_ref()
    }

    /// Home anchor where returning vehicles park.
    pub fn home(&self) -> LatLng {
        self.home
            .or_else(|| self.waypoints.first().copied())
            .unwrap_or(LatLng::new(0.0, 0.0))
    }

    /// Wrap an arc distance into `[0, length)`.
    pub fn wrap(&self, d: f64) -> f64 {
        if self.length_m <= 0.0 || !d.is_finite() {
            return 0.0;
        }
        let wrapped = d.rem_euclid(self.length_m);
        if wrapped >= self.length_m { 0.0 } else { wrapped }
    }

    /// Progress as a fraction of length, in `[0, 1)`.
    pub fn fraction(&self, d: f64) -> f64 {
        if self.length_m <= 0.0 {
            return 0.0;
        }
        (self.wrap(d) / self.length_m).clamp(0.0, 1.0)
    }

    /// Point at arc distance `d`, wrapping modulo the length.
    pub fn position_at(&self, d: f64) -> LatLng {
        self.sample(self.wrap(d))
    }

    /// Point at arc distance `d` clamped to `[0, length]` without wrapping.
    pub fn position_at_clamped(&self, d: f64) -> LatLng {
        self.sample(d.clamp(0.0, self.length_m))
    }

    /// Heading at arc distance `d`, in `[0, 360)`.
    pub fn heading_at(&self, d: f64) -> f64 {
        heading_at_distance(&self.waypoints, &self.cumulative_m, d.clamp(0.0, self.length_m))
    }

    /// Arc position and lateral offset of the route point closest to `p`.
    pub fn project(&self, p: LatLng) -> Option<Projection> {
        geometry::project(&self.waypoints, &self.cumulative_m, p)
    }

    /// Arc position serving `target`.
    ///
    /// On closed routes a projection onto the shared end point is reported
    /// as 0, so every stop lies in `[0, length)`. On open routes a stop at the
    /// far end stays at `length`.
    pub fn stop_for(&self, target: LatLng) -> f64 {
        let along = self.project(target).map_or(0.0, |p| p.along_m);
        if self.closed && along >= self.length_m - CLOSED_LOOP_TOLERANCE_M {
            0.0
        } else {
            along
        }
    }

    /// Forward arc distance from `progress` to `stop`, in `[0, length]`.
    pub fn forward_distance(&self, progress: f64, stop: f64) -> f64 {
        if stop >= progress {
            stop - progress
        } else {
            stop + self.length_m - progress
        }
    }

    fn sample(&self, d: f64) -> LatLng {
        position_at_distance(&self.waypoints, &self.cumulative_m, d).unwrap_or_else(|| self.home())
    }
}
