//! Speed zones and the first-match speed limit lookup.
//!
//! Zones are evaluated in declaration order; the first zone containing a
//! point sets the cap. Points outside every zone get the caller's default.

use pitfleet_types::LatLng;
use serde::{Deserialize, Serialize};

use crate::error::WorldError;
use crate::geometry::segment_distance_m;

/// Guards the ray-cast intersection against horizontal edges.
const RAY_CAST_EPSILON: f64 = 1e-12;

/// The area a speed zone covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ZoneShape {
    /// A simple polygon. A closing vertex equal to the first is accepted.
    Polygon {
        /// Ring vertices.
        ring: Vec<LatLng>,
    },
    /// Every point within `radius_m` of `center`.
    Circle {
        /// Circle centre.
        center: LatLng,
        /// Radius in meters.
        radius_m: f64,
    },
}

/// A named area with a speed cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedZone {
    /// Display name.
    pub name: String,
    /// Covered area.
    pub shape: ZoneShape,
    /// Speed cap in km/h.
    pub speed_limit_kph: f64,
}

impl SpeedZone {
    /// Check the shape and cap.
    pub fn validate(&self) -> Result<(), WorldError> {
        if !self.speed_limit_kph.is_finite() || self.speed_limit_kph <= 0.0 {
            return Err(WorldError::InvalidSpeedCap {
                zone: self.name.clone(),
                speed_limit_kph: self.speed_limit_kph,
            });
        }
        match &self.shape {
            ZoneShape::Polygon { ring } => {
                validate_ring(&format!("zone {}", self.name), ring)?;
            }
            ZoneShape::Circle { center, radius_m } => {
                if !center.is_valid() {
                    return Err(WorldError::coordinate(
                        format!("zone {}", self.name),
                        center.lat,
                        center.lng,
                    ));
                }
                if !radius_m.is_finite() || *radius_m <= 0.0 {
                    return Err(WorldError::InvalidRadius {
                        zone: self.name.clone(),
                        radius_m: *radius_m,
                    });
                }
            }
        }
        Ok(())
    }

    /// Whether the zone covers `p`.
    pub fn contains(&self, p: LatLng) -> bool {
        match &self.shape {
            ZoneShape::Polygon { ring } => point_in_polygon(p, ring),
            ZoneShape::Circle { center, radius_m } => segment_distance_m(*center, p) <= *radius_m,
        }
    }
}

/// Check that a ring has valid coordinates and at least three distinct vertices.
pub fn validate_ring(context: &str, ring: &[LatLng]) -> Result<(), WorldError> {
    if let Some(bad) = ring.iter().find(|p| !p.is_valid()) {
        return Err(WorldError::coordinate(context, bad.lat, bad.lng));
    }
    let mut distinct: Vec<LatLng> = Vec::with_capacity(ring.len());
    for p in ring {
        if !distinct.iter().any(|q| same_point(*q, *p)) {
            distinct.push(*p);
        }
    }
    if distinct.len() < 3 {
        return Err(WorldError::DegeneratePolygon {
            context: context.to_owned(),
            count: distinct.len(),
        });
    }
    Ok(())
}

fn same_point(a: LatLng, b: LatLng) -> bool {
    (a.lat - b.lat).abs() < f64::EPSILON && (a.lng - b.lng).abs() < f64::EPSILON
}

/// Even-odd ray casting in degree space.
///
/// Works on open or closed rings: a closing vertex only adds a zero-length
/// edge, which never toggles the crossing parity.
pub fn point_in_polygon(p: LatLng, ring: &[LatLng]) -> bool {
    let (x, y) = (p.lng, p.lat);
    let mut inside = false;
    let Some(mut prev) = ring.last().copied() else {
        return false;
    };
    for &cur in ring {
        let (xi, yi) = (cur.lng, cur.lat);
        let (xj, yj) = (prev.lng, prev.lat);
        let crosses = (yi > y) != (yj > y)
            && x < (xj - xi) * (y - yi) / (yj - yi + RAY_CAST_EPSILON) + xi;
        if crosses {
            inside = !inside;
        }
        prev = cur;
    }
    inside
}

/// An ordered set of speed zones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeedZoneIndex {
    zones: Vec<SpeedZone>,
}

impl SpeedZoneIndex {
    /// Validate and index zones in priority order.
    pub fn new(zones: Vec<SpeedZone>) -> Result<Self, WorldError> {
        for zone in &zones {
            zone.validate()?;
        }
        Ok(Self { zones })
    }

    /// Zones in priority order.
    pub fn zones(&self) -> &[SpeedZone] {
        &self.zones
    }

    /// First zone containing `p`.
    pub fn zone_at(&self, p: LatLng) -> Option<&SpeedZone> {
        self.zones.iter().find(|z| z.contains(p))
    }

    /// Speed cap at `p`, or `default_kph` outside every zone.
    pub fn speed_limit_at(&self, p: LatLng, default_kph: f64) -> f64 {
        self.zone_at(p).map_or(default_kph, |z| z.speed_limit_kph)
    }
}
