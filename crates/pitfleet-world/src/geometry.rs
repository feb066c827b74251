//! Great-circle geometry over haul road polylines.
//!
//! Waypoints are WGS84 points. Distances use the haversine formula on a
//! spherical Earth; interpolation between two waypoints is linear in degrees,
//! which is accurate to well under a meter at haul road segment lengths.
//!
//! All functions are pure. Functions that sample a polyline take the
//! waypoints together with their [`cumulative_table`] so callers can cache
//! the table (see [`Route`](crate::route::Route)).

use pitfleet_types::LatLng;

/// Mean Earth radius used for all distance calculations, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Look-ahead distance used when deriving a heading, in meters.
pub const HEADING_EPSILON_M: f64 = 1.0;

/// Great-circle distance between two points in meters.
pub fn segment_distance_m(a: LatLng, b: LatLng) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let s = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * s.sqrt().min(1.0).asin()
}

/// Initial bearing from `a` to `b` in degrees clockwise from north, in `[0, 360)`.
///
/// Identical points yield 0.
pub fn bearing_deg(a: LatLng, b: LatLng) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let y = d_lng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lng.cos();
    normalize_heading(y.atan2(x).to_degrees())
}

/// Wrap an angle in degrees into `[0, 360)`.
pub fn normalize_heading(deg: f64) -> f64 {
    if !deg.is_finite() {
        return 0.0;
    }
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Total length of a polyline in meters.
pub fn polyline_length_m(points: &[LatLng]) -> f64 {
    points
        .windows(2)
        .map(|w| match w {
            [a, b] => segment_distance_m(*a, *b),
            _ => 0.0,
        })
        .sum()
}

/// Prefix sums of segment lengths, starting at 0.
///
/// The table has one entry per waypoint and is monotonically non-decreasing.
/// The last entry is the total length.
pub fn cumulative_table(points: &[LatLng]) -> Vec<f64> {
    let mut table = Vec::with_capacity(points.len());
    let mut acc = 0.0;
    let mut prev: Option<LatLng> = None;
    for p in points {
        if let Some(a) = prev {
            acc += segment_distance_m(a, *p);
        }
        table.push(acc);
        prev = Some(*p);
    }
    table
}

/// Sample the point at arc distance `d` along the polyline.
///
/// Returns the first point for `d <= 0`, for fewer than two waypoints, or for
/// a zero-length polyline, and the last point for `d >= length`. Returns
/// `None` only when `points` is empty.
pub fn position_at_distance(points: &[LatLng], table: &[f64], d: f64) -> Option<LatLng> {
    let first = *points.first()?;
    let total = table.last().copied().unwrap_or(0.0);
    if points.len() < 2 || total <= 0.0 || d <= 0.0 || !d.is_finite() {
        return Some(first);
    }
    if d >= total {
        return points.last().copied();
    }

    // Index of the first table entry strictly greater than d; the bracketing
    // segment starts one before it.
    let upper = table.partition_point(|&c| c <= d);
    let seg = upper.saturating_sub(1).min(points.len().saturating_sub(2));

    let (Some(&a), Some(&b), Some(&start), Some(&end)) = (
        points.get(seg),
        points.get(seg.saturating_add(1)),
        table.get(seg),
        table.get(seg.saturating_add(1)),
    ) else {
        return Some(first);
    };

    let seg_len = end - start;
    let frac = if seg_len > 0.0 {
        ((d - start) / seg_len).clamp(0.0, 1.0)
    } else {
        0.0
    };
    Some(LatLng::new(
        a.lat + (b.lat - a.lat) * frac,
        a.lng + (b.lng - a.lng) * frac,
    ))
}

/// Heading at arc distance `d` along the polyline, in `[0, 360)`.
///
/// Looks [`HEADING_EPSILON_M`] ahead, or behind at the far end. Degenerate
/// geometry yields 0.
pub fn heading_at_distance(points: &[LatLng], table: &[f64], d: f64) -> f64 {
    let total = table.last().copied().unwrap_or(0.0);
    if points.len() < 2 || total <= 0.0 {
        return 0.0;
    }
    let d = d.clamp(0.0, total);
    let (from_d, to_d) = if d + HEADING_EPSILON_M <= total {
        (d, d + HEADING_EPSILON_M)
    } else {
        ((d - HEADING_EPSILON_M).max(0.0), d)
    };
    match (
        position_at_distance(points, table, from_d),
        position_at_distance(points, table, to_d),
    ) {
        (Some(a), Some(b)) => bearing_deg(a, b),
        _ => 0.0,
    }
}

/// The closest point of a polyline to some query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Arc distance from the polyline start to the closest point, in meters.
    pub along_m: f64,
    /// Lateral distance from the query point to the polyline, in meters.
    pub offset_m: f64,
}

/// Project `p` onto the polyline.
///
/// Each segment is flattened with a local equirectangular projection centred
/// on its start point. Ties resolve to the earliest segment. Returns `None`
/// for fewer than two waypoints.
pub fn project(points: &[LatLng], table: &[f64], p: LatLng) -> Option<Projection> {
    if points.len() < 2 {
        return None;
    }
    let meters_per_deg = EARTH_RADIUS_M.to_radians();
    let mut best: Option<Projection> = None;

    for (seg, pair) in points.windows(2).enumerate() {
        let [a, b] = pair else { continue };
        let Some(&start) = table.get(seg) else {
            continue;
        };
        let seg_len = table.get(seg.saturating_add(1)).map_or(0.0, |end| end - start);

        let cos_lat = a.lat.to_radians().cos();
        let bx = (b.lng - a.lng) * cos_lat * meters_per_deg;
        let by = (b.lat - a.lat) * meters_per_deg;
        let px = (p.lng - a.lng) * cos_lat * meters_per_deg;
        let py = (p.lat - a.lat) * meters_per_deg;

        let len2 = bx.mul_add(bx, by * by);
        let t = if len2 > 0.0 {
            (px.mul_add(bx, py * by) / len2).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let offset = (px - t * bx).hypot(py - t * by);
        let candidate = Projection {
            along_m: t.mul_add(seg_len, start),
            offset_m: offset,
        };
        if best.is_none_or(|current| candidate.offset_m < current.offset_m) {
            best = Some(candidate);
        }
    }
    best
}
