//! Geospatial utilities
//!
//! Pure functions over WGS84 points: great-circle distance, polyline
//! proximity, radius queries over the building dataset and polygon
//! containment.

use site_types::{Feature, GeoPoint, Neighbor, NeighborhoodStats};

/// Spherical earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude, used for bounding-box pre-filters only
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Great-circle distance in meters (haversine).
///
/// The points are put into a canonical order first so swapping the
/// arguments yields a bit-identical result.
pub fn distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let (a, b) = if (a.lat, a.lng) <= (b.lat, b.lng) {
        (a, b)
    } else {
        (b, a)
    };

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());

    EARTH_RADIUS_M * c
}

/// Minimum distance from `point` to any vertex of any line.
///
/// Vertex approximation, not true point-to-segment distance. Returns
/// `f64::INFINITY` when there are no vertices at all.
pub fn nearest_line_distance<'a, I>(point: GeoPoint, lines: I) -> f64
where
    I: IntoIterator<Item = &'a [GeoPoint]>,
{
    lines
        .into_iter()
        .flat_map(|line| line.iter())
        .map(|vertex| distance(point, *vertex))
        .fold(f64::INFINITY, f64::min)
}

/// Minimum distance from `point` to any segment of `line`, in meters.
///
/// Segments are measured on a local equirectangular projection centred on
/// `point`, which is accurate at city scale. A single-vertex line degrades to
/// vertex distance; an empty line returns `f64::INFINITY`.
pub fn nearest_segment_distance(point: GeoPoint, line: &[GeoPoint]) -> f64 {
    match line {
        [] => f64::INFINITY,
        [only] => distance(point, *only),
        _ => line
            .windows(2)
            .map(|seg| segment_distance(point, seg[0], seg[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

fn segment_distance(p: GeoPoint, a: GeoPoint, b: GeoPoint) -> f64 {
    let cos_lat = p.lat.to_radians().cos();
    let project = |q: GeoPoint| {
        (
            (q.lng - p.lng).to_radians() * cos_lat * EARTH_RADIUS_M,
            (q.lat - p.lat).to_radians() * EARTH_RADIUS_M,
        )
    };
    let (ax, ay) = project(a);
    let (bx, by) = project(b);
    let (dx, dy) = (bx - ax, by - ay);
    let len_sq = dx * dx + dy * dy;

    // Degenerate segment: both endpoints coincide
    if len_sq == 0.0 {
        return distance(p, a);
    }

    // Projection of the origin (p) onto the segment, clamped to its endpoints
    let t = (-(ax * dx + ay * dy) / len_sq).clamp(0.0, 1.0);
    let (cx, cy) = (ax + t * dx, ay + t * dy);
    (cx * cx + cy * cy).sqrt()
}

/// Cheap degree-based rectangle test ahead of the exact haversine check.
///
/// The longitude span is taken at the most poleward latitude of the box, so
/// the rectangle never cuts off a point the exact check would accept. Boxes
/// reaching a pole skip the longitude test.
fn within_bounding_box(center: GeoPoint, candidate: GeoPoint, radius: f64) -> bool {
    let lat_delta = radius / METERS_PER_DEGREE;
    if (candidate.lat - center.lat).abs() > lat_delta {
        return false;
    }
    let poleward = center.lat.abs() + lat_delta;
    if poleward >= 89.999 {
        return true;
    }
    let lng_delta = radius / (METERS_PER_DEGREE * poleward.to_radians().cos());
    (candidate.lng - center.lng).abs() <= lng_delta
}

/// Features whose first vertex lies within `radius` meters, with their distance
fn features_within_radius<'a>(
    point: GeoPoint,
    features: &'a [Feature],
    radius: f64,
) -> impl Iterator<Item = (&'a Feature, f64)> + 'a {
    features.iter().filter_map(move |feature| {
        let position = feature.position()?;
        if !within_bounding_box(point, position, radius) {
            return None;
        }
        let d = distance(point, position);
        (d <= radius).then_some((feature, d))
    })
}

/// Count features whose first vertex lies within `radius` meters
pub fn count_within_radius(point: GeoPoint, features: &[Feature], radius: f64) -> usize {
    features_within_radius(point, features, radius).count()
}

/// Ray-casting containment test against one polygon ring.
///
/// The ring is implicitly closed. Edge handling is half-open: a point on a
/// left or bottom edge counts as inside, on a right or top edge as outside.
/// Callers must not rely on boundary behavior.
pub fn point_in_polygon(point: GeoPoint, ring: &[GeoPoint]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let (px, py) = (point.lng, point.lat);
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (ring[i].lng, ring[i].lat);
        let (xj, yj) = (ring[j].lng, ring[j].lat);
        if ((yi > py) != (yj > py)) && (px < (xj - xi) * (py - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Height statistics of neighbors within `radius` meters.
///
/// Only features with a resolvable height qualify. `nearest` holds up to
/// `nearest_count` qualifying neighbors, ascending by distance (ties broken
/// by id). No neighbors yields zeroed stats.
pub fn neighborhood_stats(
    point: GeoPoint,
    features: &[Feature],
    radius: f64,
    nearest_count: usize,
) -> NeighborhoodStats {
    let mut neighbors: Vec<Neighbor> = features_within_radius(point, features, radius)
        .filter_map(|(feature, d)| {
            feature.effective_height().map(|height| Neighbor {
                id: feature.id.clone(),
                distance: d,
                height,
            })
        })
        .collect();

    if neighbors.is_empty() {
        return NeighborhoodStats::default();
    }

    let count = neighbors.len();
    let total: f64 = neighbors.iter().map(|n| n.height).sum();
    let max_height = neighbors.iter().map(|n| n.height).fold(0.0, f64::max);

    neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance).then_with(|| a.id.cmp(&b.id)));
    neighbors.truncate(nearest_count);

    NeighborhoodStats {
        count,
        avg_height: total / count as f64,
        max_height,
        nearest: neighbors,
    }
}
