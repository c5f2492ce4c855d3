//! Geodesic helpers: haversine distance, point-to-polyline distance, and
//! endpoint trimming of route geometry.

use geo::HaversineDistance;
use geo::Point;

/// Great-circle distance in meters between two (lat, lon) coordinates.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let p1 = Point::new(lon1, lat1);
    let p2 = Point::new(lon2, lat2);
    p1.haversine_distance(&p2)
}

/// Minimum distance in meters from a point to a polyline of (lon, lat)
/// vertices. The projection parameter is computed in local Cartesian degree
/// space; the resulting foot point is measured with haversine.
pub fn point_to_polyline_distance(lat: f64, lng: f64, line: &[(f64, f64)]) -> f64 {
    if line.is_empty() {
        return f64::INFINITY;
    }
    if line.len() == 1 {
        return haversine_distance(lat, lng, line[0].1, line[0].0);
    }

    let mut min_dist = f64::INFINITY;
    for seg in line.windows(2) {
        let (x1, y1) = seg[0];
        let (x2, y2) = seg[1];
        let (dx, dy) = (x2 - x1, y2 - y1);
        let len_sq = dx * dx + dy * dy;

        let t = if len_sq > 1e-12 {
            (((lng - x1) * dx + (lat - y1) * dy) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let proj_x = x1 + t * dx;
        let proj_y = y1 + t * dy;
        min_dist = min_dist.min(haversine_distance(lat, lng, proj_y, proj_x));
    }
    min_dist
}

/// Squared degree-space distance between two (lat, lon) points. Only used to
/// compare projections onto nearby segments, where the planar approximation
/// is safe.
fn dist_sq(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dlat = a.0 - b.0;
    let dlon = a.1 - b.1;
    dlat * dlat + dlon * dlon
}

/// Project point `p` onto segment [a, b], all (lat, lon) in degrees.
fn project_on_segment(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    let l2 = dist_sq(a, b);
    if l2 == 0.0 {
        return a;
    }
    let t = (((p.0 - a.0) * (b.0 - a.0) + (p.1 - a.1) * (b.1 - a.1)) / l2).clamp(0.0, 1.0);
    (a.0 + t * (b.0 - a.0), a.1 + t * (b.1 - a.1))
}

/// Number of leading/trailing segments scanned when snapping the query
/// endpoints onto the route polyline.
const TRIM_SCAN_SEGMENTS: usize = 100;

/// Replace the endpoints of a route polyline (GeoJSON (lon, lat) order) with
/// the projections of the true query points. Only the first and last
/// `TRIM_SCAN_SEGMENTS` segments are scanned. Returns the input unchanged
/// when fewer than two vertices are available.
pub fn trim_polyline(
    coords: &[(f64, f64)],
    start_lat: f64,
    start_lon: f64,
    end_lat: f64,
    end_lon: f64,
) -> Vec<(f64, f64)> {
    if coords.len() < 2 {
        return coords.to_vec();
    }

    let points: Vec<(f64, f64)> = coords.iter().map(|&(lon, lat)| (lat, lon)).collect();

    let start_target = (start_lat, start_lon);
    let mut start_idx = 0usize;
    let mut new_start = points[0];
    let mut min_start = f64::INFINITY;
    let scan_limit = TRIM_SCAN_SEGMENTS.min(points.len() - 1);
    for i in 0..scan_limit {
        let p = project_on_segment(start_target, points[i], points[i + 1]);
        let d = dist_sq(start_target, p);
        if d < min_start {
            min_start = d;
            new_start = p;
            start_idx = i;
        }
    }

    let end_target = (end_lat, end_lon);
    let mut end_idx = points.len() - 1;
    let mut new_end = points[points.len() - 1];
    let mut min_end = f64::INFINITY;
    let end_scan_start = points.len().saturating_sub(TRIM_SCAN_SEGMENTS + 1);
    for i in end_scan_start..points.len() - 1 {
        let p = project_on_segment(end_target, points[i], points[i + 1]);
        let d = dist_sq(end_target, p);
        if d < min_end {
            min_end = d;
            new_end = p;
            end_idx = i;
        }
    }

    let mut out = Vec::with_capacity(end_idx.saturating_sub(start_idx) + 2);
    out.push((new_start.1, new_start.0));
    for &(lat, lon) in points.iter().take(end_idx + 1).skip(start_idx + 1) {
        out.push((lon, lat));
    }
    out.push((new_end.1, new_end.0));

    if out.len() < 2 {
        return coords.to_vec();
    }
    out
}
