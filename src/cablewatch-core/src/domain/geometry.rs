//! Planar geometry in (longitude, latitude) degree units.
//!
//! Distances are plain Euclidean distances between degree pairs. At the latitudes the
//! service watches this is close enough for zone classification, but one degree of
//! longitude shrinks towards the poles so the metric is latitude dependent.

use geo::{Coord, Line};

/// Shortest distance from `point` to the closed segment `line`.
///
/// The point is projected onto the segment's direction vector and the projection
/// parameter clamped to `[0, 1]`, so points beyond either end measure against that
/// endpoint. Zero length segments measure against their start point.
pub fn distance_to_segment(point: Coord<f64>, line: &Line<f64>) -> f64 {
    let delta = line.delta();
    let len_sq = delta.x * delta.x + delta.y * delta.y;

    if len_sq == 0.0 {
        return distance(point, line.start);
    }

    let offset = point - line.start;
    let t = ((offset.x * delta.x + offset.y * delta.y) / len_sq).clamp(0.0, 1.0);

    distance(point, line.start + delta * t)
}

pub fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let d = b - a;
    (d.x * d.x + d.y * d.y).sqrt()
}

/// Cross product of `o -> a` and `o -> b`, positive when `b` is counter-clockwise of `a`.
pub fn orientation(o: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Whether `q` lies inside the axis aligned bounding box of `p` and `r`.
fn within_bounds(p: Coord<f64>, q: Coord<f64>, r: Coord<f64>) -> bool {
    q.x <= p.x.max(r.x) && q.x >= p.x.min(r.x) && q.y <= p.y.max(r.y) && q.y >= p.y.min(r.y)
}

/// Exact crossing test between a vessel trajectory segment and an infrastructure segment.
///
/// Segments cross when each one's endpoints lie strictly on opposite sides of the other.
/// Collinear endpoints fall back to a bounding box containment check, which reports
/// touching and overlapping segments as intersecting.
pub fn intersects(trajectory: &Line<f64>, infrastructure: &Line<f64>) -> bool {
    let (a, b) = (trajectory.start, trajectory.end);
    let (c, d) = (infrastructure.start, infrastructure.end);

    let o1 = orientation(a, c, d);
    let o2 = orientation(b, c, d);
    let o3 = orientation(c, a, b);
    let o4 = orientation(d, a, b);

    if o1 * o2 < 0.0 && o3 * o4 < 0.0 {
        return true;
    }

    (o1 == 0.0 && within_bounds(c, a, d))
        || (o2 == 0.0 && within_bounds(c, b, d))
        || (o3 == 0.0 && within_bounds(a, c, b))
        || (o4 == 0.0 && within_bounds(a, d, b))
}
