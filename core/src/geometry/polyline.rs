//! Queries over point sequences treated as open polylines or closed
//! polygons: lengths, locations, tangents/normals, intersections,
//! splitting and hit-testing.

use super::utils_2d::*;
use super::Point2;

/// A position on a path: segment `index` (from vertex `index` to the next
/// one), the parameter `t` within it, the point, and the arc-length offset
/// from the first vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathLocation {
    pub index: usize,
    pub t: f64,
    pub point: Point2,
    pub offset: f64,
}

/// Result of hit-testing a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathHit {
    /// The pointer is on vertex `index`.
    Vertex(usize),
    /// The pointer is on the outline, away from any vertex.
    Stroke(PathLocation),
    /// The pointer is inside a closed path.
    Fill,
}

fn segment_end(points: &[Point2], index: usize, closed: bool) -> Point2 {
    if closed {
        points[(index + 1) % points.len()]
    } else {
        points[index + 1]
    }
}

/// Number of segments of the path.
pub fn segment_count(points: &[Point2], closed: bool) -> usize {
    match points.len() {
        0 | 1 => 0,
        n if closed && n > 2 => n,
        n => n - 1,
    }
}

/// Total length of the open polyline.
pub fn polyline_length(points: &[Point2]) -> f64 {
    points.windows(2).map(|w| distance(w[0], w[1])).sum()
}

/// Location at the given arc-length offset, clamped to the polyline.
pub fn location_at_offset(points: &[Point2], offset: f64) -> Option<PathLocation> {
    let first = *points.first()?;
    if points.len() == 1 {
        return Some(PathLocation { index: 0, t: 0.0, point: first, offset: 0.0 });
    }

    let mut travelled = 0.0;
    let last = points.len() - 2;
    for (i, w) in points.windows(2).enumerate() {
        let len = distance(w[0], w[1]);
        if travelled + len >= offset || i == last {
            let t = if len > EPSILON { ((offset - travelled) / len).clamp(0.0, 1.0) } else { 0.0 };
            return Some(PathLocation {
                index: i,
                t,
                point: lerp(w[0], w[1], t),
                offset: travelled + t * len,
            });
        }
        travelled += len;
    }
    None
}

/// The point halfway along the polyline.
pub fn polyline_midpoint(points: &[Point2]) -> Option<Point2> {
    location_at_offset(points, polyline_length(points) / 2.0).map(|loc| loc.point)
}

/// Unit direction towards (or from) the first vertex that does not
/// coincide with vertex `from`, walking forwards or backwards.
fn walk_direction(points: &[Point2], from: usize, forward: bool) -> Option<Point2> {
    let origin = points[from];
    if forward {
        points[from + 1..].iter().find_map(|p| normalize_2d(sub_2d(*p, origin)))
    } else {
        points[..from].iter().rev().find_map(|p| normalize_2d(sub_2d(origin, *p)))
    }
}

/// Tangent of an open polyline at vertex `index`: the average of the
/// incoming and outgoing directions. Zero-length segments are skipped;
/// `None` when every neighbour coincides with the vertex.
pub fn vertex_tangent(points: &[Point2], index: usize) -> Option<Point2> {
    if index >= points.len() {
        return None;
    }
    let incoming = walk_direction(points, index, false);
    let outgoing = walk_direction(points, index, true);
    match (incoming, outgoing) {
        (Some(a), Some(b)) => normalize_2d(add_2d(a, b)).or(Some(b)),
        (a, b) => a.or(b),
    }
}

/// Tangent at a location: the direction of its segment, or the vertex
/// tangent when the segment has zero length.
pub fn tangent_at(points: &[Point2], location: &PathLocation, closed: bool) -> Option<Point2> {
    if points.len() < 2 {
        return None;
    }
    let start = points[location.index];
    let end = segment_end(points, location.index, closed);
    normalize_2d(sub_2d(end, start)).or_else(|| vertex_tangent(points, location.index.min(points.len() - 1)))
}

/// Intersections of `path` with `other`, sorted by offset along `path`.
/// Crossings closer than EPSILON along `path` (a shared vertex of two
/// segments) are reported once.
pub fn intersections(path: &[Point2], path_closed: bool, other: &[Point2], other_closed: bool) -> Vec<PathLocation> {
    let mut found = Vec::new();
    let n = segment_count(path, path_closed);
    let m = segment_count(other, other_closed);

    let mut offset = 0.0;
    for i in 0..n {
        let a1 = path[i];
        let a2 = segment_end(path, i, path_closed);
        let seg_len = distance(a1, a2);
        for j in 0..m {
            let b1 = other[j];
            let b2 = segment_end(other, j, other_closed);
            if let Some((point, t, _)) = segment_intersection(a1, a2, b1, b2) {
                found.push(PathLocation { index: i, t, point, offset: offset + t * seg_len });
            }
        }
        offset += seg_len;
    }

    found.sort_by(|a, b| a.offset.total_cmp(&b.offset));
    found.dedup_by(|a, b| (a.offset - b.offset).abs() < EPSILON && points_equal(a.point, b.point));
    found
}

/// Whether the two paths touch anywhere along their outlines.
pub fn paths_intersect(path: &[Point2], path_closed: bool, other: &[Point2], other_closed: bool) -> bool {
    let n = segment_count(path, path_closed);
    let m = segment_count(other, other_closed);
    (0..n).any(|i| {
        let a1 = path[i];
        let a2 = segment_end(path, i, path_closed);
        (0..m).any(|j| segment_intersection(a1, a2, other[j], segment_end(other, j, other_closed)).is_some())
    })
}

/// Vertices of the open polyline between two locations, both included as
/// end points. `None` bounds mean the polyline start/end.
pub fn slice(points: &[Point2], from: Option<&PathLocation>, to: Option<&PathLocation>) -> Vec<Point2> {
    let mut out: Vec<Point2> = Vec::new();
    let push = |out: &mut Vec<Point2>, p: Point2| {
        if out.last().map_or(true, |last| !points_equal(*last, p)) {
            out.push(p);
        }
    };

    let first_vertex = match from {
        Some(loc) => {
            push(&mut out, loc.point);
            loc.index + 1
        }
        None => 0,
    };
    let last_vertex = match to {
        Some(loc) => loc.index,
        None => points.len().saturating_sub(1),
    };

    for p in points.iter().take(last_vertex + 1).skip(first_vertex) {
        push(&mut out, *p);
    }
    if let Some(loc) = to {
        push(&mut out, loc.point);
    }
    out
}

/// Closest location on the path to `point`.
pub fn nearest_location(points: &[Point2], closed: bool, point: Point2) -> Option<PathLocation> {
    if points.len() == 1 {
        return Some(PathLocation { index: 0, t: 0.0, point: points[0], offset: 0.0 });
    }

    let mut best: Option<(f64, PathLocation)> = None;
    let mut offset = 0.0;
    for i in 0..segment_count(points, closed) {
        let a = points[i];
        let b = segment_end(points, i, closed);
        let (p, t) = closest_point_on_segment(a, b, point);
        let d = distance_squared(p, point);
        let seg_len = distance(a, b);
        if best.as_ref().map_or(true, |(bd, _)| d < *bd) {
            best = Some((d, PathLocation { index: i, t, point: p, offset: offset + t * seg_len }));
        }
        offset += seg_len;
    }
    best.map(|(_, loc)| loc)
}

/// Index of the vertex closest to `point`.
pub fn nearest_vertex(points: &[Point2], point: Point2) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .min_by(|a, b| distance_squared(*a.1, point).total_cmp(&distance_squared(*b.1, point)))
        .map(|(i, _)| i)
}

/// Hit-test a path: vertices win over the outline, the outline over the
/// fill of a closed path.
pub fn hit_test(points: &[Point2], closed: bool, point: Point2, tolerance: f64) -> Option<PathHit> {
    let tol_sq = tolerance * tolerance;
    if let Some(i) = nearest_vertex(points, point) {
        if distance_squared(points[i], point) <= tol_sq {
            return Some(PathHit::Vertex(i));
        }
    }
    if let Some(loc) = nearest_location(points, closed, point) {
        if distance_squared(loc.point, point) <= tol_sq {
            return Some(PathHit::Stroke(loc));
        }
    }
    if closed && point_in_polygon(point, points) {
        return Some(PathHit::Fill);
    }
    None
}

/// Insert the location's point as a new vertex; returns its index.
pub fn insert_vertex(points: &mut Vec<Point2>, location: &PathLocation) -> usize {
    if location.t <= EPSILON {
        return location.index;
    }
    if location.t >= 1.0 - EPSILON && location.index + 1 < points.len() {
        return location.index + 1;
    }
    points.insert(location.index + 1, location.point);
    location.index + 1
}

/// Drop consecutive duplicate vertices.
pub fn dedup_points(points: &mut Vec<Point2>) {
    points.dedup_by(|a, b| points_equal(*a, *b));
}
