//! 2D point, vector, segment and polygon primitives.
//!
//! These are the building blocks reused by the polyline queries, the
//! boolean operations and the editing algorithms.

use super::Point2;

/// Tolerance for floating-point comparisons
pub const EPSILON: f64 = 1e-6;

// =============================================================================
// Point Operations
// =============================================================================

/// Same point up to `EPSILON` per axis.
#[inline]
pub fn points_equal(a: Point2, b: Point2) -> bool {
    let d = sub_2d(a, b);
    d[0].abs() < EPSILON && d[1].abs() < EPSILON
}

#[inline]
pub fn distance_squared(a: Point2, b: Point2) -> f64 {
    let d = sub_2d(b, a);
    dot_2d(d, d)
}

#[inline]
pub fn distance(a: Point2, b: Point2) -> f64 {
    length_2d(sub_2d(b, a))
}

/// Point at parameter `t` on the segment from `a` to `b`.
#[inline]
pub fn lerp(a: Point2, b: Point2, t: f64) -> Point2 {
    add_2d(a, scale_2d(sub_2d(b, a), t))
}

#[inline]
pub fn midpoint(a: Point2, b: Point2) -> Point2 {
    [(a[0] + b[0]) * 0.5, (a[1] + b[1]) * 0.5]
}

// =============================================================================
// Vector Operations
// =============================================================================

#[inline]
pub fn add_2d(a: [f64; 2], b: [f64; 2]) -> [f64; 2] {
    [a[0] + b[0], a[1] + b[1]]
}

#[inline]
pub fn sub_2d(a: [f64; 2], b: [f64; 2]) -> [f64; 2] {
    [a[0] - b[0], a[1] - b[1]]
}

#[inline]
pub fn scale_2d(v: [f64; 2], s: f64) -> [f64; 2] {
    [v[0] * s, v[1] * s]
}

/// 2D cross product (determinant of the two vectors).
/// Positive if v2 is counter-clockwise from v1 in a y-up frame.
#[inline]
pub fn cross_2d(v1: [f64; 2], v2: [f64; 2]) -> f64 {
    v1[0] * v2[1] - v1[1] * v2[0]
}

#[inline]
pub fn dot_2d(v1: [f64; 2], v2: [f64; 2]) -> f64 {
    v1[0] * v2[0] + v1[1] * v2[1]
}

#[inline]
pub fn length_2d(v: [f64; 2]) -> f64 {
    (v[0] * v[0] + v[1] * v[1]).sqrt()
}

/// Normalize a 2D vector. Returns `None` for a zero vector so callers can
/// skip degenerate directions instead of producing NaN.
#[inline]
pub fn normalize_2d(v: [f64; 2]) -> Option<[f64; 2]> {
    let len = length_2d(v);
    if len < EPSILON || !len.is_finite() {
        None
    } else {
        Some([v[0] / len, v[1] / len])
    }
}

// =============================================================================
// Line Segment Operations
// =============================================================================

/// Parameter t where `point` projects onto the line through `start`/`end`.
pub fn project_point_on_line(start: [f64; 2], end: [f64; 2], point: [f64; 2]) -> f64 {
    let d = sub_2d(end, start);
    let len_sq = dot_2d(d, d);
    if len_sq < EPSILON * EPSILON {
        return 0.0;
    }
    dot_2d(sub_2d(point, start), d) / len_sq
}

/// Closest point on a segment, with its clamped parameter.
pub fn closest_point_on_segment(start: [f64; 2], end: [f64; 2], point: [f64; 2]) -> ([f64; 2], f64) {
    let t = project_point_on_line(start, end, point).clamp(0.0, 1.0);
    (lerp(start, end, t), t)
}

/// Intersection of two segments, returned with the parameters on each
/// segment: `(point, t, u)` with `point = s1 + t (e1 - s1) = s2 + u (e2 - s2)`.
/// Parallel and collinear segments report no intersection.
pub fn segment_intersection(
    s1: [f64; 2],
    e1: [f64; 2],
    s2: [f64; 2],
    e2: [f64; 2],
) -> Option<([f64; 2], f64, f64)> {
    let d1 = sub_2d(e1, s1);
    let d2 = sub_2d(e2, s2);

    let denom = cross_2d(d1, d2);
    if denom.abs() < EPSILON * EPSILON {
        return None;
    }

    let w = sub_2d(s2, s1);
    let t = cross_2d(w, d2) / denom;
    let u = cross_2d(w, d1) / denom;

    let tol = 1e-9;
    if t >= -tol && t <= 1.0 + tol && u >= -tol && u <= 1.0 + tol {
        let t = t.clamp(0.0, 1.0);
        Some((lerp(s1, e1, t), t, u.clamp(0.0, 1.0)))
    } else {
        None
    }
}

// =============================================================================
// Polygon Operations
// =============================================================================

/// Signed area using the Shoelace formula.
/// Positive = CCW in a y-up frame (clockwise on screen).
pub fn polygon_signed_area(vertices: &[[f64; 2]]) -> f64 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += vertices[i][0] * vertices[j][1];
        area -= vertices[j][0] * vertices[i][1];
    }
    area / 2.0
}

pub fn polygon_area(vertices: &[[f64; 2]]) -> f64 {
    polygon_signed_area(vertices).abs()
}

/// Area centroid of a polygon; degenerate polygons fall back to the vertex
/// average.
pub fn polygon_centroid(vertices: &[[f64; 2]]) -> [f64; 2] {
    let n = vertices.len();
    match n {
        0 => return [0.0, 0.0],
        1 => return vertices[0],
        2 => return midpoint(vertices[0], vertices[1]),
        _ => {}
    }

    let mut signed_area = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;

    for i in 0..n {
        let j = (i + 1) % n;
        let cross = vertices[i][0] * vertices[j][1] - vertices[j][0] * vertices[i][1];
        signed_area += cross;
        cx += (vertices[i][0] + vertices[j][0]) * cross;
        cy += (vertices[i][1] + vertices[j][1]) * cross;
    }

    signed_area /= 2.0;

    if signed_area.abs() > EPSILON {
        [cx / (6.0 * signed_area), cy / (6.0 * signed_area)]
    } else {
        [
            vertices.iter().map(|p| p[0]).sum::<f64>() / n as f64,
            vertices.iter().map(|p| p[1]).sum::<f64>() / n as f64,
        ]
    }
}

/// Test if a point is inside a polygon using the winding number algorithm.
/// Works for both convex and concave polygons.
pub fn point_in_polygon(point: [f64; 2], polygon: &[[f64; 2]]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut winding: i32 = 0;
    for i in 0..n {
        let p1 = polygon[i];
        let p2 = polygon[(i + 1) % n];
        let side = cross_2d(sub_2d(p2, p1), sub_2d(point, p1));

        if p1[1] <= point[1] {
            if p2[1] > point[1] && side > 0.0 {
                winding += 1;
            }
        } else if p2[1] <= point[1] && side < 0.0 {
            winding -= 1;
        }
    }

    winding != 0
}

/// A point strictly inside the polygon: the centroid when it is inside,
/// otherwise the midpoint of the widest horizontal span through the
/// vertical centre.
pub fn polygon_interior_point(polygon: &[[f64; 2]]) -> [f64; 2] {
    let centroid = polygon_centroid(polygon);
    if polygon.len() < 3 || point_in_polygon(centroid, polygon) {
        return centroid;
    }

    let y = centroid[1];
    let n = polygon.len();
    let mut xs: Vec<f64> = Vec::new();
    for i in 0..n {
        let p1 = polygon[i];
        let p2 = polygon[(i + 1) % n];
        if (p1[1] <= y && p2[1] > y) || (p2[1] <= y && p1[1] > y) {
            let t = (y - p1[1]) / (p2[1] - p1[1]);
            xs.push(p1[0] + t * (p2[0] - p1[0]));
        }
    }
    xs.sort_by(|a, b| a.total_cmp(b));

    xs.chunks_exact(2)
        .max_by(|a, b| (a[1] - a[0]).total_cmp(&(b[1] - b[0])))
        .map(|span| [(span[0] + span[1]) / 2.0, y])
        .unwrap_or(centroid)
}

// =============================================================================
// Tests
// =============================================================================
