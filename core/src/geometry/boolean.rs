//! Boolean operations on simple polygons.
//!
//! Works on the planar arrangement of the two outlines:
//! 1. Split every edge of both polygons at their mutual intersections
//! 2. Classify each piece by whether its midpoint lies inside the other polygon
//! 3. Keep the pieces bounding the result, directed so the result is on their left
//! 4. Chain pieces into closed loops, taking the tightest turn at shared vertices
//!
//! Results are outer loops only. A hole (the clip strictly inside the
//! subject) cannot be expressed as a simple polygon and is dropped.

use super::utils_2d::*;
use super::Point2;
use std::collections::HashMap;
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Subtract,
    Intersect,
}

#[derive(Debug, Clone)]
struct Piece {
    start: Point2,
    end: Point2,
    used: bool,
}

type VertexKey = (i64, i64);

fn vertex_key(p: Point2) -> VertexKey {
    ((p[0] * 1e6).round() as i64, (p[1] * 1e6).round() as i64)
}

/// `subject - clip`. Fragments are returned largest first, wound like the
/// subject.
pub fn subtract(subject: &[Point2], clip: &[Point2]) -> Vec<Vec<Point2>> {
    run(subject, clip, Op::Subtract)
}

/// `subject ∩ clip`. Fragments are returned largest first, wound like the
/// subject.
pub fn intersect(subject: &[Point2], clip: &[Point2]) -> Vec<Vec<Point2>> {
    run(subject, clip, Op::Intersect)
}

fn oriented(points: &[Point2]) -> Vec<Point2> {
    let mut out = points.to_vec();
    out.dedup_by(|a, b| points_equal(*a, *b));
    if out.len() > 1 && points_equal(out[0], out[out.len() - 1]) {
        out.pop();
    }
    if polygon_signed_area(&out) < 0.0 {
        out.reverse();
    }
    out
}

fn run(subject: &[Point2], clip: &[Point2], op: Op) -> Vec<Vec<Point2>> {
    let a = oriented(subject);
    let b = oriented(clip);
    let subject_negative = polygon_signed_area(subject) < 0.0;

    if polygon_area(&a) < EPSILON {
        return Vec::new();
    }
    if polygon_area(&b) < EPSILON {
        return match op {
            Op::Subtract => vec![subject.to_vec()],
            Op::Intersect => Vec::new(),
        };
    }

    let (a_cuts, b_cuts) = edge_cuts(&a, &b);
    let crossed = a_cuts.iter().any(|c| c.len() > 2) || b_cuts.iter().any(|c| c.len() > 2);

    let mut result = if crossed {
        let pieces = collect_pieces(&a, &a_cuts, &b, &b_cuts, op);
        chain_loops(pieces)
    } else {
        disjoint_case(&a, &b, op)
    };

    result.retain(|poly| poly.len() >= 3 && polygon_signed_area(poly) > EPSILON);
    result.sort_by(|p, q| polygon_area(q).total_cmp(&polygon_area(p)));
    if subject_negative {
        for poly in &mut result {
            poly.reverse();
        }
    }
    result
}

/// Outlines that never cross: one contains the other or they are apart.
fn disjoint_case(a: &[Point2], b: &[Point2], op: Op) -> Vec<Vec<Point2>> {
    let a_in_b = a.iter().all(|p| point_in_polygon(*p, b));
    let b_in_a = b.iter().all(|p| point_in_polygon(*p, a));
    match op {
        Op::Subtract if a_in_b => Vec::new(),
        Op::Subtract => vec![a.to_vec()],
        Op::Intersect if a_in_b => vec![a.to_vec()],
        Op::Intersect if b_in_a => vec![b.to_vec()],
        Op::Intersect => Vec::new(),
    }
}

/// For each edge of both polygons, the sorted list of `(t, point)` cut
/// positions including both end points.
fn edge_cuts(a: &[Point2], b: &[Point2]) -> (Vec<Vec<(f64, Point2)>>, Vec<Vec<(f64, Point2)>>) {
    let n = a.len();
    let m = b.len();
    let mut a_cuts: Vec<Vec<(f64, Point2)>> = (0..n).map(|i| vec![(0.0, a[i]), (1.0, a[(i + 1) % n])]).collect();
    let mut b_cuts: Vec<Vec<(f64, Point2)>> = (0..m).map(|j| vec![(0.0, b[j]), (1.0, b[(j + 1) % m])]).collect();

    for i in 0..n {
        let (a1, a2) = (a[i], a[(i + 1) % n]);
        for j in 0..m {
            let (b1, b2) = (b[j], b[(j + 1) % m]);
            if let Some((p, t, u)) = segment_intersection(a1, a2, b1, b2) {
                a_cuts[i].push((t, p));
                b_cuts[j].push((u, p));
            }
        }
    }

    for cuts in a_cuts.iter_mut().chain(b_cuts.iter_mut()) {
        cuts.sort_by(|x, y| x.0.total_cmp(&y.0));
        cuts.dedup_by(|x, y| vertex_key(x.1) == vertex_key(y.1));
    }
    (a_cuts, b_cuts)
}

fn collect_pieces(
    a: &[Point2],
    a_cuts: &[Vec<(f64, Point2)>],
    b: &[Point2],
    b_cuts: &[Vec<(f64, Point2)>],
    op: Op,
) -> Vec<Piece> {
    let mut pieces = Vec::new();

    for cuts in a_cuts {
        for w in cuts.windows(2) {
            let (s, e) = (w[0].1, w[1].1);
            if vertex_key(s) == vertex_key(e) {
                continue;
            }
            let inside = point_in_polygon(midpoint(s, e), b);
            let keep = match op {
                Op::Subtract => !inside,
                Op::Intersect => inside,
            };
            if keep {
                pieces.push(Piece { start: s, end: e, used: false });
            }
        }
    }

    for cuts in b_cuts {
        for w in cuts.windows(2) {
            let (s, e) = (w[0].1, w[1].1);
            if vertex_key(s) == vertex_key(e) {
                continue;
            }
            if !point_in_polygon(midpoint(s, e), a) {
                continue;
            }
            match op {
                Op::Subtract => pieces.push(Piece { start: e, end: s, used: false }),
                Op::Intersect => pieces.push(Piece { start: s, end: e, used: false }),
            }
        }
    }

    pieces
}

/// Clockwise angle from `from` to `to`, in `(0, 2π]`.
fn clockwise_angle(from: Point2, to: Point2) -> f64 {
    let angle = cross_2d(to, from).atan2(dot_2d(to, from));
    let angle = if angle < 0.0 { angle + 2.0 * PI } else { angle };
    if angle < EPSILON {
        2.0 * PI
    } else {
        angle
    }
}

fn chain_loops(mut pieces: Vec<Piece>) -> Vec<Vec<Point2>> {
    let mut outgoing: HashMap<VertexKey, Vec<usize>> = HashMap::new();
    for (i, piece) in pieces.iter().enumerate() {
        outgoing.entry(vertex_key(piece.start)).or_default().push(i);
    }

    let mut loops = Vec::new();
    for first in 0..pieces.len() {
        if pieces[first].used {
            continue;
        }

        let mut ring = Vec::new();
        let mut current = first;
        let start_key = vertex_key(pieces[first].start);
        let closed = loop {
            pieces[current].used = true;
            ring.push(pieces[current].start);

            let end = pieces[current].end;
            if vertex_key(end) == start_key {
                break true;
            }

            let back = sub_2d(pieces[current].start, end);
            let next = outgoing.get(&vertex_key(end)).and_then(|candidates| {
                candidates
                    .iter()
                    .copied()
                    .filter(|&c| !pieces[c].used)
                    .min_by(|&x, &y| {
                        let ax = clockwise_angle(back, sub_2d(pieces[x].end, pieces[x].start));
                        let ay = clockwise_angle(back, sub_2d(pieces[y].end, pieces[y].start));
                        ax.total_cmp(&ay)
                    })
            });

            match next {
                Some(n) => current = n,
                None => break false,
            }
        };

        if closed {
            loops.push(ring);
        }
    }
    loops
}
