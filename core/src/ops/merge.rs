//! Joining lines into one.

use crate::geometry::polyline::{dedup_points, nearest_vertex};
use crate::geometry::{distance, polygon_interior_point, polygon_signed_area, Point2};
use crate::model::{EntityId, Line};

/// Order in which selected lines are folded together: by bounding-box
/// centre x, descending when most of them run right to left.
pub fn merge_order(lines: &[&Line]) -> Vec<EntityId> {
    let leftwards = lines.iter().filter(|l| l.trends_leftwards()).count();
    let descending = leftwards * 2 > lines.len();

    let mut keyed: Vec<(f64, EntityId)> = lines
        .iter()
        .map(|l| (l.bounds().map_or(0.0, |b| b.center()[0]), l.id))
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    if descending {
        keyed.reverse();
    }
    keyed.into_iter().map(|(_, id)| id).collect()
}

/// Join two baselines. When their closest endpoints are within `tolerance`
/// the baselines are joined at those ends (flipping `second` if needed),
/// otherwise `second` is appended after `first`. No endpoint is lost; a
/// junction where both ends coincide keeps a single point.
pub fn join_baselines(first: &[Point2], second: &[Point2], tolerance: f64) -> Vec<Point2> {
    let (Some(&a0), Some(&a1), Some(&b0), Some(&b1)) = (first.first(), first.last(), second.first(), second.last())
    else {
        return first.iter().chain(second).copied().collect();
    };

    let reversed = || second.iter().rev().copied();
    let candidates = [
        (distance(a1, b0), 0),
        (distance(a1, b1), 1),
        (distance(a0, b1), 2),
        (distance(a0, b0), 3),
    ];
    let (gap, case) = candidates
        .into_iter()
        .min_by(|x, y| x.0.total_cmp(&y.0))
        .unwrap_or((f64::INFINITY, 0));

    let mut joined: Vec<Point2> = if gap > tolerance {
        first.iter().chain(second).copied().collect()
    } else {
        match case {
            0 => first.iter().chain(second).copied().collect(),
            1 => first.iter().copied().chain(reversed()).collect(),
            2 => second.iter().chain(first).copied().collect(),
            _ => reversed().chain(first.iter().copied()).collect(),
        }
    };
    dedup_points(&mut joined);
    joined
}

/// Insert the outline of `second` into `first` after the vertex of `first`
/// nearest the interior of `second`. The inserted outline starts at its
/// vertex nearest that insertion vertex and follows the winding of `first`.
pub fn join_masks(first: &[Point2], second: &[Point2]) -> Vec<Point2> {
    if first.is_empty() {
        return second.to_vec();
    }
    if second.is_empty() {
        return first.to_vec();
    }

    let probe = polygon_interior_point(second);
    let at = nearest_vertex(first, probe).unwrap_or(0);

    let mut inserted = second.to_vec();
    if (polygon_signed_area(first) < 0.0) != (polygon_signed_area(second) < 0.0) {
        inserted.reverse();
    }
    let start = nearest_vertex(&inserted, first[at]).unwrap_or(0);
    inserted.rotate_left(start);

    let mut joined = Vec::with_capacity(first.len() + inserted.len());
    joined.extend_from_slice(&first[..=at]);
    joined.extend(inserted);
    joined.extend_from_slice(&first[at + 1..]);
    dedup_points(&mut joined);
    joined
}

/// Tolerance for joining two lines: the distance between their interior
/// points.
pub fn join_tolerance(first: &Line, second: &Line) -> f64 {
    match (first.reference_point(), second.reference_point()) {
        (Some(a), Some(b)) => distance(a, b),
        _ => 0.0,
    }
}

/// Geometry of `first` after absorbing `second`.
pub fn merge_geometry(first: &Line, second: &Line) -> (Option<Vec<Point2>>, Option<Vec<Point2>>) {
    let tolerance = join_tolerance(first, second);
    let baseline = match (first.baseline.as_deref(), second.baseline.as_deref()) {
        (Some(a), Some(b)) => Some(join_baselines(a, b, tolerance)),
        (a, b) => a.or(b).map(<[Point2]>::to_vec),
    };
    let mask = match (first.mask.as_deref(), second.mask.as_deref()) {
        (Some(a), Some(b)) => Some(join_masks(a, b)),
        (a, b) => a.or(b).map(<[Point2]>::to_vec),
    };
    (baseline, mask)
}
