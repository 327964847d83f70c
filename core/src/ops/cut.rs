//! Splitting lines and regions against a closed cutting path.
//!
//! A line is cut by walking its baseline crossings with the cutting path.
//! Every stretch of baseline inside the path is removed; the stretches
//! outside it become the retained line (the first one) and new lines (the
//! following ones). The mask is cut with slabs built from the baseline
//! normals at each crossing, and each mask fragment is handed to the
//! baseline stretch on whose side of the slab boundaries it lies.

use super::mask::canonical_normal;
use crate::geometry::boolean::subtract;
use crate::geometry::polyline::{self, intersections, paths_intersect, tangent_at, PathLocation};
use crate::geometry::{
    add_2d, cross_2d, point_in_polygon, polygon_area, polygon_interior_point, scale_2d, sub_2d, Bounds,
    Point2, EPSILON,
};

/// Half-width of the slab cut through a mask at a single crossing.
const THIN_SLAB: f64 = 0.5;

/// Most fragments a single slab may produce; more means the cut is
/// degenerate for this mask.
pub const MAX_FRAGMENTS: usize = 3;

/// One retained stretch of a cut line.
#[derive(Debug, Clone, PartialEq)]
pub struct LinePiece {
    pub baseline: Vec<Point2>,
    pub mask: Option<Vec<Point2>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineCut {
    /// The baseline does not cross the cutting path.
    Untouched,
    /// A slab split the mask into too many fragments.
    Rejected { fragments: usize },
    /// Pieces in baseline order; the first one stays with the original line.
    Split(Vec<LinePiece>),
}

/// How the crossings of a baseline pair up.
#[derive(Debug, Clone, Default)]
struct CutPlan {
    /// Crossing where a baseline starting inside the cut leaves it.
    leading: Option<PathLocation>,
    /// Enter/leave crossings around each removed interior stretch.
    pairs: Vec<(PathLocation, PathLocation)>,
    /// Crossing where a baseline ending inside the cut enters it.
    trailing: Option<PathLocation>,
}

impl CutPlan {
    fn new(baseline: &[Point2], cut: &[Point2]) -> Option<Self> {
        let crossings = intersections(baseline, false, cut, true);
        if crossings.is_empty() {
            return None;
        }

        let mut plan = CutPlan::default();
        let mut rest = crossings.as_slice();
        if point_in_polygon(baseline[0], cut) {
            plan.leading = Some(rest[0]);
            rest = &rest[1..];
        }
        let mut chunks = rest.chunks_exact(2);
        plan.pairs = chunks.by_ref().map(|c| (c[0], c[1])).collect();
        plan.trailing = chunks.remainder().first().copied();
        Some(plan)
    }

    /// `(from, to)` bounds of each retained stretch, in baseline order.
    fn stretches(&self) -> Vec<(Option<PathLocation>, Option<PathLocation>)> {
        let mut starts = vec![self.leading];
        starts.extend(self.pairs.iter().map(|(_, leave)| Some(*leave)));
        let mut ends: Vec<Option<PathLocation>> = self.pairs.iter().map(|(enter, _)| Some(*enter)).collect();
        ends.push(self.trailing);
        starts.into_iter().zip(ends).collect()
    }
}

/// A boundary across the baseline at a crossing: the crossing point, the
/// normal there, and the forward tangent.
#[derive(Debug, Clone, Copy)]
struct Boundary {
    point: Point2,
    normal: Point2,
    tangent: Point2,
}

impl Boundary {
    fn at(baseline: &[Point2], location: &PathLocation) -> Self {
        let tangent = tangent_at(baseline, location, false).unwrap_or([1.0, 0.0]);
        let normal = canonical_normal(tangent);
        Self { point: location.point, normal, tangent }
    }

    /// Whether `p` is on the forward side of the boundary, decided by the
    /// sign of the determinant of the normal with the offset to `p`,
    /// compared with the determinant of the normal with the tangent.
    fn is_ahead(&self, p: Point2) -> bool {
        let side = cross_2d(self.normal, sub_2d(p, self.point));
        let forward = cross_2d(self.normal, self.tangent);
        side * forward > 0.0
    }

    fn offset(&self, along: f64, across: f64) -> Point2 {
        add_2d(add_2d(self.point, scale_2d(self.tangent, along)), scale_2d(self.normal, across))
    }
}

/// Slab across the mask at a single crossing.
fn thin_slab(b: &Boundary, height: f64) -> Vec<Point2> {
    vec![
        b.offset(-THIN_SLAB, height),
        b.offset(THIN_SLAB, height),
        b.offset(THIN_SLAB, -height),
        b.offset(-THIN_SLAB, -height),
    ]
}

/// Slab between two crossings, offset to the full mask height.
fn pair_slab(enter: &Boundary, leave: &Boundary, height: f64) -> Vec<Point2> {
    vec![
        enter.offset(0.0, height),
        leave.offset(0.0, height),
        leave.offset(0.0, -height),
        enter.offset(0.0, -height),
    ]
}

/// Cut one line. `mask` is cut alongside the baseline when present.
pub fn cut_line(baseline: &[Point2], mask: Option<&[Point2]>, cut: &[Point2]) -> LineCut {
    if baseline.len() < 2 || cut.len() < 3 {
        return LineCut::Untouched;
    }
    let Some(plan) = CutPlan::new(baseline, cut) else {
        return LineCut::Untouched;
    };

    let stretches: Vec<_> = plan
        .stretches()
        .into_iter()
        .map(|(from, to)| (from, to, polyline::slice(baseline, from.as_ref(), to.as_ref())))
        .filter(|(_, _, points)| points.len() >= 2 && polyline::polyline_length(points) > EPSILON)
        .collect();
    if stretches.is_empty() {
        return LineCut::Untouched;
    }

    let boundary = |loc: &PathLocation| Boundary::at(baseline, loc);

    let fragments = match mask.filter(|m| m.len() >= 3) {
        Some(mask) => {
            let height = Bounds::of(mask).map_or(0.0, |b| b.height().max(b.width())) + 1.0;
            let mut slabs = Vec::new();
            if let Some(loc) = &plan.leading {
                slabs.push(thin_slab(&boundary(loc), height));
            }
            for (enter, leave) in &plan.pairs {
                slabs.push(pair_slab(&boundary(enter), &boundary(leave), height));
            }
            if let Some(loc) = &plan.trailing {
                slabs.push(thin_slab(&boundary(loc), height));
            }

            let mut fragments = vec![mask.to_vec()];
            for slab in &slabs {
                let mut next = Vec::new();
                for fragment in &fragments {
                    let parts = subtract(fragment, slab);
                    if parts.len() > MAX_FRAGMENTS {
                        return LineCut::Rejected { fragments: parts.len() };
                    }
                    next.extend(parts);
                }
                fragments = next;
            }
            fragments
        }
        None => Vec::new(),
    };

    let mut pieces: Vec<LinePiece> = stretches
        .iter()
        .map(|(_, _, points)| LinePiece { baseline: points.clone(), mask: None })
        .collect();

    for fragment in fragments {
        let probe = polygon_interior_point(&fragment);
        let owner = stretches.iter().position(|(from, to, _)| {
            let after_start = from.as_ref().map_or(true, |loc| boundary(loc).is_ahead(probe));
            let before_end = to.as_ref().map_or(true, |loc| !boundary(loc).is_ahead(probe));
            after_start && before_end
        });
        let Some(owner) = owner else {
            continue;
        };
        let replace = pieces[owner]
            .mask
            .as_ref()
            .map_or(true, |current| polygon_area(&fragment) > polygon_area(current));
        if replace {
            pieces[owner].mask = Some(fragment);
        }
    }

    LineCut::Split(pieces)
}

/// Cut a region polygon. `None` when the cutting path does not cross the
/// region outline or covers the region entirely; otherwise the fragments,
/// largest first.
pub fn cut_region(polygon: &[Point2], cut: &[Point2]) -> Option<Vec<Vec<Point2>>> {
    if polygon.len() < 3 || cut.len() < 3 || !paths_intersect(polygon, true, cut, true) {
        return None;
    }
    let fragments = subtract(polygon, cut);
    (!fragments.is_empty()).then_some(fragments)
}
