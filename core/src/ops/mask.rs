//! Mask synthesis: deriving a closed text-mask polygon from a baseline,
//! and the line-height measures derived from masks.
//!
//! A synthesized mask has exactly two vertices per baseline vertex: the
//! upper offset of vertex `i` sits at index `i`, the lower offset at the
//! mirrored index `2n - 1 - i`, so the polygon walks forward along the top
//! edge and back along the bottom edge. Single baseline vertices can then be
//! inserted, moved or removed by touching only their pair. The pair
//! operations rely on that layout, so callers only use them on masks the
//! engine synthesized itself and has not cut, merged or reversed since.

use crate::geometry::polyline::{polyline_length, vertex_tangent};
use crate::geometry::{add_2d, polygon_area, scale_2d, Bounds, Point2, EPSILON};
use crate::model::Line;

/// Unit normal of a baseline tangent, canonicalised to point to the upper
/// side of the text. The raw normal of a leftward-running baseline points
/// down the page and is flipped; a vertical baseline gets a rightward normal.
pub fn canonical_normal(tangent: Point2) -> Point2 {
    let n = [tangent[1], -tangent[0]];
    if n[1] > 0.0 || (n[1] == 0.0 && n[0] < 0.0) {
        [-n[0], -n[1]]
    } else {
        n
    }
}

/// Canonical normals of every baseline vertex. Vertices without a tangent
/// (all neighbours coincide) borrow the normal of the closest vertex that
/// has one. `None` when no vertex has a tangent.
pub fn baseline_normals(baseline: &[Point2]) -> Option<Vec<Point2>> {
    let raw: Vec<Option<Point2>> = (0..baseline.len())
        .map(|i| vertex_tangent(baseline, i).map(canonical_normal))
        .collect();
    if raw.iter().all(Option::is_none) {
        return None;
    }

    let normals = (0..raw.len())
        .map(|i| {
            raw[i].unwrap_or_else(|| {
                (1..raw.len())
                    .find_map(|d| {
                        let before = i.checked_sub(d).and_then(|j| raw[j]);
                        let after = raw.get(i + d).copied().flatten();
                        before.or(after)
                    })
                    .unwrap_or([0.0, -1.0])
            })
        })
        .collect();
    Some(normals)
}

/// Upper and lower offset points of a baseline vertex.
pub fn offset_pair(point: Point2, normal: Point2, upper: f64, lower: f64) -> (Point2, Point2) {
    (add_2d(point, scale_2d(normal, upper)), add_2d(point, scale_2d(normal, -lower)))
}

/// Build the mask of a baseline.
///
/// `fallback_height` sizes the box drawn around a baseline that has no
/// direction (a single point, or points that all coincide).
pub fn synthesize_mask(baseline: &[Point2], upper: f64, lower: f64, fallback_height: f64) -> Option<Vec<Point2>> {
    let first = *baseline.first()?;
    let Some(normals) = baseline_normals(baseline) else {
        return Some(point_box(first, upper, lower, fallback_height));
    };

    let mut mask: Vec<Point2> = Vec::with_capacity(baseline.len() * 2);
    for (i, (point, normal)) in baseline.iter().zip(normals).enumerate() {
        let (up, down) = offset_pair(*point, normal, upper, lower);
        mask.insert(i, up);
        let mirrored = mask.len() - i;
        mask.insert(mirrored, down);
    }
    Some(mask)
}

/// Box of height `height` centred horizontally on `point`, split between
/// the upper and lower side in the configured proportion.
fn point_box(point: Point2, upper: f64, lower: f64, height: f64) -> Vec<Point2> {
    let total = upper + lower;
    let up_share = if total > EPSILON { upper / total } else { 0.5 };
    let top = point[1] - height * up_share;
    let bottom = point[1] + height * (1.0 - up_share);
    let half = height / 2.0;
    vec![
        [point[0] - half, top],
        [point[0] + half, top],
        [point[0] + half, bottom],
        [point[0] - half, bottom],
    ]
}

/// Whether `mask` carries one upper/lower pair per baseline vertex.
pub fn is_paired(mask: &[Point2], baseline: &[Point2]) -> bool {
    !baseline.is_empty() && mask.len() == baseline.len() * 2
}

/// Mirrored index of the pair partner of `index`.
fn partner(mask_len: usize, index: usize) -> usize {
    mask_len - 1 - index
}

/// Insert the pair for a vertex just inserted at `index` of `baseline`
/// (which already contains it).
pub fn insert_pair(mask: &mut Vec<Point2>, baseline: &[Point2], index: usize, upper: f64, lower: f64) -> bool {
    if mask.len() + 2 != baseline.len() * 2 || index >= baseline.len() {
        return false;
    }
    let Some(normals) = baseline_normals(baseline) else {
        return false;
    };
    let (up, down) = offset_pair(baseline[index], normals[index], upper, lower);
    mask.insert(index, up);
    let mirrored = mask.len() - index;
    mask.insert(mirrored, down);
    true
}

/// Remove the pair of the baseline vertex `index`. `baseline_len` is the
/// baseline length before the vertex was removed.
pub fn remove_pair(mask: &mut Vec<Point2>, baseline_len: usize, index: usize) -> bool {
    if mask.len() != baseline_len * 2 || index >= baseline_len {
        return false;
    }
    let back = partner(mask.len(), index);
    mask.remove(back);
    mask.remove(index);
    true
}

/// Recompute the pairs of vertex `index` and its neighbours (whose normals
/// depend on it) after the vertex moved.
pub fn refresh_pairs(mask: &mut [Point2], baseline: &[Point2], index: usize, upper: f64, lower: f64) -> bool {
    if !is_paired(mask, baseline) || index >= baseline.len() {
        return false;
    }
    let Some(normals) = baseline_normals(baseline) else {
        return false;
    };

    let from = index.saturating_sub(1);
    let to = (index + 1).min(baseline.len() - 1);
    for i in from..=to {
        let (up, down) = offset_pair(baseline[i], normals[i], upper, lower);
        let back = partner(mask.len(), i);
        mask[i] = up;
        mask[back] = down;
    }
    true
}

/// Height of one line: mask area over baseline length when both exist,
/// otherwise the mask's bounding-box height.
pub fn line_height(baseline: Option<&[Point2]>, mask: Option<&[Point2]>) -> Option<f64> {
    let mask = mask.filter(|m| m.len() >= 3)?;
    let length = baseline.map_or(0.0, polyline_length);
    let height = if length > EPSILON {
        polygon_area(mask) / length
    } else {
        Bounds::of(mask)?.height()
    };
    (height > EPSILON && height.is_finite()).then_some(height)
}

/// Cached average line height over the document. Any baseline or mask
/// change must call [`LineHeights::invalidate`].
#[derive(Debug, Clone, Default)]
pub struct LineHeights {
    average: Option<Option<f64>>,
}

impl LineHeights {
    pub fn invalidate(&mut self) {
        self.average = None;
    }

    /// Average height over every line with a computable height.
    pub fn average<'a>(&mut self, lines: impl Iterator<Item = &'a Line>) -> Option<f64> {
        if let Some(cached) = self.average {
            return cached;
        }
        let heights: Vec<f64> = lines
            .filter_map(|l| line_height(l.baseline.as_deref(), l.mask.as_deref()))
            .collect();
        let average = if heights.is_empty() {
            None
        } else {
            Some(heights.iter().sum::<f64>() / heights.len() as f64)
        };
        self.average = Some(average);
        average
    }

    /// Height of `line`, falling back to the document average.
    pub fn height_of<'a>(&mut self, line: &Line, lines: impl Iterator<Item = &'a Line>) -> Option<f64> {
        line_height(line.baseline.as_deref(), line.mask.as_deref()).or_else(|| self.average(lines))
    }
}
