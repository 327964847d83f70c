use super::{EntityId, PathKind, TextDirection};
use crate::geometry::polyline::{self, vertex_tangent};
use crate::geometry::{scale_2d, Bounds, Point2};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Geometry derived from a line for display: the reading-direction hint at
/// the anchor end of the baseline and the position of the order badge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decorations {
    /// Reading-order anchor (baseline start for LTR, end for RTL).
    pub anchor: Point2,
    /// Unit direction of reading at the anchor, `None` for a mask-only or
    /// single-point line.
    pub direction: Option<Point2>,
    /// Length of the direction hint.
    pub hint_size: f64,
    /// Where the order badge is drawn.
    pub badge: Point2,
}

/// A text line: a baseline polyline and/or a closed mask polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id: EntityId,
    /// Opaque host identifier; `None` until the host confirms creation.
    pub context: Option<Value>,
    pub order: usize,
    pub baseline: Option<Vec<Point2>>,
    pub mask: Option<Vec<Point2>>,
    /// The mask was synthesized from the baseline and still has one
    /// upper/lower vertex pair per baseline vertex.
    pub mask_derived: bool,
    /// Owning region, looked up in the region store.
    pub region: Option<EntityId>,
    pub line_type: Option<String>,
    pub text_direction: TextDirection,
    pub selected: bool,
    pub decorations: Option<Decorations>,
}

impl Line {
    pub fn new(id: EntityId, baseline: Option<Vec<Point2>>, mask: Option<Vec<Point2>>) -> Self {
        Self {
            id,
            context: None,
            order: 0,
            baseline: baseline.filter(|b| !b.is_empty()),
            mask: mask.filter(|m| !m.is_empty()),
            mask_derived: false,
            region: None,
            line_type: None,
            text_direction: TextDirection::default(),
            selected: false,
            decorations: None,
        }
    }

    /// At least one of baseline and mask is present.
    pub fn has_geometry(&self) -> bool {
        self.baseline.as_ref().is_some_and(|b| !b.is_empty()) || self.mask.as_ref().is_some_and(|m| !m.is_empty())
    }

    pub fn path(&self, kind: PathKind) -> Option<&Vec<Point2>> {
        match kind {
            PathKind::Baseline => self.baseline.as_ref(),
            PathKind::Mask => self.mask.as_ref(),
            PathKind::Polygon => None,
        }
    }

    pub fn path_mut(&mut self, kind: PathKind) -> Option<&mut Vec<Point2>> {
        match kind {
            PathKind::Baseline => self.baseline.as_mut(),
            PathKind::Mask => self.mask.as_mut(),
            PathKind::Polygon => None,
        }
    }

    /// Bounds of every point of the line.
    pub fn bounds(&self) -> Option<Bounds> {
        let points: Vec<Point2> = self
            .baseline
            .iter()
            .chain(self.mask.iter())
            .flat_map(|p| p.iter().copied())
            .collect();
        Bounds::of(&points)
    }

    /// Midpoint of the baseline by length, or the mask centre for a
    /// mask-only line.
    pub fn reference_point(&self) -> Option<Point2> {
        match &self.baseline {
            Some(b) if !b.is_empty() => polyline::polyline_midpoint(b),
            _ => self.mask.as_deref().and_then(Bounds::of).map(|b| b.center()),
        }
    }

    /// Flip the baseline in place.
    pub fn reverse(&mut self) {
        if let Some(baseline) = self.baseline.as_mut() {
            baseline.reverse();
        }
    }

    /// Whether the baseline, end to end, runs leftwards.
    pub fn trends_leftwards(&self) -> bool {
        match self.baseline.as_deref() {
            Some([first, .., last]) => last[0] < first[0],
            _ => false,
        }
    }

    /// Recompute the direction hint and order badge for the given line height.
    pub fn derive_decorations(&mut self, line_height: f64) {
        let hint_size = (line_height / 2.0).max(1.0);
        self.decorations = match self.baseline.as_deref() {
            Some(baseline) if !baseline.is_empty() => {
                let (index, sign) = match self.text_direction {
                    TextDirection::Ltr => (0, 1.0),
                    TextDirection::Rtl => (baseline.len() - 1, -1.0),
                };
                let anchor = baseline[index];
                let direction = vertex_tangent(baseline, index).map(|t| scale_2d(t, sign));
                Some(Decorations { anchor, direction, hint_size, badge: anchor })
            }
            _ => self.mask.as_deref().and_then(Bounds::of).map(|b| {
                let anchor = match self.text_direction {
                    TextDirection::Ltr => b.min,
                    TextDirection::Rtl => [b.max[0], b.min[1]],
                };
                Decorations { anchor, direction: None, hint_size, badge: anchor }
            }),
        };
    }
}
