//! Geometry kernel used by the editor: points, polylines, closed polygons,
//! intersections and boolean operations. Everything here is a pure function
//! over `[f64; 2]` point arrays.

pub mod utils_2d;
pub use utils_2d::*;

pub mod polyline;
pub use polyline::{PathHit, PathLocation};

pub mod boolean;

/// A 2D point in image pixel coordinates (y grows downwards).
pub type Point2 = [f64; 2];

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point2,
    pub max: Point2,
}

impl Bounds {
    /// Bounds spanned by two arbitrary corners.
    pub fn from_corners(a: Point2, b: Point2) -> Self {
        Self {
            min: [a[0].min(b[0]), a[1].min(b[1])],
            max: [a[0].max(b[0]), a[1].max(b[1])],
        }
    }

    /// Bounds of a point set, `None` when the set is empty.
    pub fn of(points: &[Point2]) -> Option<Self> {
        let first = *points.first()?;
        let mut bounds = Self { min: first, max: first };
        for p in &points[1..] {
            bounds.min[0] = bounds.min[0].min(p[0]);
            bounds.min[1] = bounds.min[1].min(p[1]);
            bounds.max[0] = bounds.max[0].max(p[0]);
            bounds.max[1] = bounds.max[1].max(p[1]);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    pub fn center(&self) -> Point2 {
        midpoint(self.min, self.max)
    }

    pub fn contains(&self, p: Point2) -> bool {
        p[0] >= self.min[0] && p[0] <= self.max[0] && p[1] >= self.min[1] && p[1] <= self.max[1]
    }

    /// Clamp a point into the box.
    pub fn clamp(&self, p: Point2) -> Point2 {
        [
            p[0].clamp(self.min[0], self.max[0]),
            p[1].clamp(self.min[1], self.max[1]),
        ]
    }

    /// The box as a closed clockwise (screen) rectangle polygon.
    pub fn to_polygon(&self) -> Vec<Point2> {
        vec![
            self.min,
            [self.max[0], self.min[1]],
            self.max,
            [self.min[0], self.max[1]],
        ]
    }
}
