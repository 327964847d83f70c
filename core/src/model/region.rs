use super::EntityId;
use crate::geometry::{point_in_polygon, polygon_area, Bounds, Point2};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A closed polygon annotating a zone of the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: EntityId,
    pub context: Option<Value>,
    pub order: usize,
    pub polygon: Vec<Point2>,
    pub region_type: Option<String>,
    pub selected: bool,
}

impl Region {
    pub fn new(id: EntityId, polygon: Vec<Point2>) -> Self {
        Self {
            id,
            context: None,
            order: 0,
            polygon,
            region_type: None,
            selected: false,
        }
    }

    pub fn area(&self) -> f64 {
        polygon_area(&self.polygon)
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::of(&self.polygon)
    }

    pub fn contains(&self, point: Point2) -> bool {
        point_in_polygon(point, &self.polygon)
    }
}
