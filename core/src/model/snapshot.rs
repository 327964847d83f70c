//! Plain value copies of entities, as sent to the host in change
//! notifications and accepted back by `load`.

use super::{EntityId, Line, Region, TextDirection};
use crate::geometry::Point2;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Public state of a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSnapshot {
    pub id: EntityId,
    pub context: Option<Value>,
    pub order: usize,
    #[serde(rename = "box")]
    pub polygon: Vec<Point2>,
    #[serde(rename = "type")]
    pub region_type: Option<String>,
}

impl From<&Region> for RegionSnapshot {
    fn from(region: &Region) -> Self {
        Self {
            id: region.id,
            context: region.context.clone(),
            order: region.order,
            polygon: region.polygon.clone(),
            region_type: region.region_type.clone(),
        }
    }
}

/// Public state of a line. The owning region is embedded by value so the
/// host can resolve its persistent identifier without a lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSnapshot {
    pub id: EntityId,
    pub context: Option<Value>,
    pub order: usize,
    pub baseline: Option<Vec<Point2>>,
    pub mask: Option<Vec<Point2>>,
    pub region: Option<RegionSnapshot>,
    #[serde(rename = "type")]
    pub line_type: Option<String>,
    pub text_direction: TextDirection,
}

impl LineSnapshot {
    pub fn new(line: &Line, region: Option<&Region>) -> Self {
        Self {
            id: line.id,
            context: line.context.clone(),
            order: line.order,
            baseline: line.baseline.clone(),
            mask: line.mask.clone(),
            region: region.map(RegionSnapshot::from),
            line_type: line.line_type.clone(),
            text_direction: line.text_direction,
        }
    }
}

/// Current document geometry, as returned by `export`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportData {
    pub lines: Vec<LineSnapshot>,
    pub regions: Vec<RegionSnapshot>,
}

/// A line as supplied by the host to `load`. `region` holds the host
/// context of the owning region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineData {
    pub context: Option<Value>,
    pub order: Option<usize>,
    pub baseline: Option<Vec<Point2>>,
    pub mask: Option<Vec<Point2>>,
    pub region: Option<Value>,
    #[serde(rename = "type")]
    pub line_type: Option<String>,
    pub text_direction: Option<TextDirection>,
}

/// A region as supplied by the host to `load`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionData {
    pub context: Option<Value>,
    pub order: Option<usize>,
    #[serde(rename = "box")]
    pub polygon: Vec<Point2>,
    #[serde(rename = "type")]
    pub region_type: Option<String>,
}

/// Bulk payload accepted by `load`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentData {
    pub lines: Vec<LineData>,
    pub regions: Vec<RegionData>,
}
