//! Entity model: lines (baseline + mask) and regions (polygons), the ids
//! that address them and the plain snapshots exchanged with the host.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod line;
pub use line::{Decorations, Line};
pub mod region;
pub use region::Region;
pub mod snapshot;
pub use snapshot::{DocumentData, ExportData, LineData, LineSnapshot, RegionData, RegionSnapshot};

#[cfg(test)]
mod tests_model;

/// Engine-local identifier of a line or a region.
///
/// Ids come from one monotonic counter shared by both entity kinds, so an id
/// never names a line and a region at the same time and is never reused.
/// The persistent identifier assigned by the host lives in the entity's
/// `context` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic id source.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    counter: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> EntityId {
        self.counter += 1;
        EntityId(self.counter)
    }

    /// Make sure future ids are greater than `id` (used when an entity is
    /// restored with a previously issued id).
    pub fn observe(&mut self, id: EntityId) {
        self.counter = self.counter.max(id.0);
    }
}

/// Which entity kind the pointer tools operate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Lines,
    Regions,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::Lines => Mode::Regions,
            Mode::Regions => Mode::Lines,
        }
    }
}

/// Reading direction of a line. Decides which baseline end anchors the
/// reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

/// The path of an entity a vertex belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PathKind {
    Baseline,
    Mask,
    Polygon,
}

impl PathKind {
    pub fn is_closed(self) -> bool {
        !matches!(self, PathKind::Baseline)
    }
}

/// Identity of one path of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PathRef {
    pub entity: EntityId,
    pub kind: PathKind,
}

impl PathRef {
    pub fn new(entity: EntityId, kind: PathKind) -> Self {
        Self { entity, kind }
    }
}

/// A single vertex of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexRef {
    pub path: PathRef,
    pub index: usize,
}
