use crate::model::{EntityId, PathKind, PathRef, VertexRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How a lasso combines with the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LassoScope {
    /// Replace the selection with what the rectangle touches.
    Full,
    /// Only add to the selection.
    Refine,
}

/// Selected lines, regions and vertices.
///
/// Lines keep the order in which they were selected. A selected vertex
/// always implies its entity is selected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    lines: Vec<EntityId>,
    regions: Vec<EntityId>,
    vertices: BTreeSet<VertexRef>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[EntityId] {
        &self.lines
    }

    pub fn regions(&self) -> &[EntityId] {
        &self.regions
    }

    pub fn vertices(&self) -> impl Iterator<Item = &VertexRef> {
        self.vertices.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.regions.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.lines.contains(&id) || self.regions.contains(&id)
    }

    pub fn contains_vertex(&self, vertex: &VertexRef) -> bool {
        self.vertices.contains(vertex)
    }

    pub fn select_line(&mut self, id: EntityId) {
        if !self.lines.contains(&id) {
            self.lines.push(id);
        }
    }

    pub fn select_region(&mut self, id: EntityId) {
        if !self.regions.contains(&id) {
            self.regions.push(id);
        }
    }

    /// Select a vertex along with the entity owning it.
    pub fn select_vertex(&mut self, vertex: VertexRef) {
        match vertex.path.kind {
            PathKind::Polygon => self.select_region(vertex.path.entity),
            PathKind::Baseline | PathKind::Mask => self.select_line(vertex.path.entity),
        }
        self.vertices.insert(vertex);
    }

    pub fn deselect_vertex(&mut self, vertex: &VertexRef) {
        self.vertices.remove(vertex);
    }

    /// Deselect an entity of either kind, with its vertices.
    pub fn deselect(&mut self, id: EntityId) {
        self.lines.retain(|l| *l != id);
        self.regions.retain(|r| *r != id);
        self.vertices.retain(|v| v.path.entity != id);
    }

    /// Drop the vertex selection of a path whose vertices were renumbered.
    pub fn clear_path(&mut self, path: PathRef) {
        self.vertices.retain(|v| v.path != path);
    }

    pub fn clear_vertices(&mut self) {
        self.vertices.clear();
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.regions.clear();
        self.vertices.clear();
    }

    /// Keep only entities for which `alive` holds.
    pub fn retain(&mut self, mut alive: impl FnMut(EntityId) -> bool) {
        self.lines.retain(|id| alive(*id));
        self.regions.retain(|id| alive(*id));
        let (lines, regions) = (&self.lines, &self.regions);
        self.vertices
            .retain(|v| lines.contains(&v.path.entity) || regions.contains(&v.path.entity));
    }
}
