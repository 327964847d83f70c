//! Outbound change protocol.
//!
//! Mutations mark entities dirty in the [`UpdateQueue`]; once per frame the
//! host calls `Editor::flush_frame`, which turns the queue into a single
//! [`EngineEvent::Update`]. Deletions skip the queue: the
//! [`EngineEvent::Delete`] carrying the pre-deletion state is emitted before
//! the entity is dropped.

use crate::model::{EntityId, LineSnapshot, Mode, RegionSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Entities changed since the last flush.
#[derive(Debug, Clone, Default)]
pub struct UpdateQueue {
    lines: BTreeSet<EntityId>,
    regions: BTreeSet<EntityId>,
}

impl UpdateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_line(&mut self, id: EntityId) {
        self.lines.insert(id);
    }

    pub fn push_region(&mut self, id: EntityId) {
        self.regions.insert(id);
    }

    /// Forget a deleted entity.
    pub fn remove(&mut self, id: EntityId) {
        self.lines.remove(&id);
        self.regions.remove(&id);
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.regions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len() + self.regions.len()
    }

    /// Drain the queue: `(lines, regions)`.
    pub fn take(&mut self) -> (Vec<EntityId>, Vec<EntityId>) {
        let lines = std::mem::take(&mut self.lines).into_iter().collect();
        let regions = std::mem::take(&mut self.regions).into_iter().collect();
        (lines, regions)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.regions.clear();
    }
}

/// Visual preferences the host persists between sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub show_masks: bool,
    pub show_ordering: bool,
    pub mode: Mode,
}

/// Notification for the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Batched per-frame state of every entity changed during the frame.
    Update {
        lines: Vec<LineSnapshot>,
        regions: Vec<RegionSnapshot>,
    },
    /// State of entities captured just before they were removed.
    Delete {
        lines: Vec<LineSnapshot>,
        regions: Vec<RegionSnapshot>,
    },
    Settings(Settings),
}

impl EngineEvent {
    /// Tag used when the event is framed as text (`TAG:json`).
    pub fn tag(&self) -> &'static str {
        match self {
            EngineEvent::Update { .. } => "UPDATE",
            EngineEvent::Delete { .. } => "DELETE",
            EngineEvent::Settings(_) => "SETTINGS",
        }
    }
}
