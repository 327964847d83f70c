//! Undo/redo as a stack of reversible commands.
//!
//! A command is pure data: the entity states before and after each change.
//! Undoing applies the inverse command through the same editor paths as a
//! user edit, so the host sees the usual update and delete notifications.

use crate::model::{EntityId, Line, Region};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Default number of commands kept.
pub const MAX_HISTORY_SIZE: usize = 100;

/// Full state of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityState {
    Line(Line),
    Region(Region),
}

impl EntityState {
    /// Captured state of a line. Selection is not part of the history.
    pub fn line(line: &Line) -> Self {
        EntityState::Line(Line { selected: false, ..line.clone() })
    }

    pub fn region(region: &Region) -> Self {
        EntityState::Region(Region { selected: false, ..region.clone() })
    }

    fn is_region(&self) -> bool {
        matches!(self, EntityState::Region(_))
    }

    pub fn id(&self) -> EntityId {
        match self {
            EntityState::Line(l) => l.id,
            EntityState::Region(r) => r.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Change {
    Create(EntityState),
    Delete(EntityState),
    Modify { before: EntityState, after: EntityState },
}

impl Change {
    pub fn inverse(&self) -> Change {
        match self {
            Change::Create(state) => Change::Delete(state.clone()),
            Change::Delete(state) => Change::Create(state.clone()),
            Change::Modify { before, after } => Change::Modify { before: after.clone(), after: before.clone() },
        }
    }

    pub fn id(&self) -> EntityId {
        match self {
            Change::Create(state) | Change::Delete(state) => state.id(),
            Change::Modify { after, .. } => after.id(),
        }
    }
}

/// One user-visible edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditCommand {
    pub label: String,
    pub changes: Vec<Change>,
}

impl EditCommand {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), changes: Vec::new() }
    }

    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    /// Record a modification, dropping it when nothing changed.
    pub fn modify(&mut self, before: EntityState, after: EntityState) {
        if before != after {
            self.changes.push(Change::Modify { before, after });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// The command that undoes this one: every change inverted, last first.
    pub fn inverse(&self) -> EditCommand {
        EditCommand {
            label: self.label.clone(),
            changes: self.changes.iter().rev().map(Change::inverse).collect(),
        }
    }
}

/// Collects the state every touched entity had before an edit, then turns
/// the difference with the state after the edit into a command.
#[derive(Debug, Clone)]
pub struct Transaction {
    label: String,
    before: BTreeMap<EntityId, Option<EntityState>>,
}

impl Transaction {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), before: BTreeMap::new() }
    }

    /// Remember `state` as the pre-edit state of `id`. Later calls for the
    /// same id are ignored; `None` marks an entity created by the edit.
    pub fn record(&mut self, id: EntityId, state: Option<EntityState>) {
        self.before.entry(id).or_insert(state);
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.before.contains_key(&id)
    }

    /// Every entity recorded so far.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.before.keys().copied()
    }

    /// Build the command. Changes are ordered so that replaying them never
    /// links a line to a missing region: region creations, line creations,
    /// modifications, line deletions, region deletions.
    pub fn finish(self, current: impl Fn(EntityId) -> Option<EntityState>) -> EditCommand {
        let mut changes: Vec<(u8, Change)> = Vec::new();
        for (id, before) in self.before {
            let change = match (before, current(id)) {
                (None, Some(after)) => Change::Create(after),
                (Some(before), None) => Change::Delete(before),
                (Some(before), Some(after)) if before != after => Change::Modify { before, after },
                _ => continue,
            };
            let rank = match &change {
                Change::Create(s) if s.is_region() => 0,
                Change::Create(_) => 1,
                Change::Modify { .. } => 2,
                Change::Delete(s) if !s.is_region() => 3,
                Change::Delete(_) => 4,
            };
            changes.push((rank, change));
        }
        changes.sort_by_key(|(rank, _)| *rank);
        EditCommand { label: self.label, changes: changes.into_iter().map(|(_, c)| c).collect() }
    }
}

#[derive(Debug, Clone)]
pub struct History {
    /// Most recent last.
    undo_stack: VecDeque<EditCommand>,
    /// Most recent last.
    redo_stack: Vec<EditCommand>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_limit(MAX_HISTORY_SIZE)
    }
}

impl History {
    pub fn with_limit(limit: usize) -> Self {
        Self { undo_stack: VecDeque::new(), redo_stack: Vec::new(), limit: limit.max(1) }
    }

    /// Record a new command. Clears the redo stack.
    pub fn push(&mut self, command: EditCommand) {
        if command.is_empty() {
            return;
        }
        self.redo_stack.clear();
        self.push_undo(command);
    }

    pub fn pop_undo(&mut self) -> Option<EditCommand> {
        self.undo_stack.pop_back()
    }

    pub fn pop_redo(&mut self) -> Option<EditCommand> {
        self.redo_stack.pop()
    }

    pub fn push_redo(&mut self, command: EditCommand) {
        self.redo_stack.push(command);
    }

    /// Push without touching the redo stack (used after redo).
    pub fn push_undo(&mut self, command: EditCommand) {
        self.undo_stack.push_back(command);
        while self.undo_stack.len() > self.limit {
            self.undo_stack.pop_front();
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
