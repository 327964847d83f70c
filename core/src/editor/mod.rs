//! The editor engine.
//!
//! [`Editor`] owns every line and region, the selection, the active pointer
//! tool, the undo history and the outbound change protocol. It is a plain
//! single-threaded value: every call runs to completion and the host pulls
//! notifications with [`Editor::take_events`].
//!
//! Entities live in ordered maps keyed by [`EntityId`]; a line refers to its
//! region by id and the link is removed before the region is. Every user
//! edit runs inside a [`Transaction`] which becomes one undoable
//! [`EditCommand`] when committed.

pub mod history;
pub mod interaction;
pub mod protocol;
pub mod selection;
pub mod shortcuts;

mod actions;

pub use history::{Change, EditCommand, EntityState, History, Transaction};
pub use interaction::{Button, Hit, Modifiers, PointerEvent, Preview, Sketch, ToolState};
pub use protocol::{EngineEvent, Settings, UpdateQueue};
pub use selection::{LassoScope, Selection};
pub use shortcuts::{default_keymap, key_name, KeyModifiers, Shortcut};

use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};
use crate::geometry::{Bounds, Point2};
use crate::model::{
    DocumentData, EntityId, ExportData, IdGenerator, Line, LineSnapshot, Mode, Region, RegionSnapshot,
};
use crate::ops::mask::{synthesize_mask, LineHeights};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

#[cfg(test)]
mod tests_editor;

pub struct Editor {
    config: EditorConfig,
    /// Image extent; pointer positions are clamped to it.
    image: Option<Bounds>,
    lines: BTreeMap<EntityId, Line>,
    regions: BTreeMap<EntityId, Region>,
    ids: IdGenerator,
    mode: Mode,
    /// The cut tool is armed.
    splitting: bool,
    show_masks: bool,
    show_ordering: bool,
    type_prompt: bool,
    selection: Selection,
    tool: ToolState,
    queue: UpdateQueue,
    events: Vec<EngineEvent>,
    history: History,
    heights: LineHeights,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            image: None,
            lines: BTreeMap::new(),
            regions: BTreeMap::new(),
            ids: IdGenerator::new(),
            mode: Mode::default(),
            splitting: false,
            show_masks: config.show_masks,
            show_ordering: config.show_ordering,
            type_prompt: false,
            selection: Selection::new(),
            tool: ToolState::Idle,
            queue: UpdateQueue::new(),
            events: Vec::new(),
            history: History::with_limit(config.history_limit),
            heights: LineHeights::default(),
            config,
        }
    }

    pub fn with_image_size(mut self, width: f64, height: f64) -> Self {
        self.set_image_size(width, height);
        self
    }

    pub fn set_image_size(&mut self, width: f64, height: f64) {
        self.image = Some(Bounds::from_corners([0.0, 0.0], [width, height]));
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_splitting(&self) -> bool {
        self.splitting
    }

    pub fn is_type_prompt_open(&self) -> bool {
        self.type_prompt
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn tool(&self) -> &ToolState {
        &self.tool
    }

    /// Lines in reading order.
    pub fn lines(&self) -> Vec<&Line> {
        let mut lines: Vec<&Line> = self.lines.values().collect();
        lines.sort_by_key(|l| (l.order, l.id));
        lines
    }

    /// Regions in order.
    pub fn regions(&self) -> Vec<&Region> {
        let mut regions: Vec<&Region> = self.regions.values().collect();
        regions.sort_by_key(|r| (r.order, r.id));
        regions
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn get_line(&self, id: EntityId) -> Option<&Line> {
        self.lines.get(&id)
    }

    pub fn get_region(&self, id: EntityId) -> Option<&Region> {
        self.regions.get(&id)
    }

    /// Plain copy of a line's public state.
    pub fn line(&self, id: EntityId) -> Option<LineSnapshot> {
        self.lines.get(&id).map(|line| self.snapshot_line(line))
    }

    pub fn region(&self, id: EntityId) -> Option<RegionSnapshot> {
        self.regions.get(&id).map(RegionSnapshot::from)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn settings(&self) -> Settings {
        Settings { show_masks: self.show_masks, show_ordering: self.show_ordering, mode: self.mode }
    }

    /// Drain the notification outbox.
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Number of entities waiting for the next frame.
    pub fn pending_updates(&self) -> usize {
        self.queue.len()
    }

    /// End of frame: turn every entity queued since the last frame into one
    /// update notification. Returns whether one was emitted.
    pub fn flush_frame(&mut self) -> bool {
        if self.queue.is_empty() {
            return false;
        }
        let (line_ids, region_ids) = self.queue.take();
        let lines: Vec<LineSnapshot> = line_ids.iter().filter_map(|id| self.line(*id)).collect();
        let regions: Vec<RegionSnapshot> = region_ids.iter().filter_map(|id| self.region(*id)).collect();
        if lines.is_empty() && regions.is_empty() {
            return false;
        }
        debug!(lines = lines.len(), regions = regions.len(), "flushing frame");
        self.events.push(EngineEvent::Update { lines, regions });
        true
    }

    /// Store the host identifier of a line once the host persisted it.
    pub fn set_line_context(&mut self, id: EntityId, context: Value) -> EditorResult<()> {
        let line = self.lines.get_mut(&id).ok_or(EditorError::UnknownEntity(id))?;
        line.context = Some(context);
        Ok(())
    }

    pub fn set_region_context(&mut self, id: EntityId, context: Value) -> EditorResult<()> {
        let region = self.regions.get_mut(&id).ok_or(EditorError::UnknownEntity(id))?;
        region.context = Some(context);
        Ok(())
    }

    // =========================================================================
    // Bulk load / export
    // =========================================================================

    /// Replace the document with host data. Entities without usable
    /// geometry are skipped; lines without a mask get a synthesized one and
    /// are queued so the host stores it.
    pub fn load(&mut self, doc: DocumentData) {
        self.empty();
        self.history.clear();

        let mut region_contexts: Vec<(Value, EntityId)> = Vec::new();
        for (index, data) in doc.regions.into_iter().enumerate() {
            if data.polygon.len() < 3 {
                warn!(index, "skipping region with fewer than 3 points");
                continue;
            }
            let id = self.ids.next_id();
            let mut region = Region::new(id, data.polygon);
            region.order = data.order.unwrap_or(index);
            region.region_type = data.region_type;
            if let Some(context) = data.context {
                region_contexts.push((context.clone(), id));
                region.context = Some(context);
            }
            self.regions.insert(id, region);
        }

        let mut unmasked = Vec::new();
        for (index, data) in doc.lines.into_iter().enumerate() {
            let mut line = Line::new(self.ids.next_id(), data.baseline, data.mask);
            if !line.has_geometry() {
                warn!(index, "skipping line without baseline or mask");
                continue;
            }
            line.context = data.context;
            line.order = data.order.unwrap_or(index);
            line.line_type = data.line_type;
            line.text_direction = data.text_direction.unwrap_or(self.config.default_text_direction);
            if let Some(region_context) = data.region {
                line.region = region_contexts
                    .iter()
                    .find(|(context, _)| *context == region_context)
                    .map(|(_, id)| *id);
                if line.region.is_none() {
                    warn!(index, "line references an unknown region, loading it unlinked");
                }
            }
            if line.mask.is_none() {
                unmasked.push(line.id);
            }
            self.lines.insert(line.id, line);
        }

        self.heights.invalidate();
        for id in unmasked {
            let Some(baseline) = self.lines.get(&id).and_then(|l| l.baseline.clone()) else {
                continue;
            };
            let mask = self.synthesize(&baseline);
            if let Some(line) = self.lines.get_mut(&id) {
                line.mask = mask;
                line.mask_derived = line.mask.is_some();
            }
            self.queue.push_line(id);
        }
        self.heights.invalidate();

        let mut tx = Transaction::new("load");
        self.renumber(&mut tx);
        let ids: Vec<EntityId> = self.lines.keys().copied().collect();
        for id in ids {
            self.rederive_line(id);
        }
        info!(lines = self.lines.len(), regions = self.regions.len(), "document loaded");
    }

    pub fn load_json(&mut self, json: &str) -> EditorResult<()> {
        let doc: DocumentData = serde_json::from_str(json)?;
        self.load(doc);
        Ok(())
    }

    /// Current geometry of every entity, in order.
    pub fn export(&self) -> ExportData {
        ExportData {
            lines: self.lines().into_iter().map(|l| self.snapshot_line(l)).collect(),
            regions: self.regions().into_iter().map(RegionSnapshot::from).collect(),
        }
    }

    pub fn export_json(&self) -> EditorResult<String> {
        Ok(serde_json::to_string(&self.export())?)
    }

    /// Drop every entity without notifying the host.
    pub fn empty(&mut self) {
        self.lines.clear();
        self.regions.clear();
        self.selection.clear();
        self.queue.clear();
        self.tool = ToolState::Idle;
        self.heights.invalidate();
    }

    /// Back to a freshly constructed editor, keeping the configuration and
    /// image size.
    pub fn reset(&mut self) {
        self.empty();
        self.history.clear();
        self.events.clear();
        self.splitting = false;
        self.type_prompt = false;
        self.mode = Mode::default();
        self.show_masks = self.config.show_masks;
        self.show_ordering = self.config.show_ordering;
    }

    // =========================================================================
    // Settings
    // =========================================================================

    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode == mode {
            return;
        }
        self.escape();
        self.mode = mode;
        self.selection.clear();
        self.sync_selection_flags();
        debug!(?mode, "mode changed");
        self.emit_settings();
    }

    pub fn toggle_mode(&mut self) {
        self.set_mode(self.mode.toggled());
    }

    pub fn toggle_masks(&mut self) {
        self.show_masks = !self.show_masks;
        self.emit_settings();
    }

    pub fn toggle_ordering(&mut self) {
        self.show_ordering = !self.show_ordering;
        self.emit_settings();
    }

    /// Arm or disarm the cut tool. Stays armed across gestures.
    pub fn toggle_cut(&mut self) {
        self.splitting = !self.splitting;
        if !self.splitting && matches!(self.tool, ToolState::Cutting { .. }) {
            self.tool = ToolState::Idle;
        }
        debug!(splitting = self.splitting, "cut tool toggled");
    }

    fn emit_settings(&mut self) {
        self.events.push(EngineEvent::Settings(self.settings()));
    }

    // =========================================================================
    // Store helpers
    // =========================================================================

    fn snapshot_line(&self, line: &Line) -> LineSnapshot {
        LineSnapshot::new(line, line.region.and_then(|r| self.regions.get(&r)))
    }

    fn state_of(&self, id: EntityId) -> Option<EntityState> {
        self.lines
            .get(&id)
            .map(EntityState::line)
            .or_else(|| self.regions.get(&id).map(EntityState::region))
    }

    /// Record the pre-edit state of `id` in `tx`.
    fn touch(&self, tx: &mut Transaction, id: EntityId) {
        if !tx.contains(id) {
            tx.record(id, self.state_of(id));
        }
    }

    fn commit(&mut self, tx: Transaction) {
        let command = tx.finish(|id| self.state_of(id));
        if command.is_empty() {
            return;
        }
        debug!(label = %command.label, changes = command.changes.len(), "recorded edit");
        self.history.push(command);
    }

    fn queue_entity(&mut self, id: EntityId) {
        if self.lines.contains_key(&id) {
            self.queue.push_line(id);
        } else if self.regions.contains_key(&id) {
            self.queue.push_region(id);
        }
    }

    fn clamp(&self, p: Point2) -> Point2 {
        self.image.map_or(p, |b| b.clamp(p))
    }

    fn fallback_height(&mut self) -> f64 {
        self.heights
            .average(self.lines.values())
            .unwrap_or(self.config.upper_height + self.config.lower_height)
    }

    fn synthesize(&mut self, baseline: &[Point2]) -> Option<Vec<Point2>> {
        let fallback = self.fallback_height();
        synthesize_mask(baseline, self.config.upper_height, self.config.lower_height, fallback)
    }

    /// Rebuild the derived mask of a line whose baseline changed.
    fn resynthesize(&mut self, id: EntityId) {
        let Some(baseline) = self.lines.get(&id).and_then(|l| l.baseline.clone()) else {
            return;
        };
        let mask = self.synthesize(&baseline);
        if let Some(line) = self.lines.get_mut(&id) {
            line.mask = mask;
            line.mask_derived = line.mask.is_some();
        }
        self.heights.invalidate();
    }

    /// Recompute the derived display state of a line.
    fn rederive_line(&mut self, id: EntityId) {
        let Some(line) = self.lines.get(&id) else {
            return;
        };
        let height = self
            .heights
            .height_of(line, self.lines.values())
            .unwrap_or(self.config.upper_height + self.config.lower_height);
        if let Some(line) = self.lines.get_mut(&id) {
            line.derive_decorations(height);
        }
    }

    /// Add a new line, recording its creation.
    fn insert_line(&mut self, tx: &mut Transaction, mut line: Line) -> EntityId {
        let id = line.id;
        line.selected = false;
        tx.record(id, None);
        self.lines.insert(id, line);
        self.heights.invalidate();
        self.rederive_line(id);
        self.queue.push_line(id);
        id
    }

    fn insert_region(&mut self, tx: &mut Transaction, mut region: Region) -> EntityId {
        let id = region.id;
        region.selected = false;
        tx.record(id, None);
        self.regions.insert(id, region);
        self.queue.push_region(id);
        id
    }

    /// Remove entities. Lines still linked to a removed region are unlinked
    /// first; the delete notification with the pre-removal state goes out
    /// before anything is dropped.
    fn delete_entities(&mut self, tx: &mut Transaction, lines: &[EntityId], regions: &[EntityId]) {
        let linked: Vec<EntityId> = self
            .lines
            .values()
            .filter(|l| !lines.contains(&l.id) && l.region.is_some_and(|r| regions.contains(&r)))
            .map(|l| l.id)
            .collect();
        for id in &linked {
            self.touch(tx, *id);
            if let Some(line) = self.lines.get_mut(id) {
                line.region = None;
            }
            self.queue.push_line(*id);
        }

        let line_snapshots: Vec<LineSnapshot> = lines.iter().filter_map(|id| self.line(*id)).collect();
        let region_snapshots: Vec<RegionSnapshot> = regions.iter().filter_map(|id| self.region(*id)).collect();
        if line_snapshots.is_empty() && region_snapshots.is_empty() {
            return;
        }
        debug!(lines = line_snapshots.len(), regions = region_snapshots.len(), unlinked = linked.len(), "deleting");
        self.events.push(EngineEvent::Delete { lines: line_snapshots, regions: region_snapshots });

        for id in lines.iter().chain(regions) {
            self.touch(tx, *id);
            self.lines.remove(id);
            self.regions.remove(id);
            self.queue.remove(*id);
            self.selection.deselect(*id);
        }
        self.heights.invalidate();
    }

    /// Assign orders `0..n` to lines in the given sequence.
    fn reorder_lines(&mut self, tx: &mut Transaction, ordered: &[EntityId]) {
        for (order, id) in ordered.iter().enumerate() {
            if self.lines.get(id).is_some_and(|l| l.order != order) {
                self.touch(tx, *id);
                if let Some(line) = self.lines.get_mut(id) {
                    line.order = order;
                }
                self.queue.push_line(*id);
            }
        }
    }

    fn reorder_regions(&mut self, tx: &mut Transaction, ordered: &[EntityId]) {
        for (order, id) in ordered.iter().enumerate() {
            if self.regions.get(id).is_some_and(|r| r.order != order) {
                self.touch(tx, *id);
                if let Some(region) = self.regions.get_mut(id) {
                    region.order = order;
                }
                self.queue.push_region(*id);
            }
        }
    }

    /// Close gaps in both order sequences.
    fn renumber(&mut self, tx: &mut Transaction) {
        let lines: Vec<EntityId> = self.lines().iter().map(|l| l.id).collect();
        let regions: Vec<EntityId> = self.regions().iter().map(|r| r.id).collect();
        self.reorder_lines(tx, &lines);
        self.reorder_regions(tx, &regions);
    }

    /// Mirror the selection into the entities' `selected` flags.
    fn sync_selection_flags(&mut self) {
        for line in self.lines.values_mut() {
            line.selected = self.selection.contains(line.id);
        }
        for region in self.regions.values_mut() {
            region.selected = self.selection.contains(region.id);
        }
    }

    /// First region, in order, containing `p`.
    fn region_at(&self, p: Point2) -> Option<EntityId> {
        self.regions().into_iter().find(|r| r.contains(p)).map(|r| r.id)
    }
}
