//! Editing commands bound to shortcuts, plus undo/redo.

use super::{Change, EditCommand, Editor, EntityState, KeyModifiers, Shortcut, Transaction};
use crate::error::{EditorError, EditorResult};
use crate::geometry::Point2;
use crate::model::{EntityId, Line, Mode, PathKind, PathRef, Region, VertexRef};
use crate::ops::cut::{cut_line, cut_region, LineCut, LinePiece};
use crate::ops::mask::{refresh_pairs, remove_pair};
use crate::ops::merge::{merge_geometry, merge_order};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

impl Editor {
    /// Dispatch a key press through the keymap. Returns whether it was
    /// consumed. While the type prompt is open only Escape (closing it) is.
    pub fn handle_key(&mut self, key: &str, modifiers: KeyModifiers) -> bool {
        let name = super::key_name(key, modifiers);
        if name == "Escape" {
            if self.type_prompt {
                self.close_type_prompt();
            } else {
                self.escape();
            }
            return true;
        }
        if self.type_prompt {
            debug!(key = %name, "type prompt open, key ignored");
            return false;
        }
        let Some(shortcut) = self.config.keymap.get(&name).copied() else {
            return false;
        };
        self.run_shortcut(shortcut);
        true
    }

    pub fn run_shortcut(&mut self, shortcut: Shortcut) {
        if self.type_prompt {
            return;
        }
        debug!(?shortcut, "shortcut");
        match shortcut {
            Shortcut::DeleteSelection => self.delete_selection(),
            Shortcut::DeleteVertices => self.delete_selected_vertices(),
            Shortcut::ToggleCut => self.toggle_cut(),
            Shortcut::ToggleMasks => self.toggle_masks(),
            Shortcut::ToggleMode => self.toggle_mode(),
            Shortcut::ToggleOrdering => self.toggle_ordering(),
            Shortcut::SelectAll => self.select_all(),
            Shortcut::Reverse => self.reverse_selection(),
            Shortcut::Merge => self.merge_selection(),
            Shortcut::Link => self.link_selection(),
            Shortcut::TypePrompt => self.open_type_prompt(),
            Shortcut::Undo => {
                self.undo();
            }
            Shortcut::Redo => {
                self.redo();
            }
        }
    }

    /// Select every entity of the active mode.
    pub fn select_all(&mut self) {
        self.selection.clear();
        match self.mode {
            Mode::Lines => self.lines.keys().for_each(|id| self.selection.select_line(*id)),
            Mode::Regions => self.regions.keys().for_each(|id| self.selection.select_region(*id)),
        }
        self.sync_selection_flags();
    }

    pub fn delete_selection(&mut self) {
        if self.selection.is_empty() {
            return;
        }
        let lines = self.selection.lines().to_vec();
        let regions = self.selection.regions().to_vec();
        let mut tx = Transaction::new("delete");
        self.delete_entities(&mut tx, &lines, &regions);
        self.renumber(&mut tx);
        self.selection.clear();
        self.sync_selection_flags();
        self.commit(tx);
    }

    /// Delete the selected vertices. Paths left too short lose their
    /// geometry, and entities left without geometry are deleted.
    pub fn delete_selected_vertices(&mut self) {
        let mut paths: BTreeMap<PathRef, Vec<usize>> = BTreeMap::new();
        for vertex in self.selection.vertices() {
            paths.entry(vertex.path).or_default().push(vertex.index);
        }
        if paths.is_empty() {
            return;
        }

        let (upper, lower) = (self.config.upper_height, self.config.lower_height);
        let mut tx = Transaction::new("delete vertices");
        let mut emptied_lines = Vec::new();
        let mut emptied_regions = Vec::new();
        let mut resynthesize = Vec::new();

        for (path, mut indices) in paths {
            indices.sort_unstable();
            indices.dedup();
            self.touch(&mut tx, path.entity);
            self.selection.clear_path(path);

            if path.kind == PathKind::Polygon {
                let Some(region) = self.regions.get_mut(&path.entity) else {
                    continue;
                };
                for &index in indices.iter().rev() {
                    if index < region.polygon.len() {
                        region.polygon.remove(index);
                    }
                }
                if region.polygon.len() < 3 {
                    emptied_regions.push(region.id);
                }
                self.queue.push_region(path.entity);
                continue;
            }

            let Some(line) = self.lines.get_mut(&path.entity) else {
                continue;
            };
            match path.kind {
                PathKind::Baseline => {
                    if let Some(baseline) = line.baseline.as_mut() {
                        for &index in indices.iter().rev() {
                            let len = baseline.len();
                            if index >= len {
                                continue;
                            }
                            if line.mask_derived {
                                line.mask_derived = line.mask.as_mut().is_some_and(|mask| remove_pair(mask, len, index));
                            }
                            baseline.remove(index);
                            if line.mask_derived && !baseline.is_empty() {
                                let neighbour = index.min(baseline.len() - 1);
                                if let Some(mask) = line.mask.as_mut() {
                                    line.mask_derived = refresh_pairs(mask, baseline, neighbour, upper, lower);
                                }
                            }
                        }
                        if baseline.len() < 2 && line.mask_derived {
                            resynthesize.push(line.id);
                        }
                    }
                    if line.baseline.as_ref().is_some_and(Vec::is_empty) {
                        line.baseline = None;
                    }
                }
                PathKind::Mask => {
                    if let Some(mask) = line.mask.as_mut() {
                        for &index in indices.iter().rev() {
                            if index < mask.len() {
                                mask.remove(index);
                            }
                        }
                    }
                    line.mask_derived = false;
                    if line.mask.as_ref().is_some_and(|m| m.len() < 3) {
                        line.mask = None;
                    }
                }
                PathKind::Polygon => {}
            }
            if !line.has_geometry() {
                emptied_lines.push(line.id);
            }
            self.queue.push_line(path.entity);
        }

        for id in resynthesize {
            self.resynthesize(id);
        }
        self.delete_entities(&mut tx, &emptied_lines, &emptied_regions);
        self.heights.invalidate();
        let touched: Vec<EntityId> = tx.ids().collect();
        for id in touched {
            self.rederive_line(id);
        }
        self.renumber(&mut tx);
        self.sync_selection_flags();
        self.commit(tx);
    }

    /// Flip the baselines of the selected lines. Derived masks are rebuilt
    /// from the flipped baseline.
    pub fn reverse_selection(&mut self) {
        let mut tx = Transaction::new("reverse");
        for id in self.selection.lines().to_vec() {
            let derived = match self.lines.get(&id) {
                Some(line) if line.baseline.is_some() => line.mask_derived,
                _ => continue,
            };
            self.touch(&mut tx, id);
            if let Some(line) = self.lines.get_mut(&id) {
                line.reverse();
            }
            if derived {
                self.resynthesize(id);
                self.selection.clear_path(PathRef::new(id, PathKind::Mask));
            }
            self.selection.clear_path(PathRef::new(id, PathKind::Baseline));
            self.rederive_line(id);
            self.queue.push_line(id);
        }
        self.commit(tx);
    }

    /// Join the selected lines into the leftmost one (rightmost for
    /// right-to-left text). Needs at least two lines, all with baselines.
    pub fn merge_selection(&mut self) {
        let selected: Vec<&Line> = self.selection.lines().iter().filter_map(|id| self.lines.get(id)).collect();
        if selected.len() < 2 || selected.iter().any(|l| l.baseline.is_none()) {
            debug!(selected = selected.len(), "merge needs two or more lines with baselines");
            return;
        }
        let order = merge_order(&selected);
        let Some((&target, absorbed)) = order.split_first() else {
            return;
        };

        let mut tx = Transaction::new("merge");
        self.touch(&mut tx, target);
        for id in absorbed {
            let (Some(first), Some(second)) = (self.lines.get(&target), self.lines.get(id)) else {
                continue;
            };
            let (baseline, mask) = merge_geometry(first, second);
            self.delete_entities(&mut tx, &[*id], &[]);
            if let Some(line) = self.lines.get_mut(&target) {
                line.baseline = baseline;
                line.mask = mask;
                line.mask_derived = false;
            }
        }

        self.heights.invalidate();
        self.rederive_line(target);
        self.queue.push_line(target);
        self.renumber(&mut tx);
        self.selection.clear();
        self.selection.select_line(target);
        self.sync_selection_flags();
        info!(line = %target, absorbed = absorbed.len(), "merged lines");
        self.commit(tx);
    }

    /// Link each selected line to the region under its baseline midpoint,
    /// or clear its link when no region contains it.
    pub fn link_selection(&mut self) {
        let mut tx = Transaction::new("link");
        for id in self.selection.lines().to_vec() {
            let Some(line) = self.lines.get(&id) else {
                continue;
            };
            let region = line.reference_point().and_then(|p| self.region_at(p));
            if region == line.region {
                continue;
            }
            self.touch(&mut tx, id);
            if let Some(line) = self.lines.get_mut(&id) {
                line.region = region;
            }
            self.queue.push_line(id);
        }
        self.commit(tx);
    }

    pub fn open_type_prompt(&mut self) {
        if !self.selection.is_empty() {
            self.type_prompt = true;
        }
    }

    pub fn close_type_prompt(&mut self) {
        self.type_prompt = false;
    }

    /// Assign a type to the selected entities and close the prompt. `None`
    /// clears the type. The name must be one of the configured types of
    /// the entity kind.
    pub fn set_type(&mut self, type_name: Option<&str>) -> EditorResult<()> {
        self.type_prompt = false;
        let lines = self.selection.lines().to_vec();
        let regions = self.selection.regions().to_vec();
        if let Some(name) = type_name {
            let line_ok = lines.is_empty() || self.config.allows_line_type(name);
            let region_ok = regions.is_empty() || self.config.allows_region_type(name);
            if !line_ok || !region_ok {
                return Err(EditorError::UnknownType(name.to_string()));
            }
        }

        let value = type_name.map(str::to_string);
        let mut tx = Transaction::new("set type");
        for id in lines {
            self.touch(&mut tx, id);
            if let Some(line) = self.lines.get_mut(&id) {
                line.line_type = value.clone();
                self.queue.push_line(id);
            }
        }
        for id in regions {
            self.touch(&mut tx, id);
            if let Some(region) = self.regions.get_mut(&id) {
                region.region_type = value.clone();
                self.queue.push_region(id);
            }
        }
        self.commit(tx);
        Ok(())
    }

    /// Move an entity to a new position in its order sequence, shifting
    /// the ones in between.
    pub fn move_order(&mut self, id: EntityId, position: usize) -> EditorResult<()> {
        let mut tx = Transaction::new("reorder");
        if self.lines.contains_key(&id) {
            let mut ordered: Vec<EntityId> = self.lines().iter().map(|l| l.id).filter(|l| *l != id).collect();
            ordered.insert(position.min(ordered.len()), id);
            self.reorder_lines(&mut tx, &ordered);
        } else if self.regions.contains_key(&id) {
            let mut ordered: Vec<EntityId> = self.regions().iter().map(|r| r.id).filter(|r| *r != id).collect();
            ordered.insert(position.min(ordered.len()), id);
            self.reorder_regions(&mut tx, &ordered);
        } else {
            return Err(EditorError::UnknownEntity(id));
        }
        self.commit(tx);
        Ok(())
    }

    /// Cut every entity of the active mode with a closed path.
    pub fn apply_cut(&mut self, cut: &[Point2]) {
        let mut tx = Transaction::new("cut");
        match self.mode {
            Mode::Lines => self.cut_lines(&mut tx, cut),
            Mode::Regions => self.cut_regions(&mut tx, cut),
        }
        self.sync_selection_flags();
        self.commit(tx);
    }

    fn cut_lines(&mut self, tx: &mut Transaction, cut: &[Point2]) {
        let ids: Vec<EntityId> = self.lines().iter().map(|l| l.id).collect();
        let mut ordered = ids.clone();
        let mut changed = Vec::new();

        for id in ids {
            let Some(line) = self.lines.get(&id) else {
                continue;
            };
            let Some(baseline) = line.baseline.as_deref() else {
                continue;
            };
            let pieces = match cut_line(baseline, line.mask.as_deref(), cut) {
                LineCut::Untouched => continue,
                LineCut::Rejected { fragments } => {
                    warn!(line = %id, fragments, "cut splits the mask into too many pieces, line left unchanged");
                    continue;
                }
                LineCut::Split(pieces) => pieces,
            };
            let template = line.clone();
            let had_mask = template.mask.is_some();
            let mut pieces = pieces.into_iter();
            let Some(first) = pieces.next() else {
                continue;
            };

            self.touch(tx, id);
            self.apply_piece(id, first, had_mask);
            self.selection.clear_path(PathRef::new(id, PathKind::Baseline));
            self.selection.clear_path(PathRef::new(id, PathKind::Mask));
            changed.push(id);

            let mut created = Vec::new();
            for piece in pieces {
                let mut line = Line::new(self.ids.next_id(), None, None);
                line.region = template.region;
                line.line_type = template.line_type.clone();
                line.text_direction = template.text_direction;
                let new_id = self.insert_line(tx, line);
                self.apply_piece(new_id, piece, had_mask);
                created.push(new_id);
            }
            if let Some(at) = ordered.iter().position(|o| *o == id) {
                ordered.splice(at + 1..at + 1, created.iter().copied());
            }
            changed.extend(created);
        }

        self.heights.invalidate();
        self.reorder_lines(tx, &ordered);
        for id in &changed {
            self.rederive_line(*id);
        }
        if !changed.is_empty() {
            info!(lines = changed.len(), "cut lines");
        }
    }

    /// Give a line the geometry of one cut piece. A piece that lost its
    /// mask gets a synthesized one when the line had a mask.
    fn apply_piece(&mut self, id: EntityId, piece: LinePiece, had_mask: bool) {
        let (mask, derived) = match piece.mask {
            Some(mask) => (Some(mask), false),
            None if had_mask => (self.synthesize(&piece.baseline), true),
            None => (None, false),
        };
        if let Some(line) = self.lines.get_mut(&id) {
            line.baseline = Some(piece.baseline);
            line.mask_derived = derived && mask.is_some();
            line.mask = mask;
        }
        self.queue.push_line(id);
    }

    fn cut_regions(&mut self, tx: &mut Transaction, cut: &[Point2]) {
        let ids: Vec<EntityId> = self.regions().iter().map(|r| r.id).collect();
        let mut ordered = ids.clone();
        let mut created_total = 0;

        for id in ids {
            let Some(region) = self.regions.get(&id) else {
                continue;
            };
            let Some(fragments) = cut_region(&region.polygon, cut) else {
                continue;
            };
            let region_type = region.region_type.clone();
            let mut fragments = fragments.into_iter();
            let Some(first) = fragments.next() else {
                continue;
            };

            self.touch(tx, id);
            if let Some(region) = self.regions.get_mut(&id) {
                region.polygon = first;
            }
            self.queue.push_region(id);
            self.selection.clear_path(PathRef::new(id, PathKind::Polygon));

            let mut created = Vec::new();
            for fragment in fragments {
                let mut region = Region::new(self.ids.next_id(), fragment);
                region.region_type = region_type.clone();
                created.push(self.insert_region(tx, region));
            }
            if let Some(at) = ordered.iter().position(|o| *o == id) {
                ordered.splice(at + 1..at + 1, created.iter().copied());
            }
            created_total += created.len();
        }

        self.reorder_regions(tx, &ordered);
        if created_total > 0 {
            info!(created = created_total, "cut regions");
        }
    }

    // =========================================================================
    // Undo / redo
    // =========================================================================

    pub fn undo(&mut self) -> bool {
        self.escape();
        let Some(command) = self.history.pop_undo() else {
            return false;
        };
        debug!(label = %command.label, "undo");
        self.apply_command(&command.inverse());
        self.history.push_redo(command);
        true
    }

    pub fn redo(&mut self) -> bool {
        self.escape();
        let Some(command) = self.history.pop_redo() else {
            return false;
        };
        debug!(label = %command.label, "redo");
        self.apply_command(&command);
        self.history.push_undo(command);
        true
    }

    /// Replay a command. Host contexts are never restored from history: a
    /// modified entity keeps its current context and a re-created one
    /// starts without one so the host stores it afresh.
    fn apply_command(&mut self, command: &EditCommand) {
        let mut scratch = Transaction::new(command.label.clone());
        for change in &command.changes {
            match change {
                Change::Create(state) => self.restore(state.clone(), None),
                Change::Modify { after, .. } => {
                    let context = self.live_context(after.id());
                    self.restore(after.clone(), context);
                }
                Change::Delete(EntityState::Line(line)) => self.delete_entities(&mut scratch, &[line.id], &[]),
                Change::Delete(EntityState::Region(region)) => self.delete_entities(&mut scratch, &[], &[region.id]),
            }
        }

        self.selection.retain(|id| self.lines.contains_key(&id) || self.regions.contains_key(&id));
        self.selection.clear_vertices();
        self.heights.invalidate();
        let ids: Vec<EntityId> = self.lines.keys().copied().collect();
        for id in ids {
            self.rederive_line(id);
        }
        self.sync_selection_flags();
    }

    fn live_context(&self, id: EntityId) -> Option<Value> {
        match self.lines.get(&id) {
            Some(line) => line.context.clone(),
            None => self.regions.get(&id).and_then(|r| r.context.clone()),
        }
    }

    fn restore(&mut self, state: EntityState, context: Option<Value>) {
        self.ids.observe(state.id());
        match state {
            EntityState::Line(mut line) => {
                line.context = context;
                if line.region.is_some_and(|r| !self.regions.contains_key(&r)) {
                    line.region = None;
                }
                let id = line.id;
                self.lines.insert(id, line);
                self.queue.push_line(id);
            }
            EntityState::Region(mut region) => {
                region.context = context;
                let id = region.id;
                self.regions.insert(id, region);
                self.queue.push_region(id);
            }
        }
    }

    /// Vertices of the selection, for renderers that highlight them.
    pub fn selected_vertices(&self) -> Vec<(VertexRef, Point2)> {
        self.selection
            .vertices()
            .filter_map(|v| {
                let point = match v.path.kind {
                    PathKind::Polygon => self.regions.get(&v.path.entity)?.polygon.get(v.index).copied(),
                    kind => self.lines.get(&v.path.entity)?.path(kind)?.get(v.index).copied(),
                };
                point.map(|p| (*v, p))
            })
            .collect()
    }
}
