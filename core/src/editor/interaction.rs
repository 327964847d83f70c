//! Pointer tools.
//!
//! One [`ToolState`] is active at a time. Gestures start from `Idle` on
//! pointer-down and return to it on pointer-up or escape:
//!
//! ```text
//! Idle --down--> Cutting            (cut tool armed)
//!            \-> LassoSelecting     (box-select held)
//!            \-> Pressed            (hit something)
//!            \-> DrawingLine/Region (hit nothing)
//! Pressed --drag--> DraggingPoint | DraggingSelection
//! Pressed --up----> Idle (select) | LassoSelecting (box-select held)
//! ```
//!
//! A draw released where it started switches to click mode: the floating
//! end follows the pointer, secondary clicks add vertices and the next
//! primary click finishes the shape.

use super::{Editor, LassoScope, Transaction};
use crate::geometry::polyline::{self, insert_vertex, paths_intersect, polyline_length, PathHit, PathLocation};
use crate::geometry::{add_2d, distance, points_equal, polygon_area, sub_2d, Bounds, Point2, EPSILON};
use crate::model::{EntityId, Line, Mode, PathKind, PathRef, Region, VertexRef};
use crate::ops::mask::{insert_pair, refresh_pairs};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::debug;

/// A draw released closer than this to where it started is a click.
const CLICK_SLOP: f64 = 1.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    #[default]
    Primary,
    /// Extends an in-progress click-mode draw.
    Secondary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    /// Toggle selection / keep the current selection.
    pub multi: bool,
    pub box_select: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub point: Point2,
    #[serde(default)]
    pub button: Button,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn primary(point: Point2) -> Self {
        Self { point, button: Button::Primary, modifiers: Modifiers::default() }
    }

    pub fn secondary(point: Point2) -> Self {
        Self { point, button: Button::Secondary, modifiers: Modifiers::default() }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// What lies under the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hit {
    Vertex(VertexRef),
    Stroke { path: PathRef, location: PathLocation },
    Fill(EntityId),
}

impl Hit {
    pub fn entity(&self) -> EntityId {
        match self {
            Hit::Vertex(v) => v.path.entity,
            Hit::Stroke { path, .. } => path.entity,
            Hit::Fill(id) => *id,
        }
    }
}

/// An in-progress drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct Sketch {
    /// Fixed vertices; never empty.
    pub points: Vec<Point2>,
    /// Floating end point.
    pub cursor: Point2,
    pub click_mode: bool,
}

impl Sketch {
    fn new(start: Point2) -> Self {
        Self { points: vec![start], cursor: start, click_mode: false }
    }

    fn origin(&self) -> Point2 {
        self.points.first().copied().unwrap_or(self.cursor)
    }

    /// Fixed vertices followed by the floating end.
    pub fn outline(&self) -> Vec<Point2> {
        let mut points = self.points.clone();
        points.push(self.cursor);
        polyline::dedup_points(&mut points);
        points
    }

    /// Rectangle spanned by a press-drag-release.
    pub fn rectangle(&self) -> Vec<Point2> {
        Bounds::from_corners(self.origin(), self.cursor).to_polygon()
    }
}

#[derive(Debug, Clone, Default)]
pub enum ToolState {
    #[default]
    Idle,
    /// Pressed on an entity; becomes a selection on release or a drag on
    /// move.
    Pressed { hit: Hit, origin: Point2 },
    DrawingLine(Sketch),
    DrawingRegion(Sketch),
    LassoSelecting { origin: Point2, cursor: Point2, scope: LassoScope },
    Cutting { origin: Point2, cursor: Point2 },
    DraggingPoint { vertex: VertexRef, tx: Transaction },
    DraggingSelection { last: Point2, tx: Transaction },
}

impl ToolState {
    pub fn name(&self) -> &'static str {
        match self {
            ToolState::Idle => "idle",
            ToolState::Pressed { .. } => "pressed",
            ToolState::DrawingLine(_) => "drawing_line",
            ToolState::DrawingRegion(_) => "drawing_region",
            ToolState::LassoSelecting { .. } => "lasso",
            ToolState::Cutting { .. } => "cutting",
            ToolState::DraggingPoint { .. } => "dragging_point",
            ToolState::DraggingSelection { .. } => "dragging_selection",
        }
    }
}

/// Geometry of the gesture in progress, for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "points", rename_all = "snake_case")]
pub enum Preview {
    Line(Vec<Point2>),
    Region(Vec<Point2>),
    Lasso(Vec<Point2>),
    Cut(Vec<Point2>),
}

impl Editor {
    pub fn pointer_down(&mut self, event: PointerEvent) {
        let p = self.clamp(event.point);
        let tool = std::mem::take(&mut self.tool);
        self.tool = match tool {
            ToolState::Idle => self.begin_gesture(p, event.modifiers),
            ToolState::DrawingLine(mut sketch) if sketch.click_mode => {
                sketch.cursor = p;
                match event.button {
                    Button::Secondary => {
                        sketch.points.push(p);
                        ToolState::DrawingLine(sketch)
                    }
                    Button::Primary => {
                        self.finish_line(sketch);
                        ToolState::Idle
                    }
                }
            }
            ToolState::DrawingRegion(mut sketch) if sketch.click_mode => {
                sketch.cursor = p;
                match event.button {
                    Button::Secondary => {
                        sketch.points.push(p);
                        ToolState::DrawingRegion(sketch)
                    }
                    Button::Primary => {
                        self.finish_region(sketch);
                        ToolState::Idle
                    }
                }
            }
            other => other,
        };
    }

    /// Pointer motion with no button held.
    pub fn pointer_move(&mut self, point: Point2) {
        let p = self.clamp(point);
        if let ToolState::DrawingLine(sketch) | ToolState::DrawingRegion(sketch) = &mut self.tool {
            if sketch.click_mode {
                sketch.cursor = p;
            }
        }
    }

    /// Pointer motion with a button held.
    pub fn pointer_drag(&mut self, event: PointerEvent) {
        let p = self.clamp(event.point);
        let tool = std::mem::take(&mut self.tool);
        self.tool = match tool {
            ToolState::Pressed { hit, origin } => self.begin_drag(hit, origin, p, event.modifiers),
            ToolState::DraggingPoint { vertex, tx } => {
                self.move_vertex(vertex, p);
                ToolState::DraggingPoint { vertex, tx }
            }
            ToolState::DraggingSelection { last, tx } => {
                let last = self.move_selection(last, p);
                ToolState::DraggingSelection { last, tx }
            }
            ToolState::DrawingLine(mut sketch) => {
                sketch.cursor = p;
                ToolState::DrawingLine(sketch)
            }
            ToolState::DrawingRegion(mut sketch) => {
                sketch.cursor = p;
                ToolState::DrawingRegion(sketch)
            }
            ToolState::LassoSelecting { origin, scope, .. } => {
                ToolState::LassoSelecting { origin, cursor: event.point, scope }
            }
            ToolState::Cutting { origin, .. } => ToolState::Cutting { origin, cursor: p },
            ToolState::Idle => ToolState::Idle,
        };
    }

    pub fn pointer_up(&mut self, event: PointerEvent) {
        let p = self.clamp(event.point);
        let tool = std::mem::take(&mut self.tool);
        self.tool = match tool {
            ToolState::Pressed { hit, .. } => {
                self.click_select(hit, event.modifiers.multi);
                if event.modifiers.box_select {
                    ToolState::LassoSelecting { origin: event.point, cursor: event.point, scope: LassoScope::Refine }
                } else {
                    ToolState::Idle
                }
            }
            ToolState::DrawingLine(mut sketch) if !sketch.click_mode => {
                sketch.cursor = p;
                if distance(sketch.origin(), p) < CLICK_SLOP {
                    sketch.click_mode = true;
                    ToolState::DrawingLine(sketch)
                } else {
                    self.finish_line(sketch);
                    ToolState::Idle
                }
            }
            ToolState::DrawingRegion(mut sketch) if !sketch.click_mode => {
                sketch.cursor = p;
                if distance(sketch.origin(), p) < CLICK_SLOP {
                    sketch.click_mode = true;
                    ToolState::DrawingRegion(sketch)
                } else {
                    self.finish_region(sketch);
                    ToolState::Idle
                }
            }
            ToolState::LassoSelecting { origin, scope, .. } => {
                self.lasso_select(Bounds::from_corners(origin, event.point), scope);
                ToolState::Idle
            }
            ToolState::Cutting { origin, .. } => {
                let rect = Bounds::from_corners(origin, p);
                if rect.width() > EPSILON && rect.height() > EPSILON {
                    self.apply_cut(&rect.to_polygon());
                }
                ToolState::Idle
            }
            ToolState::DraggingPoint { tx, .. } | ToolState::DraggingSelection { tx, .. } => {
                self.finish_drag(tx);
                ToolState::Idle
            }
            other => other,
        };
    }

    /// Abandon the gesture in progress. A drag is kept as it is.
    pub fn escape(&mut self) {
        match std::mem::take(&mut self.tool) {
            ToolState::Idle => {}
            ToolState::DraggingPoint { tx, .. } | ToolState::DraggingSelection { tx, .. } => self.finish_drag(tx),
            cancelled => debug!(tool = cancelled.name(), "gesture cancelled"),
        }
    }

    pub fn preview(&self) -> Option<Preview> {
        match &self.tool {
            ToolState::DrawingLine(sketch) => Some(Preview::Line(sketch.outline())),
            ToolState::DrawingRegion(sketch) if sketch.click_mode => Some(Preview::Region(sketch.outline())),
            ToolState::DrawingRegion(sketch) => Some(Preview::Region(sketch.rectangle())),
            ToolState::LassoSelecting { origin, cursor, .. } => {
                Some(Preview::Lasso(Bounds::from_corners(*origin, *cursor).to_polygon()))
            }
            ToolState::Cutting { origin, cursor } => Some(Preview::Cut(Bounds::from_corners(*origin, *cursor).to_polygon())),
            _ => None,
        }
    }

    /// Topmost hit of the active mode. Vertices win over strokes and
    /// strokes over fills; selected entities win ties, then baselines over
    /// masks, then later order.
    pub fn hit_test(&self, p: Point2) -> Option<Hit> {
        let tolerance = self.config.hit_tolerance;
        let mut candidates: Vec<(u8, bool, u8, Reverse<usize>, Hit)> = Vec::new();
        let mut consider = |id: EntityId, kind: PathKind, points: &[Point2], selected: bool, order: usize| {
            let Some(path_hit) = polyline::hit_test(points, kind.is_closed(), p, tolerance) else {
                return;
            };
            let path = PathRef::new(id, kind);
            let (rank, hit) = match path_hit {
                PathHit::Vertex(index) => (0, Hit::Vertex(VertexRef { path, index })),
                PathHit::Stroke(location) => (1, Hit::Stroke { path, location }),
                PathHit::Fill => (2, Hit::Fill(id)),
            };
            let kind_rank = u8::from(kind == PathKind::Mask);
            candidates.push((rank, !selected, kind_rank, Reverse(order), hit));
        };

        match self.mode {
            Mode::Lines => {
                for line in self.lines.values() {
                    let selected = self.selection.contains(line.id);
                    if let Some(baseline) = &line.baseline {
                        consider(line.id, PathKind::Baseline, baseline, selected, line.order);
                    }
                    if let Some(mask) = line.mask.as_ref().filter(|_| self.show_masks) {
                        consider(line.id, PathKind::Mask, mask, selected, line.order);
                    }
                }
            }
            Mode::Regions => {
                for region in self.regions.values() {
                    let selected = self.selection.contains(region.id);
                    consider(region.id, PathKind::Polygon, &region.polygon, selected, region.order);
                }
            }
        }

        candidates
            .into_iter()
            .min_by_key(|(rank, unselected, kind, order, _)| (*rank, *unselected, *kind, *order))
            .map(|(.., hit)| hit)
    }

    /// Select an entity, replacing the selection unless `multi` is set.
    pub fn select(&mut self, id: EntityId, multi: bool) {
        if !multi {
            self.selection.clear();
        }
        self.select_entity(id);
        self.sync_selection_flags();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.sync_selection_flags();
    }

    /// Select every entity of the active mode touched by `rect`, along
    /// with their vertices inside it.
    pub fn lasso_select(&mut self, rect: Bounds, scope: LassoScope) {
        if scope == LassoScope::Full {
            self.selection.clear();
        }
        let outline = rect.to_polygon();
        let touched = |id: EntityId, kind: PathKind, points: &[Point2]| {
            let inside: Vec<VertexRef> = points
                .iter()
                .enumerate()
                .filter(|(_, p)| rect.contains(**p))
                .map(|(index, _)| VertexRef { path: PathRef::new(id, kind), index })
                .collect();
            let hit = !inside.is_empty() || paths_intersect(points, kind.is_closed(), &outline, true);
            (hit, inside)
        };

        let mut hits: Vec<(EntityId, Vec<VertexRef>)> = Vec::new();
        match self.mode {
            Mode::Lines => {
                for line in self.lines.values() {
                    let mut any = false;
                    let mut vertices = Vec::new();
                    for kind in [PathKind::Baseline, PathKind::Mask] {
                        if kind == PathKind::Mask && !self.show_masks {
                            continue;
                        }
                        if let Some(points) = line.path(kind) {
                            let (hit, inside) = touched(line.id, kind, points);
                            any |= hit;
                            vertices.extend(inside);
                        }
                    }
                    if any {
                        hits.push((line.id, vertices));
                    }
                }
            }
            Mode::Regions => {
                for region in self.regions.values() {
                    let (hit, inside) = touched(region.id, PathKind::Polygon, &region.polygon);
                    if hit {
                        hits.push((region.id, inside));
                    }
                }
            }
        }

        debug!(hits = hits.len(), ?scope, "lasso");
        for (id, vertices) in hits {
            self.select_entity(id);
            for vertex in vertices {
                self.selection.select_vertex(vertex);
            }
        }
        self.sync_selection_flags();
    }

    fn select_entity(&mut self, id: EntityId) {
        if self.lines.contains_key(&id) {
            self.selection.select_line(id);
        } else if self.regions.contains_key(&id) {
            self.selection.select_region(id);
        }
    }

    fn begin_gesture(&mut self, p: Point2, modifiers: Modifiers) -> ToolState {
        if self.splitting {
            return ToolState::Cutting { origin: p, cursor: p };
        }
        if modifiers.box_select {
            let scope = if modifiers.multi { LassoScope::Refine } else { LassoScope::Full };
            return ToolState::LassoSelecting { origin: p, cursor: p, scope };
        }
        if let Some(hit) = self.hit_test(p) {
            return ToolState::Pressed { hit, origin: p };
        }
        self.clear_selection();
        match self.mode {
            Mode::Lines => ToolState::DrawingLine(Sketch::new(p)),
            Mode::Regions => ToolState::DrawingRegion(Sketch::new(p)),
        }
    }

    fn click_select(&mut self, hit: Hit, multi: bool) {
        let entity = hit.entity();
        if multi {
            match hit {
                Hit::Vertex(vertex) if self.selection.contains_vertex(&vertex) => self.selection.deselect_vertex(&vertex),
                Hit::Vertex(vertex) => self.selection.select_vertex(vertex),
                _ if self.selection.contains(entity) => self.selection.deselect(entity),
                _ => self.select_entity(entity),
            }
        } else {
            self.selection.clear();
            self.select_entity(entity);
            if let Hit::Vertex(vertex) = hit {
                self.selection.select_vertex(vertex);
            }
        }
        self.sync_selection_flags();
    }

    fn begin_drag(&mut self, hit: Hit, origin: Point2, p: Point2, modifiers: Modifiers) -> ToolState {
        let entity = hit.entity();
        let was_selected = self.selection.contains(entity);
        if !was_selected {
            self.select(entity, modifiers.multi);
        }

        let mut tx = Transaction::new("drag");
        let vertex = match hit {
            Hit::Vertex(vertex) => Some(vertex),
            Hit::Stroke { path, location } if was_selected => {
                self.touch(&mut tx, path.entity);
                self.insert_path_vertex(path, &location)
            }
            _ => None,
        };

        if let Some(vertex) = vertex {
            self.touch(&mut tx, vertex.path.entity);
            self.selection.select_vertex(vertex);
            self.sync_selection_flags();
            self.move_vertex(vertex, p);
            debug!(entity = %vertex.path.entity, index = vertex.index, "dragging vertex");
            return ToolState::DraggingPoint { vertex, tx };
        }

        let ids: Vec<EntityId> = self.selection.lines().iter().chain(self.selection.regions()).copied().collect();
        for id in &ids {
            self.touch(&mut tx, *id);
        }
        debug!(entities = ids.len(), "dragging selection");
        let last = self.move_selection(origin, p);
        ToolState::DraggingSelection { last, tx }
    }

    /// Insert a vertex on a path where it was pressed. Derived masks get the
    /// matching vertex pair.
    fn insert_path_vertex(&mut self, path: PathRef, location: &PathLocation) -> Option<VertexRef> {
        let (upper, lower) = (self.config.upper_height, self.config.lower_height);
        let index = match path.kind {
            PathKind::Polygon => {
                let region = self.regions.get_mut(&path.entity)?;
                insert_vertex(&mut region.polygon, location)
            }
            PathKind::Baseline => {
                let line = self.lines.get_mut(&path.entity)?;
                let baseline = line.baseline.as_mut()?;
                let before = baseline.len();
                let index = insert_vertex(baseline, location);
                if baseline.len() > before && line.mask_derived {
                    let paired = line.mask.as_mut().is_some_and(|mask| insert_pair(mask, baseline, index, upper, lower));
                    line.mask_derived = paired;
                }
                index
            }
            PathKind::Mask => {
                let line = self.lines.get_mut(&path.entity)?;
                let mask = line.mask.as_mut()?;
                line.mask_derived = false;
                insert_vertex(mask, location)
            }
        };
        self.selection.clear_path(path);
        self.queue_entity(path.entity);
        Some(VertexRef { path, index })
    }

    fn move_vertex(&mut self, vertex: VertexRef, p: Point2) {
        let (upper, lower) = (self.config.upper_height, self.config.lower_height);
        let id = vertex.path.entity;
        match vertex.path.kind {
            PathKind::Polygon => {
                if let Some(point) = self.regions.get_mut(&id).and_then(|r| r.polygon.get_mut(vertex.index)) {
                    *point = p;
                    self.queue.push_region(id);
                }
            }
            kind @ (PathKind::Baseline | PathKind::Mask) => {
                let Some(line) = self.lines.get_mut(&id) else {
                    return;
                };
                let Some(point) = line.path_mut(kind).and_then(|path| path.get_mut(vertex.index)) else {
                    return;
                };
                *point = p;
                if kind == PathKind::Mask {
                    line.mask_derived = false;
                } else if line.mask_derived {
                    if let (Some(baseline), Some(mask)) = (line.baseline.as_deref(), line.mask.as_mut()) {
                        line.mask_derived = refresh_pairs(mask, baseline, vertex.index, upper, lower);
                    }
                }
                self.heights.invalidate();
                self.queue.push_line(id);
                self.rederive_line(id);
            }
        }
    }

    /// Bounds of everything selected.
    fn selection_bounds(&self) -> Option<Bounds> {
        let mut points: Vec<Point2> = Vec::new();
        for id in self.selection.lines() {
            if let Some(b) = self.lines.get(id).and_then(Line::bounds) {
                points.extend([b.min, b.max]);
            }
        }
        for id in self.selection.regions() {
            if let Some(b) = self.regions.get(id).and_then(Region::bounds) {
                points.extend([b.min, b.max]);
            }
        }
        Bounds::of(&points)
    }

    /// Translate the selection by `p - last`, keeping it inside the image.
    /// Returns the position the selection actually reached.
    fn move_selection(&mut self, last: Point2, p: Point2) -> Point2 {
        let mut delta = sub_2d(p, last);
        if let (Some(image), Some(bounds)) = (self.image, self.selection_bounds()) {
            for axis in 0..2 {
                let low = image.min[axis] - bounds.min[axis];
                let high = image.max[axis] - bounds.max[axis];
                if low <= high {
                    delta[axis] = delta[axis].clamp(low, high);
                }
            }
        }
        if points_equal(delta, [0.0, 0.0]) {
            return last;
        }

        let shift = |points: &mut [Point2]| points.iter_mut().for_each(|q| *q = add_2d(*q, delta));
        for id in self.selection.lines().to_vec() {
            if let Some(line) = self.lines.get_mut(&id) {
                if let Some(baseline) = line.baseline.as_mut() {
                    shift(baseline);
                }
                if let Some(mask) = line.mask.as_mut() {
                    shift(mask);
                }
                self.queue.push_line(id);
                self.rederive_line(id);
            }
        }
        for id in self.selection.regions().to_vec() {
            if let Some(region) = self.regions.get_mut(&id) {
                shift(&mut region.polygon);
                self.queue.push_region(id);
            }
        }
        add_2d(last, delta)
    }

    fn finish_drag(&mut self, tx: Transaction) {
        let ids: Vec<EntityId> = tx.ids().collect();
        self.heights.invalidate();
        for id in ids {
            self.rederive_line(id);
        }
        self.commit(tx);
    }

    fn finish_line(&mut self, sketch: Sketch) {
        let points = sketch.outline();
        let length = polyline_length(&points);
        if length < self.config.length_threshold {
            debug!(length, threshold = self.config.length_threshold, "line too short, discarded");
            return;
        }

        let mut tx = Transaction::new("draw line");
        let mut line = Line::new(self.ids.next_id(), None, None);
        line.mask = self.synthesize(&points);
        line.mask_derived = line.mask.is_some();
        line.baseline = Some(points);
        line.text_direction = self.config.default_text_direction;
        line.order = self.lines.len();
        line.region = line.reference_point().and_then(|p| self.region_at(p));
        let id = self.insert_line(&mut tx, line);
        debug!(line = %id, "line drawn");
        self.commit(tx);
    }

    fn finish_region(&mut self, sketch: Sketch) {
        let polygon = if sketch.click_mode { sketch.outline() } else { sketch.rectangle() };
        let area = polygon_area(&polygon);
        if polygon.len() < 3 || area < self.config.area_threshold {
            debug!(area, threshold = self.config.area_threshold, "region too small, discarded");
            return;
        }

        let mut tx = Transaction::new("draw region");
        let mut region = Region::new(self.ids.next_id(), polygon);
        region.order = self.regions.len();
        let id = self.insert_region(&mut tx, region);
        debug!(region = %id, "region drawn");
        self.commit(tx);
    }
}
