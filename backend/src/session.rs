//! One editing session per socket: parses client messages, drives the
//! editor, persists its notifications and frames them for the client.

use crate::store::{context_key, Store};
use seg_core::editor::{EngineEvent, KeyModifiers, PointerEvent};
use seg_core::model::{DocumentData, EntityId, LineSnapshot, Mode, RegionSnapshot};
use seg_core::{Editor, EditorConfig};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Format an error as a JSON message for the frontend
pub fn format_error(code: &str, message: &str, severity: &str) -> String {
    format!(
        "ERROR_UPDATE:{}",
        json!({
            "code": code,
            "message": message,
            "severity": severity
        })
    )
}

fn read(store: &RwLock<Store>) -> RwLockReadGuard<'_, Store> {
    store.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write(store: &RwLock<Store>) -> RwLockWriteGuard<'_, Store> {
    store.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PointerKind {
    Down,
    Move,
    Drag,
    Up,
}

#[derive(Debug, Deserialize)]
struct PointerCmd {
    kind: PointerKind,
    #[serde(flatten)]
    event: PointerEvent,
}

#[derive(Debug, Deserialize)]
struct KeyCmd {
    key: String,
    #[serde(flatten)]
    modifiers: KeyModifiers,
}

#[derive(Debug, Deserialize)]
struct TypeCmd {
    #[serde(rename = "type")]
    type_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrderCmd {
    id: EntityId,
    position: usize,
}

#[derive(Debug, Deserialize)]
struct ImageCmd {
    width: f64,
    height: f64,
}

pub struct Session {
    editor: Editor,
}

impl Session {
    /// Start a session on the current stored document.
    pub fn open(config: EditorConfig, store: &RwLock<Store>) -> Self {
        let mut editor = Editor::new(config);
        editor.load(read(store).document());
        Self { editor }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    /// Handle one client text message. Returns the frames to send back.
    pub fn handle(&mut self, text: &str, store: &RwLock<Store>) -> Vec<String> {
        let (command, payload) = text.split_once(':').unwrap_or((text, ""));
        debug!(command, "client message");
        match command {
            "LOAD" => self.load(payload, store),
            "POINTER" => self.pointer(payload),
            "KEY" => match serde_json::from_str::<KeyCmd>(payload) {
                Ok(cmd) => {
                    self.editor.handle_key(&cmd.key, cmd.modifiers);
                    self.preview_frame()
                }
                Err(e) => vec![format_error("BAD_KEY", &e.to_string(), "warning")],
            },
            "ESCAPE" => {
                self.editor.escape();
                self.preview_frame()
            }
            "TYPE" => match serde_json::from_str::<TypeCmd>(payload) {
                Ok(cmd) => match self.editor.set_type(cmd.type_name.as_deref()) {
                    Ok(()) => Vec::new(),
                    Err(e) => vec![format_error("TYPE_REJECTED", &e.to_string(), "warning")],
                },
                Err(e) => vec![format_error("BAD_TYPE", &e.to_string(), "warning")],
            },
            "MODE" => match serde_json::from_value::<Mode>(Value::String(payload.to_string())) {
                Ok(mode) => {
                    self.editor.set_mode(mode);
                    Vec::new()
                }
                Err(e) => vec![format_error("BAD_MODE", &e.to_string(), "warning")],
            },
            "ORDER" => match serde_json::from_str::<OrderCmd>(payload) {
                Ok(cmd) => match self.editor.move_order(cmd.id, cmd.position) {
                    Ok(()) => Vec::new(),
                    Err(e) => vec![format_error("ORDER_REJECTED", &e.to_string(), "warning")],
                },
                Err(e) => vec![format_error("BAD_ORDER", &e.to_string(), "warning")],
            },
            "IMAGE" => match serde_json::from_str::<ImageCmd>(payload) {
                Ok(cmd) => {
                    self.editor.set_image_size(cmd.width, cmd.height);
                    Vec::new()
                }
                Err(e) => vec![format_error("BAD_IMAGE", &e.to_string(), "warning")],
            },
            "EXPORT" => match self.editor.export_json() {
                Ok(json) => vec![format!("EXPORT_UPDATE:{}", json)],
                Err(e) => vec![format_error("EXPORT_FAILED", &e.to_string(), "error")],
            },
            _ => {
                warn!(command, "unknown client message");
                vec![format_error("UNKNOWN_COMMAND", command, "warning")]
            }
        }
    }

    fn load(&mut self, payload: &str, store: &RwLock<Store>) -> Vec<String> {
        if !payload.is_empty() {
            match serde_json::from_str::<DocumentData>(payload) {
                Ok(doc) => write(store).replace(doc),
                Err(e) => return vec![format_error("BAD_DOCUMENT", &e.to_string(), "error")],
            }
        }
        let doc = read(store).document();
        self.editor.load(doc);
        info!(lines = self.editor.line_count(), regions = self.editor.region_count(), "session loaded");
        match self.editor.export_json() {
            Ok(json) => vec![format!("EXPORT_UPDATE:{}", json)],
            Err(e) => vec![format_error("EXPORT_FAILED", &e.to_string(), "error")],
        }
    }

    fn pointer(&mut self, payload: &str) -> Vec<String> {
        let cmd = match serde_json::from_str::<PointerCmd>(payload) {
            Ok(cmd) => cmd,
            Err(e) => return vec![format_error("BAD_POINTER", &e.to_string(), "warning")],
        };
        match cmd.kind {
            PointerKind::Down => self.editor.pointer_down(cmd.event),
            PointerKind::Move => self.editor.pointer_move(cmd.event.point),
            PointerKind::Drag => self.editor.pointer_drag(cmd.event),
            PointerKind::Up => self.editor.pointer_up(cmd.event),
        }
        self.preview_frame()
    }

    fn preview_frame(&self) -> Vec<String> {
        let preview = serde_json::to_string(&self.editor.preview()).unwrap_or_else(|_| "null".into());
        vec![format!("PREVIEW_UPDATE:{}", preview)]
    }

    /// End of a frame: flush the editor, persist what it reports and frame
    /// every notification as `TAG:json`.
    pub fn tick(&mut self, store: &RwLock<Store>) -> Vec<String> {
        self.editor.flush_frame();
        let mut events = self.editor.take_events();
        if events.is_empty() {
            return Vec::new();
        }

        let mut store = write(store);
        events
            .iter_mut()
            .filter_map(|event| {
                persist(&mut store, &mut self.editor, event);
                match serde_json::to_string(event) {
                    Ok(json) => Some(format!("{}:{}", event.tag(), json)),
                    Err(e) => {
                        warn!(error = %e, "failed to encode event");
                        None
                    }
                }
            })
            .collect()
    }
}

/// Key of an entity, minting one (and handing it to the engine) the first
/// time the entity is seen.
fn reconcile(context: &mut Option<Value>, assign: impl FnOnce(Value) -> bool) -> Uuid {
    if let Some(key) = context_key(context.as_ref()) {
        return key;
    }
    let key = Uuid::new_v4();
    let value = json!(key.to_string());
    if !assign(value.clone()) {
        warn!(%key, "entity vanished before its key was stored");
    }
    *context = Some(value);
    key
}

fn owning_region(editor: &Editor, region: &mut Option<RegionSnapshot>) -> Option<Uuid> {
    let region = region.as_mut()?;
    if region.context.is_none() {
        region.context = editor.region(region.id).and_then(|r| r.context);
    }
    context_key(region.context.as_ref())
}

/// Apply one notification to the store. Snapshots of new entities get the
/// key they were stored under, so the client sees it too.
pub fn persist(store: &mut Store, editor: &mut Editor, event: &mut EngineEvent) {
    match event {
        EngineEvent::Update { lines, regions } => {
            for region in regions.iter_mut() {
                let id = region.id;
                let key = reconcile(&mut region.context, |ctx| editor.set_region_context(id, ctx).is_ok());
                store.put_region(key, region);
            }
            for line in lines.iter_mut() {
                let id = line.id;
                let key = reconcile(&mut line.context, |ctx| editor.set_line_context(id, ctx).is_ok());
                let region = owning_region(editor, &mut line.region);
                store.put_line(key, line, region);
            }
        }
        EngineEvent::Delete { lines, regions } => {
            let keys = lines
                .iter()
                .map(|l: &LineSnapshot| l.context.as_ref())
                .chain(regions.iter().map(|r| r.context.as_ref()))
                .filter_map(context_key);
            for key in keys {
                store.remove(key);
            }
        }
        EngineEvent::Settings(_) => {}
    }
}
