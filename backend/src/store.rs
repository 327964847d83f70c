//! In-memory document store shared by every socket.
//!
//! Entities are keyed by a UUID the store hands out the first time it sees
//! them. That UUID is the entity's context inside the engine, so later
//! notifications about the same entity land on the same record.

use seg_core::model::{DocumentData, LineData, LineSnapshot, RegionData, RegionSnapshot};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct Store {
    lines: BTreeMap<Uuid, LineData>,
    regions: BTreeMap<Uuid, RegionData>,
}

/// Key stored in an entity's context, if it carries one.
pub fn context_key(context: Option<&Value>) -> Option<Uuid> {
    context.and_then(Value::as_str).and_then(|s| Uuid::parse_str(s).ok())
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Replace the whole document. Entities without a UUID context get one;
    /// line links to regions are rewritten to the new keys.
    pub fn replace(&mut self, doc: DocumentData) {
        self.lines.clear();
        self.regions.clear();

        let mut renamed: Vec<(Value, Uuid)> = Vec::new();
        for mut region in doc.regions {
            let key = context_key(region.context.as_ref()).unwrap_or_else(Uuid::new_v4);
            if let Some(old) = region.context.replace(json!(key.to_string())) {
                renamed.push((old, key));
            }
            self.regions.insert(key, region);
        }
        for mut line in doc.lines {
            let key = context_key(line.context.as_ref()).unwrap_or_else(Uuid::new_v4);
            line.context = Some(json!(key.to_string()));
            line.region = line.region.and_then(|r| {
                renamed.iter().find(|(old, _)| *old == r).map(|(_, key)| json!(key.to_string()))
            });
            self.lines.insert(key, line);
        }
    }

    /// Current document, in order, ready for `Editor::load`.
    pub fn document(&self) -> DocumentData {
        let mut lines: Vec<LineData> = self.lines.values().cloned().collect();
        lines.sort_by_key(|l| l.order);
        let mut regions: Vec<RegionData> = self.regions.values().cloned().collect();
        regions.sort_by_key(|r| r.order);
        DocumentData { lines, regions }
    }

    /// Store a region under `key`.
    pub fn put_region(&mut self, key: Uuid, region: &RegionSnapshot) {
        self.regions.insert(
            key,
            RegionData {
                context: Some(json!(key.to_string())),
                order: Some(region.order),
                polygon: region.polygon.clone(),
                region_type: region.region_type.clone(),
            },
        );
    }

    /// Store a line under `key`. `region` is the owning region's key.
    pub fn put_line(&mut self, key: Uuid, line: &LineSnapshot, region: Option<Uuid>) {
        self.lines.insert(
            key,
            LineData {
                context: Some(json!(key.to_string())),
                order: Some(line.order),
                baseline: line.baseline.clone(),
                mask: line.mask.clone(),
                region: region.map(|r| json!(r.to_string())),
                line_type: line.line_type.clone(),
                text_direction: Some(line.text_direction),
            },
        );
    }

    pub fn remove(&mut self, key: Uuid) {
        self.lines.remove(&key);
        self.regions.remove(&key);
    }
}
