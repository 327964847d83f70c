//! Editor configuration.
//!
//! Every field has a default so a host can supply a partial JSON document.

use crate::editor::shortcuts::{default_keymap, Shortcut};
use crate::error::{EditorError, EditorResult};
use crate::model::TextDirection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Mask extent above the baseline, in pixels
    pub upper_height: f64,
    /// Mask extent below the baseline, in pixels
    pub lower_height: f64,
    /// New lines shorter than this are discarded
    pub length_threshold: f64,
    /// New regions with a smaller area are discarded
    pub area_threshold: f64,
    /// Pointer hit-test radius
    pub hit_tolerance: f64,
    /// Allowed line types; an empty list disables line typing
    pub line_types: Vec<String>,
    /// Allowed region types
    pub region_types: Vec<String>,
    pub default_text_direction: TextDirection,
    pub show_masks: bool,
    pub show_ordering: bool,
    /// Maximum number of undoable commands kept
    pub history_limit: usize,
    /// Key name (e.g. "Ctrl+z", "Delete", "m") to shortcut
    pub keymap: BTreeMap<String, Shortcut>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            upper_height: 20.0,
            lower_height: 10.0,
            length_threshold: 10.0,
            area_threshold: 100.0,
            hit_tolerance: 5.0,
            line_types: Vec::new(),
            region_types: Vec::new(),
            default_text_direction: TextDirection::Ltr,
            show_masks: true,
            show_ordering: false,
            history_limit: 100,
            keymap: default_keymap(),
        }
    }
}

impl EditorConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> EditorResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EditorResult<()> {
        let finite_non_negative = [
            ("upper_height", self.upper_height),
            ("lower_height", self.lower_height),
            ("length_threshold", self.length_threshold),
            ("area_threshold", self.area_threshold),
            ("hit_tolerance", self.hit_tolerance),
        ];
        for (name, value) in finite_non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(EditorError::InvalidConfig(format!("{} must be a non-negative number, got {}", name, value)));
            }
        }
        if self.upper_height + self.lower_height <= 0.0 {
            return Err(EditorError::InvalidConfig("mask height (upper + lower) must be positive".into()));
        }
        if self.history_limit == 0 {
            return Err(EditorError::InvalidConfig("history_limit must be at least 1".into()));
        }
        Ok(())
    }

    pub fn allows_line_type(&self, line_type: &str) -> bool {
        self.line_types.iter().any(|t| t == line_type)
    }

    pub fn allows_region_type(&self, region_type: &str) -> bool {
        self.region_types.iter().any(|t| t == region_type)
    }
}
