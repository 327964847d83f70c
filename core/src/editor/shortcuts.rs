//! Keyboard shortcuts and the default keymap.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shortcut {
    DeleteSelection,
    /// Delete only the selected vertices, keeping the entities.
    DeleteVertices,
    ToggleCut,
    ToggleMasks,
    ToggleMode,
    ToggleOrdering,
    SelectAll,
    Reverse,
    Merge,
    /// Link the selected lines to the region under them, or unlink them.
    Link,
    TypePrompt,
    Undo,
    Redo,
}

/// Modifier keys held with a key press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyModifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

/// Canonical keymap name of a key press, e.g. `Ctrl+Shift+z`. Single
/// characters are lowercased so Shift does not change the key itself.
pub fn key_name(key: &str, modifiers: KeyModifiers) -> String {
    let key = if key.chars().count() == 1 { key.to_lowercase() } else { key.to_string() };
    let mut name = String::new();
    if modifiers.ctrl {
        name.push_str("Ctrl+");
    }
    if modifiers.alt {
        name.push_str("Alt+");
    }
    if modifiers.shift {
        name.push_str("Shift+");
    }
    name.push_str(&key);
    name
}

pub fn default_keymap() -> BTreeMap<String, Shortcut> {
    [
        ("Delete", Shortcut::DeleteSelection),
        ("Backspace", Shortcut::DeleteSelection),
        ("Shift+Delete", Shortcut::DeleteVertices),
        ("Shift+Backspace", Shortcut::DeleteVertices),
        ("c", Shortcut::ToggleCut),
        ("m", Shortcut::ToggleMasks),
        ("r", Shortcut::ToggleMode),
        ("o", Shortcut::ToggleOrdering),
        ("Ctrl+a", Shortcut::SelectAll),
        ("i", Shortcut::Reverse),
        ("j", Shortcut::Merge),
        ("l", Shortcut::Link),
        ("t", Shortcut::TypePrompt),
        ("Ctrl+z", Shortcut::Undo),
        ("Ctrl+y", Shortcut::Redo),
        ("Ctrl+Shift+z", Shortcut::Redo),
    ]
    .into_iter()
    .map(|(key, shortcut)| (key.to_string(), shortcut))
    .collect()
}
