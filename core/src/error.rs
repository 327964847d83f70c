//! Error type for the host-facing editor API.
//!
//! Expected editing edge cases (short lines, empty selections, degenerate
//! cuts) are not errors: they are rejected silently and logged. Only calls
//! the host can get wrong end up here.

use crate::model::EntityId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown entity: {0}")]
    UnknownEntity(EntityId),

    #[error("Unknown type '{0}'")]
    UnknownType(String),
}

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;
