pub mod config;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod model;
pub mod ops;

pub use config::EditorConfig;
pub use editor::{Editor, EngineEvent};
pub use error::{EditorError, EditorResult};
