//! Reading and writing the game's JSON scene-graph level files.

pub mod export;
pub mod format;
pub mod import;

pub use export::{export_level, render_level, validate_for_export, LevelValidationError, ValidationIssue};
pub use import::{import_level, parse_level, parse_scene_key};
