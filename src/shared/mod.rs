//! Geteilte Typen für layer-übergreifende Verträge.
//!
//! Enthält die Editor-Optionen samt Fallback-Konstanten, die zwischen
//! `core`, `app` und `project` geteilt werden.

pub mod options;

pub use options::EditorOptions;
pub use options::{GUIDE_STICK_THRESHOLD, STICK_TO_CENTERS, STICK_TO_SIDES, UNDO_STACK_DEPTH};
