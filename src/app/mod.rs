//! Application-Layer: Kontext, Commands, Verlauf und Fassade.

pub mod clipboard;
pub mod commands;
pub mod context;
pub mod controller;
pub mod events;
pub mod history;
pub mod selection;

pub use clipboard::{ClipboardKind, CopyPasteController};
pub use commands::Command;
pub use context::EditorContext;
pub use controller::CommandsController;
pub use events::{EditorEvent, EventQueue};
pub use history::UndoRedoController;
pub use selection::Selection;
