//! UI-Layout-Editor Library.
//! Core-Funktionalität als Library exportiert für Tests und Wiederverwendung.

pub mod app;
pub mod core;
pub mod project;
pub mod shared;

pub use app::{
    ClipboardKind, Command, CommandsController, CopyPasteController, EditorContext, EditorEvent,
    EventQueue, Selection, UndoRedoController,
};
pub use core::{
    GuideData, GuideKind, GuidesManager, InsertAt, Node, NodeId, NodeKind, Rect, Tree,
};
pub use project::{load_project, save_project, LocalizationTable, SaveMode};
pub use shared::EditorOptions;
