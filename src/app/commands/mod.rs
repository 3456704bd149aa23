//! Reversible Commands auf dem Dokumentbaum.
//!
//! Alle Commands folgen demselben Zwei-Phasen-Protokoll: der erste
//! `execute` führt die eigentliche Mutation aus und hält den Zustand fest,
//! den `rollback` zum Umkehren braucht. Jeder weitere `execute` (Redo)
//! spielt nur den festgehaltenen Zustand wieder ein — ein gelöschter Node
//! wird wieder angehängt statt neu aufgebaut, deshalb behalten Nodes über
//! Undo/Redo-Zyklen hinweg ihre Ids.

pub mod control;
pub mod delete;
pub mod guides;
pub mod hierarchy;
pub mod import;
pub mod items;
pub mod paste;

use crate::app::context::EditorContext;
use crate::core::NodeId;

/// Eine umkehrbare (oder bewusst nicht umkehrbare) Mutation des Dokuments.
pub trait Command {
    /// Anzeigename für Logmeldungen und den Verlauf.
    fn name(&self) -> &str;

    /// Führt den Command aus.
    ///
    /// Scheitert die Validierung, kommt ein `Err` zurück, bevor irgendetwas
    /// mutiert wurde — der Command darf dann nicht in den Verlauf.
    fn execute(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()>;

    /// Macht den Command rückgängig. Der festgehaltene Zustand bleibt
    /// erhalten, damit ein folgendes Redo ihn wieder einspielen kann.
    fn rollback(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()>;

    /// Ob der Command in den Undo/Redo-Verlauf darf. Für Importe steht das
    /// erst nach dem ersten `execute` fest.
    fn is_undo_redo_supported(&self) -> bool {
        true
    }

    /// Screens, deren Änderungszähler dieser Command bewegt. Wird vom
    /// Facade nach `execute` bzw. `rollback` verrechnet und ist erst nach
    /// dem ersten `execute` aussagekräftig.
    fn affected_screens(&self) -> Vec<NodeId> {
        Vec::new()
    }
}

pub use control::{MoveControlsCommand, SetControlRectCommand};
pub use delete::DeleteSelectedNodesCommand;
pub use guides::{AddGuideCommand, DeleteGuidesCommand, MoveGuideCommand};
pub use hierarchy::ChangeNodeHierarchyCommand;
pub use import::{ImportAction, ImportItem, ImportPlatformCommand, ImportReport, ImportScreensCommand};
pub use items::{
    CreateAggregatorCommand, CreateControlCommand, CreatePlatformCommand, CreateScreenCommand,
    RenameNodeCommand,
};
pub use paste::PasteCommand;
