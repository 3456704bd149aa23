//! Gemeinsamer Editor-Zustand.
//!
//! Der Kontext bündelt Baum, Selektion, Zwischenablage, Event-Queue und
//! Optionen und wird per Konstruktor an Commands und Controller gereicht —
//! es gibt keinen globalen Zustand.

use std::path::PathBuf;

use indexmap::IndexMap;

use crate::app::clipboard::CopyPasteController;
use crate::app::commands::import::ImportReport;
use crate::app::events::{EditorEvent, EventQueue};
use crate::app::selection::Selection;
use crate::core::{GuidesManager, NodeId, Tree};
use crate::project::LocalizationTable;
use crate::shared::EditorOptions;

/// Vollständiger Zustand eines offenen Projekts.
pub struct EditorContext {
    /// Der Dokumentbaum; alleiniger Besitzer aller Nodes.
    pub tree: Tree,
    /// Aktuelle Mehrfachselektion (nur Ids).
    pub selection: Selection,
    /// Zwischenablage für Copy/Paste.
    pub clipboard: CopyPasteController,
    /// Anstehende Events für die Oberfläche.
    pub events: EventQueue,
    /// Laufzeit-Optionen (Undo-Tiefe, Standardgrößen, Guide-Verhalten).
    pub options: EditorOptions,
    /// Geladene Lokalisierungstabellen je Platform.
    pub localization: IndexMap<NodeId, LocalizationTable>,
    /// Bericht des letzten Imports, für die Fehleranzeige der Oberfläche.
    pub last_import_report: Option<ImportReport>,
}

impl EditorContext {
    /// Erstellt einen Kontext mit leerem Projekt.
    pub fn new(options: EditorOptions) -> Self {
        Self {
            tree: Tree::new(),
            selection: Selection::new(),
            clipboard: CopyPasteController::new(),
            events: EventQueue::new(),
            options,
            localization: IndexMap::new(),
            last_import_report: None,
        }
    }

    /// Guides des angegebenen Screens bzw. Aggregators.
    pub fn guides_mut(&mut self, screen: NodeId) -> Option<&mut GuidesManager> {
        self.tree
            .get_node_mut(screen)
            .and_then(|node| node.screen_data_mut())
            .map(|data| &mut data.guides)
    }

    /// Überträgt die Guide-Optionen auf den Screen bzw. Aggregator.
    /// Wird beim Anlegen, Laden und Importieren von Screens aufgerufen,
    /// damit alle Screens dieselben Laufzeit-Einstellungen tragen.
    pub fn apply_guide_options(&mut self, screen: NodeId) {
        let threshold = self.options.guide_stick_threshold;
        let mode = self.options.guide_stick_mode;
        if let Some(guides) = self.guides_mut(screen) {
            guides.set_stick_threshold(threshold);
            guides.set_stick_mode(mode);
        }
    }

    /// Setzt den Kontext auf ein frisches Projekt zurück.
    ///
    /// Der alte Baum wird mitsamt aller losgelösten Teilbäume freigegeben;
    /// Selektion, Zwischenablage und Lokalisierung werden geleert. Den
    /// Undo/Redo-Verlauf verwirft der [`CommandsController`], der diese
    /// Methode aufruft.
    ///
    /// [`CommandsController`]: crate::app::controller::CommandsController
    pub fn reset_project(&mut self, path: Option<PathBuf>) {
        self.tree = Tree::new();
        self.tree.set_project_path(path);
        self.selection.clear();
        self.clipboard.clear();
        self.localization.clear();
        self.last_import_report = None;
        self.events.emit(EditorEvent::ProjectChanged);
    }
}

impl Default for EditorContext {
    fn default() -> Self {
        Self::new(EditorOptions::default())
    }
}
