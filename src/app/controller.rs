//! Fassade über Commands, Verlauf und Projekt-Lebenszyklus.
//!
//! Der `CommandsController` ist die eine Stelle, an der Commands laufen:
//! er führt sie aus, verbucht die Änderungszähler der betroffenen Screens,
//! gleicht geänderte Aggregator-Templates mit ihren Instanzen ab und
//! pflegt den Undo/Redo-Verlauf samt Ungespeichert-Zähler. Die Oberfläche
//! reicht ausschließlich Commands herein und holt Events aus der Queue ab.

use std::path::{Path, PathBuf};

use anyhow::bail;

use crate::app::commands::Command;
use crate::app::context::EditorContext;
use crate::app::events::EditorEvent;
use crate::app::history::UndoRedoController;
use crate::core::NodeId;
use crate::project::{load_project, save_project, SaveMode};
use crate::shared::EditorOptions;

/// Zentrale Anlaufstelle für alle Dokument-Mutationen.
pub struct CommandsController {
    /// Gesamter Editor-Zustand; für Lesezugriffe der Oberfläche öffentlich.
    pub context: EditorContext,
    history: UndoRedoController,
    /// Saldo seit dem letzten Speichern. Undo hinter den Speicherstand
    /// zurück macht ihn negativ, erst Redo zurück auf den Stand macht das
    /// Projekt wieder "gespeichert".
    unsaved_changes: i32,
}

impl CommandsController {
    pub fn new(options: EditorOptions) -> Self {
        let depth = options.undo_stack_depth;
        Self {
            context: EditorContext::new(options),
            history: UndoRedoController::new_with_capacity(depth),
            unsaved_changes: 0,
        }
    }

    // ── Commands ────────────────────────────────────────────────────

    /// Führt einen Command aus und verbucht ihn.
    ///
    /// Schlägt die Ausführung fehl, bleibt das Dokument unverändert und
    /// der Command wird verworfen; der Fehler geht an den Aufrufer.
    pub fn execute_command(&mut self, command: impl Command + 'static) -> anyhow::Result<()> {
        let mut command = Box::new(command);
        log::debug!("Command '{}' ausführen", command.name());
        command.execute(&mut self.context)?;

        let affected = command.affected_screens();
        self.book_change(&affected, 1);
        self.history.add_command(command);
        self.context.events.emit(EditorEvent::HierarchyChanged);
        Ok(())
    }

    /// Nimmt den jüngsten Command zurück. `Ok(false)` bei leerem Verlauf.
    pub fn undo(&mut self) -> anyhow::Result<bool> {
        let affected = self
            .history
            .peek_undo()
            .map(|command| command.affected_screens())
            .unwrap_or_default();
        if !self.history.undo(&mut self.context)? {
            return Ok(false);
        }
        self.book_change(&affected, -1);
        self.context.events.emit(EditorEvent::HierarchyChanged);
        Ok(true)
    }

    /// Spielt den zuletzt zurückgenommenen Command wieder ein.
    pub fn redo(&mut self) -> anyhow::Result<bool> {
        let affected = self
            .history
            .peek_redo()
            .map(|command| command.affected_screens())
            .unwrap_or_default();
        if !self.history.redo(&mut self.context)? {
            return Ok(false);
        }
        self.book_change(&affected, 1);
        self.context.events.emit(EditorEvent::HierarchyChanged);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Verbucht eine Dokumentänderung: Screen-Zähler, Template-Abgleich,
    /// Ungespeichert-Saldo. `delta` ist `+1` für Ausführen/Redo und `-1`
    /// für Undo.
    fn book_change(&mut self, affected: &[NodeId], delta: i32) {
        for &screen in affected {
            self.context.tree.bump_screen_changes(screen, delta);
        }
        self.sync_affected_templates(affected, delta);
        self.unsaved_changes += delta;
        self.emit_unsaved_state();
    }

    /// Gleicht betroffene Aggregator-Templates mit ihren Instanzen ab und
    /// verbucht die Screens der Instanzen in dieselbe Richtung.
    ///
    /// Losgelöste Templates (etwa nach Undo eines Anlegens) werden
    /// übersprungen; ihre Instanzen gleicht das Redo wieder ab.
    fn sync_affected_templates(&mut self, affected: &[NodeId], delta: i32) {
        for &screen in affected {
            let tree = &self.context.tree;
            let is_live_template = tree.is_attached(screen)
                && tree
                    .get_node(screen)
                    .map(|n| n.is_aggregator())
                    .unwrap_or(false);
            if !is_live_template {
                continue;
            }

            if self.context.tree.sync_aggregator(screen) == 0 {
                continue;
            }
            for instance in self.context.tree.aggregator_instances(screen) {
                if !self.context.tree.is_attached(instance) {
                    continue;
                }
                if let Some(host) = self.context.tree.screen_of(instance) {
                    self.context.tree.bump_screen_changes(host, delta);
                }
            }
            self.context
                .events
                .emit(EditorEvent::AggregatorSynced { template: screen });
        }
    }

    fn emit_unsaved_state(&mut self) {
        self.context.events.emit(EditorEvent::UnsavedStateChanged {
            unsaved: self.unsaved_changes != 0,
        });
    }

    // ── Ungespeichert-Zustand ───────────────────────────────────────

    /// `true`, wenn das Dokument seit dem letzten Speichern unverändert ist.
    pub fn is_last_change_saved(&self) -> bool {
        self.unsaved_changes == 0
    }

    /// Saldo der Änderungen seit dem letzten Speichern.
    pub fn unsaved_changes(&self) -> i32 {
        self.unsaved_changes
    }

    /// Setzt den Speicherstand auf "alles gespeichert".
    pub fn mark_saved(&mut self) {
        self.unsaved_changes = 0;
        self.context.tree.reset_unsaved_marks();
        self.emit_unsaved_state();
    }

    // ── Projekt-Lebenszyklus ────────────────────────────────────────

    /// Verwirft das offene Projekt und beginnt ein leeres. Der Pfad wird
    /// erst beim Speichern gebraucht, darf hier also fehlen.
    pub fn new_project(&mut self, path: Option<PathBuf>) {
        log::info!("Neues Projekt");
        self.context.reset_project(path);
        self.history.clear();
        self.unsaved_changes = 0;
    }

    /// Schließt das offene Projekt. Der Zustand danach entspricht einem
    /// frisch angelegten leeren Projekt.
    pub fn close_project(&mut self) {
        log::info!("Projekt geschlossen");
        self.context.reset_project(None);
        self.history.clear();
        self.unsaved_changes = 0;
    }

    /// Lädt ein Projekt von der Platte und ersetzt das offene.
    pub fn load_project(&mut self, path: &Path) -> anyhow::Result<()> {
        let loaded = load_project(path)?;
        self.context.tree = loaded.tree;
        self.context.localization = loaded.localization;

        // Laufzeit-Optionen gelten auch für geladene Screens.
        for platform in self.context.tree.platform_ids() {
            for screen in self.context.tree.children_of(platform).to_vec() {
                self.context.apply_guide_options(screen);
            }
        }

        self.context.selection.clear();
        self.context.clipboard.clear();
        self.context.last_import_report = None;
        self.history.clear();
        self.unsaved_changes = 0;
        self.context.events.emit(EditorEvent::ProjectChanged);
        Ok(())
    }

    /// Speichert unter dem gemerkten Projektpfad.
    pub fn save_project(&mut self, mode: SaveMode) -> anyhow::Result<usize> {
        let Some(path) = self.context.tree.project_path().map(Path::to_path_buf) else {
            bail!("Kein Projektpfad gesetzt, zuerst 'Speichern unter' verwenden");
        };
        self.save_project_as(&path, mode)
    }

    /// Speichert unter einem neuen Pfad und merkt ihn sich.
    pub fn save_project_as(&mut self, path: &Path, mode: SaveMode) -> anyhow::Result<usize> {
        let written = save_project(&self.context.tree, path, mode)?;
        self.context.tree.set_project_path(Some(path.to_path_buf()));
        self.mark_saved();
        Ok(written)
    }
}

impl Default for CommandsController {
    fn default() -> Self {
        Self::new(EditorOptions::default())
    }
}
