//! Undo/Redo-Verwaltung über begrenzte Command-Stacks.
//!
//! Statt Zustands-Snapshots wandern die ausgeführten Commands selbst in
//! die Stacks: Undo ruft `rollback`, Redo ruft `execute` erneut auf. Die
//! Commands tragen ihren gemerkten Zustand (Ids, Positionen, alte Werte)
//! selbst, der Controller kennt nur das Protokoll.

use crate::app::commands::Command;
use crate::app::context::EditorContext;
use crate::shared::options::UNDO_STACK_DEPTH;

/// Begrenzte Undo/Redo-Stacks über `Box<dyn Command>`.
pub struct UndoRedoController {
    undo_stack: Vec<Box<dyn Command>>,
    redo_stack: Vec<Box<dyn Command>>,
    max_depth: usize,
}

impl Default for UndoRedoController {
    fn default() -> Self {
        Self::new_with_capacity(UNDO_STACK_DEPTH)
    }
}

impl UndoRedoController {
    pub fn new_with_capacity(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth,
        }
    }

    /// Nimmt ein bereits ausgeführtes Command in den Undo-Stack auf.
    ///
    /// Leert den Redo-Stack: Nach einer neuen Änderung gibt es keine
    /// widerrufene Zukunft mehr. Läuft der Stack über `max_depth` hinaus,
    /// fällt der älteste Eintrag heraus.
    pub fn add_command(&mut self, command: Box<dyn Command>) {
        if !command.is_undo_redo_supported() {
            log::warn!("Command '{}' ist nicht widerrufbar, verwerfe", command.name());
            return;
        }
        if self.undo_stack.len() >= self.max_depth {
            self.undo_stack.remove(0);
        }
        self.undo_stack.push(command);
        self.redo_stack.clear();
    }

    /// Macht das jüngste Command rückgängig.
    ///
    /// `Ok(false)` bei leerem Stack. Schlägt der Rollback fehl, wird der
    /// Fehler durchgereicht und das Command verworfen, damit kein
    /// halb zurückgerollter Eintrag im Stack verbleibt.
    pub fn undo(&mut self, ctx: &mut EditorContext) -> anyhow::Result<bool> {
        let Some(mut command) = self.undo_stack.pop() else {
            return Ok(false);
        };
        log::debug!("Undo: {}", command.name());
        if let Err(e) = command.rollback(ctx) {
            log::error!("Rollback von '{}' fehlgeschlagen: {e:#}", command.name());
            return Err(e);
        }
        if self.redo_stack.len() >= self.max_depth {
            self.redo_stack.remove(0);
        }
        self.redo_stack.push(command);
        Ok(true)
    }

    /// Führt das jüngste widerrufene Command erneut aus.
    pub fn redo(&mut self, ctx: &mut EditorContext) -> anyhow::Result<bool> {
        let Some(mut command) = self.redo_stack.pop() else {
            return Ok(false);
        };
        log::debug!("Redo: {}", command.name());
        if let Err(e) = command.execute(ctx) {
            log::error!("Redo von '{}' fehlgeschlagen: {e:#}", command.name());
            return Err(e);
        }
        if self.undo_stack.len() >= self.max_depth {
            self.undo_stack.remove(0);
        }
        self.undo_stack.push(command);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Oberstes Undo-Command, ohne es zu entnehmen.
    pub fn peek_undo(&self) -> Option<&dyn Command> {
        self.undo_stack.last().map(|c| c.as_ref())
    }

    /// Oberstes Redo-Command, ohne es zu entnehmen.
    pub fn peek_redo(&self) -> Option<&dyn Command> {
        self.redo_stack.last().map(|c| c.as_ref())
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Verwirft beide Stacks (Projektwechsel).
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::commands::CreatePlatformCommand;
    use glam::Vec2;

    fn executed_command(ctx: &mut EditorContext, name: &str) -> Box<dyn Command> {
        let mut cmd = CreatePlatformCommand::new(name, Some(Vec2::new(800.0, 480.0)));
        cmd.execute(ctx).expect("Erstausführung");
        Box::new(cmd)
    }

    #[test]
    fn undo_redo_roundtrip_restores_the_tree() {
        let mut ctx = EditorContext::default();
        let mut history = UndoRedoController::default();

        let cmd = executed_command(&mut ctx, "iPhone");
        history.add_command(cmd);
        assert_eq!(ctx.tree.children_of(ctx.tree.root_id()).len(), 1);

        assert!(history.undo(&mut ctx).expect("undo vorhanden"));
        assert_eq!(ctx.tree.children_of(ctx.tree.root_id()).len(), 0);
        assert!(history.can_redo());

        assert!(history.redo(&mut ctx).expect("redo vorhanden"));
        assert_eq!(ctx.tree.children_of(ctx.tree.root_id()).len(), 1);
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn empty_stacks_return_ok_false() {
        let mut ctx = EditorContext::default();
        let mut history = UndoRedoController::default();

        assert!(!history.undo(&mut ctx).expect("kein Fehler"));
        assert!(!history.redo(&mut ctx).expect("kein Fehler"));
    }

    #[test]
    fn oldest_entry_drops_out_on_overflow() {
        let mut ctx = EditorContext::default();
        let mut history = UndoRedoController::new_with_capacity(3);

        for i in 0..5 {
            let cmd = executed_command(&mut ctx, &format!("Platform{i}"));
            history.add_command(cmd);
        }
        assert_eq!(history.undo_len(), 3);

        // Nur die drei jüngsten Commands sind widerrufbar.
        for _ in 0..3 {
            assert!(history.undo(&mut ctx).expect("undo vorhanden"));
        }
        assert!(!history.undo(&mut ctx).expect("Stack leer"));
        assert_eq!(ctx.tree.children_of(ctx.tree.root_id()).len(), 2);
    }

    #[test]
    fn new_command_clears_the_redo_stack() {
        let mut ctx = EditorContext::default();
        let mut history = UndoRedoController::default();

        history.add_command(executed_command(&mut ctx, "iPhone"));
        assert!(history.undo(&mut ctx).expect("undo vorhanden"));
        assert!(history.can_redo());

        history.add_command(executed_command(&mut ctx, "Android"));
        assert!(!history.can_redo());
        assert_eq!(history.undo_len(), 1);
    }

    #[test]
    fn peek_returns_names_without_popping() {
        let mut ctx = EditorContext::default();
        let mut history = UndoRedoController::default();

        history.add_command(executed_command(&mut ctx, "iPhone"));
        assert_eq!(history.peek_undo().map(|c| c.name()), Some("Platform anlegen"));
        assert_eq!(history.undo_len(), 1);
        assert!(history.peek_redo().is_none());
    }
}
