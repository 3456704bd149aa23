//! Geometrie-Commands: Controls verschieben und umformen.

use anyhow::bail;
use glam::Vec2;

use crate::app::commands::Command;
use crate::app::context::EditorContext;
use crate::core::{NodeId, Rect};

/// Verschiebt eine Menge von Controls um einen gemeinsamen Vektor.
///
/// Entsteht am Ende einer Drag-Geste: Der interaktive Versatz ist dann
/// schon sichtbar, die Erstausführung hält nur die Ausgangsrechtecke
/// fest und rechnet die Endlage deterministisch aus ihnen aus.
pub struct MoveControlsCommand {
    ids: Vec<NodeId>,
    delta: Vec2,
    previous: Option<Vec<(NodeId, Rect)>>,
    affected: Vec<NodeId>,
}

impl MoveControlsCommand {
    pub fn new(ids: &[NodeId], delta: Vec2) -> Self {
        Self {
            ids: ids.to_vec(),
            delta,
            previous: None,
            affected: Vec::new(),
        }
    }

    fn apply_delta(&self, ctx: &mut EditorContext) {
        let Some(previous) = &self.previous else {
            return;
        };
        for &(id, rect) in previous {
            if let Some(data) = ctx.tree.get_node_mut(id).and_then(|n| n.control_data_mut()) {
                data.rect.pos = rect.pos + self.delta;
            }
        }
    }
}

impl Command for MoveControlsCommand {
    fn name(&self) -> &str {
        "Controls verschieben"
    }

    fn execute(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        if self.previous.is_some() {
            self.apply_delta(ctx);
            return Ok(());
        }

        let mut previous = Vec::with_capacity(self.ids.len());
        let mut affected = Vec::new();
        for &id in &self.ids {
            let Some(rect) = ctx.tree.get_node(id).and_then(|n| n.control_data()).map(|d| d.rect)
            else {
                log::warn!("MoveControls: Node {} ist kein Control, übersprungen", id);
                continue;
            };
            previous.push((id, rect));
            if let Some(screen) = ctx.tree.screen_of(id) {
                if !affected.contains(&screen) {
                    affected.push(screen);
                }
            }
        }
        if previous.is_empty() {
            bail!("Keine verschiebbaren Controls im Auftrag");
        }

        self.previous = Some(previous);
        self.affected = affected;
        self.apply_delta(ctx);
        Ok(())
    }

    fn rollback(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        let Some(previous) = &self.previous else {
            bail!("Rollback vor der ersten Ausführung");
        };
        for &(id, rect) in previous {
            if let Some(data) = ctx.tree.get_node_mut(id).and_then(|n| n.control_data_mut()) {
                data.rect = rect;
            }
        }
        Ok(())
    }

    fn affected_screens(&self) -> Vec<NodeId> {
        self.affected.clone()
    }
}

/// Setzt die Geometrie eines Controls absolut (Resize-Geste, Eigenschafts-Panel).
pub struct SetControlRectCommand {
    id: NodeId,
    new_rect: Rect,
    previous: Option<Rect>,
    affected: Vec<NodeId>,
}

impl SetControlRectCommand {
    pub fn new(id: NodeId, new_rect: Rect) -> Self {
        Self {
            id,
            new_rect,
            previous: None,
            affected: Vec::new(),
        }
    }
}

impl Command for SetControlRectCommand {
    fn name(&self) -> &str {
        "Control-Geometrie setzen"
    }

    fn execute(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        if self.previous.is_none() {
            let Some(rect) = ctx
                .tree
                .get_node(self.id)
                .and_then(|n| n.control_data())
                .map(|d| d.rect)
            else {
                bail!("Node {} ist kein Control", self.id);
            };
            self.previous = Some(rect);
            self.affected = ctx.tree.screen_of(self.id).into_iter().collect();
        }
        if let Some(data) = ctx
            .tree
            .get_node_mut(self.id)
            .and_then(|n| n.control_data_mut())
        {
            data.rect = self.new_rect;
        }
        Ok(())
    }

    fn rollback(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        let Some(previous) = self.previous else {
            bail!("Rollback vor der ersten Ausführung");
        };
        if let Some(data) = ctx
            .tree
            .get_node_mut(self.id)
            .and_then(|n| n.control_data_mut())
        {
            data.rect = previous;
        }
        Ok(())
    }

    fn affected_screens(&self) -> Vec<NodeId> {
        self.affected.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_with_two_controls() -> (EditorContext, NodeId, NodeId, NodeId) {
        let mut ctx = EditorContext::default();
        let platform = ctx
            .tree
            .add_platform("iPhone", Vec2::new(800.0, 480.0), "en");
        let screen = ctx.tree.add_screen("Main", platform).expect("Screen");
        let a = ctx
            .tree
            .create_control(screen, "A", Rect::new(10.0, 10.0, 50.0, 20.0))
            .expect("Control");
        let b = ctx
            .tree
            .create_control(screen, "B", Rect::new(100.0, 40.0, 50.0, 20.0))
            .expect("Control");
        (ctx, screen, a, b)
    }

    fn rect_of(ctx: &EditorContext, id: NodeId) -> Rect {
        ctx.tree.get_node(id).unwrap().control_data().unwrap().rect
    }

    #[test]
    fn move_rollback_and_redo() {
        let (mut ctx, _screen, a, b) = context_with_two_controls();
        let delta = Vec2::new(5.0, -3.0);

        let mut cmd = MoveControlsCommand::new(&[a, b], delta);
        cmd.execute(&mut ctx).expect("Verschieben");
        assert_eq!(rect_of(&ctx, a).pos, Vec2::new(15.0, 7.0));
        assert_eq!(rect_of(&ctx, b).pos, Vec2::new(105.0, 37.0));

        cmd.rollback(&mut ctx).expect("Rollback");
        assert_eq!(rect_of(&ctx, a).pos, Vec2::new(10.0, 10.0));
        assert_eq!(rect_of(&ctx, b).pos, Vec2::new(100.0, 40.0));

        cmd.execute(&mut ctx).expect("Redo");
        assert_eq!(rect_of(&ctx, a).pos, Vec2::new(15.0, 7.0));
    }

    #[test]
    fn non_controls_are_skipped() {
        let (mut ctx, screen, a, _b) = context_with_two_controls();

        let mut cmd = MoveControlsCommand::new(&[screen, a], Vec2::new(1.0, 1.0));
        cmd.execute(&mut ctx).expect("Verschieben");
        assert_eq!(rect_of(&ctx, a).pos, Vec2::new(11.0, 11.0));
        assert_eq!(cmd.affected_screens(), vec![screen]);
    }

    #[test]
    fn empty_request_is_rejected() {
        let (mut ctx, screen, _a, _b) = context_with_two_controls();
        let mut cmd = MoveControlsCommand::new(&[screen], Vec2::ONE);
        assert!(cmd.execute(&mut ctx).is_err());
    }

    #[test]
    fn set_rect_with_rollback() {
        let (mut ctx, _screen, a, _b) = context_with_two_controls();
        let ziel = Rect::new(0.0, 0.0, 200.0, 80.0);

        let mut cmd = SetControlRectCommand::new(a, ziel);
        cmd.execute(&mut ctx).expect("Setzen");
        assert_eq!(rect_of(&ctx, a), ziel);

        cmd.rollback(&mut ctx).expect("Rollback");
        assert_eq!(rect_of(&ctx, a), Rect::new(10.0, 10.0, 50.0, 20.0));
    }
}
