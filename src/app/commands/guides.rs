//! Commands für Guides: Anlegen, Verschieben, Löschen.
//!
//! Die interaktiven Abläufe (Ziehen, Einrasten) laufen direkt über den
//! `GuidesManager` des Screens; erst das `accept_*` erzeugt eines dieser
//! Commands. Die Erstausführung stellt deshalb nur sicher, dass der vom
//! Ablauf hinterlassene Zustand stimmt, Undo und Redo spulen ihn exakt
//! vor und zurück.

use anyhow::bail;
use glam::Vec2;

use crate::app::commands::Command;
use crate::app::context::EditorContext;
use crate::core::{GuideData, GuideKind, NodeId};

/// Hält eine angenommene neue Guide im Screen fest.
pub struct AddGuideCommand {
    screen: NodeId,
    guide: GuideData,
}

impl AddGuideCommand {
    pub fn new(screen: NodeId, guide: GuideData) -> Self {
        Self { screen, guide }
    }
}

impl Command for AddGuideCommand {
    fn name(&self) -> &str {
        "Guide anlegen"
    }

    fn execute(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        let Some(guides) = ctx.guides_mut(self.screen) else {
            bail!("Node {} hat keine Guides", self.screen);
        };
        if !guides.guide_exists(&self.guide) {
            guides.add_guide(self.guide);
        }
        Ok(())
    }

    fn rollback(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        let Some(guides) = ctx.guides_mut(self.screen) else {
            bail!("Node {} hat keine Guides", self.screen);
        };
        if !guides.remove_guide(&self.guide) {
            log::warn!("Guide zum Entfernen nicht gefunden: {:?}", self.guide);
        }
        Ok(())
    }

    fn affected_screens(&self) -> Vec<NodeId> {
        vec![self.screen]
    }
}

/// Hält die Verschiebung einer bestehenden Guide fest.
pub struct MoveGuideCommand {
    screen: NodeId,
    kind: GuideKind,
    from: Vec2,
    to: Vec2,
}

impl MoveGuideCommand {
    pub fn new(screen: NodeId, kind: GuideKind, from: Vec2, to: Vec2) -> Self {
        Self {
            screen,
            kind,
            from,
            to,
        }
    }

    fn shift(&self, ctx: &mut EditorContext, from: Vec2, to: Vec2) -> anyhow::Result<()> {
        let Some(guides) = ctx.guides_mut(self.screen) else {
            bail!("Node {} hat keine Guides", self.screen);
        };
        let source = GuideData::new(self.kind, from);
        if guides.update_guide_position(&source, to) {
            return Ok(());
        }
        // Der interaktive Ablauf hat die Guide schon ans Ziel gestellt.
        if guides.guide_exists(&GuideData::new(self.kind, to)) {
            return Ok(());
        }
        bail!("Guide bei {:?} nicht gefunden", from);
    }
}

impl Command for MoveGuideCommand {
    fn name(&self) -> &str {
        "Guide verschieben"
    }

    fn execute(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        self.shift(ctx, self.from, self.to)
    }

    fn rollback(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        self.shift(ctx, self.to, self.from)
    }

    fn affected_screens(&self) -> Vec<NodeId> {
        vec![self.screen]
    }
}

/// Löscht die selektierten Guides eines Screens.
pub struct DeleteGuidesCommand {
    screen: NodeId,
    removed: Option<Vec<GuideData>>,
}

impl DeleteGuidesCommand {
    pub fn new(screen: NodeId) -> Self {
        Self {
            screen,
            removed: None,
        }
    }
}

impl Command for DeleteGuidesCommand {
    fn name(&self) -> &str {
        "Guides löschen"
    }

    fn execute(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        let Some(guides) = ctx.guides_mut(self.screen) else {
            bail!("Node {} hat keine Guides", self.screen);
        };
        if let Some(removed) = &self.removed {
            for guide in removed {
                if !guides.remove_guide(guide) {
                    log::warn!("Guide zum Entfernen nicht gefunden: {guide:?}");
                }
            }
            return Ok(());
        }

        let removed = guides.delete_selected_guides();
        if removed.is_empty() {
            bail!("Keine Guides selektiert");
        }
        log::info!("{} Guides gelöscht", removed.len());
        self.removed = Some(removed);
        Ok(())
    }

    fn rollback(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        let Some(removed) = &self.removed else {
            bail!("Rollback vor der ersten Ausführung");
        };
        let Some(guides) = ctx.guides_mut(self.screen) else {
            bail!("Node {} hat keine Guides", self.screen);
        };
        for &guide in removed {
            guides.add_guide(guide);
        }
        Ok(())
    }

    fn affected_screens(&self) -> Vec<NodeId> {
        vec![self.screen]
    }
}
