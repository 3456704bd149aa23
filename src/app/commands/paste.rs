//! Einfügen aus der Zwischenablage.

use anyhow::bail;

use crate::app::clipboard::ClipboardKind;
use crate::app::commands::Command;
use crate::app::context::EditorContext;
use crate::app::events::EditorEvent;
use crate::core::tree::NodePosition;
use crate::core::{format_copy_name, NodeId};

/// Materialisiert den Inhalt der Zwischenablage unter einem Ziel-Node.
///
/// Jede eingefügte Wurzel bekommt einen frischen Kopiennamen, auch wenn
/// der Originalname im Ziel noch frei wäre. Die Zwischenablage bleibt
/// unverändert, derselbe Inhalt lässt sich mehrfach einfügen. Redo hängt
/// exakt dieselben Nodes wieder ein, statt neu zu materialisieren.
pub struct PasteCommand {
    target: NodeId,
    pasted: Option<Vec<(NodeId, NodePosition)>>,
    affected: Vec<NodeId>,
}

impl PasteCommand {
    pub fn new(target: NodeId) -> Self {
        Self {
            target,
            pasted: None,
            affected: Vec::new(),
        }
    }

    fn select_pasted(&self, ctx: &mut EditorContext) {
        let Some(pasted) = &self.pasted else {
            return;
        };
        ctx.selection.clear();
        for &(id, _) in pasted {
            ctx.selection.add(id);
        }
        ctx.events.emit(EditorEvent::SelectionChanged);
    }
}

impl Command for PasteCommand {
    fn name(&self) -> &str {
        "Einfügen"
    }

    fn execute(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        if let Some(pasted) = &self.pasted {
            for &(id, position) in pasted {
                if !ctx.tree.attach_node(id, position.parent, position.insert_at()) {
                    bail!("Node {} lässt sich nicht wieder einfügen", id);
                }
            }
            self.select_pasted(ctx);
            return Ok(());
        }

        if !ctx.clipboard.has_content() {
            bail!("Zwischenablage ist leer");
        }
        let Some(target_node) = ctx.tree.get_node(self.target) else {
            bail!("Ziel-Node {} existiert nicht", self.target);
        };
        let target_ok = match ctx.clipboard.kind() {
            ClipboardKind::Control => target_node.is_screen_like() || target_node.is_control_like(),
            ClipboardKind::Screen => target_node.is_platform(),
            ClipboardKind::Platform => self.target == ctx.tree.root_id(),
            ClipboardKind::None => false,
        };
        if !target_ok {
            bail!(
                "{:?}-Inhalt passt nicht unter einen {}",
                ctx.clipboard.kind(),
                target_node.kind.kind_name()
            );
        }

        let items = ctx.clipboard.items().to_vec();
        let max_attempts = ctx.options.copy_name_max_attempts;
        let mut pasted = Vec::with_capacity(items.len());
        for item in &items {
            let copy_name = format_copy_name(&ctx.tree, &item.name, self.target, max_attempts);
            let Some(id) = item.materialize(&mut ctx.tree, self.target) else {
                log::warn!("'{}' ließ sich nicht einfügen, übersprungen", item.name);
                continue;
            };
            if let Some(node) = ctx.tree.get_node_mut(id) {
                node.name = copy_name;
            }
            let Some(position) = ctx.tree.node_position(id) else {
                bail!("Eingefügter Node {} hat keine Position", id);
            };
            pasted.push((id, position));
        }
        if pasted.is_empty() {
            bail!("Kein Eintrag der Zwischenablage passte unter das Ziel");
        }

        let mut affected = Vec::new();
        for &(id, _) in &pasted {
            let Some(node) = ctx.tree.get_node(id) else {
                continue;
            };
            if node.is_platform() {
                for &screen in ctx.tree.children_of(id) {
                    if !affected.contains(&screen) {
                        affected.push(screen);
                    }
                }
            } else if let Some(screen) = ctx.tree.screen_of(id) {
                if !affected.contains(&screen) {
                    affected.push(screen);
                }
            }
        }

        log::info!("{} Teilbäume eingefügt unter {}", pasted.len(), self.target);
        self.pasted = Some(pasted);
        self.affected = affected;
        self.select_pasted(ctx);
        Ok(())
    }

    fn rollback(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        let Some(pasted) = &self.pasted else {
            bail!("Rollback vor der ersten Ausführung");
        };
        let ids: Vec<NodeId> = pasted.iter().map(|&(id, _)| id).collect();
        let mut pruned = 0;
        for &id in &ids {
            pruned += ctx.selection.remove_subtree(&ctx.tree, id);
        }
        if pruned > 0 {
            ctx.events.emit(EditorEvent::SelectionChanged);
        }
        ctx.tree.delete_nodes(&ids, false, true);
        Ok(())
    }

    fn affected_screens(&self) -> Vec<NodeId> {
        self.affected.clone()
    }
}
