//! Löschen selektierter Teilbäume, mit Kaskade auf Aggregator-Instanzen.

use std::collections::HashMap;

use anyhow::bail;

use crate::app::commands::Command;
use crate::app::context::EditorContext;
use crate::app::events::EditorEvent;
use crate::core::node::NodeKind;
use crate::core::tree::NodePosition;
use crate::core::NodeId;

struct DeleteEntry {
    node: NodeId,
    position: NodePosition,
}

/// Löst die obersten Vertreter der Auswahl aus der Szene.
///
/// Stirbt ein Aggregator, sterben seine registrierten Instanzen mit,
/// auch wenn sie in ganz anderen Screens liegen. Gelöscht wird nur
/// entlang der Szene-Achse, die Teilbäume bleiben für Undo im Speicher.
/// Die Positionen werden in Dokumentreihenfolge festgehalten, damit der
/// Rollback benachbarte Geschwister nacheinander wieder einhängen kann.
pub struct DeleteSelectedNodesCommand {
    requested: Vec<NodeId>,
    entries: Option<Vec<DeleteEntry>>,
    affected: Vec<NodeId>,
}

impl DeleteSelectedNodesCommand {
    pub fn new(nodes: &[NodeId]) -> Self {
        Self {
            requested: nodes.to_vec(),
            entries: None,
            affected: Vec::new(),
        }
    }

    pub fn from_selection(ctx: &EditorContext) -> Self {
        Self::new(&ctx.selection.ids())
    }

    fn detach_entries(&self, ctx: &mut EditorContext) {
        let Some(entries) = &self.entries else {
            return;
        };
        let ids: Vec<NodeId> = entries.iter().map(|e| e.node).collect();
        let mut pruned = 0;
        for &id in &ids {
            pruned += ctx.selection.remove_subtree(&ctx.tree, id);
        }
        if pruned > 0 {
            ctx.events.emit(EditorEvent::SelectionChanged);
        }
        ctx.tree.delete_nodes(&ids, false, true);
    }
}

impl Command for DeleteSelectedNodesCommand {
    fn name(&self) -> &str {
        "Nodes löschen"
    }

    fn execute(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        if self.entries.is_some() {
            self.detach_entries(ctx);
            return Ok(());
        }

        let roots = ctx.tree.top_level_of(&self.requested);

        // Kaskade: Instanzen sterbender Aggregatoren sterben mit.
        let mut combined = roots.clone();
        for &root in &roots {
            for id in ctx.tree.subtree_ids(root) {
                let Some(NodeKind::Aggregator { instances, .. }) =
                    ctx.tree.get_node(id).map(|n| &n.kind)
                else {
                    continue;
                };
                for &instance in instances {
                    if ctx.tree.is_attached(instance) && !combined.contains(&instance) {
                        combined.push(instance);
                    }
                }
            }
        }
        let mut roots = ctx.tree.top_level_of(&combined);

        // Dokumentreihenfolge, damit `after`-Nachbarn beim Rollback schon stehen.
        let order: HashMap<NodeId, usize> = ctx
            .tree
            .subtree_ids(ctx.tree.root_id())
            .into_iter()
            .enumerate()
            .map(|(index, id)| (id, index))
            .collect();
        roots.sort_by_key(|id| order.get(id).copied().unwrap_or(usize::MAX));

        let mut entries = Vec::with_capacity(roots.len());
        let mut affected = Vec::new();
        for &root in &roots {
            let Some(position) = ctx.tree.node_position(root) else {
                log::warn!("Überspringe Node {root} ohne Position in der Szene");
                continue;
            };
            if let Some(screen) = ctx.tree.screen_of(root) {
                if !affected.contains(&screen) {
                    affected.push(screen);
                }
            }
            entries.push(DeleteEntry { node: root, position });
        }
        if entries.is_empty() {
            bail!("Keine löschbaren Nodes in der Auswahl");
        }

        log::info!("Lösche {} Teilbäume", entries.len());
        self.entries = Some(entries);
        self.affected = affected;
        self.detach_entries(ctx);
        Ok(())
    }

    fn rollback(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        let Some(entries) = &self.entries else {
            bail!("Rollback vor der ersten Ausführung");
        };
        for entry in entries {
            if !ctx
                .tree
                .attach_node(entry.node, entry.position.parent, entry.position.insert_at())
            {
                bail!("Node {} lässt sich nicht wiederherstellen", entry.node);
            }
        }
        Ok(())
    }

    fn affected_screens(&self) -> Vec<NodeId> {
        self.affected.clone()
    }
}
