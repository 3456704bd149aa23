//! Umhängen von Nodes: neuer Parent und/oder neue Geschwisterposition.

use std::collections::HashMap;

use anyhow::bail;

use crate::app::commands::Command;
use crate::app::context::EditorContext;
use crate::core::tree::{InsertAt, NodePosition};
use crate::core::NodeId;

/// Verschiebt eine Menge von Nodes unter einen neuen Parent.
///
/// Alle Prüfungen laufen vor der ersten Mutation, damit ein abgelehnter
/// Auftrag den Baum unangetastet lässt. Der erste Node landet an der
/// Zielposition, jeder weitere direkt hinter seinem Vorgänger, die
/// Auftragsreihenfolge bleibt also erhalten.
pub struct ChangeNodeHierarchyCommand {
    nodes: Vec<NodeId>,
    new_parent: NodeId,
    insert: InsertAt,
    previous: Option<Vec<(NodeId, NodePosition)>>,
    affected: Vec<NodeId>,
}

impl ChangeNodeHierarchyCommand {
    pub fn new(nodes: &[NodeId], new_parent: NodeId, insert: InsertAt) -> Self {
        Self {
            nodes: nodes.to_vec(),
            new_parent,
            insert,
            previous: None,
            affected: Vec::new(),
        }
    }

    fn apply_move(&self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        for &node in &self.nodes {
            ctx.tree.detach_node(node);
        }
        let mut anchor = self.insert;
        for &node in &self.nodes {
            if !ctx.tree.attach_node(node, self.new_parent, anchor) {
                bail!("Node {} lässt sich nicht unter {} einhängen", node, self.new_parent);
            }
            anchor = InsertAt::After(node);
        }
        Ok(())
    }
}

impl Command for ChangeNodeHierarchyCommand {
    fn name(&self) -> &str {
        "Hierarchie ändern"
    }

    fn execute(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        if self.previous.is_some() {
            return self.apply_move(ctx);
        }

        let nodes = ctx.tree.top_level_of(&self.nodes);
        if nodes.is_empty() {
            bail!("Keine verschiebbaren Nodes im Auftrag");
        }
        if !ctx.tree.is_attached(self.new_parent) {
            bail!("Ziel-Parent {} hängt nicht in der Szene", self.new_parent);
        }
        let Some(parent_node) = ctx.tree.get_node(self.new_parent) else {
            bail!("Ziel-Parent {} existiert nicht", self.new_parent);
        };
        for &node in &nodes {
            let Some(moved) = ctx.tree.get_node(node) else {
                bail!("Node {} existiert nicht", node);
            };
            if ctx.tree.node_position(node).is_none() {
                bail!("Node {} hängt nicht in der Szene", node);
            }
            if !parent_node.kind.can_adopt(&moved.kind) {
                bail!(
                    "{} darf kein {} aufnehmen",
                    parent_node.kind.kind_name(),
                    moved.kind.kind_name()
                );
            }
            if node == self.new_parent || ctx.tree.is_descendant_of(self.new_parent, node) {
                bail!("Node {} kann nicht in den eigenen Teilbaum wandern", node);
            }
        }
        if let InsertAt::After(sibling) = self.insert {
            if nodes.contains(&sibling) {
                bail!("Ziel-Nachbar {} wird selbst verschoben", sibling);
            }
            if !ctx.tree.children_of(self.new_parent).contains(&sibling) {
                bail!("Ziel-Nachbar {} liegt nicht unter dem neuen Parent", sibling);
            }
        }

        // Alte Positionen in Dokumentreihenfolge festhalten.
        let order: HashMap<NodeId, usize> = ctx
            .tree
            .subtree_ids(ctx.tree.root_id())
            .into_iter()
            .enumerate()
            .map(|(index, id)| (id, index))
            .collect();
        let mut previous: Vec<(NodeId, NodePosition)> = Vec::with_capacity(nodes.len());
        for &node in &nodes {
            let Some(position) = ctx.tree.node_position(node) else {
                bail!("Node {} hängt nicht in der Szene", node);
            };
            previous.push((node, position));
        }
        previous.sort_by_key(|&(node, _)| order.get(&node).copied().unwrap_or(usize::MAX));

        let mut affected = Vec::new();
        for &node in &nodes {
            if let Some(screen) = ctx.tree.screen_of(node) {
                if !affected.contains(&screen) {
                    affected.push(screen);
                }
            }
        }
        if let Some(screen) = ctx.tree.screen_of(self.new_parent) {
            if !affected.contains(&screen) {
                affected.push(screen);
            }
        }

        self.nodes = nodes;
        self.previous = Some(previous);
        self.affected = affected;
        self.apply_move(ctx)
    }

    fn rollback(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        let Some(previous) = &self.previous else {
            bail!("Rollback vor der ersten Ausführung");
        };
        for &(node, _) in previous {
            ctx.tree.detach_node(node);
        }
        for &(node, position) in previous {
            if !ctx.tree.attach_node(node, position.parent, position.insert_at()) {
                bail!("Node {} lässt sich nicht zurückhängen", node);
            }
        }
        Ok(())
    }

    fn affected_screens(&self) -> Vec<NodeId> {
        self.affected.clone()
    }
}
