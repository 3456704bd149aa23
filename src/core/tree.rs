//! Der Dokumentbaum: Arena aller Nodes mit Fabrik- und Strukturoperationen.
//!
//! Der Baum besitzt sämtlichen Node-Speicher. Externe Halter merken sich
//! Ids und lösen sie bei jedem Zugriff über `get_node` neu auf; `None`
//! bedeutet, dass der Node von einem laufenden Undo losgelöst oder bereits
//! freigegeben wurde, und ist an jeder Stelle ein erwarteter Fall.
//!
//! Löschen hat zwei unabhängige Achsen: "aus der Szene" (Node verschwindet
//! aus der Struktur, bleibt aber im Speicher) und "aus dem Speicher"
//! (Teilbaum wird endgültig freigegeben). Reversible Commands lösen nur aus
//! der Szene und hängen denselben Node beim Redo wieder an.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use glam::Vec2;
use indexmap::IndexSet;

use crate::core::id::{IdAllocator, NodeId, RenderObjectId};
use crate::core::node::{ControlData, Node, NodeKind, Rect, ScreenData};

/// Einfügeposition beim Anhängen eines Nodes an einen Parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertAt {
    /// Ans Ende der Kinderliste (Standard für neue Nodes).
    End,
    /// An den Anfang der Kinderliste.
    Front,
    /// Direkt hinter dem angegebenen Geschwister-Node.
    After(NodeId),
}

/// Position eines Nodes in der Struktur: Parent plus linker Nachbar.
/// Commands halten diese Paare fest, bevor sie Nodes bewegen oder lösen,
/// damit ein Rollback exakt dieselbe Geschwisterposition wiederherstellt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodePosition {
    pub parent: NodeId,
    /// Linker Nachbar; `None`, wenn der Node erstes Kind war.
    pub after: Option<NodeId>,
}

impl NodePosition {
    pub fn insert_at(&self) -> InsertAt {
        match self.after {
            Some(sibling) => InsertAt::After(sibling),
            None => InsertAt::Front,
        }
    }
}

/// Arena-Container des Dokumentbaums.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: HashMap<NodeId, Node>,
    root_id: NodeId,
    node_ids: IdAllocator,
    render_ids: IdAllocator,
    /// Wurzeln vom Canvas gelöster Teilbäume; bleiben für ausstehende
    /// Undos am Leben und werden beim Schließen des Projekts freigegeben.
    detached: IndexSet<NodeId>,
    /// Rückabbildung Render-Objekt → besitzender Node.
    render_lookup: HashMap<RenderObjectId, NodeId>,
}

impl Tree {
    /// Erstellt einen leeren Baum mit frischem Root.
    pub fn new() -> Self {
        let mut node_ids = IdAllocator::new();
        let root_id = NodeId::new(node_ids.allocate());
        let root = Node::new(root_id, "", NodeKind::Root { project_path: None });

        let mut nodes = HashMap::new();
        nodes.insert(root_id, root);

        Self {
            nodes,
            root_id,
            node_ids,
            render_ids: IdAllocator::new(),
            detached: IndexSet::new(),
            render_lookup: HashMap::new(),
        }
    }

    // ── Zugriff ─────────────────────────────────────────────────────

    pub fn root_id(&self) -> NodeId {
        self.root_id
    }

    /// Löst eine Id auf. `None` ist ein erwarteter Fall (Node losgelöst
    /// oder freigegeben) und muss von jedem Aufrufer toleriert werden.
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Anzahl aller lebenden Nodes, inklusive losgelöster.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Kinder eines Nodes in Z-Reihenfolge; leer bei unbekannter Id.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn platform_ids(&self) -> Vec<NodeId> {
        self.children_of(self.root_id).to_vec()
    }

    pub fn project_path(&self) -> Option<&Path> {
        match &self.nodes.get(&self.root_id)?.kind {
            NodeKind::Root { project_path } => project_path.as_deref(),
            _ => None,
        }
    }

    pub fn set_project_path(&mut self, path: Option<PathBuf>) {
        if let Some(root) = self.nodes.get_mut(&self.root_id) {
            if let NodeKind::Root { project_path } = &mut root.kind {
                *project_path = path;
            }
        }
    }

    /// Anzahl der losgelösten Teilbaum-Wurzeln.
    pub fn detached_count(&self) -> usize {
        self.detached.len()
    }

    // ── Fabriken ────────────────────────────────────────────────────

    fn next_node_id(&mut self) -> NodeId {
        NodeId::new(self.node_ids.allocate())
    }

    fn next_render_object(&mut self, owner: NodeId) -> RenderObjectId {
        let handle = RenderObjectId::new(self.render_ids.allocate());
        self.render_lookup.insert(handle, owner);
        handle
    }

    /// Legt eine neue Platform unter dem Root an.
    pub fn add_platform(&mut self, name: &str, size: Vec2, locale: &str) -> NodeId {
        let id = self.next_node_id();
        let node = Node::new(
            id,
            name,
            NodeKind::Platform {
                size,
                localization_path: None,
                locale: locale.to_string(),
            },
        );
        self.nodes.insert(id, node);
        self.attach_node(id, self.root_id, InsertAt::End);
        id
    }

    /// Legt einen neuen Screen unter der Platform an.
    pub fn add_screen(&mut self, name: &str, platform: NodeId) -> Option<NodeId> {
        if !matches!(
            self.nodes.get(&platform).map(|n| &n.kind),
            Some(NodeKind::Platform { .. })
        ) {
            log::warn!("add_screen: Platform {} nicht gefunden", platform);
            return None;
        }

        let id = self.next_node_id();
        let surface = self.next_render_object(id);
        let node = Node::new(id, name, NodeKind::Screen(ScreenData::new(surface)));
        self.nodes.insert(id, node);
        self.attach_node(id, platform, InsertAt::End);
        Some(id)
    }

    /// Legt einen neuen Aggregator unter der Platform an.
    pub fn add_aggregator(&mut self, name: &str, platform: NodeId, size: Vec2) -> Option<NodeId> {
        if !matches!(
            self.nodes.get(&platform).map(|n| &n.kind),
            Some(NodeKind::Platform { .. })
        ) {
            log::warn!("add_aggregator: Platform {} nicht gefunden", platform);
            return None;
        }

        let id = self.next_node_id();
        let surface = self.next_render_object(id);
        let node = Node::new(
            id,
            name,
            NodeKind::Aggregator {
                screen: ScreenData::new(surface),
                size,
                instances: IndexSet::new(),
            },
        );
        self.nodes.insert(id, node);
        self.attach_node(id, platform, InsertAt::End);
        Some(id)
    }

    /// Erzeugt ein neues Control unter einem Screen oder Control.
    pub fn create_control(&mut self, parent: NodeId, name: &str, rect: Rect) -> Option<NodeId> {
        let parent_ok = self
            .nodes
            .get(&parent)
            .map(|n| n.is_screen_like() || n.is_control_like())
            .unwrap_or(false);
        if !parent_ok {
            log::warn!("create_control: Parent {} nicht gefunden", parent);
            return None;
        }

        let id = self.next_node_id();
        let render_object = self.next_render_object(id);
        let node = Node::new(
            id,
            name,
            NodeKind::Control(ControlData::new(render_object, rect)),
        );
        self.nodes.insert(id, node);
        self.attach_node(id, parent, InsertAt::End);
        Some(id)
    }

    /// Erzeugt eine Aggregator-Instanz unter einem Screen oder Control und
    /// registriert sie beim Template.
    pub fn create_aggregator_control(
        &mut self,
        parent: NodeId,
        name: &str,
        rect: Rect,
        template: NodeId,
    ) -> Option<NodeId> {
        let parent_ok = self
            .nodes
            .get(&parent)
            .map(|n| n.is_screen_like() || n.is_control_like())
            .unwrap_or(false);
        if !parent_ok {
            log::warn!("create_aggregator_control: Parent {} nicht gefunden", parent);
            return None;
        }
        let Some(template_name) = self
            .nodes
            .get(&template)
            .filter(|n| n.is_aggregator())
            .map(|n| n.name.clone())
        else {
            log::warn!(
                "create_aggregator_control: Template {} ist kein Aggregator",
                template
            );
            return None;
        };

        let id = self.next_node_id();
        let render_object = self.next_render_object(id);
        let node = Node::new(
            id,
            name,
            NodeKind::AggregatorControl {
                control: ControlData::new(render_object, rect),
                template: Some(template),
                template_name,
            },
        );
        self.nodes.insert(id, node);
        self.register_instance(template, id);
        self.attach_node(id, parent, InsertAt::End);
        Some(id)
    }

    pub(crate) fn register_instance(&mut self, template: NodeId, instance: NodeId) {
        if let Some(NodeKind::Aggregator { instances, .. }) =
            self.nodes.get_mut(&template).map(|n| &mut n.kind)
        {
            instances.insert(instance);
        }
    }

    fn unregister_instance(&mut self, template: NodeId, instance: NodeId) {
        if let Some(NodeKind::Aggregator { instances, .. }) =
            self.nodes.get_mut(&template).map(|n| &mut n.kind)
        {
            instances.shift_remove(&instance);
        }
    }

    // ── Struktur ────────────────────────────────────────────────────

    /// Hängt einen elternlosen Node unter `parent` ein.
    ///
    /// Scheitert bei unbekannten Ids, bereits eingehängtem Node,
    /// unzulässiger Eltern-Kind-Kombination oder wenn `parent` im
    /// Teilbaum von `child` liegt.
    pub fn attach_node(&mut self, child: NodeId, parent: NodeId, at: InsertAt) -> bool {
        let Some(child_node) = self.nodes.get(&child) else {
            log::warn!("attach_node: Node {} nicht gefunden", child);
            return false;
        };
        if child_node.parent.is_some() {
            log::warn!("attach_node: Node {} hängt bereits unter einem Parent", child);
            return false;
        }
        let Some(parent_node) = self.nodes.get(&parent) else {
            log::warn!("attach_node: Parent {} nicht gefunden", parent);
            return false;
        };
        if !parent_node.kind.can_adopt(&child_node.kind) {
            log::warn!(
                "attach_node: {} darf kein {} aufnehmen",
                parent_node.kind.kind_name(),
                child_node.kind.kind_name()
            );
            return false;
        }
        if child == parent || self.is_descendant_of(parent, child) {
            log::warn!("attach_node: Zyklus zwischen {} und {}", child, parent);
            return false;
        }

        let Some(parent_node) = self.nodes.get_mut(&parent) else {
            return false;
        };
        let index = match at {
            InsertAt::End => parent_node.children.len(),
            InsertAt::Front => 0,
            InsertAt::After(sibling) => {
                match parent_node.children.iter().position(|&c| c == sibling) {
                    Some(i) => i + 1,
                    None => {
                        // Nachbar existiert nicht mehr, ans Ende anhängen.
                        log::debug!("attach_node: Nachbar {} fehlt, hänge ans Ende", sibling);
                        parent_node.children.len()
                    }
                }
            }
        };
        parent_node.children.insert(index, child);

        if let Some(child_node) = self.nodes.get_mut(&child) {
            child_node.parent = Some(parent);
        }
        self.detached.shift_remove(&child);
        true
    }

    /// Löst einen Node aus der Szene, behält ihn aber im Speicher.
    /// Die Teilbaum-Wurzel wandert ins Register losgelöster Nodes.
    pub fn detach_node(&mut self, id: NodeId) -> bool {
        let Some(parent_id) = self.nodes.get(&id).and_then(|n| n.parent) else {
            log::warn!("detach_node: Node {} hat keinen Parent", id);
            return false;
        };

        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            parent.children.retain(|&c| c != id);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = None;
        }
        self.detached.insert(id);
        true
    }

    /// Aktuelle Position eines Nodes (Parent + linker Nachbar).
    pub fn node_position(&self, id: NodeId) -> Option<NodePosition> {
        let parent = self.nodes.get(&id)?.parent?;
        let siblings = &self.nodes.get(&parent)?.children;
        let index = siblings.iter().position(|&c| c == id)?;
        let after = if index == 0 {
            None
        } else {
            Some(siblings[index - 1])
        };
        Some(NodePosition { parent, after })
    }

    /// Löscht Nodes entlang der beiden unabhängigen Achsen.
    ///
    /// `delete_from_scene` löst die Nodes aus der Struktur,
    /// `delete_from_memory` gibt die Teilbäume endgültig frei. Rollbacks
    /// reversibler Commands nutzen nur die Szene-Achse. Gibt die Anzahl
    /// der behandelten Wurzel-Nodes zurück.
    pub fn delete_nodes(
        &mut self,
        ids: &[NodeId],
        delete_from_memory: bool,
        delete_from_scene: bool,
    ) -> usize {
        let mut affected = 0;
        for &id in ids {
            if id == self.root_id {
                log::warn!("delete_nodes: Root kann nicht gelöscht werden");
                continue;
            }
            if !self.nodes.contains_key(&id) {
                continue;
            }
            affected += 1;

            if delete_from_scene && self.nodes.get(&id).map(|n| n.parent.is_some()) == Some(true) {
                self.detach_node(id);
            }
            if delete_from_memory {
                self.free_subtree(id);
            }
        }
        affected
    }

    /// Gibt einen Teilbaum endgültig frei und pflegt alle Register.
    fn free_subtree(&mut self, id: NodeId) {
        if id == self.root_id {
            log::error!("free_subtree: Root kann nicht freigegeben werden");
            return;
        }

        // Erst aus der Struktur lösen, falls noch eingehängt.
        if let Some(parent_id) = self.nodes.get(&id).and_then(|n| n.parent) {
            if let Some(parent) = self.nodes.get_mut(&parent_id) {
                parent.children.retain(|&c| c != id);
            }
        }

        let doomed = self.subtree_ids(id);

        // Aggregator-Buchführung: Instanzen abmelden, verwaiste Instanzen
        // vom gelöschten Template lösen.
        let mut deregister: Vec<(NodeId, NodeId)> = Vec::new();
        let mut orphaned: Vec<NodeId> = Vec::new();
        for &dying in &doomed {
            match self.nodes.get(&dying).map(|n| &n.kind) {
                Some(NodeKind::AggregatorControl {
                    template: Some(template),
                    ..
                }) => deregister.push((*template, dying)),
                Some(NodeKind::Aggregator { instances, .. }) => {
                    orphaned.extend(instances.iter().copied());
                }
                _ => {}
            }
        }
        for (template, instance) in deregister {
            if !doomed.contains(&template) {
                self.unregister_instance(template, instance);
            }
        }
        for instance in orphaned {
            if doomed.contains(&instance) {
                continue;
            }
            if let Some(NodeKind::AggregatorControl { template, .. }) =
                self.nodes.get_mut(&instance).map(|n| &mut n.kind)
            {
                log::warn!("Instanz {} verliert ihr gelöschtes Template", instance);
                *template = None;
            }
        }

        for dying in doomed {
            if let Some(node) = self.nodes.remove(&dying) {
                if let Some(data) = node.control_data() {
                    self.render_lookup.remove(&data.render_object);
                }
                if let Some(data) = node.screen_data() {
                    self.render_lookup.remove(&data.surface);
                }
            }
            self.detached.shift_remove(&dying);
        }
    }

    // ── Abfragen ────────────────────────────────────────────────────

    /// Alle Ids des Teilbaums in Preorder, Wurzel zuerst.
    pub fn subtree_ids(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            result.push(current);
            // Kinder rückwärts auf den Stack, damit Preorder-Reihenfolge entsteht.
            for &child in node.children.iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    /// Liegt `node` (echt) unterhalb von `ancestor`?
    pub fn is_descendant_of(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.nodes.get(&node).and_then(|n| n.parent);
        let mut hops = 0;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            hops += 1;
            if hops > self.nodes.len() {
                log::error!("is_descendant_of: Zyklus bei Node {}", node);
                return false;
            }
            current = self.nodes.get(&parent).and_then(|n| n.parent);
        }
        false
    }

    /// Hängt der Node (direkt oder transitiv) unter dem Root?
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root_id || self.is_descendant_of(id, self.root_id)
    }

    /// Reduziert eine Id-Menge auf ihre obersten Vertreter: Ids, die unter
    /// einer anderen Id der Menge liegen, fliegen raus. Löschen und Kopieren
    /// behandeln einen Teilbaum immer über seine Wurzel, sonst würde derselbe
    /// Node doppelt erfasst.
    pub fn top_level_of(&self, ids: &[NodeId]) -> Vec<NodeId> {
        let mut result = Vec::new();
        for &id in ids {
            if !self.nodes.contains_key(&id) || result.contains(&id) {
                continue;
            }
            let covered = ids
                .iter()
                .any(|&other| other != id && self.is_descendant_of(id, other));
            if !covered {
                result.push(id);
            }
        }
        result
    }

    /// Screen bzw. Aggregator, zu dem der Node gehört.
    pub fn screen_of(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        let mut hops = 0;
        while let Some(node_id) = current {
            let node = self.nodes.get(&node_id)?;
            if node.is_screen_like() {
                return Some(node_id);
            }
            hops += 1;
            if hops > self.nodes.len() {
                return None;
            }
            current = node.parent;
        }
        None
    }

    /// Platform, zu der der Node gehört.
    pub fn platform_of(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        let mut hops = 0;
        while let Some(node_id) = current {
            let node = self.nodes.get(&node_id)?;
            if node.is_platform() {
                return Some(node_id);
            }
            hops += 1;
            if hops > self.nodes.len() {
                return None;
            }
            current = node.parent;
        }
        None
    }

    pub fn find_platform(&self, name: &str) -> Option<NodeId> {
        self.children_of(self.root_id)
            .iter()
            .copied()
            .find(|&id| self.nodes.get(&id).map(|n| n.name == name) == Some(true))
    }

    /// Screen oder Aggregator mit diesem Namen unter der Platform.
    pub fn find_screen(&self, platform: NodeId, name: &str) -> Option<NodeId> {
        self.children_of(platform)
            .iter()
            .copied()
            .find(|&id| self.nodes.get(&id).map(|n| n.name == name) == Some(true))
    }

    /// Erster Node mit diesem Namen im Teilbaum, Preorder-Reihenfolge.
    pub fn find_node_by_name(&self, scope: NodeId, name: &str) -> Option<NodeId> {
        self.subtree_ids(scope)
            .into_iter()
            .find(|id| self.nodes.get(id).map(|n| n.name == name) == Some(true))
    }

    /// Rückwärtssuche vom Render-Objekt zum besitzenden Node.
    pub fn find_node_by_render_object(&self, handle: RenderObjectId) -> Option<NodeId> {
        let id = self.render_lookup.get(&handle).copied()?;
        self.nodes.contains_key(&id).then_some(id)
    }

    // ── Klonen ──────────────────────────────────────────────────────

    /// Klont einen Teilbaum mit frischen Node-Ids und Render-Objekten.
    /// Der Klon ist elternlos und steht im Register losgelöster Nodes,
    /// bis ihn der Aufrufer einhängt. Aggregator-Instanzen im Klon werden
    /// bei ihrem Template registriert; geklonte Aggregatoren starten ohne
    /// Instanzen.
    pub fn clone_subtree(&mut self, source: NodeId) -> Option<NodeId> {
        if !self.nodes.contains_key(&source) {
            log::warn!("clone_subtree: Node {} nicht gefunden", source);
            return None;
        }
        let clone_id = self.clone_node_recursive(source)?;
        self.detached.insert(clone_id);
        Some(clone_id)
    }

    fn clone_node_recursive(&mut self, source: NodeId) -> Option<NodeId> {
        let source_node = self.nodes.get(&source)?.clone();

        let id = self.next_node_id();
        let kind = match source_node.kind {
            NodeKind::Root { .. } => {
                log::warn!("clone_subtree: Root ist nicht klonbar");
                return None;
            }
            NodeKind::Platform {
                size,
                localization_path,
                locale,
            } => NodeKind::Platform {
                size,
                localization_path,
                locale,
            },
            NodeKind::Screen(data) => NodeKind::Screen(self.clone_screen_data(&data, id)),
            NodeKind::Aggregator { screen, size, .. } => NodeKind::Aggregator {
                screen: self.clone_screen_data(&screen, id),
                size,
                // Der Klon ist ein neues Template ohne Instanzen.
                instances: IndexSet::new(),
            },
            NodeKind::Control(data) => NodeKind::Control(self.clone_control_data(&data, id)),
            NodeKind::AggregatorControl {
                control,
                template,
                template_name,
            } => {
                if let Some(template) = template {
                    self.register_instance(template, id);
                }
                NodeKind::AggregatorControl {
                    control: self.clone_control_data(&control, id),
                    template,
                    template_name,
                }
            }
        };

        let mut clone = Node::new(id, source_node.name.clone(), kind);
        clone.extra = source_node.extra.clone();
        self.nodes.insert(id, clone);

        for child in source_node.children {
            if let Some(child_clone) = self.clone_node_recursive(child) {
                if let Some(node) = self.nodes.get_mut(&child_clone) {
                    node.parent = Some(id);
                }
                if let Some(node) = self.nodes.get_mut(&id) {
                    node.children.push(child_clone);
                }
            }
        }

        Some(id)
    }

    fn clone_screen_data(&mut self, source: &ScreenData, owner: NodeId) -> ScreenData {
        ScreenData {
            surface: self.next_render_object(owner),
            view: source.view,
            guides: source.guides.clone(),
            unsaved_changes: 0,
            loaded: source.loaded,
        }
    }

    fn clone_control_data(&mut self, source: &ControlData, owner: NodeId) -> ControlData {
        ControlData {
            render_object: self.next_render_object(owner),
            rect: source.rect,
            text: source.text.clone(),
            aggregator_owned: source.aggregator_owned,
        }
    }

    // ── Speichern-Buchführung ───────────────────────────────────────

    /// Erhöht bzw. senkt den Änderungszähler des Screens, der `id` enthält.
    pub fn bump_screen_changes(&mut self, id: NodeId, delta: i32) {
        let Some(screen_id) = self.screen_of(id) else {
            return;
        };
        if let Some(data) = self
            .nodes
            .get_mut(&screen_id)
            .and_then(|n| n.screen_data_mut())
        {
            data.unsaved_changes += delta;
        }
    }

    /// Setzt die Änderungszähler aller Screens zurück (nach dem Speichern).
    pub fn reset_unsaved_marks(&mut self) {
        for node in self.nodes.values_mut() {
            if let Some(data) = node.screen_data_mut() {
                data.unsaved_changes = 0;
            }
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_screen() -> (Tree, NodeId, NodeId) {
        let mut tree = Tree::new();
        let platform = tree.add_platform("iPhone", Vec2::new(800.0, 480.0), "en");
        let screen = tree
            .add_screen("Main", platform)
            .expect("Screen sollte angelegt werden");
        (tree, platform, screen)
    }

    #[test]
    fn test_factories_build_structure_in_order() {
        let (mut tree, platform, screen) = tree_with_screen();

        let a = tree
            .create_control(screen, "A", Rect::new(0.0, 0.0, 10.0, 10.0))
            .expect("Control A");
        let b = tree
            .create_control(screen, "B", Rect::new(0.0, 0.0, 10.0, 10.0))
            .expect("Control B");

        assert_eq!(tree.children_of(tree.root_id()), &[platform]);
        assert_eq!(tree.children_of(platform), &[screen]);
        assert_eq!(tree.children_of(screen), &[a, b]);
        assert_eq!(tree.get_node(a).unwrap().parent, Some(screen));
        assert_eq!(tree.screen_of(a), Some(screen));
        assert_eq!(tree.platform_of(a), Some(platform));
    }

    #[test]
    fn test_attach_after_controls_sibling_position() {
        let (mut tree, _platform, screen) = tree_with_screen();
        let a = tree
            .create_control(screen, "A", Rect::default())
            .expect("Control A");
        let b = tree
            .create_control(screen, "B", Rect::default())
            .expect("Control B");
        let c = tree
            .create_control(screen, "C", Rect::default())
            .expect("Control C");

        // C hinter A einsortieren: A, C, B
        assert!(tree.detach_node(c));
        assert!(tree.attach_node(c, screen, InsertAt::After(a)));
        assert_eq!(tree.children_of(screen), &[a, c, b]);

        // B an den Anfang: B, A, C
        assert!(tree.detach_node(b));
        assert!(tree.attach_node(b, screen, InsertAt::Front));
        assert_eq!(tree.children_of(screen), &[b, a, c]);
    }

    #[test]
    fn test_attach_refuses_cycles_and_wrong_kinds() {
        let (mut tree, platform, screen) = tree_with_screen();
        let control = tree
            .create_control(screen, "A", Rect::default())
            .expect("Control");

        // Screen unter sein eigenes Control hängen wäre ein Zyklus.
        assert!(tree.detach_node(screen));
        assert!(!tree.attach_node(screen, control, InsertAt::End));
        assert!(tree.attach_node(screen, platform, InsertAt::End));

        // Platform darf keine Controls aufnehmen, und der Node hängt bereits.
        assert!(!tree.attach_node(control, platform, InsertAt::End));
        assert_eq!(tree.children_of(screen), &[control]);
    }

    #[test]
    fn test_detach_keeps_the_node_in_memory() {
        let (mut tree, _platform, screen) = tree_with_screen();
        let control = tree
            .create_control(screen, "A", Rect::default())
            .expect("Control");

        assert!(tree.detach_node(control));
        assert!(tree.get_node(control).is_some());
        assert!(!tree.is_attached(control));
        assert_eq!(tree.detached_count(), 1);
        assert_eq!(tree.children_of(screen), &[] as &[NodeId]);

        // Wiederanhängen räumt das Register auf.
        assert!(tree.attach_node(control, screen, InsertAt::End));
        assert_eq!(tree.detached_count(), 0);
        assert!(tree.is_attached(control));
    }

    #[test]
    fn test_full_delete_frees_subtree_and_ids_stay_used() {
        let (mut tree, _platform, screen) = tree_with_screen();
        let parent = tree
            .create_control(screen, "Parent", Rect::default())
            .expect("Parent");
        let child = tree
            .create_control(parent, "Child", Rect::default())
            .expect("Child");
        let count_before = tree.node_count();

        assert_eq!(tree.delete_nodes(&[parent], true, true), 1);
        assert!(tree.get_node(parent).is_none());
        assert!(tree.get_node(child).is_none());
        assert_eq!(tree.node_count(), count_before - 2);

        // Neue Nodes bekommen frische Ids, gelöschte Ids kehren nie zurück.
        let next = tree
            .create_control(screen, "Neu", Rect::default())
            .expect("Neues Control");
        assert!(next.raw() > child.raw());
    }

    #[test]
    fn test_scene_only_delete_allows_reattach() {
        let (mut tree, _platform, screen) = tree_with_screen();
        let control = tree
            .create_control(screen, "A", Rect::default())
            .expect("Control");
        let position = tree.node_position(control).expect("Position");

        assert_eq!(tree.delete_nodes(&[control], false, true), 1);
        assert!(tree.get_node(control).is_some());
        assert!(!tree.is_attached(control));

        assert!(tree.attach_node(control, position.parent, position.insert_at()));
        assert_eq!(tree.children_of(screen), &[control]);
    }

    #[test]
    fn test_top_level_of_filters_covered_descendants() {
        let (mut tree, _platform, screen) = tree_with_screen();
        let a = tree
            .create_control(screen, "A", Rect::default())
            .expect("Control A");
        let b = tree.create_control(a, "B", Rect::default()).expect("Control B");
        let c = tree
            .create_control(screen, "C", Rect::default())
            .expect("Control C");

        // B liegt unter A und wird von A mit erfasst.
        assert_eq!(tree.top_level_of(&[a, b, c]), vec![a, c]);
        assert_eq!(tree.top_level_of(&[b]), vec![b]);
        assert_eq!(tree.top_level_of(&[a, a]), vec![a]);
    }

    #[test]
    fn test_find_node_by_name_searches_the_subtree() {
        let (mut tree, platform, screen) = tree_with_screen();
        let panel = tree
            .create_control(screen, "Panel", Rect::default())
            .expect("Panel");
        let button = tree
            .create_control(panel, "Button1", Rect::default())
            .expect("Button");

        assert_eq!(tree.find_node_by_name(platform, "Button1"), Some(button));
        assert_eq!(tree.find_node_by_name(screen, "Panel"), Some(panel));
        // Außerhalb des Teilbaums wird nicht gesucht.
        assert_eq!(tree.find_node_by_name(panel, "Main"), None);
        assert_eq!(tree.find_node_by_name(platform, "Unbekannt"), None);
    }

    #[test]
    fn test_subtree_ids_returns_preorder() {
        let (mut tree, _platform, screen) = tree_with_screen();
        let a = tree.create_control(screen, "A", Rect::default()).unwrap();
        let a1 = tree.create_control(a, "A1", Rect::default()).unwrap();
        let a2 = tree.create_control(a, "A2", Rect::default()).unwrap();
        let b = tree.create_control(screen, "B", Rect::default()).unwrap();

        assert_eq!(tree.subtree_ids(screen), vec![screen, a, a1, a2, b]);
        assert!(tree.is_descendant_of(a2, screen));
        assert!(!tree.is_descendant_of(b, a));
    }

    #[test]
    fn test_clone_subtree_assigns_fresh_ids_and_render_objects() {
        let (mut tree, _platform, screen) = tree_with_screen();
        let a = tree.create_control(screen, "A", Rect::default()).unwrap();
        let _a1 = tree.create_control(a, "A1", Rect::default()).unwrap();

        let clone = tree.clone_subtree(a).expect("Klon");
        assert_ne!(clone, a);
        assert!(tree.get_node(clone).unwrap().parent.is_none());
        assert_eq!(tree.detached_count(), 1);

        let original_render = tree.get_node(a).unwrap().control_data().unwrap().render_object;
        let clone_render = tree
            .get_node(clone)
            .unwrap()
            .control_data()
            .unwrap()
            .render_object;
        assert_ne!(original_render, clone_render);
        assert_eq!(tree.get_node(clone).unwrap().children.len(), 1);
    }

    #[test]
    fn test_render_object_reverse_lookup_finds_the_owner() {
        let (mut tree, _platform, screen) = tree_with_screen();
        let control = tree.create_control(screen, "A", Rect::default()).unwrap();
        let handle = tree
            .get_node(control)
            .unwrap()
            .control_data()
            .unwrap()
            .render_object;

        assert_eq!(tree.find_node_by_render_object(handle), Some(control));

        tree.delete_nodes(&[control], true, true);
        assert_eq!(tree.find_node_by_render_object(handle), None);
    }

    #[test]
    fn test_deleting_a_template_unbinds_remaining_instances() {
        let (mut tree, platform, screen) = tree_with_screen();
        let aggregator = tree
            .add_aggregator("Header", platform, Vec2::new(800.0, 64.0))
            .expect("Aggregator");
        let instance = tree
            .create_aggregator_control(screen, "HeaderInstanz", Rect::default(), aggregator)
            .expect("Instanz");

        tree.delete_nodes(&[aggregator], true, true);
        let node = tree.get_node(instance).expect("Instanz lebt weiter");
        assert_eq!(node.aggregator_template(), None);
    }
}
