//! Aggregator-Synchronisation: Template-Inhalte in alle Instanzen spiegeln.
//!
//! Ein Aggregator ist ein benannter, wiederverwendbarer Teilbaum. Jede
//! Instanz (`AggregatorControl`) muss nach jeder Strukturänderung am
//! Template exakt dessen aktuelle Kinderliste enthalten, in derselben
//! Reihenfolge und ohne Reste früherer Abgleiche.

use indexmap::IndexSet;

use crate::core::id::NodeId;
use crate::core::node::{NodeKind, Rect};
use crate::core::tree::{InsertAt, Tree};

impl Tree {
    /// Gleicht eine einzelne Instanz mit ihrem Template ab.
    ///
    /// Ablauf je Instanz:
    /// 1. Bis zu `template_child_count` vorhandene Kinder entfernen
    ///    (Klone des vorherigen Abgleichs).
    /// 2. Übrige aggregator-markierte Kinder entfernen (Reste eines
    ///    früheren, größeren Template-Stands).
    /// 3. Template-Kinder in Reihenfolge klonen, jeweils direkt hinter dem
    ///    zuvor eingefügten Klon einhängen und als aggregator-eigen
    ///    markieren.
    /// 4. Die eigene Geometrie der Instanz wieder anwenden, damit vom
    ///    Benutzer gesetzte Position/Größe den Neuaufbau überlebt.
    pub fn update_aggregator_instance(&mut self, template: NodeId, instance: NodeId) -> bool {
        let template_ok = self
            .get_node(template)
            .map(|n| n.is_aggregator())
            .unwrap_or(false);
        if !template_ok {
            log::warn!("update_aggregator_instance: Template {} fehlt", template);
            return false;
        }
        let instance_ok = self
            .get_node(instance)
            .map(|n| n.is_control_like())
            .unwrap_or(false);
        if !instance_ok {
            log::warn!("update_aggregator_instance: Instanz {} fehlt", instance);
            return false;
        }
        if instance == template || self.is_descendant_of(instance, template) {
            log::warn!(
                "update_aggregator_instance: Instanz {} liegt im Template {}",
                instance,
                template
            );
            return false;
        }

        let template_children = self.children_of(template).to_vec();
        let instance_rect = self
            .get_node(instance)
            .and_then(|n| n.control_data())
            .map(|data| data.rect);

        // Schritt 1: Klone des letzten Abgleichs entfernen.
        let first_batch: Vec<NodeId> = self
            .children_of(instance)
            .iter()
            .take(template_children.len())
            .copied()
            .collect();
        self.delete_nodes(&first_batch, true, true);

        // Schritt 2: übrig gebliebene markierte Kinder entfernen.
        let stale: Vec<NodeId> = self
            .children_of(instance)
            .iter()
            .copied()
            .filter(|&child| {
                self.get_node(child)
                    .and_then(|n| n.control_data())
                    .map(|data| data.aggregator_owned)
                    .unwrap_or(false)
            })
            .collect();
        self.delete_nodes(&stale, true, true);

        // Schritt 3: Template-Kinder in Reihenfolge einklonen.
        let mut previous: Option<NodeId> = None;
        for child in template_children {
            let Some(clone) = self.clone_subtree(child) else {
                continue;
            };
            if let Some(data) = self.get_node_mut(clone).and_then(|n| n.control_data_mut()) {
                data.aggregator_owned = true;
            }
            let at = match previous {
                Some(p) => InsertAt::After(p),
                None => InsertAt::Front,
            };
            if !self.attach_node(clone, instance, at) {
                self.delete_nodes(&[clone], true, false);
                continue;
            }
            previous = Some(clone);
        }

        // Schritt 4: Geometrie der Instanz wieder anwenden.
        if let Some(rect) = instance_rect {
            if let Some(data) = self
                .get_node_mut(instance)
                .and_then(|n| n.control_data_mut())
            {
                data.rect = rect;
            }
        }

        true
    }

    /// Gleicht alle registrierten Instanzen eines Templates ab und räumt
    /// dabei tote Registry-Einträge auf. Gibt die Anzahl der
    /// abgeglichenen Instanzen zurück.
    pub fn sync_aggregator(&mut self, template: NodeId) -> usize {
        let registered: Vec<NodeId> = match self.get_node(template).map(|n| &n.kind) {
            Some(NodeKind::Aggregator { instances, .. }) => instances.iter().copied().collect(),
            _ => {
                log::warn!("sync_aggregator: {} ist kein Aggregator", template);
                return 0;
            }
        };

        let mut synced = 0;
        let mut dead: Vec<NodeId> = Vec::new();
        for instance in registered {
            if self.get_node(instance).is_none() {
                dead.push(instance);
                continue;
            }
            if self.update_aggregator_instance(template, instance) {
                synced += 1;
            }
        }

        for instance in dead {
            if let Some(NodeKind::Aggregator { instances, .. }) =
                self.get_node_mut(template).map(|n| &mut n.kind)
            {
                instances.shift_remove(&instance);
            }
        }

        if synced > 0 {
            log::debug!("Aggregator {}: {} Instanzen abgeglichen", template, synced);
        }
        synced
    }

    /// Registrierte Instanzen eines Templates, auch losgelöste.
    pub fn aggregator_instances(&self, template: NodeId) -> Vec<NodeId> {
        match self.get_node(template).map(|n| &n.kind) {
            Some(NodeKind::Aggregator { instances, .. }) => instances.iter().copied().collect(),
            _ => Vec::new(),
        }
    }

    /// Erzeugt eine noch ungebundene Aggregator-Instanz (Laden/Import):
    /// der Template-Name ist bekannt, das Template selbst wird erst durch
    /// `replace_aggregators` aufgelöst.
    pub fn create_unresolved_aggregator_control(
        &mut self,
        parent: NodeId,
        name: &str,
        rect: Rect,
        template_name: &str,
    ) -> Option<NodeId> {
        let control = self.create_control(parent, name, rect)?;
        if let Some(node) = self.get_node_mut(control) {
            if let NodeKind::Control(data) = &node.kind {
                node.kind = NodeKind::AggregatorControl {
                    control: data.clone(),
                    template: None,
                    template_name: template_name.to_string(),
                };
            }
        }
        Some(control)
    }

    /// Bindet nach dem Laden alle ungebundenen Instanzen unterhalb der
    /// Platform an ihre Templates (Auflösung über den serialisierten
    /// Template-Namen) und gleicht sie ab. Gibt die Anzahl der gebundenen
    /// Instanzen zurück.
    pub fn replace_aggregators(&mut self, platform: NodeId) -> usize {
        // Name → Template-Id der Aggregatoren dieser Platform.
        let mut templates: Vec<(String, NodeId)> = Vec::new();
        for &child in self.children_of(platform) {
            if let Some(node) = self.get_node(child) {
                if node.is_aggregator() {
                    templates.push((node.name.clone(), child));
                }
            }
        }

        let mut bound = 0;
        for id in self.subtree_ids(platform) {
            let pending = match self.get_node(id).map(|n| &n.kind) {
                Some(NodeKind::AggregatorControl {
                    template: None,
                    template_name,
                    ..
                }) => Some(template_name.clone()),
                _ => None,
            };
            let Some(template_name) = pending else {
                continue;
            };

            let Some(template) = templates
                .iter()
                .find(|(name, _)| *name == template_name)
                .map(|(_, id)| *id)
            else {
                log::warn!(
                    "replace_aggregators: Template '{}' für Instanz {} fehlt",
                    template_name,
                    id
                );
                continue;
            };

            if let Some(NodeKind::AggregatorControl { template: slot, .. }) =
                self.get_node_mut(id).map(|n| &mut n.kind)
            {
                *slot = Some(template);
            }
            self.register_instance(template, id);
            self.update_aggregator_instance(template, id);
            bound += 1;
        }

        bound
    }

    /// Template-Namen, von denen der Teilbaum eines Screens textuell
    /// abhängt, in Auftretens-Reihenfolge. Grundlage der
    /// Import-Abhängigkeitsprüfung.
    pub fn aggregator_dependencies(&self, screen: NodeId) -> IndexSet<String> {
        let mut names = IndexSet::new();
        for id in self.subtree_ids(screen) {
            if let Some(NodeKind::AggregatorControl { template_name, .. }) =
                self.get_node(id).map(|n| &n.kind)
            {
                names.insert(template_name.clone());
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn fixture() -> (Tree, NodeId, NodeId, NodeId) {
        let mut tree = Tree::new();
        let platform = tree.add_platform("iPhone", Vec2::new(800.0, 480.0), "en");
        let screen = tree.add_screen("Main", platform).expect("Screen");
        let template = tree
            .add_aggregator("Header", platform, Vec2::new(800.0, 64.0))
            .expect("Aggregator");
        (tree, platform, screen, template)
    }

    fn child_names(tree: &Tree, parent: NodeId) -> Vec<String> {
        tree.children_of(parent)
            .iter()
            .map(|&id| tree.get_node(id).expect("Kind").name.clone())
            .collect()
    }

    #[test]
    fn test_sync_mirrors_template_children_in_order() {
        let (mut tree, _platform, screen, template) = fixture();
        tree.create_control(template, "Logo", Rect::default());
        tree.create_control(template, "Titel", Rect::default());
        let instance = tree
            .create_aggregator_control(screen, "Kopf", Rect::default(), template)
            .expect("Instanz");

        assert_eq!(tree.sync_aggregator(template), 1);
        assert_eq!(child_names(&tree, instance), vec!["Logo", "Titel"]);

        // Alle Klone tragen die Aggregator-Markierung.
        for &child in tree.children_of(instance) {
            assert!(
                tree.get_node(child)
                    .and_then(|n| n.control_data())
                    .map(|d| d.aggregator_owned)
                    .unwrap_or(false),
                "Klon sollte als aggregator-eigen markiert sein"
            );
        }
    }

    #[test]
    fn test_sync_is_idempotent() {
        let (mut tree, _platform, screen, template) = fixture();
        tree.create_control(template, "Logo", Rect::default());
        tree.create_control(template, "Titel", Rect::default());
        let instance = tree
            .create_aggregator_control(screen, "Kopf", Rect::default(), template)
            .expect("Instanz");

        tree.sync_aggregator(template);
        let first = child_names(&tree, instance);
        tree.sync_aggregator(template);
        let second = child_names(&tree, instance);

        assert_eq!(first, second);
        assert_eq!(tree.children_of(instance).len(), 2);
    }

    #[test]
    fn test_sync_removes_leftovers_of_a_shrunk_template() {
        let (mut tree, _platform, screen, template) = fixture();
        let a = tree.create_control(template, "A", Rect::default()).unwrap();
        let b = tree.create_control(template, "B", Rect::default()).unwrap();
        tree.create_control(template, "C", Rect::default()).unwrap();
        let instance = tree
            .create_aggregator_control(screen, "Kopf", Rect::default(), template)
            .expect("Instanz");

        tree.sync_aggregator(template);
        assert_eq!(tree.children_of(instance).len(), 3);

        tree.delete_nodes(&[a, b], true, true);
        tree.sync_aggregator(template);
        assert_eq!(child_names(&tree, instance), vec!["C"]);
    }

    #[test]
    fn test_sync_keeps_instance_geometry() {
        let (mut tree, _platform, screen, template) = fixture();
        tree.create_control(template, "Logo", Rect::default());
        let instance = tree
            .create_aggregator_control(
                screen,
                "Kopf",
                Rect::new(40.0, 8.0, 200.0, 60.0),
                template,
            )
            .expect("Instanz");

        tree.sync_aggregator(template);

        let rect = tree
            .get_node(instance)
            .and_then(|n| n.control_data())
            .map(|d| d.rect)
            .expect("Instanz-Rect");
        assert_eq!(rect, Rect::new(40.0, 8.0, 200.0, 60.0));
    }

    #[test]
    fn test_replace_binds_unresolved_instances_by_name() {
        let (mut tree, platform, screen, template) = fixture();
        tree.create_control(template, "Logo", Rect::default());

        let instance = tree
            .create_unresolved_aggregator_control(screen, "Kopf", Rect::default(), "Header")
            .expect("ungebundene Instanz");
        assert_eq!(tree.get_node(instance).unwrap().aggregator_template(), None);

        assert_eq!(tree.replace_aggregators(platform), 1);
        assert_eq!(
            tree.get_node(instance).unwrap().aggregator_template(),
            Some(template)
        );
        assert_eq!(child_names(&tree, instance), vec!["Logo"]);
    }

    #[test]
    fn test_screen_dependencies_by_template_name() {
        let (mut tree, _platform, screen, _template) = fixture();
        tree.create_unresolved_aggregator_control(screen, "Kopf", Rect::default(), "Header");
        tree.create_unresolved_aggregator_control(screen, "Fuss", Rect::default(), "Footer");

        let deps = tree.aggregator_dependencies(screen);
        let names: Vec<&String> = deps.iter().collect();
        assert_eq!(names.len(), 2);
        assert_eq!(names[0], "Header");
        assert_eq!(names[1], "Footer");
    }
}
