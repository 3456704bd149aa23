//! Zwischenablage für Copy/Paste von Teilbäumen.
//!
//! Kopieren klont sofort: die Zwischenablage hält id-freie Wertbäume
//! ([`ClonedNode`]), die vom Quellbaum vollständig entkoppelt sind. Einfügen
//! materialisiert daraus frische Nodes mit neuen Ids, beliebig oft — die
//! Zwischenablage bleibt über mehrere Paste-Vorgänge hinweg verwendbar und
//! überlebt auch das Löschen der Originale.

use glam::Vec2;

use crate::core::node::{ExtraData, NodeKind, Rect, ScreenView};
use crate::core::{GuidesManager, NodeId, Tree};

/// Art des Zwischenablage-Inhalts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipboardKind {
    /// Zwischenablage ist leer
    #[default]
    None,
    /// Control-Teilbäume (Ziel: Screen oder Control)
    Control,
    /// Screens oder Aggregatoren (Ziel: Platform)
    Screen,
    /// Platforms (Ziel: Root)
    Platform,
}

/// Artspezifische Daten eines geklonten Nodes, ohne Ids und Render-Handles.
#[derive(Debug, Clone)]
pub enum ClonedKind {
    Platform {
        size: Vec2,
        localization_path: Option<String>,
        locale: String,
    },
    Screen {
        view: ScreenView,
        guides: GuidesManager,
    },
    Aggregator {
        size: Vec2,
        view: ScreenView,
        guides: GuidesManager,
    },
    Control {
        rect: Rect,
        text: String,
        aggregator_owned: bool,
    },
    AggregatorControl {
        rect: Rect,
        text: String,
        aggregator_owned: bool,
        /// Template zum Kopierzeitpunkt; kann beim Einfügen bereits
        /// gelöscht sein und wird dann über den Namen nachaufgelöst.
        template: Option<NodeId>,
        template_name: String,
    },
}

/// Id-freier Wertbaum eines kopierten Nodes.
#[derive(Debug, Clone)]
pub struct ClonedNode {
    pub name: String,
    pub extra: ExtraData,
    pub kind: ClonedKind,
    pub children: Vec<ClonedNode>,
}

impl ClonedNode {
    /// Klont einen Teilbaum des Dokuments in einen Wertbaum.
    /// Root ist nicht kopierbar.
    pub fn from_tree(tree: &Tree, id: NodeId) -> Option<ClonedNode> {
        let node = tree.get_node(id)?;
        let kind = match &node.kind {
            NodeKind::Root { .. } => {
                log::warn!("ClonedNode: Root ist nicht kopierbar");
                return None;
            }
            NodeKind::Platform {
                size,
                localization_path,
                locale,
            } => ClonedKind::Platform {
                size: *size,
                localization_path: localization_path.clone(),
                locale: locale.clone(),
            },
            NodeKind::Screen(data) => ClonedKind::Screen {
                view: data.view,
                guides: data.guides.clone(),
            },
            NodeKind::Aggregator { screen, size, .. } => ClonedKind::Aggregator {
                size: *size,
                view: screen.view,
                guides: screen.guides.clone(),
            },
            NodeKind::Control(data) => ClonedKind::Control {
                rect: data.rect,
                text: data.text.clone(),
                aggregator_owned: data.aggregator_owned,
            },
            NodeKind::AggregatorControl {
                control,
                template,
                template_name,
            } => ClonedKind::AggregatorControl {
                rect: control.rect,
                text: control.text.clone(),
                aggregator_owned: control.aggregator_owned,
                template: *template,
                template_name: template_name.clone(),
            },
        };

        let children = tree
            .children_of(id)
            .iter()
            .filter_map(|&child| ClonedNode::from_tree(tree, child))
            .collect();

        Some(ClonedNode {
            name: node.name.clone(),
            extra: node.extra.clone(),
            kind,
            children,
        })
    }

    /// Materialisiert den Wertbaum als frische Nodes unter `parent`.
    ///
    /// Jeder Aufruf vergibt neue Node- und Render-Ids. Instanzen mit
    /// lebendem Template werden sofort registriert, Instanzen mit totem
    /// Template entstehen unaufgelöst und können später über
    /// [`Tree::replace_aggregators`] nachgebunden werden. Gibt `None`
    /// zurück, wenn `parent` den Node nicht aufnehmen kann.
    pub fn materialize(&self, tree: &mut Tree, parent: NodeId) -> Option<NodeId> {
        let created = match &self.kind {
            ClonedKind::Platform {
                size,
                localization_path,
                locale,
            } => {
                if parent != tree.root_id() {
                    log::warn!("materialize: Platform nur unter Root einfügbar");
                    return None;
                }
                let id = tree.add_platform(&self.name, *size, locale);
                if let Some(node) = tree.get_node_mut(id) {
                    if let NodeKind::Platform {
                        localization_path: path,
                        ..
                    } = &mut node.kind
                    {
                        *path = localization_path.clone();
                    }
                }
                id
            }
            ClonedKind::Screen { view, guides } => {
                let id = tree.add_screen(&self.name, parent)?;
                if let Some(data) = tree.get_node_mut(id).and_then(|n| n.screen_data_mut()) {
                    data.view = *view;
                    data.guides = guides.clone();
                }
                id
            }
            ClonedKind::Aggregator { size, view, guides } => {
                let id = tree.add_aggregator(&self.name, parent, *size)?;
                if let Some(data) = tree.get_node_mut(id).and_then(|n| n.screen_data_mut()) {
                    data.view = *view;
                    data.guides = guides.clone();
                }
                id
            }
            ClonedKind::Control {
                rect,
                text,
                aggregator_owned,
            } => {
                let id = tree.create_control(parent, &self.name, *rect)?;
                if let Some(data) = tree.get_node_mut(id).and_then(|n| n.control_data_mut()) {
                    data.text = text.clone();
                    data.aggregator_owned = *aggregator_owned;
                }
                id
            }
            ClonedKind::AggregatorControl {
                rect,
                text,
                aggregator_owned,
                template,
                template_name,
            } => {
                let live_template = template
                    .filter(|&t| tree.get_node(t).map(|n| n.is_aggregator()) == Some(true));
                let id = match live_template {
                    Some(t) => tree.create_aggregator_control(parent, &self.name, *rect, t)?,
                    None => tree.create_unresolved_aggregator_control(
                        parent,
                        &self.name,
                        *rect,
                        template_name,
                    )?,
                };
                if let Some(data) = tree.get_node_mut(id).and_then(|n| n.control_data_mut()) {
                    data.text = text.clone();
                    data.aggregator_owned = *aggregator_owned;
                }
                id
            }
        };

        if let Some(node) = tree.get_node_mut(created) {
            node.extra = self.extra.clone();
        }
        for child in &self.children {
            child.materialize(tree, created);
        }
        Some(created)
    }
}

/// Hält den Inhalt der Zwischenablage zwischen Copy und Paste.
#[derive(Default)]
pub struct CopyPasteController {
    kind: ClipboardKind,
    items: Vec<ClonedNode>,
}

impl CopyPasteController {
    /// Erstellt eine leere Zwischenablage.
    pub fn new() -> Self {
        Self {
            kind: ClipboardKind::None,
            items: Vec::new(),
        }
    }

    pub fn kind(&self) -> ClipboardKind {
        self.kind
    }

    pub fn items(&self) -> &[ClonedNode] {
        &self.items
    }

    pub fn has_content(&self) -> bool {
        !self.items.is_empty()
    }

    /// Leert die Zwischenablage.
    pub fn clear(&mut self) {
        self.kind = ClipboardKind::None;
        self.items.clear();
    }

    /// Kopiert die selektierten Controls.
    ///
    /// Nodes, die bereits unter einem anderen selektierten Node liegen,
    /// werden übersprungen — ihr Teilbaum ist im Klon des Vorfahren
    /// enthalten. Nicht-Controls in der Auswahl werden ignoriert.
    pub fn copy_controls(&mut self, tree: &Tree, ids: &[NodeId]) -> usize {
        let controls: Vec<NodeId> = ids
            .iter()
            .copied()
            .filter(|&id| {
                let is_control = tree.get_node(id).map(|n| n.is_control_like()) == Some(true);
                if !is_control {
                    log::warn!("copy_controls: Node {} ist kein Control, übersprungen", id);
                }
                is_control
            })
            .collect();

        self.clear();
        for id in tree.top_level_of(&controls) {
            if let Some(clone) = ClonedNode::from_tree(tree, id) {
                self.items.push(clone);
            }
        }
        if self.items.is_empty() {
            log::warn!("copy_controls: nichts kopiert");
            return 0;
        }

        self.kind = ClipboardKind::Control;
        log::info!("{} Control-Teilbäume kopiert", self.items.len());
        self.items.len()
    }

    /// Kopiert einen Screen oder Aggregator samt Control-Baum.
    pub fn copy_screen(&mut self, tree: &Tree, screen: NodeId) -> bool {
        if tree.get_node(screen).map(|n| n.is_screen_like()) != Some(true) {
            log::warn!("copy_screen: Node {} ist kein Screen", screen);
            return false;
        }
        let Some(clone) = ClonedNode::from_tree(tree, screen) else {
            return false;
        };

        self.clear();
        self.items.push(clone);
        self.kind = ClipboardKind::Screen;
        true
    }

    /// Kopiert eine Platform samt aller Screens und Aggregatoren.
    pub fn copy_platform(&mut self, tree: &Tree, platform: NodeId) -> bool {
        if tree.get_node(platform).map(|n| n.is_platform()) != Some(true) {
            log::warn!("copy_platform: Node {} ist keine Platform", platform);
            return false;
        }
        let Some(clone) = ClonedNode::from_tree(tree, platform) else {
            return false;
        };

        self.clear();
        self.items.push(clone);
        self.kind = ClipboardKind::Platform;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_controls() -> (Tree, NodeId, NodeId, NodeId) {
        let mut tree = Tree::new();
        let platform = tree.add_platform("iPhone", Vec2::new(800.0, 480.0), "en");
        let screen = tree.add_screen("Main", platform).expect("Screen");
        let panel = tree
            .create_control(screen, "Panel", Rect::new(10.0, 10.0, 200.0, 100.0))
            .expect("Panel");
        tree.create_control(panel, "Button1", Rect::new(5.0, 5.0, 80.0, 30.0))
            .expect("Button1");
        (tree, platform, screen, panel)
    }

    #[test]
    fn copy_controls_filters_descendants_and_foreign_kinds() {
        let (tree, _platform, screen, panel) = tree_with_controls();
        let button = tree.children_of(panel)[0];

        let mut clipboard = CopyPasteController::new();
        let copied = clipboard.copy_controls(&tree, &[panel, button, screen]);

        // Button liegt im Panel-Klon, der Screen ist kein Control.
        assert_eq!(copied, 1);
        assert_eq!(clipboard.kind(), ClipboardKind::Control);
        assert_eq!(clipboard.items()[0].name, "Panel");
        assert_eq!(clipboard.items()[0].children.len(), 1);
    }

    #[test]
    fn clone_survives_deleting_the_original() {
        let (mut tree, _platform, screen, panel) = tree_with_controls();

        let mut clipboard = CopyPasteController::new();
        clipboard.copy_controls(&tree, &[panel]);
        tree.delete_nodes(&[panel], true, true);

        let pasted = clipboard.items()[0]
            .materialize(&mut tree, screen)
            .expect("Einfügen");
        assert_eq!(tree.get_node(pasted).unwrap().name, "Panel");
        assert_eq!(tree.children_of(pasted).len(), 1);
    }

    #[test]
    fn materialize_assigns_fresh_render_handles() {
        let (mut tree, _platform, screen, panel) = tree_with_controls();
        let original_handle = tree
            .get_node(panel)
            .and_then(|n| n.control_data())
            .map(|d| d.render_object)
            .expect("Render-Objekt");

        let mut clipboard = CopyPasteController::new();
        clipboard.copy_controls(&tree, &[panel]);
        let pasted = clipboard.items()[0]
            .materialize(&mut tree, screen)
            .expect("Einfügen");

        let pasted_handle = tree
            .get_node(pasted)
            .and_then(|n| n.control_data())
            .map(|d| d.render_object)
            .expect("Render-Objekt");
        assert_ne!(original_handle, pasted_handle);
        assert_eq!(tree.find_node_by_render_object(pasted_handle), Some(pasted));
    }

    #[test]
    fn pasted_instance_with_dead_template_stays_unresolved() {
        let mut tree = Tree::new();
        let platform = tree.add_platform("iPhone", Vec2::new(800.0, 480.0), "en");
        let screen = tree.add_screen("Main", platform).expect("Screen");
        let template = tree
            .add_aggregator("Header", platform, Vec2::new(800.0, 60.0))
            .expect("Aggregator");
        let instance = tree
            .create_aggregator_control(
                screen,
                "HeaderInstanz",
                Rect::new(0.0, 0.0, 800.0, 60.0),
                template,
            )
            .expect("Instanz");

        let mut clipboard = CopyPasteController::new();
        clipboard.copy_controls(&tree, &[instance]);
        tree.delete_nodes(&[template], true, true);

        let pasted = clipboard.items()[0]
            .materialize(&mut tree, screen)
            .expect("Einfügen");
        let node = tree.get_node(pasted).expect("Node");
        assert!(node.is_aggregator_control());
        assert_eq!(node.aggregator_template(), None);
    }
}
