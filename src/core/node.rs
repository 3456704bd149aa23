//! Node-Typen des Dokumentbaums.
//!
//! Ein Projekt ist ein Baum aus Platforms, Screens, Aggregatoren und
//! Controls. Der Baum (Arena) besitzt alle Nodes exklusiv; Eltern- und
//! Kindverweise sind Ids. Die Node-Art ist eine geschlossene Menge
//! (`NodeKind`), artspezifische Daten hängen direkt an der Variante.

use glam::Vec2;
use indexmap::{IndexMap, IndexSet};
use std::path::PathBuf;

use crate::core::guides::GuidesManager;
use crate::core::id::{NodeId, RenderObjectId};

/// Achsenparalleles Rechteck aus Position und Größe in Canvas-Pixeln.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    pub fn left(&self) -> f32 {
        self.pos.x
    }

    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    pub fn top(&self) -> f32 {
        self.pos.y
    }

    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            size: Vec2::ZERO,
        }
    }
}

/// Editor-eigene Metadaten eines Nodes, unabhängig vom Render-Objekt.
/// Überleben Kopieren, Undo/Redo und das Speichern/Laden.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtraData {
    /// Lokalisierungsschlüssel des Control-Texts (Rohform wie auf der Platte).
    pub localization_key: Option<String>,
    /// Freie Schlüssel/Wert-Paare.
    pub custom: IndexMap<String, String>,
}

/// Pan/Zoom-Zustand eines Screens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenView {
    pub offset: Vec2,
    pub zoom: f32,
}

impl Default for ScreenView {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

/// Gemeinsame Daten von Screen und Aggregator.
#[derive(Debug, Clone)]
pub struct ScreenData {
    /// Render-Fläche des Screens; besessen, wird mit dem Node freigegeben.
    pub surface: RenderObjectId,
    /// Pan/Zoom-Zustand des Screens.
    pub view: ScreenView,
    /// Guides dieses Screens.
    pub guides: GuidesManager,
    /// Ungesicherte Änderungen seit dem letzten Speichern dieses Screens.
    pub unsaved_changes: i32,
    /// Ob der Control-Baum geladen ist; Screens werden bei Bedarf nachgeladen.
    pub loaded: bool,
}

impl ScreenData {
    pub fn new(surface: RenderObjectId) -> Self {
        Self {
            surface,
            view: ScreenView::default(),
            guides: GuidesManager::new(),
            unsaved_changes: 0,
            loaded: true,
        }
    }
}

/// Gemeinsame Daten aller Control-Varianten.
#[derive(Debug, Clone)]
pub struct ControlData {
    /// Render-Objekt des Controls; besessen, wird mit dem Node freigegeben.
    pub render_object: RenderObjectId,
    /// Geometrie in Canvas-Koordinaten des Screens.
    pub rect: Rect,
    /// Angezeigter Text; im Speicher gegebenenfalls lokalisiert.
    pub text: String,
    /// Von der Aggregator-Synchronisation erzeugt; wird beim nächsten
    /// Abgleich wiedererkannt und ersetzt.
    pub aggregator_owned: bool,
}

impl ControlData {
    pub fn new(render_object: RenderObjectId, rect: Rect) -> Self {
        Self {
            render_object,
            rect,
            text: String::new(),
            aggregator_owned: false,
        }
    }
}

/// Geschlossene Menge der Node-Arten samt artspezifischer Daten.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Root {
        /// Pfad der Projektdatei, sobald das Projekt gespeichert wurde.
        project_path: Option<PathBuf>,
    },
    Platform {
        /// Canvas-Größe; bestimmt die Größe aller Screens der Platform.
        size: Vec2,
        /// Ordner der Lokalisierungstabellen, relativ zum Projekt.
        localization_path: Option<String>,
        /// Aktive Locale der Platform.
        locale: String,
    },
    Screen(ScreenData),
    Aggregator {
        screen: ScreenData,
        /// Eigene Größe des Aggregators, unabhängig von der Platform.
        size: Vec2,
        /// Registrierte Instanzen; nicht-besitzende Rückverweise.
        instances: IndexSet<NodeId>,
    },
    Control(ControlData),
    AggregatorControl {
        control: ControlData,
        /// Template, aus dem diese Instanz erzeugt wurde. `None`, wenn das
        /// Template inzwischen gelöscht wurde.
        template: Option<NodeId>,
        /// Name des Templates in serialisierter Form; wird beim Laden über
        /// die Aggregatoren der Platform aufgelöst.
        template_name: String,
    },
}

impl NodeKind {
    /// Kurzname für Logmeldungen.
    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeKind::Root { .. } => "Root",
            NodeKind::Platform { .. } => "Platform",
            NodeKind::Screen(_) => "Screen",
            NodeKind::Aggregator { .. } => "Aggregator",
            NodeKind::Control(_) => "Control",
            NodeKind::AggregatorControl { .. } => "AggregatorControl",
        }
    }

    /// Darf ein Node dieser Art `child` als Kind aufnehmen?
    ///
    /// Root → Platform, Platform → Screen/Aggregator, Screens und
    /// Controls → Controls. Alles andere ist ein Strukturfehler.
    pub fn can_adopt(&self, child: &NodeKind) -> bool {
        match self {
            NodeKind::Root { .. } => matches!(child, NodeKind::Platform { .. }),
            NodeKind::Platform { .. } => {
                matches!(child, NodeKind::Screen(_) | NodeKind::Aggregator { .. })
            }
            NodeKind::Screen(_) | NodeKind::Aggregator { .. } => matches!(
                child,
                NodeKind::Control(_) | NodeKind::AggregatorControl { .. }
            ),
            NodeKind::Control(_) | NodeKind::AggregatorControl { .. } => matches!(
                child,
                NodeKind::Control(_) | NodeKind::AggregatorControl { .. }
            ),
        }
    }
}

/// Ein Node des Dokumentbaums.
#[derive(Debug, Clone)]
pub struct Node {
    /// Eindeutige, nie wiederverwendete Id.
    pub id: NodeId,
    /// Anzeigename; Eindeutigkeit erzwingt der jeweilige Controller.
    pub name: String,
    /// Eltern-Node; `None` für Root und vom Canvas losgelöste Nodes.
    pub parent: Option<NodeId>,
    /// Kinder in Z-Reihenfolge.
    pub children: Vec<NodeId>,
    /// Editor-Metadaten.
    pub extra: ExtraData,
    /// Artspezifische Daten.
    pub kind: NodeKind,
}

impl Node {
    pub fn new(id: NodeId, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id,
            name: name.into(),
            parent: None,
            children: Vec::new(),
            extra: ExtraData::default(),
            kind,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self.kind, NodeKind::Root { .. })
    }

    pub fn is_platform(&self) -> bool {
        matches!(self.kind, NodeKind::Platform { .. })
    }

    /// Screen oder Aggregator (alles, was einen Control-Baum trägt).
    pub fn is_screen_like(&self) -> bool {
        matches!(self.kind, NodeKind::Screen(_) | NodeKind::Aggregator { .. })
    }

    pub fn is_aggregator(&self) -> bool {
        matches!(self.kind, NodeKind::Aggregator { .. })
    }

    /// Control oder Aggregator-Instanz.
    pub fn is_control_like(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Control(_) | NodeKind::AggregatorControl { .. }
        )
    }

    pub fn is_aggregator_control(&self) -> bool {
        matches!(self.kind, NodeKind::AggregatorControl { .. })
    }

    /// Screen-Daten von Screen- und Aggregator-Nodes.
    pub fn screen_data(&self) -> Option<&ScreenData> {
        match &self.kind {
            NodeKind::Screen(data) => Some(data),
            NodeKind::Aggregator { screen, .. } => Some(screen),
            _ => None,
        }
    }

    pub fn screen_data_mut(&mut self) -> Option<&mut ScreenData> {
        match &mut self.kind {
            NodeKind::Screen(data) => Some(data),
            NodeKind::Aggregator { screen, .. } => Some(screen),
            _ => None,
        }
    }

    /// Control-Daten von Control- und Aggregator-Instanz-Nodes.
    pub fn control_data(&self) -> Option<&ControlData> {
        match &self.kind {
            NodeKind::Control(data) => Some(data),
            NodeKind::AggregatorControl { control, .. } => Some(control),
            _ => None,
        }
    }

    pub fn control_data_mut(&mut self) -> Option<&mut ControlData> {
        match &mut self.kind {
            NodeKind::Control(data) => Some(data),
            NodeKind::AggregatorControl { control, .. } => Some(control),
            _ => None,
        }
    }

    /// Template-Id einer Aggregator-Instanz.
    pub fn aggregator_template(&self) -> Option<NodeId> {
        match &self.kind {
            NodeKind::AggregatorControl { template, .. } => *template,
            _ => None,
        }
    }

    /// Template-Name einer Aggregator-Instanz, wie er serialisiert wird.
    pub fn aggregator_template_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::AggregatorControl { template_name, .. } => Some(template_name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control_kind() -> NodeKind {
        NodeKind::Control(ControlData::new(
            RenderObjectId::new(1),
            Rect::new(0.0, 0.0, 10.0, 10.0),
        ))
    }

    #[test]
    fn test_can_adopt_allows_only_valid_pairs() {
        let root = NodeKind::Root { project_path: None };
        let platform = NodeKind::Platform {
            size: Vec2::new(800.0, 480.0),
            localization_path: None,
            locale: "en".to_string(),
        };
        let screen = NodeKind::Screen(ScreenData::new(RenderObjectId::new(2)));
        let control = control_kind();

        assert!(root.can_adopt(&platform));
        assert!(!root.can_adopt(&screen));
        assert!(platform.can_adopt(&screen));
        assert!(!platform.can_adopt(&control));
        assert!(screen.can_adopt(&control));
        assert!(control.can_adopt(&control_kind()));
        assert!(!control.can_adopt(&platform));
    }

    #[test]
    fn test_rect_contains_includes_the_border() {
        let rect = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert!(rect.contains(Vec2::new(10.0, 20.0)));
        assert!(rect.contains(Vec2::new(110.0, 70.0)));
        assert!(!rect.contains(Vec2::new(9.9, 20.0)));
        assert_eq!(rect.center(), Vec2::new(60.0, 45.0));
    }
}
