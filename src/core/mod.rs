//! Core-Domänentypen: Node-Baum, Ids, Hilfslinien, Aggregator-Abgleich.

pub mod aggregator;
pub mod guides;
pub mod id;
pub mod naming;
/// Core-Datenmodelle des Dokumentbaums
///
/// Dieses Modul definiert die Haupt-Datenstrukturen:
/// - Node: ein Element der Hierarchie mit Art-spezifischen Daten
/// - NodeKind: Root, Platform, Screen, Aggregator und die Control-Arten
/// - Rect: achsenparalleles Rechteck für Control-Geometrie
pub mod node;
pub mod tree;

pub use guides::{GuideData, GuideKind, GuidesManager, StickResult};
pub use id::{IdAllocator, NodeId, RenderObjectId};
pub use naming::{format_copy_name, name_exists_in_scope, new_control_name};
pub use node::{ControlData, ExtraData, Node, NodeKind, Rect, ScreenData, ScreenView};
pub use tree::{InsertAt, NodePosition, Tree};
