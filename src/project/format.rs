//! Serde-Modell der Projekt- und Screen-Dateien.
//!
//! Die Projektdatei zählt Platforms mit ihren Screens auf, jeder Screen
//! bzw. Aggregator liegt als eigene YAML-Datei unter
//! `<Platform-Name>/UI/<Name>.yaml` neben der Projektdatei. Auf der
//! Platte stehen Control-Texte in Rohform (Lokalisierungsschlüssel),
//! im Speicher gegebenenfalls lokalisiert.

use glam::Vec2;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::{GuideData, GuideKind, Rect};

/// Wurzel der Projektdatei.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectFile {
    #[serde(default)]
    pub platforms: Vec<PlatformEntry>,
}

/// Eine Platform mit Canvas-Größe und ihrer Screen-Liste.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEntry {
    pub name: String,
    pub width: f32,
    pub height: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub localization: Option<LocalizationEntry>,
    /// Screens und Aggregatoren in Dokumentreihenfolge.
    #[serde(default)]
    pub screens: Vec<ScreenRef>,
}

/// Verweis auf die Lokalisierungstabelle einer Platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalizationEntry {
    /// Ordner der Tabellen, relativ zum Platform-Ordner.
    pub path: String,
    pub locale: String,
}

/// Eintrag der Screen-Liste. Screens stehen nur mit ihrem Namen in der
/// Projektdatei, Aggregatoren tragen ihre Größe zusätzlich inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScreenRef {
    Aggregator {
        name: String,
        width: f32,
        height: f32,
    },
    Screen(String),
}

impl ScreenRef {
    pub fn name(&self) -> &str {
        match self {
            ScreenRef::Aggregator { name, .. } => name,
            ScreenRef::Screen(name) => name,
        }
    }
}

/// Wurzel einer Screen- bzw. Aggregator-Datei.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreenFile {
    #[serde(default)]
    pub controls: Vec<ControlEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub guides: Vec<GuideEntry>,
}

/// Ein Control samt Kindern, rekursiv.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlEntry {
    pub name: String,
    /// x, y, Breite, Höhe in Canvas-Pixeln.
    pub rect: [f32; 4],
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    /// Template-Name; vorhanden genau bei Aggregator-Instanzen. Von der
    /// Synchronisation erzeugte Kinder stehen nicht in der Datei, sie
    /// entstehen beim Laden neu aus dem Template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregator: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub custom: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ControlEntry>,
}

impl ControlEntry {
    pub fn rect(&self) -> Rect {
        Rect::new(self.rect[0], self.rect[1], self.rect[2], self.rect[3])
    }

    pub fn rect_array(rect: Rect) -> [f32; 4] {
        [rect.pos.x, rect.pos.y, rect.size.x, rect.size.y]
    }
}

/// Eine serialisierte Guide-Linie.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GuideEntry {
    pub kind: GuideKindEntry,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideKindEntry {
    Horizontal,
    Vertical,
    Both,
}

impl From<&GuideData> for GuideEntry {
    fn from(guide: &GuideData) -> Self {
        let kind = match guide.kind {
            GuideKind::Horizontal => GuideKindEntry::Horizontal,
            GuideKind::Vertical => GuideKindEntry::Vertical,
            GuideKind::Both => GuideKindEntry::Both,
        };
        Self {
            kind,
            x: guide.position.x,
            y: guide.position.y,
        }
    }
}

impl From<GuideEntry> for GuideData {
    fn from(entry: GuideEntry) -> Self {
        let kind = match entry.kind {
            GuideKindEntry::Horizontal => GuideKind::Horizontal,
            GuideKindEntry::Vertical => GuideKind::Vertical,
            GuideKindEntry::Both => GuideKind::Both,
        };
        GuideData::new(kind, Vec2::new(entry.x, entry.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_ref_distinguishes_screen_and_aggregator() {
        let yaml = "\
- Main
- name: Header
  width: 800.0
  height: 60.0
- Detail
";
        let refs: Vec<ScreenRef> = serde_yaml::from_str(yaml).expect("Liste parst");
        assert_eq!(refs.len(), 3);
        assert!(matches!(&refs[0], ScreenRef::Screen(name) if name == "Main"));
        assert!(matches!(
            &refs[1],
            ScreenRef::Aggregator { name, width, .. } if name == "Header" && *width == 800.0
        ));
        assert_eq!(refs[2].name(), "Detail");
    }

    #[test]
    fn test_control_entry_omits_empty_fields() {
        let entry = ControlEntry {
            name: "Button1".into(),
            rect: [10.0, 20.0, 100.0, 30.0],
            text: String::new(),
            aggregator: None,
            custom: IndexMap::new(),
            children: Vec::new(),
        };
        let yaml = serde_yaml::to_string(&entry).expect("serialisiert");
        assert!(!yaml.contains("text"));
        assert!(!yaml.contains("children"));
        assert!(!yaml.contains("aggregator"));

        let zurueck: ControlEntry = serde_yaml::from_str(&yaml).expect("parst");
        assert_eq!(zurueck.name, "Button1");
        assert_eq!(zurueck.rect(), Rect::new(10.0, 20.0, 100.0, 30.0));
    }

    #[test]
    fn test_guide_entry_roundtrip() {
        let guide = GuideData::new(GuideKind::Vertical, Vec2::new(120.0, 0.0));
        let entry = GuideEntry::from(&guide);
        let yaml = serde_yaml::to_string(&entry).expect("serialisiert");
        assert!(yaml.contains("vertical"));

        let zurueck: GuideEntry = serde_yaml::from_str(&yaml).expect("parst");
        assert!(GuideData::from(zurueck).same_line(&guide));
    }
}
