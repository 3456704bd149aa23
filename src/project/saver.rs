//! Speichern von Projekten.
//!
//! Die Projektdatei wird immer geschrieben, Screen-Dateien wahlweise
//! alle oder nur die mit Änderungszähler ≠ 0. Control-Texte landen in
//! Rohform auf der Platte: Steht in den `ExtraData` ein
//! Lokalisierungsschlüssel, wird der Schlüssel geschrieben, nicht der
//! lokalisierte Text im Speicher.

use std::path::Path;

use anyhow::Context;

use crate::core::node::NodeKind;
use crate::core::{NodeId, Tree};
use crate::project::format::{
    ControlEntry, GuideEntry, LocalizationEntry, PlatformEntry, ProjectFile, ScreenFile, ScreenRef,
};
use crate::project::loader::screen_file_path;

/// Umfang eines Speichervorgangs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Nur Screens mit ungesicherten Änderungen.
    ChangedOnly,
    /// Alle Screens, unabhängig vom Änderungszähler.
    All,
}

/// Serialisiert die Platform-Ebene des Baums in das Projektdatei-Modell.
pub fn project_file_from_tree(tree: &Tree) -> ProjectFile {
    let mut platforms = Vec::new();
    for &platform_id in tree.children_of(tree.root_id()) {
        let Some(platform) = tree.get_node(platform_id) else {
            continue;
        };
        let NodeKind::Platform {
            size,
            localization_path,
            locale,
        } = &platform.kind
        else {
            continue;
        };

        let mut screens = Vec::new();
        for &screen_id in tree.children_of(platform_id) {
            let Some(screen) = tree.get_node(screen_id) else {
                continue;
            };
            match &screen.kind {
                NodeKind::Screen(_) => screens.push(ScreenRef::Screen(screen.name.clone())),
                NodeKind::Aggregator { size, .. } => screens.push(ScreenRef::Aggregator {
                    name: screen.name.clone(),
                    width: size.x,
                    height: size.y,
                }),
                _ => {}
            }
        }

        platforms.push(PlatformEntry {
            name: platform.name.clone(),
            width: size.x,
            height: size.y,
            localization: localization_path.as_ref().map(|path| LocalizationEntry {
                path: path.clone(),
                locale: locale.clone(),
            }),
            screens,
        });
    }
    ProjectFile { platforms }
}

/// Serialisiert einen Control-Teilbaum. Von der Aggregator-Synchronisation
/// erzeugte Kinder werden übersprungen, sie entstehen beim Laden neu.
fn control_entry_from(tree: &Tree, id: NodeId) -> Option<ControlEntry> {
    let node = tree.get_node(id)?;
    let data = node.control_data()?;
    let text = node
        .extra
        .localization_key
        .clone()
        .unwrap_or_else(|| data.text.clone());
    let aggregator = match &node.kind {
        NodeKind::AggregatorControl { template_name, .. } => Some(template_name.clone()),
        _ => None,
    };

    let mut children = Vec::new();
    for &child in tree.children_of(id) {
        let owned = tree
            .get_node(child)
            .and_then(|n| n.control_data())
            .map(|d| d.aggregator_owned);
        if owned == Some(true) {
            continue;
        }
        if let Some(entry) = control_entry_from(tree, child) {
            children.push(entry);
        }
    }

    Some(ControlEntry {
        name: node.name.clone(),
        rect: ControlEntry::rect_array(data.rect),
        text,
        aggregator,
        custom: node.extra.custom.clone(),
        children,
    })
}

/// Serialisiert einen Screen bzw. Aggregator in das Dateimodell.
pub fn screen_file_from_tree(tree: &Tree, screen: NodeId) -> ScreenFile {
    let mut controls = Vec::new();
    for &child in tree.children_of(screen) {
        if let Some(entry) = control_entry_from(tree, child) {
            controls.push(entry);
        }
    }
    let guides = tree
        .get_node(screen)
        .and_then(|n| n.screen_data())
        .map(|data| data.guides.guides().iter().map(GuideEntry::from).collect())
        .unwrap_or_default();
    ScreenFile { controls, guides }
}

/// Schreibt Projektdatei und Screen-Dateien. Gibt die Anzahl der
/// geschriebenen Screen-Dateien zurück; die Änderungszähler bleiben
/// unberührt, das Zurücksetzen übernimmt der Aufrufer nach Erfolg.
pub fn save_project(tree: &Tree, path: &Path, mode: SaveMode) -> anyhow::Result<usize> {
    let project_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let file = project_file_from_tree(tree);
    let text = serde_yaml::to_string(&file).context("Projektdatei serialisieren")?;
    if !project_dir.as_os_str().is_empty() {
        std::fs::create_dir_all(project_dir)
            .with_context(|| format!("Ordner {} anlegen", project_dir.display()))?;
    }
    std::fs::write(path, text)
        .with_context(|| format!("Projektdatei {} schreiben", path.display()))?;

    let mut written = 0;
    for &platform_id in tree.children_of(tree.root_id()) {
        let Some(platform) = tree.get_node(platform_id) else {
            continue;
        };
        for &screen_id in tree.children_of(platform_id) {
            let Some(screen) = tree.get_node(screen_id) else {
                continue;
            };
            let Some(data) = screen.screen_data() else {
                continue;
            };
            // Nicht geladene Screens haben keinen Baum im Speicher,
            // ihre Datei auf der Platte ist weiterhin der Stand.
            if !data.loaded {
                continue;
            }
            if mode == SaveMode::ChangedOnly && data.unsaved_changes == 0 {
                continue;
            }

            let file_path = screen_file_path(project_dir, &platform.name, &screen.name);
            if let Some(parent) = file_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Ordner {} anlegen", parent.display()))?;
            }
            let screen_file = screen_file_from_tree(tree, screen_id);
            let text = serde_yaml::to_string(&screen_file)
                .with_context(|| format!("Screen '{}' serialisieren", screen.name))?;
            std::fs::write(&file_path, text)
                .with_context(|| format!("Screen-Datei {} schreiben", file_path.display()))?;
            written += 1;
        }
    }

    log::info!(
        "Projekt {} gespeichert ({} Screen-Dateien)",
        path.display(),
        written
    );
    Ok(written)
}
