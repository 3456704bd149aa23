//! Laden von Projekten.
//!
//! Ablauf: Platforms anlegen → Screen-Dateien je Platform einlesen und
//! die Control-Bäume aufbauen → ungebundene Aggregator-Instanzen über
//! ihren Template-Namen auflösen → Lokalisierungs-Pass. Die reinen
//! Parse- und Aufbau-Schritte arbeiten auf Strings bzw. dem Baum und
//! kommen ohne Dateisystem aus; nur `load_project` liest Dateien.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use glam::Vec2;
use indexmap::{IndexMap, IndexSet};

use crate::core::node::NodeKind;
use crate::core::{NodeId, Tree};
use crate::project::format::{ControlEntry, PlatformEntry, ProjectFile, ScreenFile, ScreenRef};
use crate::project::localization::LocalizationTable;
use crate::shared::options::DEFAULT_LOCALE;

/// Ergebnis eines Ladevorgangs: Baum plus geladene Tabellen je Platform.
pub struct LoadedProject {
    pub tree: Tree,
    pub localization: IndexMap<NodeId, LocalizationTable>,
}

pub fn parse_project_str(text: &str) -> anyhow::Result<ProjectFile> {
    serde_yaml::from_str(text).context("Projektdatei parsen")
}

pub fn parse_screen_str(text: &str) -> anyhow::Result<ScreenFile> {
    serde_yaml::from_str(text).context("Screen-Datei parsen")
}

/// Template-Namen, von denen eine Screen-Datei textuell abhängt.
pub fn screen_file_dependencies(file: &ScreenFile) -> IndexSet<String> {
    fn walk(entries: &[ControlEntry], out: &mut IndexSet<String>) {
        for entry in entries {
            if let Some(name) = &entry.aggregator {
                out.insert(name.clone());
            }
            walk(&entry.children, out);
        }
    }
    let mut out = IndexSet::new();
    walk(&file.controls, &mut out);
    out
}

/// Pfad einer Screen-Datei: `<Projektordner>/<Platform>/UI/<Name>.yaml`.
pub fn screen_file_path(project_dir: &Path, platform_name: &str, screen_name: &str) -> PathBuf {
    project_dir
        .join(platform_name)
        .join("UI")
        .join(format!("{screen_name}.yaml"))
}

/// Pfad einer Lokalisierungstabelle:
/// `<Projektordner>/<Platform>/<path>/<locale>.yaml`.
pub fn localization_file_path(
    project_dir: &Path,
    platform_name: &str,
    path: &str,
    locale: &str,
) -> PathBuf {
    project_dir
        .join(platform_name)
        .join(path)
        .join(format!("{locale}.yaml"))
}

/// Baut den Control-Teilbaum einer Screen-Datei unter `parent` auf.
/// Einträge mit Template-Namen werden zu ungebundenen Instanzen, die
/// erst `replace_aggregators` an ihr Template bindet.
pub fn build_controls(tree: &mut Tree, parent: NodeId, entries: &[ControlEntry]) -> anyhow::Result<()> {
    for entry in entries {
        let rect = entry.rect();
        let created = match &entry.aggregator {
            Some(template_name) => {
                tree.create_unresolved_aggregator_control(parent, &entry.name, rect, template_name)
            }
            None => tree.create_control(parent, &entry.name, rect),
        };
        let Some(id) = created else {
            bail!("Control '{}' passt nicht unter Node {}", entry.name, parent);
        };
        if let Some(node) = tree.get_node_mut(id) {
            node.extra.custom = entry.custom.clone();
            if let Some(data) = node.control_data_mut() {
                data.text = entry.text.clone();
            }
        }
        build_controls(tree, id, &entry.children)?;
    }
    Ok(())
}

/// Überträgt Controls und Guides einer Screen-Datei in den Baum.
pub fn apply_screen_file(tree: &mut Tree, screen: NodeId, file: &ScreenFile) -> anyhow::Result<()> {
    build_controls(tree, screen, &file.controls)?;
    if file.guides.is_empty() {
        return Ok(());
    }
    let Some(data) = tree.get_node_mut(screen).and_then(|n| n.screen_data_mut()) else {
        bail!("Node {} trägt keine Guides", screen);
    };
    for &entry in &file.guides {
        data.guides.add_guide(entry.into());
    }
    Ok(())
}

/// Lokalisiert alle Control-Texte unterhalb der Platform.
///
/// Texte, deren Rohform in der Tabelle steht, werden ersetzt; die
/// Rohform wandert als Schlüssel in die `ExtraData`, damit das
/// Speichern sie zurückschreiben kann. Gibt die Trefferzahl zurück.
pub fn apply_localization(tree: &mut Tree, platform: NodeId, table: &LocalizationTable) -> usize {
    let mut hits = 0;
    for id in tree.subtree_ids(platform) {
        let raw = match tree.get_node(id).and_then(|n| n.control_data()) {
            Some(data) if !data.text.is_empty() => data.text.clone(),
            _ => continue,
        };
        let Some(localized) = table.get(&raw).map(str::to_string) else {
            continue;
        };
        if let Some(node) = tree.get_node_mut(id) {
            node.extra.localization_key = Some(raw);
            if let Some(data) = node.control_data_mut() {
                data.text = localized;
            }
        }
        hits += 1;
    }
    hits
}

/// Legt eine Platform samt ihrer Screens aus der Projektdatei an.
fn load_platform(tree: &mut Tree, project_dir: &Path, entry: &PlatformEntry) -> anyhow::Result<NodeId> {
    let size = Vec2::new(entry.width, entry.height);
    let locale = entry
        .localization
        .as_ref()
        .map(|l| l.locale.as_str())
        .unwrap_or(DEFAULT_LOCALE);
    let platform = tree.add_platform(&entry.name, size, locale);
    if let Some(loc) = &entry.localization {
        if let Some(NodeKind::Platform {
            localization_path, ..
        }) = tree.get_node_mut(platform).map(|n| &mut n.kind)
        {
            *localization_path = Some(loc.path.clone());
        }
    }

    for screen_ref in &entry.screens {
        let screen = match screen_ref {
            ScreenRef::Screen(name) => tree.add_screen(name, platform),
            ScreenRef::Aggregator {
                name,
                width,
                height,
            } => tree.add_aggregator(name, platform, Vec2::new(*width, *height)),
        };
        let Some(screen) = screen else {
            bail!(
                "Screen '{}' der Platform '{}' ließ sich nicht anlegen",
                screen_ref.name(),
                entry.name
            );
        };

        let file_path = screen_file_path(project_dir, &entry.name, screen_ref.name());
        let text = std::fs::read_to_string(&file_path)
            .with_context(|| format!("Screen-Datei {} lesen", file_path.display()))?;
        let screen_file = parse_screen_str(&text)
            .with_context(|| format!("Screen-Datei {} parsen", file_path.display()))?;
        apply_screen_file(tree, screen, &screen_file)?;
    }

    let bound = tree.replace_aggregators(platform);
    if bound > 0 {
        log::debug!(
            "Platform '{}': {} Aggregator-Instanzen gebunden",
            entry.name,
            bound
        );
    }
    Ok(platform)
}

/// Lädt ein Projekt von der Platte.
pub fn load_project(path: &Path) -> anyhow::Result<LoadedProject> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Projektdatei {} lesen", path.display()))?;
    let file =
        parse_project_str(&text).with_context(|| format!("Projektdatei {} parsen", path.display()))?;
    let project_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut tree = Tree::new();
    tree.set_project_path(Some(path.to_path_buf()));
    let mut localization = IndexMap::new();

    for entry in &file.platforms {
        let platform = load_platform(&mut tree, project_dir, entry)?;
        let Some(loc) = &entry.localization else {
            continue;
        };
        let table_path = localization_file_path(project_dir, &entry.name, &loc.path, &loc.locale);
        match LocalizationTable::load_from_file(&table_path) {
            Ok(table) => {
                let hits = apply_localization(&mut tree, platform, &table);
                log::debug!("Platform '{}': {} Texte lokalisiert", entry.name, hits);
                localization.insert(platform, table);
            }
            Err(e) => {
                log::warn!(
                    "Platform '{}': Lokalisierung nicht geladen: {e:#}",
                    entry.name
                );
            }
        }
    }

    tree.reset_unsaved_marks();
    log::info!(
        "Projekt {} geladen ({} Platforms, {} Nodes)",
        path.display(),
        file.platforms.len(),
        tree.node_count()
    );
    Ok(LoadedProject { tree, localization })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN_YAML: &str = "\
controls:
  - name: Panel
    rect: [0.0, 0.0, 800.0, 480.0]
    children:
      - name: Button1
        rect: [10.0, 10.0, 100.0, 30.0]
        text: btn.ok
  - name: Kopf
    rect: [0.0, 0.0, 800.0, 60.0]
    aggregator: Header
guides:
  - kind: vertical
    x: 120.0
    y: 0.0
";

    #[test]
    fn test_screen_file_builds_the_control_tree() {
        let mut tree = Tree::new();
        let platform = tree.add_platform("iPhone", Vec2::new(800.0, 480.0), "en");
        let screen = tree.add_screen("Main", platform).expect("Screen");

        let file = parse_screen_str(SCREEN_YAML).expect("Screen-Datei parst");
        apply_screen_file(&mut tree, screen, &file).expect("Aufbau");

        let kinder = tree.children_of(screen).to_vec();
        assert_eq!(kinder.len(), 2);
        let panel = tree.get_node(kinder[0]).expect("Panel");
        assert_eq!(panel.name, "Panel");
        assert_eq!(tree.children_of(kinder[0]).len(), 1);

        let kopf = tree.get_node(kinder[1]).expect("Kopf");
        assert!(kopf.is_aggregator_control());
        assert_eq!(kopf.aggregator_template(), None);

        let guides = tree
            .get_node(screen)
            .and_then(|n| n.screen_data())
            .map(|d| d.guides.guides().len());
        assert_eq!(guides, Some(1));
    }

    #[test]
    fn test_replace_binds_loaded_instances() {
        let mut tree = Tree::new();
        let platform = tree.add_platform("iPhone", Vec2::new(800.0, 480.0), "en");
        let template = tree
            .add_aggregator("Header", platform, Vec2::new(800.0, 60.0))
            .expect("Aggregator");
        tree.create_control(template, "Titel", crate::core::Rect::new(0.0, 0.0, 100.0, 20.0))
            .expect("Template-Inhalt");
        let screen = tree.add_screen("Main", platform).expect("Screen");

        let file = parse_screen_str(SCREEN_YAML).expect("Screen-Datei parst");
        apply_screen_file(&mut tree, screen, &file).expect("Aufbau");
        assert_eq!(tree.replace_aggregators(platform), 1);

        let kopf = tree.children_of(screen)[1];
        assert_eq!(tree.get_node(kopf).unwrap().aggregator_template(), Some(template));
        // Abgleich hat die Template-Kinder in die Instanz gespiegelt.
        assert_eq!(tree.children_of(kopf).len(), 1);
    }

    #[test]
    fn test_dependencies_are_collected_recursively() {
        let yaml = "\
controls:
  - name: Outer
    rect: [0.0, 0.0, 10.0, 10.0]
    children:
      - name: Innen
        rect: [0.0, 0.0, 5.0, 5.0]
        aggregator: Footer
  - name: Kopf
    rect: [0.0, 0.0, 800.0, 60.0]
    aggregator: Header
";
        let file = parse_screen_str(yaml).expect("parst");
        let deps = screen_file_dependencies(&file);
        let deps: Vec<&str> = deps.iter().map(String::as_str).collect();
        assert_eq!(deps, vec!["Footer", "Header"]);
    }

    #[test]
    fn test_localization_replaces_text_and_remembers_the_key() {
        let mut tree = Tree::new();
        let platform = tree.add_platform("iPhone", Vec2::new(800.0, 480.0), "de");
        let screen = tree.add_screen("Main", platform).expect("Screen");
        let file = parse_screen_str(SCREEN_YAML).expect("parst");
        apply_screen_file(&mut tree, screen, &file).expect("Aufbau");

        let mut table = LocalizationTable::new();
        table.insert("btn.ok", "Okay");
        assert_eq!(apply_localization(&mut tree, platform, &table), 1);

        let panel = tree.children_of(screen)[0];
        let button = tree.children_of(panel)[0];
        let node = tree.get_node(button).expect("Button");
        assert_eq!(node.control_data().unwrap().text, "Okay");
        assert_eq!(node.extra.localization_key.as_deref(), Some("btn.ok"));
    }
}
