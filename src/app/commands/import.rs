//! Import von Screen-Dateien in eine bestehende oder neue Platform.
//!
//! Der Import ist Alles-oder-Nichts: Erst werden sämtliche Dateien
//! geparst und die Aggregator-Abhängigkeiten gegen den Bestand plus den
//! Stapel selbst geprüft. Schlägt irgendetwas fehl, wird der komplette
//! Stapel abgewiesen, der Befund landet als strukturierter Report im
//! Kontext und es entsteht kein Undo-Eintrag. Gebaut wird erst nach
//! bestandener Prüfung, Aggregatoren vor Screens.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use glam::Vec2;
use indexmap::{IndexMap, IndexSet};

use crate::app::commands::Command;
use crate::app::context::EditorContext;
use crate::app::events::EditorEvent;
use crate::core::tree::NodePosition;
use crate::core::{NodeId, Tree};
use crate::project::format::ScreenFile;
use crate::project::loader::{
    apply_localization, apply_screen_file, parse_screen_str, screen_file_dependencies,
};

/// Was mit einer angebotenen Datei geschehen soll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportAction {
    Ignore,
    Screen,
    Aggregator,
}

/// Eine zum Import angebotene Datei.
#[derive(Debug, Clone)]
pub struct ImportItem {
    /// Dateiname relativ zum Quellordner des Imports.
    pub file_name: String,
    pub action: ImportAction,
    /// Größe für Aggregatoren; Screens erben die Platform-Größe.
    pub size: Vec2,
}

impl ImportItem {
    pub fn new(file_name: &str, action: ImportAction, size: Vec2) -> Self {
        Self {
            file_name: file_name.to_string(),
            action,
            size,
        }
    }
}

/// Strukturierter Befund eines abgewiesenen Imports.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    /// Aggregator-Dateien, die sich nicht laden ließen, in Auftragsreihenfolge.
    pub failed_aggregators: Vec<String>,
    /// Screen-Name → fehlende Template-Namen.
    pub missing_dependencies: IndexMap<String, Vec<String>>,
}

impl ImportReport {
    pub fn is_empty(&self) -> bool {
        self.failed_aggregators.is_empty() && self.missing_dependencies.is_empty()
    }

    /// Zusammenfassung aller Einzelbefunde in einer Meldung.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.failed_aggregators.is_empty() {
            parts.push(format!(
                "Nicht ladbare Aggregator-Dateien: {}",
                self.failed_aggregators.join(", ")
            ));
        }
        for (screen, missing) in &self.missing_dependencies {
            parts.push(format!("'{}' fehlen: {}", screen, missing.join(", ")));
        }
        parts.join("; ")
    }
}

/// Eine geparste Datei des Stapels.
struct ParsedItem {
    name: String,
    action: ImportAction,
    size: Vec2,
    file: ScreenFile,
}

/// Screen-Name aus dem Dateinamen (Stamm ohne Endung).
fn screen_name_of(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string())
}

/// Liest und parst den Stapel. Nicht ladbare Aggregator-Dateien wandern
/// in den Report, eine nicht ladbare Screen-Datei bricht hart ab.
fn parse_items(
    source_dir: &Path,
    items: &[ImportItem],
    report: &mut ImportReport,
) -> anyhow::Result<Vec<ParsedItem>> {
    let mut parsed = Vec::new();
    for item in items {
        if item.action == ImportAction::Ignore {
            continue;
        }
        let path = source_dir.join(&item.file_name);
        let result = std::fs::read_to_string(&path)
            .with_context(|| format!("Datei {} lesen", path.display()))
            .and_then(|text| parse_screen_str(&text));
        let file = match result {
            Ok(file) => file,
            Err(e) => {
                if item.action == ImportAction::Aggregator {
                    log::warn!("Import: Aggregator-Datei '{}': {e:#}", item.file_name);
                    report.failed_aggregators.push(item.file_name.clone());
                    continue;
                }
                return Err(e.context(format!("Screen-Datei '{}' laden", item.file_name)));
            }
        };
        parsed.push(ParsedItem {
            name: screen_name_of(&item.file_name),
            action: item.action,
            size: item.size,
            file,
        });
    }
    Ok(parsed)
}

/// Prüft jede Datei des Stapels gegen die verfügbaren Template-Namen:
/// Aggregatoren der Platform (falls vorhanden) plus die Aggregatoren des
/// Stapels selbst. Fehlendes landet im Report.
fn check_dependencies(
    tree: &Tree,
    platform: Option<NodeId>,
    parsed: &[ParsedItem],
    report: &mut ImportReport,
) {
    let mut available: IndexSet<String> = parsed
        .iter()
        .filter(|item| item.action == ImportAction::Aggregator)
        .map(|item| item.name.clone())
        .collect();
    if let Some(platform) = platform {
        for &child in tree.children_of(platform) {
            if let Some(node) = tree.get_node(child) {
                if node.is_aggregator() {
                    available.insert(node.name.clone());
                }
            }
        }
    }

    for item in parsed {
        let missing: Vec<String> = screen_file_dependencies(&item.file)
            .into_iter()
            .filter(|name| !available.contains(name))
            .collect();
        if !missing.is_empty() {
            report.missing_dependencies.insert(item.name.clone(), missing);
        }
    }
}

/// Doppelte Namen im Stapel und gegen den Bestand der Platform.
fn check_names(tree: &Tree, platform: Option<NodeId>, parsed: &[ParsedItem]) -> anyhow::Result<()> {
    let mut seen: IndexSet<&str> = IndexSet::new();
    for item in parsed {
        if !seen.insert(&item.name) {
            bail!("'{}' kommt im Stapel doppelt vor", item.name);
        }
        if let Some(platform) = platform {
            if tree.find_screen(platform, &item.name).is_some() {
                bail!("'{}' existiert bereits in der Platform", item.name);
            }
        }
    }
    Ok(())
}

/// Baut den geprüften Stapel unter der Platform auf, Aggregatoren zuerst.
/// Bei einem Fehler stehen die bis dahin angelegten Wurzeln in `out`.
fn build_batch(
    tree: &mut Tree,
    platform: NodeId,
    parsed: &[ParsedItem],
    out: &mut Vec<NodeId>,
) -> anyhow::Result<()> {
    let aggregators = parsed
        .iter()
        .filter(|i| i.action == ImportAction::Aggregator);
    let screens = parsed.iter().filter(|i| i.action == ImportAction::Screen);
    for item in aggregators.chain(screens) {
        let created = match item.action {
            ImportAction::Aggregator => tree.add_aggregator(&item.name, platform, item.size),
            _ => tree.add_screen(&item.name, platform),
        };
        let Some(screen) = created else {
            bail!("'{}' ließ sich nicht unter der Platform anlegen", item.name);
        };
        out.push(screen);
        apply_screen_file(tree, screen, &item.file)
            .with_context(|| format!("'{}' aufbauen", item.name))?;
    }
    let bound = tree.replace_aggregators(platform);
    log::debug!("Import: {bound} Aggregator-Instanzen gebunden");
    Ok(())
}

// ── Import in eine bestehende Platform ──────────────────────────────

/// Importiert Screen-/Aggregator-Dateien in eine bestehende Platform.
pub struct ImportScreensCommand {
    platform: NodeId,
    source_dir: PathBuf,
    items: Vec<ImportItem>,
    created: Option<Vec<(NodeId, NodePosition)>>,
    undoable: bool,
}

impl ImportScreensCommand {
    pub fn new(platform: NodeId, source_dir: &Path, items: Vec<ImportItem>) -> Self {
        Self {
            platform,
            source_dir: source_dir.to_path_buf(),
            items,
            created: None,
            undoable: true,
        }
    }
}

impl Command for ImportScreensCommand {
    fn name(&self) -> &str {
        "Screens importieren"
    }

    fn execute(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        if let Some(created) = &self.created {
            for &(id, position) in created {
                if !ctx.tree.attach_node(id, position.parent, position.insert_at()) {
                    bail!("Importierter Screen {} lässt sich nicht wieder anhängen", id);
                }
            }
            return Ok(());
        }

        if ctx.tree.get_node(self.platform).map(|n| n.is_platform()) != Some(true) {
            bail!("Node {} ist keine Platform", self.platform);
        }

        let mut report = ImportReport::default();
        let parsed = parse_items(&self.source_dir, &self.items, &mut report)?;
        check_names(&ctx.tree, Some(self.platform), &parsed)?;
        check_dependencies(&ctx.tree, Some(self.platform), &parsed, &mut report);
        if !report.is_empty() {
            let summary = report.summary();
            log::warn!("Import abgewiesen: {summary}");
            self.undoable = false;
            ctx.last_import_report = Some(report);
            bail!("Import abgewiesen: {summary}");
        }
        if parsed.is_empty() {
            bail!("Keine Dateien zum Importieren");
        }

        let mut roots = Vec::new();
        if let Err(e) = build_batch(&mut ctx.tree, self.platform, &parsed, &mut roots) {
            ctx.tree.delete_nodes(&roots, true, true);
            self.undoable = false;
            return Err(e);
        }
        // Importierte Screens erhalten dieselben Laufzeit-Optionen.
        for &id in &roots {
            ctx.apply_guide_options(id);
        }
        if let Some(table) = ctx.localization.get(&self.platform) {
            let hits = apply_localization(&mut ctx.tree, self.platform, table);
            log::debug!("Import: {hits} Texte lokalisiert");
        }

        let mut created = Vec::with_capacity(roots.len());
        for &id in &roots {
            let Some(position) = ctx.tree.node_position(id) else {
                bail!("Importierter Screen {} hat keine Position", id);
            };
            created.push((id, position));
        }
        log::info!(
            "{} Screens/Aggregatoren importiert in Platform {}",
            created.len(),
            self.platform
        );
        ctx.last_import_report = None;
        self.created = Some(created);
        Ok(())
    }

    fn rollback(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        let Some(created) = &self.created else {
            bail!("Rollback vor der ersten Ausführung");
        };
        let ids: Vec<NodeId> = created.iter().map(|&(id, _)| id).collect();
        let mut pruned = 0;
        for &id in &ids {
            pruned += ctx.selection.remove_subtree(&ctx.tree, id);
        }
        if pruned > 0 {
            ctx.events.emit(EditorEvent::SelectionChanged);
        }
        ctx.tree.delete_nodes(&ids, false, true);
        Ok(())
    }

    fn is_undo_redo_supported(&self) -> bool {
        self.undoable
    }

    fn affected_screens(&self) -> Vec<NodeId> {
        self.created
            .as_ref()
            .map(|created| created.iter().map(|&(id, _)| id).collect())
            .unwrap_or_default()
    }
}

// ── Import als neue Platform ────────────────────────────────────────

/// Legt eine neue Platform an und importiert den Stapel in sie hinein.
pub struct ImportPlatformCommand {
    name: String,
    size: Vec2,
    source_dir: PathBuf,
    items: Vec<ImportItem>,
    created: Option<NodeId>,
    position: Option<NodePosition>,
    undoable: bool,
}

impl ImportPlatformCommand {
    pub fn new(name: &str, size: Vec2, source_dir: &Path, items: Vec<ImportItem>) -> Self {
        Self {
            name: name.to_string(),
            size,
            source_dir: source_dir.to_path_buf(),
            items,
            created: None,
            position: None,
            undoable: true,
        }
    }

    pub fn created_platform(&self) -> Option<NodeId> {
        self.created
    }
}

impl Command for ImportPlatformCommand {
    fn name(&self) -> &str {
        "Platform importieren"
    }

    fn execute(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        if let (Some(id), Some(position)) = (self.created, self.position) {
            if !ctx.tree.attach_node(id, position.parent, position.insert_at()) {
                bail!("Platform {} lässt sich nicht wieder anhängen", id);
            }
            return Ok(());
        }

        if ctx.tree.find_platform(&self.name).is_some() {
            bail!("Platform '{}' existiert bereits", self.name);
        }

        let mut report = ImportReport::default();
        let parsed = parse_items(&self.source_dir, &self.items, &mut report)?;
        check_names(&ctx.tree, None, &parsed)?;
        check_dependencies(&ctx.tree, None, &parsed, &mut report);
        if !report.is_empty() {
            let summary = report.summary();
            log::warn!("Import abgewiesen: {summary}");
            self.undoable = false;
            ctx.last_import_report = Some(report);
            bail!("Import abgewiesen: {summary}");
        }

        let locale = ctx.options.default_locale.clone();
        let platform = ctx.tree.add_platform(&self.name, self.size, &locale);
        let mut roots = Vec::new();
        if let Err(e) = build_batch(&mut ctx.tree, platform, &parsed, &mut roots) {
            ctx.tree.delete_nodes(&[platform], true, true);
            self.undoable = false;
            return Err(e);
        }
        for &id in &roots {
            ctx.apply_guide_options(id);
        }

        log::info!(
            "Platform '{}' mit {} Screens/Aggregatoren importiert",
            self.name,
            roots.len()
        );
        ctx.last_import_report = None;
        self.created = Some(platform);
        self.position = ctx.tree.node_position(platform);
        Ok(())
    }

    fn rollback(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        let Some(id) = self.created else {
            bail!("Rollback vor der ersten Ausführung");
        };
        if ctx.selection.remove_subtree(&ctx.tree, id) > 0 {
            ctx.events.emit(EditorEvent::SelectionChanged);
        }
        ctx.tree.delete_nodes(&[id], false, true);
        Ok(())
    }

    fn is_undo_redo_supported(&self) -> bool {
        self.undoable
    }

    fn affected_screens(&self) -> Vec<NodeId> {
        self.created.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER_YAML: &str = "\
controls:
  - name: Titel
    rect: [0.0, 0.0, 100.0, 20.0]
";

    const MAIN_YAML: &str = "\
controls:
  - name: Kopf
    rect: [0.0, 0.0, 800.0, 60.0]
    aggregator: Header
";

    fn fixture_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "ui_layout_editor_import_{}_{}",
            tag,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("Fixture-Ordner");
        dir
    }

    fn write_fixture(dir: &Path, name: &str, text: &str) {
        std::fs::write(dir.join(name), text).expect("Fixture schreiben");
    }

    fn context_with_platform() -> (EditorContext, NodeId) {
        let mut ctx = EditorContext::default();
        let platform = ctx
            .tree
            .add_platform("iPhone", Vec2::new(800.0, 480.0), "en");
        (ctx, platform)
    }

    #[test]
    fn import_builds_aggregators_before_screens() {
        let dir = fixture_dir("ok");
        write_fixture(&dir, "Header.yaml", HEADER_YAML);
        write_fixture(&dir, "Main.yaml", MAIN_YAML);
        let (mut ctx, platform) = context_with_platform();

        let items = vec![
            ImportItem::new("Main.yaml", ImportAction::Screen, Vec2::ZERO),
            ImportItem::new("Header.yaml", ImportAction::Aggregator, Vec2::new(800.0, 60.0)),
        ];
        let mut cmd = ImportScreensCommand::new(platform, &dir, items);
        cmd.execute(&mut ctx).expect("Import");
        assert!(cmd.is_undo_redo_supported());
        assert!(ctx.last_import_report.is_none());

        let names: Vec<String> = ctx
            .tree
            .children_of(platform)
            .iter()
            .map(|&id| ctx.tree.get_node(id).unwrap().name.clone())
            .collect();
        assert_eq!(names, vec!["Header", "Main"]);

        // Die Instanz im Screen ist an den importierten Aggregator gebunden.
        let main = ctx.tree.find_screen(platform, "Main").expect("Main");
        let kopf = ctx.tree.children_of(main)[0];
        let template = ctx.tree.find_screen(platform, "Header").expect("Header");
        assert_eq!(ctx.tree.get_node(kopf).unwrap().aggregator_template(), Some(template));

        cmd.rollback(&mut ctx).expect("Rollback");
        assert!(ctx.tree.children_of(platform).is_empty());
        cmd.execute(&mut ctx).expect("Redo");
        assert_eq!(ctx.tree.children_of(platform).len(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_dependency_rejects_the_batch() {
        let dir = fixture_dir("missing");
        write_fixture(&dir, "Main.yaml", MAIN_YAML);
        let (mut ctx, platform) = context_with_platform();
        let count_before = ctx.tree.node_count();

        let items = vec![ImportItem::new("Main.yaml", ImportAction::Screen, Vec2::ZERO)];
        let mut cmd = ImportScreensCommand::new(platform, &dir, items);
        assert!(cmd.execute(&mut ctx).is_err());
        assert!(!cmd.is_undo_redo_supported());
        assert_eq!(ctx.tree.node_count(), count_before);

        let report = ctx.last_import_report.as_ref().expect("Report");
        assert_eq!(
            report.missing_dependencies.get("Main"),
            Some(&vec!["Header".to_string()])
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn broken_aggregator_file_lands_in_the_report() {
        let dir = fixture_dir("broken");
        write_fixture(&dir, "Header.yaml", "controls: [:::");
        write_fixture(&dir, "Main.yaml", MAIN_YAML);
        let (mut ctx, platform) = context_with_platform();

        let items = vec![
            ImportItem::new("Header.yaml", ImportAction::Aggregator, Vec2::new(800.0, 60.0)),
            ImportItem::new("Main.yaml", ImportAction::Screen, Vec2::ZERO),
        ];
        let mut cmd = ImportScreensCommand::new(platform, &dir, items);
        assert!(cmd.execute(&mut ctx).is_err());

        let report = ctx.last_import_report.as_ref().expect("Report");
        assert_eq!(report.failed_aggregators, vec!["Header.yaml".to_string()]);
        // Ohne den Aggregator fehlt dem Screen seine Abhängigkeit.
        assert!(report.missing_dependencies.contains_key("Main"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn import_as_new_platform() {
        let dir = fixture_dir("platform");
        write_fixture(&dir, "Header.yaml", HEADER_YAML);
        write_fixture(&dir, "Main.yaml", MAIN_YAML);
        let mut ctx = EditorContext::default();

        let items = vec![
            ImportItem::new("Header.yaml", ImportAction::Aggregator, Vec2::new(800.0, 60.0)),
            ImportItem::new("Main.yaml", ImportAction::Screen, Vec2::ZERO),
        ];
        let mut cmd =
            ImportPlatformCommand::new("Android", Vec2::new(1280.0, 720.0), &dir, items);
        cmd.execute(&mut ctx).expect("Import");
        let platform = cmd.created_platform().expect("Platform");
        assert_eq!(ctx.tree.children_of(platform).len(), 2);

        cmd.rollback(&mut ctx).expect("Rollback");
        assert!(!ctx.tree.is_attached(platform));
        cmd.execute(&mut ctx).expect("Redo");
        assert!(ctx.tree.is_attached(platform));
        assert_eq!(ctx.tree.children_of(platform).len(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn ignored_files_stay_out() {
        let dir = fixture_dir("ignore");
        write_fixture(&dir, "Header.yaml", HEADER_YAML);
        let (mut ctx, platform) = context_with_platform();

        let items = vec![ImportItem::new("Header.yaml", ImportAction::Ignore, Vec2::ZERO)];
        let mut cmd = ImportScreensCommand::new(platform, &dir, items);
        assert!(cmd.execute(&mut ctx).is_err());
        assert!(ctx.tree.children_of(platform).is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
