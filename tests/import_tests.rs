use std::path::Path;

use glam::Vec2;
use ui_layout_editor::app::commands::{
    ImportAction, ImportItem, ImportPlatformCommand, ImportScreensCommand,
};
use ui_layout_editor::{CommandsController, GuideKind, NodeId};

const FIXTURES: &str = "tests/fixtures/import";

fn controller_with_platform() -> (CommandsController, NodeId) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut controller = CommandsController::default();
    let platform = controller
        .context
        .tree
        .add_platform("iPhone", Vec2::new(800.0, 480.0), "en");
    (controller, platform)
}

#[test]
fn test_import_builds_aggregators_before_screens_and_binds_instances() {
    let (mut controller, platform) = controller_with_platform();
    let items = vec![
        ImportItem::new("Main.yaml", ImportAction::Screen, Vec2::ZERO),
        ImportItem::new("Header.yaml", ImportAction::Aggregator, Vec2::new(800.0, 64.0)),
    ];

    controller
        .execute_command(ImportScreensCommand::new(platform, Path::new(FIXTURES), items))
        .expect("Import");

    let tree = &controller.context.tree;
    let header = tree.find_screen(platform, "Header").expect("Header");
    let main = tree.find_screen(platform, "Main").expect("Main");
    assert_eq!(tree.children_of(platform), &[header, main]);

    // Die Instanz "Kopf" ist an das importierte Template gebunden und
    // spiegelt dessen Kinder.
    let kopf = tree.children_of(main)[0];
    assert_eq!(
        tree.get_node(kopf).expect("Instanz").aggregator_template(),
        Some(header)
    );
    assert_eq!(tree.children_of(kopf).len(), 2);

    // Guides der Screen-Datei sind angekommen.
    let guides = tree
        .get_node(main)
        .and_then(|n| n.screen_data())
        .map(|d| d.guides.guides().to_vec())
        .expect("Guides");
    assert_eq!(guides.len(), 1);
    assert_eq!(guides[0].kind, GuideKind::Vertical);

    // Der Import ist als Ganzes umkehrbar.
    assert!(controller.can_undo());
    controller.undo().expect("Undo");
    assert!(controller.context.tree.children_of(platform).is_empty());
    controller.redo().expect("Redo");
    assert_eq!(
        controller.context.tree.children_of(platform),
        &[header, main]
    );
}

#[test]
fn test_missing_dependency_rejects_the_whole_batch() {
    let (mut controller, platform) = controller_with_platform();
    let count_before = controller.context.tree.node_count();
    let items = vec![
        ImportItem::new("Main.yaml", ImportAction::Screen, Vec2::ZERO),
        ImportItem::new("Settings.yaml", ImportAction::Screen, Vec2::ZERO),
        ImportItem::new("Header.yaml", ImportAction::Aggregator, Vec2::new(800.0, 64.0)),
    ];

    let result = controller.execute_command(ImportScreensCommand::new(
        platform,
        Path::new(FIXTURES),
        items,
    ));
    assert!(result.is_err(), "Settings braucht die fehlende NavBar");

    // Nichts wurde angelegt, nichts kam in den Verlauf.
    assert_eq!(controller.context.tree.node_count(), count_before);
    assert!(!controller.can_undo());
    assert!(controller.is_last_change_saved());

    // Der Report nennt den Screen mit seinen fehlenden Templates.
    let report = controller
        .context
        .last_import_report
        .as_ref()
        .expect("Import-Report");
    assert!(report.failed_aggregators.is_empty());
    assert_eq!(
        report.missing_dependencies.get("Settings"),
        Some(&vec!["NavBar".to_string()])
    );
    assert!(!report.missing_dependencies.contains_key("Main"));
}

#[test]
fn test_unloadable_aggregator_file_lands_in_the_report() {
    let (mut controller, platform) = controller_with_platform();
    let items = vec![
        ImportItem::new("Broken.yaml", ImportAction::Aggregator, Vec2::new(800.0, 64.0)),
        ImportItem::new("Header.yaml", ImportAction::Aggregator, Vec2::new(800.0, 64.0)),
        ImportItem::new("Main.yaml", ImportAction::Screen, Vec2::ZERO),
    ];

    let result = controller.execute_command(ImportScreensCommand::new(
        platform,
        Path::new(FIXTURES),
        items,
    ));
    assert!(result.is_err());

    let report = controller
        .context
        .last_import_report
        .as_ref()
        .expect("Import-Report");
    assert_eq!(report.failed_aggregators, vec!["Broken.yaml".to_string()]);
    assert!(controller.context.tree.children_of(platform).is_empty());
}

#[test]
fn test_import_as_new_platform_is_one_undo_step() {
    let mut controller = CommandsController::default();
    let items = vec![
        ImportItem::new("Header.yaml", ImportAction::Aggregator, Vec2::new(800.0, 64.0)),
        ImportItem::new("Main.yaml", ImportAction::Screen, Vec2::ZERO),
    ];

    controller
        .execute_command(ImportPlatformCommand::new(
            "Android",
            Vec2::new(1280.0, 720.0),
            Path::new(FIXTURES),
            items,
        ))
        .expect("Platform-Import");
    let platform = controller
        .context
        .tree
        .find_platform("Android")
        .expect("Platform");
    assert_eq!(controller.context.tree.children_of(platform).len(), 2);

    controller.undo().expect("Undo");
    assert!(controller
        .context
        .tree
        .find_platform("Android")
        .is_none());

    controller.redo().expect("Redo");
    assert_eq!(
        controller.context.tree.find_platform("Android"),
        Some(platform)
    );
}

#[test]
fn test_ignored_files_are_not_part_of_the_batch() {
    let (mut controller, platform) = controller_with_platform();
    let items = vec![
        ImportItem::new("Header.yaml", ImportAction::Aggregator, Vec2::new(800.0, 64.0)),
        ImportItem::new("Settings.yaml", ImportAction::Ignore, Vec2::ZERO),
    ];

    controller
        .execute_command(ImportScreensCommand::new(platform, Path::new(FIXTURES), items))
        .expect("Import");

    // Settings wurde übergangen, seine fehlende NavBar stört deshalb nicht.
    let names: Vec<&str> = controller
        .context
        .tree
        .children_of(platform)
        .iter()
        .map(|&id| controller.context.tree.get_node(id).expect("Kind").name.as_str())
        .collect();
    assert_eq!(names, vec!["Header"]);
}
