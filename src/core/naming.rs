//! Namensvergabe für Kopien und neue Controls.
//!
//! Platform-, Screen- und Aggregator-Namen müssen auf ihrer Ebene
//! eindeutig sein, Control-Namen im gesamten Teilbaum ihres Screens.
//! Beim Kopieren wird ein vorhandenes Ziffern-Suffix abgetrennt und
//! hochgezählt, bis ein freier Name gefunden ist.

use regex::Regex;

use crate::core::id::NodeId;
use crate::core::tree::Tree;

/// Existiert der Name unter den direkten Kindern von `parent`?
pub fn sibling_name_exists(tree: &Tree, parent: NodeId, name: &str) -> bool {
    tree.children_of(parent)
        .iter()
        .any(|&child| tree.get_node(child).map(|n| n.name == name) == Some(true))
}

/// Existiert der Name irgendwo im Teilbaum unter `scope`?
pub fn name_exists_in_subtree(tree: &Tree, scope: NodeId, name: &str) -> bool {
    tree.subtree_ids(scope)
        .iter()
        .any(|&id| tree.get_node(id).map(|n| n.name == name) == Some(true))
}

/// Prüft einen Namen im Gültigkeitsbereich des Parents: Geschwister-Ebene
/// für Root und Platform, kompletter Screen-Teilbaum für Controls.
pub fn name_exists_in_scope(tree: &Tree, parent: NodeId, name: &str) -> bool {
    let Some(parent_node) = tree.get_node(parent) else {
        return false;
    };
    if parent_node.is_root() || parent_node.is_platform() {
        return sibling_name_exists(tree, parent, name);
    }
    match tree.screen_of(parent) {
        Some(screen) => name_exists_in_subtree(tree, screen, name),
        None => sibling_name_exists(tree, parent, name),
    }
}

/// Zerlegt einen Namen in Stamm und numerisches Suffix:
/// `"Button12"` → `("Button", Some(12))`, `"Button"` → `("Button", None)`.
fn split_name_suffix(name: &str) -> (String, Option<u64>) {
    let Some(re) = Regex::new(r"^(.*?)(\d+)$").ok() else {
        return (name.to_string(), None);
    };
    match re.captures(name) {
        Some(caps) => {
            let stem = caps[1].to_string();
            match caps[2].parse::<u64>() {
                Ok(suffix) => (stem, Some(suffix)),
                // Ziffernfolge zu lang für u64: als Teil des Stamms behandeln.
                Err(_) => (name.to_string(), None),
            }
        }
        None => (name.to_string(), None),
    }
}

/// Eindeutiger Name für eine Kopie von `base_name` unter `parent`.
///
/// Probiert `stamm+(suffix+1)`, `stamm+(suffix+2)`, … bis zu
/// `max_attempts` Kandidaten durch; der erste freie gewinnt. Sind alle
/// Versuche belegt, fällt die Funktion mit einer Warnung auf den nackten
/// Stamm zurück — Einfügen muss interaktiv immer ein Ergebnis liefern,
/// die Duplikatprüfung der Create-/Rename-Commands bleibt davon unberührt.
pub fn format_copy_name(tree: &Tree, base_name: &str, parent: NodeId, max_attempts: u32) -> String {
    let (stem, suffix) = split_name_suffix(base_name);
    let start = suffix.unwrap_or(0);

    for attempt in 1..=u64::from(max_attempts) {
        let candidate = format!("{}{}", stem, start + attempt);
        if !name_exists_in_scope(tree, parent, &candidate) {
            return candidate;
        }
    }

    log::warn!(
        "format_copy_name: kein freier Name für '{}' nach {} Versuchen, verwende '{}'",
        base_name,
        max_attempts,
        stem
    );
    stem
}

/// Nächster freier Name nach dem Muster `base` + laufende Nummer für ein
/// neues Control im Teilbaum des Screens.
pub fn new_control_name(tree: &Tree, screen: NodeId, base: &str, max_attempts: u32) -> String {
    for attempt in 1..=u64::from(max_attempts) {
        let candidate = format!("{}{}", base, attempt);
        if !name_exists_in_subtree(tree, screen, &candidate) {
            return candidate;
        }
    }

    log::warn!(
        "new_control_name: kein freier Name für '{}' nach {} Versuchen",
        base,
        max_attempts
    );
    base.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::node::Rect;
    use glam::Vec2;

    fn fixture() -> (Tree, NodeId, NodeId) {
        let mut tree = Tree::new();
        let platform = tree.add_platform("iPhone", Vec2::new(800.0, 480.0), "en");
        let screen = tree.add_screen("Main", platform).expect("Screen");
        (tree, platform, screen)
    }

    #[test]
    fn test_copy_name_skips_taken_suffixes() {
        let (mut tree, _platform, screen) = fixture();
        tree.create_control(screen, "Button3", Rect::default());
        tree.create_control(screen, "Button4", Rect::default());

        // Button4 ist belegt, der erste freie Nachfolger ist Button5.
        assert_eq!(format_copy_name(&tree, "Button3", screen, 1000), "Button5");
    }

    #[test]
    fn test_copy_name_without_suffix_starts_at_one() {
        let (mut tree, _platform, screen) = fixture();
        tree.create_control(screen, "Button", Rect::default());

        assert_eq!(format_copy_name(&tree, "Button", screen, 1000), "Button1");
    }

    #[test]
    fn test_control_names_apply_to_the_whole_screen_subtree() {
        let (mut tree, _platform, screen) = fixture();
        let outer = tree
            .create_control(screen, "Panel", Rect::default())
            .expect("Panel");
        tree.create_control(outer, "Button1", Rect::default());

        // Kollision liegt verschachtelt, zählt aber trotzdem.
        assert_eq!(format_copy_name(&tree, "Button", screen, 1000), "Button2");
        assert!(name_exists_in_subtree(&tree, screen, "Button1"));
        assert!(!sibling_name_exists(&tree, screen, "Button1"));
    }

    #[test]
    fn test_platform_names_apply_only_among_siblings() {
        let (mut tree, platform, _screen) = fixture();
        let other = tree.add_platform("Android", Vec2::new(800.0, 480.0), "en");
        tree.add_screen("Einstellungen", other);

        // Gleicher Screen-Name unter einer anderen Platform kollidiert nicht.
        let root = tree.root_id();
        assert!(!name_exists_in_scope(&tree, platform, "Einstellungen"));
        assert!(name_exists_in_scope(&tree, root, "Android"));
    }

    #[test]
    fn test_exhausted_attempts_fall_back_to_the_stem() {
        let (mut tree, _platform, screen) = fixture();
        tree.create_control(screen, "Knopf1", Rect::default());
        tree.create_control(screen, "Knopf2", Rect::default());

        assert_eq!(format_copy_name(&tree, "Knopf", screen, 2), "Knopf");
    }

    #[test]
    fn test_new_control_names_count_up() {
        let (mut tree, _platform, screen) = fixture();
        assert_eq!(new_control_name(&tree, screen, "Control", 1000), "Control1");
        tree.create_control(screen, "Control1", Rect::default());
        assert_eq!(new_control_name(&tree, screen, "Control", 1000), "Control2");
    }
}
