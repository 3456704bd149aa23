//! Auswahlbezogener Editor-Zustand.

use indexmap::IndexSet;

use crate::core::{NodeId, Tree};

/// Mehrfachselektion als geordnete Menge von Node-Ids.
///
/// Die Selektion besitzt nichts: sie hält nur Ids, die bei jedem Zugriff
/// über [`Tree::get_node`] neu aufgelöst werden müssen. Die Einfügereihenfolge
/// bleibt erhalten, damit Operationen auf der Selektion deterministisch sind.
#[derive(Clone, Default)]
pub struct Selection {
    selected: IndexSet<NodeId>,
}

impl Selection {
    /// Erstellt eine leere Selektion.
    pub fn new() -> Self {
        Self {
            selected: IndexSet::new(),
        }
    }

    /// Ersetzt die Selektion durch genau einen Node.
    pub fn select(&mut self, id: NodeId) {
        self.selected.clear();
        self.selected.insert(id);
    }

    /// Fügt einen Node zur Selektion hinzu (additiv).
    pub fn add(&mut self, id: NodeId) -> bool {
        self.selected.insert(id)
    }

    /// Entfernt einen Node aus der Selektion.
    pub fn remove(&mut self, id: NodeId) -> bool {
        self.selected.shift_remove(&id)
    }

    /// Wechselt den Selektionszustand eines Nodes.
    pub fn toggle(&mut self, id: NodeId) {
        if !self.selected.shift_remove(&id) {
            self.selected.insert(id);
        }
    }

    /// Hebt die Selektion vollständig auf.
    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Gibt `true` zurück, wenn der Node selektiert ist.
    pub fn contains(&self, id: NodeId) -> bool {
        self.selected.contains(&id)
    }

    /// Anzahl der selektierten Nodes.
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Gibt `true` zurück, wenn nichts selektiert ist.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Erster selektierter Node (Anker der Mehrfachselektion).
    pub fn first(&self) -> Option<NodeId> {
        self.selected.first().copied()
    }

    /// Selektierte Ids in Einfügereihenfolge.
    pub fn ids(&self) -> Vec<NodeId> {
        self.selected.iter().copied().collect()
    }

    /// Entfernt alle Ids, die im Baum nicht mehr an der Szene hängen.
    ///
    /// Undo/Redo löst Nodes aus der Szene, ohne sie freizugeben; eine
    /// Selektion darf danach nicht auf unsichtbare Nodes zeigen.
    pub fn prune_missing(&mut self, tree: &Tree) -> usize {
        let before = self.selected.len();
        self.selected.retain(|&id| tree.is_attached(id));
        before - self.selected.len()
    }

    /// Entfernt alle Ids aus dem Teilbaum unter `root` (inklusive `root`).
    /// Wird vor dem Löschen eines Teilbaums aufgerufen.
    pub fn remove_subtree(&mut self, tree: &Tree, root: NodeId) -> usize {
        let mut removed = 0;
        for id in tree.subtree_ids(root) {
            if self.selected.shift_remove(&id) {
                removed += 1;
            }
        }
        removed
    }
}
