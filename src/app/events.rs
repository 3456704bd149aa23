//! Editor-Events für die Beobachtung von Dokumentänderungen.
//!
//! Die Kern-Schicht kennt kein UI-Toolkit: Änderungen werden als Events in
//! eine Queue gestellt, die die (außenliegende) Oberfläche einmal pro Frame
//! über [`EventQueue::drain`] konsumiert.

use crate::core::NodeId;

/// Benachrichtigung über eine Zustandsänderung des Dokuments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// Struktur des Baums hat sich geändert (erstellt, verschoben, gelöscht)
    HierarchyChanged,
    /// Die Selektion hat sich geändert
    SelectionChanged,
    /// Der Ungespeichert-Zustand hat sich geändert
    UnsavedStateChanged { unsaved: bool },
    /// Projekt wurde neu erstellt, geladen oder geschlossen
    ProjectChanged,
    /// Ein Aggregator-Template wurde mit seinen Instanzen abgeglichen
    AggregatorSynced { template: NodeId },
}

/// Sammelt Events in Reihenfolge, bis der Konsument sie abholt.
#[derive(Default)]
pub struct EventQueue {
    entries: Vec<EditorEvent>,
}

impl EventQueue {
    const MAX_ENTRIES: usize = 1000;

    /// Erstellt eine leere Event-Queue.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Stellt ein Event hinten an.
    /// Direkt aufeinanderfolgende identische Events werden zusammengefasst.
    pub fn emit(&mut self, event: EditorEvent) {
        if self.entries.last() == Some(&event) {
            return;
        }
        if self.entries.len() >= Self::MAX_ENTRIES {
            self.entries.drain(..Self::MAX_ENTRIES / 2);
        }
        self.entries.push(event);
    }

    /// Holt alle anstehenden Events ab und leert die Queue.
    pub fn drain(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.entries)
    }

    /// Gibt die Anzahl anstehender Events zurück.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Gibt `true` zurück, wenn keine Events anstehen.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Liefert eine read-only Sicht auf die anstehenden Events.
    pub fn entries(&self) -> &[EditorEvent] {
        &self.entries
    }
}
