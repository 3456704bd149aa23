//! Eindeutige Identitäten für Nodes und Render-Objekte.

use std::fmt;

/// Id eines Nodes im Dokumentbaum.
///
/// Ids werden monoton vergeben und nach dem Löschen eines Nodes nie
/// wiederverwendet. Alle schwachen Verweise (Parent, Selektion,
/// Aggregator-Registry) laufen über diese Id und werden bei Zugriff
/// über den Baum aufgelöst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle auf ein Render-Objekt (Control-Fläche oder Screen-Surface).
///
/// Das Render-Subsystem liest diese Handles, besitzt sie aber nicht;
/// Besitzer ist immer der Node, der das Handle trägt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderObjectId(u64);

impl RenderObjectId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RenderObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monoton zählende Id-Vergabe; gibt jeden Wert genau einmal heraus.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Startet bei 1; 0 bleibt frei, damit Logs eindeutig lesbar sind.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Gibt die nächste freie Id heraus und rückt den Zähler vor.
    pub fn allocate(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
