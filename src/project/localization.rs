//! Lokalisierungstabellen: Schlüssel → übersetzter Text, pro Platform.
//!
//! Die Tabelle einer Platform liegt als flache YAML-Map unter
//! `<Platform-Name>/<localization-path>/<locale>.yaml`. Auf der Platte
//! tragen Controls immer den Schlüssel; beim Laden wird er aufgelöst und
//! in den `ExtraData` festgehalten, damit das Speichern die Rohform
//! zurückschreiben kann.

use std::path::Path;

use anyhow::Context;
use indexmap::IndexMap;

/// Schlüssel→Text-Tabelle einer Locale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalizationTable {
    entries: IndexMap<String, String>,
}

impl LocalizationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parst eine flache YAML-Map.
    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        let entries: IndexMap<String, String> =
            serde_yaml::from_str(text).context("Lokalisierungstabelle ist keine flache Map")?;
        Ok(Self { entries })
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Lokalisierungstabelle {} lesen", path.display()))?;
        let table = Self::from_yaml_str(&text)
            .with_context(|| format!("Lokalisierungstabelle {} parsen", path.display()))?;
        log::info!(
            "Lokalisierungstabelle {} geladen ({} Einträge)",
            path.display(),
            table.len()
        );
        Ok(table)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Löst einen Schlüssel auf; unbekannte Schlüssel bleiben sie selbst.
    pub fn resolve<'a>(&'a self, key: &'a str) -> &'a str {
        self.get(key).unwrap_or(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
