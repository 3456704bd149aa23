//! Zentrale Konfiguration für den UI-Layout-Editor.
//!
//! `EditorOptions` enthält alle zur Laufzeit änderbaren Werte.
//! Die `const`-Werte bleiben als Fallback/Default erhalten.

use serde::{Deserialize, Serialize};

// ── Undo/Redo ───────────────────────────────────────────────────────

/// Maximale Tiefe der Undo- und Redo-Stacks.
pub const UNDO_STACK_DEPTH: usize = 20;

// ── Kopieren / Einfügen ─────────────────────────────────────────────

/// Maximale Anzahl Suffix-Versuche bei der Namensvergabe für Kopien.
pub const COPY_NAME_MAX_ATTEMPTS: u32 = 1000;

// ── Canvas ──────────────────────────────────────────────────────────

/// Standard-Breite einer neuen Platform in Pixeln.
pub const DEFAULT_PLATFORM_WIDTH: f32 = 800.0;
/// Standard-Höhe einer neuen Platform in Pixeln.
pub const DEFAULT_PLATFORM_HEIGHT: f32 = 480.0;
/// Standard-Breite eines neu erzeugten Controls.
pub const DEFAULT_CONTROL_WIDTH: f32 = 100.0;
/// Standard-Höhe eines neu erzeugten Controls.
pub const DEFAULT_CONTROL_HEIGHT: f32 = 30.0;

// ── Guides ──────────────────────────────────────────────────────────

/// Einrast-Schwelle für Guides in Canvas-Pixeln.
pub const GUIDE_STICK_THRESHOLD: f32 = 5.0;
/// Stick-Modus-Bit: Kanten der Controls rasten an Guides ein.
pub const STICK_TO_SIDES: u8 = 0b01;
/// Stick-Modus-Bit: Mittelpunkte der Controls rasten an Guides ein.
pub const STICK_TO_CENTERS: u8 = 0b10;
/// Standard-Stick-Modus: Kanten und Mittelpunkte.
pub const GUIDE_STICK_MODE_DEFAULT: u8 = STICK_TO_SIDES | STICK_TO_CENTERS;

// ── Lokalisierung ───────────────────────────────────────────────────

/// Locale, die neue Platforms erhalten, solange keine andere gesetzt ist.
pub const DEFAULT_LOCALE: &str = "en";

// ── Laufzeit-Optionen (serialisierbar) ─────────────────────────────

/// Alle zur Laufzeit änderbaren Editor-Optionen.
/// Wird als `ui_layout_editor.toml` neben der Binary gespeichert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorOptions {
    // ── Undo/Redo ───────────────────────────────────────────────
    /// Maximale Tiefe der Undo- und Redo-Stacks
    pub undo_stack_depth: usize,

    // ── Kopieren / Einfügen ─────────────────────────────────────
    /// Maximale Suffix-Versuche bei der Namensvergabe für Kopien
    pub copy_name_max_attempts: u32,

    // ── Canvas ──────────────────────────────────────────────────
    /// Standard-Breite einer neuen Platform
    pub default_platform_width: f32,
    /// Standard-Höhe einer neuen Platform
    pub default_platform_height: f32,
    /// Standard-Breite eines neuen Controls
    pub default_control_width: f32,
    /// Standard-Höhe eines neuen Controls
    pub default_control_height: f32,

    // ── Guides ──────────────────────────────────────────────────
    /// Einrast-Schwelle für Guides in Canvas-Pixeln
    pub guide_stick_threshold: f32,
    /// Stick-Modus als Bitmaske (`STICK_TO_SIDES` | `STICK_TO_CENTERS`)
    #[serde(default = "default_guide_stick_mode")]
    pub guide_stick_mode: u8,

    // ── Lokalisierung ───────────────────────────────────────────
    /// Locale für neue Platforms
    #[serde(default = "default_locale")]
    pub default_locale: String,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            undo_stack_depth: UNDO_STACK_DEPTH,

            copy_name_max_attempts: COPY_NAME_MAX_ATTEMPTS,

            default_platform_width: DEFAULT_PLATFORM_WIDTH,
            default_platform_height: DEFAULT_PLATFORM_HEIGHT,
            default_control_width: DEFAULT_CONTROL_WIDTH,
            default_control_height: DEFAULT_CONTROL_HEIGHT,

            guide_stick_threshold: GUIDE_STICK_THRESHOLD,
            guide_stick_mode: GUIDE_STICK_MODE_DEFAULT,

            default_locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

/// Serde-Default für `guide_stick_mode` (Abwärtskompatibilität bestehender TOML-Dateien).
fn default_guide_stick_mode() -> u8 {
    GUIDE_STICK_MODE_DEFAULT
}

/// Serde-Default für `default_locale` (Abwärtskompatibilität).
fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

impl EditorOptions {
    /// Lädt Optionen aus einer TOML-Datei. Bei Fehler: Standardwerte.
    pub fn load_from_file(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(opts) => {
                    log::info!("Optionen geladen aus: {}", path.display());
                    opts
                }
                Err(e) => {
                    log::warn!("Optionen-Datei fehlerhaft, verwende Standardwerte: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Keine Optionen-Datei gefunden, verwende Standardwerte");
                Self::default()
            }
        }
    }

    /// Speichert Optionen als TOML-Datei.
    pub fn save_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        log::info!("Optionen gespeichert nach: {}", path.display());
        Ok(())
    }

    /// Ermittelt den Pfad zur Optionen-Datei neben der Binary.
    pub fn config_path() -> std::path::PathBuf {
        std::env::current_exe()
            .unwrap_or_else(|_| std::path::PathBuf::from("ui_layout_editor"))
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."))
            .join("ui_layout_editor.toml")
    }

    /// Standard-Größe einer neuen Platform als Vektor.
    pub fn default_platform_size(&self) -> glam::Vec2 {
        glam::Vec2::new(self.default_platform_width, self.default_platform_height)
    }

    /// Standard-Größe eines neuen Controls als Vektor.
    pub fn default_control_size(&self) -> glam::Vec2 {
        glam::Vec2::new(self.default_control_width, self.default_control_height)
    }
}
