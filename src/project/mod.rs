//! Persistenz: Projekt- und Screen-Dateien, Lokalisierung.

pub mod format;
pub mod loader;
pub mod localization;
pub mod saver;

pub use format::{ControlEntry, GuideEntry, PlatformEntry, ProjectFile, ScreenFile, ScreenRef};
pub use loader::{load_project, LoadedProject};
pub use localization::LocalizationTable;
pub use saver::{save_project, SaveMode};
