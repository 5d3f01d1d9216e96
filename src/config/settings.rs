//! Persisted application settings
//!
//! Only window and environment preferences live here. The QR style itself is
//! session state and is never written to disk.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::gui::constants::{WINDOW_HEIGHT, WINDOW_MIN_HEIGHT, WINDOW_MIN_WIDTH, WINDOW_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_theme")]
    pub theme: Theme,
    /// Where exports are written; falls back to the download directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,
    #[serde(default = "default_window_width")]
    pub window_width: u16,
    #[serde(default = "default_window_height")]
    pub window_height: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_theme() -> Theme {
    Theme::Dark
}

fn default_window_width() -> u16 {
    WINDOW_WIDTH as u16
}

fn default_window_height() -> u16 {
    WINDOW_HEIGHT as u16
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            export_dir: None,
            window_width: default_window_width(),
            window_height: default_window_height(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    pub fn path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(crate::constants::config::APP_DIR);
        path.push(crate::constants::config::FILENAME);
        path
    }

    /// Load settings from the default location, creating the file if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "Settings file not found, creating defaults");
            let settings = Settings::default();
            settings.save_to(path)?;
            return Ok(settings);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        let mut settings: Settings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse TOML from {}", path.display()))?;
        settings.sanitize();

        info!(path = %path.display(), theme = ?settings.theme, "Loaded settings");
        Ok(settings)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }

        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize settings to TOML")?;

        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;

        info!(path = %path.display(), "Saved settings");
        Ok(())
    }

    /// Clamp values a hand-edited file may have pushed out of range
    fn sanitize(&mut self) {
        let min_w = WINDOW_MIN_WIDTH as u16;
        let min_h = WINDOW_MIN_HEIGHT as u16;
        if self.window_width < min_w || self.window_height < min_h {
            warn!(
                width = self.window_width,
                height = self.window_height,
                "Window size below minimum, clamping"
            );
            self.window_width = self.window_width.max(min_w);
            self.window_height = self.window_height.max(min_h);
        }
        if let Some(dir) = &self.export_dir {
            if !dir.is_dir() {
                warn!(path = %dir.display(), "Export directory does not exist, ignoring");
                self.export_dir = None;
            }
        }
    }

    /// Directory exports land in
    pub fn resolved_export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_creates_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(path.exists());
    }

    #[test]
    fn test_round_trip_theme() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let mut settings = Settings::default();
        settings.theme = settings.theme.toggled();
        settings.export_dir = Some(dir.path().to_path_buf());
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.theme, Theme::Light);
        assert_eq!(loaded.export_dir.as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_partial_file_uses_defaults_and_clamps() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "theme = \"light\"\nwindow_width = 10\nexport_dir = \"/definitely/not/here\"\n").unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.theme, Theme::Light);
        assert_eq!(loaded.window_width, WINDOW_MIN_WIDTH as u16);
        assert_eq!(loaded.window_height, 820);
        assert!(loaded.export_dir.is_none());
        assert_eq!(loaded.log_level, "info");
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "theme = [").unwrap();
        assert!(Settings::load_from(&path).is_err());
    }
}
