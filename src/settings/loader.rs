use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::settings::types::Settings;

/// Errors that can occur when loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Settings validation failed: {message}")]
    ValidationError { message: String },
}

impl Settings {
    /// Returns the path to the settings file.
    ///
    /// Uses `~/.config/controducer/settings.toml` on Unix/macOS,
    /// or equivalent on other platforms via `dirs::config_dir()`.
    /// Falls back to current directory if config_dir is unavailable.
    pub fn default_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("controducer").join("settings.toml")
    }

    /// Loads settings from the default settings file.
    ///
    /// - If the file doesn't exist, returns `Settings::default()`.
    /// - Otherwise behaves like [`Settings::load_from`].
    pub fn load() -> Result<Self, SettingsError> {
        let path = Self::default_path();

        if !path.exists() {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Settings::default());
        }

        Self::load_from(&path)
    }

    /// Loads, parses and validates the settings file at `path`.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|e| SettingsError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let settings: Settings = toml::from_str(&content).map_err(|e| SettingsError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        settings.validate()?;
        tracing::info!(path = %path.display(), stores = settings.stores.len(), "Settings loaded");
        Ok(settings)
    }

    /// Parses and validates settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content).map_err(|e| SettingsError::ParseError {
            path: PathBuf::from("<inline>"),
            source: e,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validates the settings.
    ///
    /// Checks:
    /// - `max_update_cycles` is at least 1
    /// - Every path override is non-empty
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.engine.max_update_cycles == 0 {
            return Err(SettingsError::ValidationError {
                message: "engine.max_update_cycles must be at least 1".to_string(),
            });
        }

        if let Some((name, _)) = self
            .stores
            .iter()
            .find(|(_, store)| store.path.as_ref().is_some_and(|path| path.is_empty()))
        {
            return Err(SettingsError::ValidationError {
                message: format!("Path override of store '{}' is empty", name),
            });
        }

        Ok(())
    }
}
