//! Settings Persistence
//!
//! Handles locating, loading and saving the engine configuration.
//! A missing or broken file never stops a job: the caller gets the
//! defaults and a warning in the log.

use crate::config::Config;
use paintkit_core::Result;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "paintkit";
const CONFIG_FILE: &str = "config.toml";

/// Default config location, e.g. `~/.config/paintkit/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Settings persistence layer
#[derive(Debug, Clone, Default)]
pub struct SettingsPersistence {
    config: Config,
    path: Option<PathBuf>,
}

impl SettingsPersistence {
    /// Create new persistence layer with default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let config = Config::load_from_file(path)?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(Self {
            config,
            path: Some(path.to_path_buf()),
        })
    }

    /// Load settings, falling back to defaults on any failure.
    ///
    /// With no explicit path the default location is tried; a missing
    /// default file is not worth a warning.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let explicit = path.is_some();
        let Some(path) = path.map(Path::to_path_buf).or_else(default_config_path) else {
            return Self::new();
        };

        if !explicit && !path.exists() {
            return Self {
                config: Config::default(),
                path: Some(path),
            };
        }

        match Self::load_from_file(&path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Using default settings, {} failed: {}", path.display(), e);
                Self {
                    config: Config::default(),
                    path: Some(path),
                }
            }
        }
    }

    /// Save settings to file, creating parent directories.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        self.config.save_to_file(path)?;
        tracing::info!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Save back to the file the settings were loaded from.
    pub fn save(&self) -> Result<()> {
        match &self.path {
            Some(path) => self.save_to_file(path),
            None => match default_config_path() {
                Some(path) => self.save_to_file(&path),
                None => Err(paintkit_core::Error::other(
                    "No configuration directory available",
                )),
            },
        }
    }

    /// Get reference to config
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable reference to config
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        self.config.validate()
    }
}
