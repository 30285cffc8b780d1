//! JSON Configuration Management
//!
//! Reads and writes the engine configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::models::settings::{PanelConfig, PanelConfigUpdate};
use crate::utils::error::{PanelError, PanelResult};
use crate::utils::paths::{config_path, ensure_dir};

/// Configuration service for engine settings
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    config: PanelConfig,
}

impl ConfigService {
    /// Load `~/.focus-panel/config.json`, writing defaults when absent
    pub fn new() -> PanelResult<Self> {
        Self::open(config_path()?)
    }

    /// Load the config at `path`, writing defaults when absent
    pub fn open(path: PathBuf) -> PanelResult<Self> {
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }

        let config = if path.exists() {
            Self::load_from_file(&path)?
        } else {
            let default_config = PanelConfig::default();
            Self::save_to_file(&path, &default_config)?;
            info!(path = %path.display(), "wrote default panel config");
            default_config
        };

        Ok(Self {
            config_path: path,
            config,
        })
    }

    fn load_from_file(path: &Path) -> PanelResult<PanelConfig> {
        let content = fs::read_to_string(path)?;
        let config: PanelConfig = serde_json::from_str(&content)?;
        config.validate().map_err(PanelError::config)?;
        Ok(config)
    }

    fn save_to_file(path: &Path, config: &PanelConfig) -> PanelResult<()> {
        config.validate().map_err(PanelError::config)?;
        let content = serde_json::to_string_pretty(config)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get_config(&self) -> &PanelConfig {
        &self.config
    }

    /// Apply a partial update and persist it. The stored config is left
    /// untouched when the update does not validate.
    pub fn update_config(&mut self, update: PanelConfigUpdate) -> PanelResult<PanelConfig> {
        let mut next = self.config.clone();
        next.apply_update(update);
        Self::save_to_file(&self.config_path, &next)?;
        self.config = next;
        Ok(self.config.clone())
    }

    pub fn save(&self) -> PanelResult<()> {
        Self::save_to_file(&self.config_path, &self.config)
    }

    /// Reload configuration from disk
    pub fn reload(&mut self) -> PanelResult<()> {
        self.config = Self::load_from_file(&self.config_path)?;
        Ok(())
    }

    pub fn reset(&mut self) -> PanelResult<()> {
        self.config = PanelConfig::default();
        self.save()
    }
}
