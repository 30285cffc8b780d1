//! Cross-Platform Path Utilities
//!
//! Resolves the engine's data directory (~/.focus-panel/) and the files in it.

use std::path::{Path, PathBuf};

use crate::utils::error::{PanelError, PanelResult};

/// Get the user's home directory
pub fn home_dir() -> PanelResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| PanelError::config("Could not determine home directory"))
}

/// Get the Focus Panel directory (~/.focus-panel/)
pub fn focus_panel_dir() -> PanelResult<PathBuf> {
    Ok(home_dir()?.join(".focus-panel"))
}

/// Get the config file path (~/.focus-panel/config.json)
pub fn config_path() -> PanelResult<PathBuf> {
    Ok(focus_panel_dir()?.join("config.json"))
}

/// Get the database file path (~/.focus-panel/panel.db)
pub fn database_path() -> PanelResult<PathBuf> {
    Ok(focus_panel_dir()?.join("panel.db"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> PanelResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Get the Focus Panel directory, creating it if it doesn't exist
pub fn ensure_focus_panel_dir() -> PanelResult<PathBuf> {
    let path = focus_panel_dir()?;
    ensure_dir(&path)?;
    Ok(path)
}
