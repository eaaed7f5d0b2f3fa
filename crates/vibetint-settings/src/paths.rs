//! Settings file locations.
//!
//! Global settings live under the OS config directory; workspace settings
//! live in a `.vibetint/` directory at the workspace root.

use std::path::{Path, PathBuf};

use vibetint_common::SettingsError;

/// The per-workspace settings directory name.
pub const WORKSPACE_DIR: &str = ".vibetint";

/// Get the platform-specific global settings file path.
///
/// On macOS: `~/Library/Application Support/vibetint/settings.json`
/// On Linux: `~/.config/vibetint/settings.json`
pub fn default_global_settings_path() -> Result<PathBuf, SettingsError> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| SettingsError::Read("could not determine config directory".into()))?;
    Ok(config_dir.join("vibetint").join("settings.json"))
}

/// Settings file path for a given workspace root.
pub fn workspace_settings_path(root: &Path) -> PathBuf {
    root.join(WORKSPACE_DIR).join("settings.json")
}

/// Find the nearest workspace root at or above `start`.
///
/// A directory counts as a workspace root when it contains a `.vibetint/`
/// directory. Returns `None` when no ancestor qualifies; the CLI then
/// runs with the global scope only.
pub fn detect_workspace_root(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(d) = dir {
        if d.join(WORKSPACE_DIR).is_dir() {
            return Some(d.to_path_buf());
        }
        dir = d.parent();
    }
    None
}
