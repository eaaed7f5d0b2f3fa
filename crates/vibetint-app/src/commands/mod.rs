//! Subcommand implementations.

pub mod apply;
pub mod clear;
pub mod generate;
pub mod show;

use std::path::PathBuf;

use vibetint_common::SettingsError;
use vibetint_generator::GeneratorError;
use vibetint_settings::paths::detect_workspace_root;
use vibetint_settings::JsonSettingsStore;
use vibetint_theme::ApplyError;

/// Anything a subcommand can fail with. Rendered to the user as one
/// message, plus a remedy when the failure has one.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Theme(#[from] ApplyError),
    #[error("{0}")]
    Settings(#[from] SettingsError),
    #[error("{0}")]
    Generator(#[from] GeneratorError),
    #[error("{0}")]
    Other(String),
}

impl CliError {
    /// A follow-up action the user can take.
    pub fn remedy(&self) -> Option<String> {
        match self {
            CliError::Theme(e) => e.suggested_action.clone(),
            CliError::Settings(SettingsError::NoWorkspace) => Some(
                "run inside a workspace with a .vibetint/ directory, or pass --workspace".into(),
            ),
            CliError::Generator(GeneratorError::RateLimited) => {
                Some("wait a moment and try again".into())
            }
            CliError::Generator(GeneratorError::Timeout) => Some("try again".into()),
            _ => None,
        }
    }
}

/// Open the JSON-backed store. The workspace root comes from the
/// --workspace flag, or from marker detection upward from the current
/// directory; no marker means global scope only.
pub fn open_store(workspace: Option<&str>) -> Result<JsonSettingsStore, CliError> {
    let root: Option<PathBuf> = match workspace {
        Some(dir) => {
            let path = PathBuf::from(dir);
            if !path.is_dir() {
                return Err(CliError::Other(format!(
                    "workspace directory not found: {dir}"
                )));
            }
            Some(path)
        }
        None => std::env::current_dir()
            .ok()
            .and_then(|cwd| detect_workspace_root(&cwd)),
    };
    Ok(JsonSettingsStore::from_default_paths(root.as_deref())?)
}
