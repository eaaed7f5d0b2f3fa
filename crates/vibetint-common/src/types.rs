use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One concrete storage level of the settings store.
///
/// Distinct from TextMate token scopes: this is *where* a setting lives,
/// not what syntax it styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsScope {
    /// User-level settings, shared across all workspaces.
    Global,
    /// Settings local to the currently open workspace.
    Workspace,
}

impl fmt::Display for SettingsScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsScope::Global => f.write_str("global"),
            SettingsScope::Workspace => f.write_str("workspace"),
        }
    }
}

/// Flat UI color namespace: dot-path selector key -> color string.
///
/// BTreeMap keeps iteration deterministic, which the context formatter
/// relies on for byte-stable output.
pub type ColorMap = BTreeMap<String, String>;

/// Syntax token namespace. Keys other than [`TOKEN_RULES_KEY`] are opaque
/// and must be preserved by every write path.
pub type TokenMap = BTreeMap<String, serde_json::Value>;

/// The single collection key inside the token namespace that holds the
/// ordered token rule array.
pub const TOKEN_RULES_KEY: &str = "textMateRules";
