//! Shared payload and result types for the theme core.

use serde::{Deserialize, Serialize};
use std::fmt;

use vibetint_common::{ColorMap, SettingsScope, TokenMap};

/// A complete theme payload, as produced by the generator's non-streaming
/// path or loaded from a saved theme file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeCustomizations {
    /// Dot-path selector key to color value.
    #[serde(default)]
    pub selectors: ColorMap,
    /// Ordered syntax token rules.
    #[serde(default)]
    pub token_colors: Vec<TokenRule>,
    /// Human-readable description of the theme.
    #[serde(default)]
    pub description: String,
}

impl ThemeCustomizations {
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty() && self.token_colors.is_empty()
    }
}

/// One syntax-highlighting rule: a TextMate scope (or list of scopes) and
/// the display settings it selects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRule {
    pub scope: TokenScope,
    pub settings: TokenSettings,
}

/// TextMate scope field of a token rule. The wire format allows a single
/// string or a list; both are preserved as written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenScope {
    One(String),
    Many(Vec<String>),
}

impl TokenScope {
    /// Whether this rule's scope field addresses exactly the given single
    /// scope: the identical string, or a one-element list containing it.
    /// Multi-scope rules never match and are never edited in place.
    pub fn matches_single(&self, scope: &str) -> bool {
        match self {
            TokenScope::One(s) => s == scope,
            TokenScope::Many(list) => list.len() == 1 && list[0] == scope,
        }
    }
}

impl fmt::Display for TokenScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenScope::One(s) => f.write_str(s),
            TokenScope::Many(list) => f.write_str(&list.join(", ")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_style: Option<String>,
}

/// Where a customization lives, or where a write is planned to land.
///
/// `Both` carries its ordering explicitly. Reads classify existing state as
/// `Both { primary: Workspace, fallback: Global }` because workspace values
/// win when merging; writes plan `Both { primary: Global, fallback:
/// Workspace }` because global is attempted first. The two orders are
/// deliberately not the same (see [`ConfigScope::write_plan`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigScope {
    Global,
    Workspace,
    Both {
        primary: SettingsScope,
        fallback: SettingsScope,
    },
}

impl ConfigScope {
    /// The write-target plan for an apply operation.
    ///
    /// Global first, workspace as fallback. This is the reverse of read
    /// precedence (where workspace values override global ones when
    /// merging); conflating the two orders is an easy bug, so the order is
    /// carried in the variant payload rather than implied by code.
    pub fn write_plan(has_workspace: bool) -> ConfigScope {
        if has_workspace {
            ConfigScope::Both {
                primary: SettingsScope::Global,
                fallback: SettingsScope::Workspace,
            }
        } else {
            ConfigScope::Global
        }
    }

    /// The concrete storage scopes this plan touches, in attempt order.
    pub fn targets(&self) -> Vec<SettingsScope> {
        match self {
            ConfigScope::Global => vec![SettingsScope::Global],
            ConfigScope::Workspace => vec![SettingsScope::Workspace],
            ConfigScope::Both { primary, fallback } => vec![*primary, *fallback],
        }
    }
}

impl From<SettingsScope> for ConfigScope {
    fn from(scope: SettingsScope) -> Self {
        match scope {
            SettingsScope::Global => ConfigScope::Global,
            SettingsScope::Workspace => ConfigScope::Workspace,
        }
    }
}

impl fmt::Display for ConfigScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigScope::Global => f.write_str("global"),
            ConfigScope::Workspace => f.write_str("workspace"),
            ConfigScope::Both { primary, fallback } => write!(f, "{primary}+{fallback}"),
        }
    }
}

/// Structured failure from an apply operation. Carries enough to decide
/// retry vs abort and to phrase a user-facing remedy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApplyError {
    pub message: String,
    pub cause: Option<String>,
    /// Whether retrying (or falling back) could plausibly succeed.
    pub recoverable: bool,
    pub suggested_action: Option<String>,
}

impl ApplyError {
    pub fn recoverable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
            recoverable: true,
            suggested_action: None,
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
            recoverable: false,
            suggested_action: None,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggested_action = Some(suggestion.into());
        self
    }
}

/// Outcome of one apply operation: the scope that actually took the write,
/// or a structured error.
pub type ApplyResult = Result<ConfigScope, ApplyError>;

/// Snapshot of the store's current customizations, merged across scopes.
///
/// Computed on demand and never cached: every mutation goes through the
/// applier and the next reader sees a fresh snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentThemeState {
    /// Merged color namespace, workspace values winning on conflicts.
    pub color_customizations: ColorMap,
    /// Merged token namespace, workspace values winning on conflicts.
    pub token_customizations: TokenMap,
    /// True iff either merged namespace is non-empty.
    pub has_customizations: bool,
    /// Which storage level(s) hold customizations. `Global` when nothing
    /// is stored anywhere, as a neutral default only.
    pub scope: ConfigScope,
}

impl CurrentThemeState {
    /// The fresh, nothing-stored state. Also what callers fall back to
    /// when reading the store fails.
    pub fn empty() -> Self {
        Self {
            color_customizations: ColorMap::new(),
            token_customizations: TokenMap::new(),
            has_customizations: false,
            scope: ConfigScope::Global,
        }
    }
}
