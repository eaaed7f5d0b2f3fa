//! Reading the store's current customizations.

use tracing::debug;

use vibetint_common::{ColorMap, SettingsError, SettingsScope, TokenMap};
use vibetint_settings::SettingsStore;

use crate::types::{ApplyError, ConfigScope, CurrentThemeState};

/// Merges the two storage scopes into one effective view of the current
/// theme. Every call reads the store fresh; nothing is cached here.
pub struct ThemeReader<'a> {
    store: &'a dyn SettingsStore,
}

impl<'a> ThemeReader<'a> {
    pub fn new(store: &'a dyn SettingsStore) -> Self {
        Self { store }
    }

    /// Merged color namespace: global values overlaid with workspace ones,
    /// workspace winning on key conflicts.
    pub async fn current_color_customizations(&self) -> Result<ColorMap, SettingsError> {
        let mut merged = self.store.read_colors(SettingsScope::Global).await?;
        merged.extend(self.store.read_colors(SettingsScope::Workspace).await?);
        Ok(merged)
    }

    /// Merged token namespace. The merge is per top-level key, so a
    /// workspace `textMateRules` array replaces the global one wholesale.
    pub async fn current_token_customizations(&self) -> Result<TokenMap, SettingsError> {
        let mut merged = self.store.read_token_colors(SettingsScope::Global).await?;
        merged.extend(self.store.read_token_colors(SettingsScope::Workspace).await?);
        Ok(merged)
    }

    /// Which storage level(s) currently hold customizations.
    pub async fn current_scope(&self) -> Result<ConfigScope, SettingsError> {
        Ok(self.read_state().await?.scope)
    }

    /// One snapshot of the effective theme state.
    ///
    /// Store failures come back as a recoverable [`ApplyError`] rather
    /// than propagating raw: reading configuration must never crash the
    /// caller, and callers that can proceed without context fall back to
    /// [`CurrentThemeState::empty`].
    pub async fn current_state(&self) -> Result<CurrentThemeState, ApplyError> {
        self.read_state().await.map_err(|e| {
            ApplyError::recoverable("failed to read current theme state")
                .with_cause(e.to_string())
                .with_suggestion("retry, or check that the settings files are readable")
        })
    }

    async fn read_state(&self) -> Result<CurrentThemeState, SettingsError> {
        let global_colors = self.store.read_colors(SettingsScope::Global).await?;
        let workspace_colors = self.store.read_colors(SettingsScope::Workspace).await?;
        let global_tokens = self.store.read_token_colors(SettingsScope::Global).await?;
        let workspace_tokens = self
            .store
            .read_token_colors(SettingsScope::Workspace)
            .await?;

        let global_has = !global_colors.is_empty() || !global_tokens.is_empty();
        let workspace_has = !workspace_colors.is_empty() || !workspace_tokens.is_empty();
        let scope = match (workspace_has, global_has) {
            (true, true) => ConfigScope::Both {
                primary: SettingsScope::Workspace,
                fallback: SettingsScope::Global,
            },
            (true, false) => ConfigScope::Workspace,
            (false, true) => ConfigScope::Global,
            // Nothing stored anywhere; global is a neutral default here,
            // not a statement about where anything lives.
            (false, false) => ConfigScope::Global,
        };

        let mut color_customizations = global_colors;
        color_customizations.extend(workspace_colors);
        let mut token_customizations = global_tokens;
        token_customizations.extend(workspace_tokens);

        let has_customizations =
            !color_customizations.is_empty() || !token_customizations.is_empty();
        debug!(
            colors = color_customizations.len(),
            token_keys = token_customizations.len(),
            %scope,
            "read current theme state"
        );

        Ok(CurrentThemeState {
            color_customizations,
            token_customizations,
            has_customizations,
            scope,
        })
    }
}
