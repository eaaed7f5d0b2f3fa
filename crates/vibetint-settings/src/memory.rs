//! In-memory settings store.
//!
//! Backs `--dry-run` runs (seeded from the real store, so appliers see the
//! current state without being able to touch it) and tests. Per-scope write
//! failure injection makes the scope fallback chain exercisable.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use vibetint_common::{ColorMap, SettingsError, SettingsScope, TokenMap};

use crate::SettingsStore;

#[derive(Debug, Default, Clone)]
struct ScopeData {
    colors: ColorMap,
    tokens: TokenMap,
}

/// Settings store held entirely in memory.
#[derive(Debug)]
pub struct MemoryStore {
    global: RwLock<ScopeData>,
    workspace: RwLock<ScopeData>,
    has_workspace: bool,
    fail_global_reads: AtomicBool,
    fail_workspace_reads: AtomicBool,
    fail_global_writes: AtomicBool,
    fail_workspace_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new(has_workspace: bool) -> Self {
        Self {
            global: RwLock::new(ScopeData::default()),
            workspace: RwLock::new(ScopeData::default()),
            has_workspace,
            fail_global_reads: AtomicBool::new(false),
            fail_workspace_reads: AtomicBool::new(false),
            fail_global_writes: AtomicBool::new(false),
            fail_workspace_writes: AtomicBool::new(false),
        }
    }

    /// Copy the current contents of another store, scope by scope.
    pub async fn seeded_from(
        source: &dyn SettingsStore,
        has_workspace: bool,
    ) -> Result<Self, SettingsError> {
        let store = Self::new(has_workspace);
        {
            let mut global = store.global.write().await;
            global.colors = source.read_colors(SettingsScope::Global).await?;
            global.tokens = source.read_token_colors(SettingsScope::Global).await?;
        }
        if has_workspace {
            let mut workspace = store.workspace.write().await;
            workspace.colors = source.read_colors(SettingsScope::Workspace).await?;
            workspace.tokens = source.read_token_colors(SettingsScope::Workspace).await?;
        }
        Ok(store)
    }

    /// Make every subsequent write to `scope` fail with a write error.
    pub fn fail_writes(&self, scope: SettingsScope, fail: bool) {
        self.write_flag(scope).store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent read of `scope` fail with a read error.
    pub fn fail_reads(&self, scope: SettingsScope, fail: bool) {
        self.read_flag(scope).store(fail, Ordering::SeqCst);
    }

    fn read_flag(&self, scope: SettingsScope) -> &AtomicBool {
        match scope {
            SettingsScope::Global => &self.fail_global_reads,
            SettingsScope::Workspace => &self.fail_workspace_reads,
        }
    }

    fn write_flag(&self, scope: SettingsScope) -> &AtomicBool {
        match scope {
            SettingsScope::Global => &self.fail_global_writes,
            SettingsScope::Workspace => &self.fail_workspace_writes,
        }
    }

    fn data_for(&self, scope: SettingsScope) -> &RwLock<ScopeData> {
        match scope {
            SettingsScope::Global => &self.global,
            SettingsScope::Workspace => &self.workspace,
        }
    }

    fn check_readable(&self, scope: SettingsScope) -> Result<(), SettingsError> {
        if self.read_flag(scope).load(Ordering::SeqCst) {
            return Err(SettingsError::Read(format!(
                "reads from {scope} scope are disabled"
            )));
        }
        Ok(())
    }

    fn check_writable(&self, scope: SettingsScope) -> Result<(), SettingsError> {
        if scope == SettingsScope::Workspace && !self.has_workspace {
            return Err(SettingsError::NoWorkspace);
        }
        if self.write_flag(scope).load(Ordering::SeqCst) {
            return Err(SettingsError::Write(format!(
                "writes to {scope} scope are disabled"
            )));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    fn has_workspace(&self) -> bool {
        self.has_workspace
    }

    async fn read_colors(&self, scope: SettingsScope) -> Result<ColorMap, SettingsError> {
        if scope == SettingsScope::Workspace && !self.has_workspace {
            return Ok(ColorMap::new());
        }
        self.check_readable(scope)?;
        Ok(self.data_for(scope).read().await.colors.clone())
    }

    async fn write_colors(
        &self,
        scope: SettingsScope,
        colors: &ColorMap,
    ) -> Result<(), SettingsError> {
        self.check_writable(scope)?;
        self.data_for(scope).write().await.colors = colors.clone();
        Ok(())
    }

    async fn read_token_colors(&self, scope: SettingsScope) -> Result<TokenMap, SettingsError> {
        if scope == SettingsScope::Workspace && !self.has_workspace {
            return Ok(TokenMap::new());
        }
        self.check_readable(scope)?;
        Ok(self.data_for(scope).read().await.tokens.clone())
    }

    async fn write_token_colors(
        &self,
        scope: SettingsScope,
        tokens: &TokenMap,
    ) -> Result<(), SettingsError> {
        self.check_writable(scope)?;
        self.data_for(scope).write().await.tokens = tokens.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn colors_round_trip() {
        let store = MemoryStore::new(true);
        let mut colors = ColorMap::new();
        colors.insert("editor.background".into(), "#1a1a2e".into());

        store
            .write_colors(SettingsScope::Workspace, &colors)
            .await
            .unwrap();
        let read = store.read_colors(SettingsScope::Workspace).await.unwrap();
        assert_eq!(read, colors);

        // Other scope untouched.
        let global = store.read_colors(SettingsScope::Global).await.unwrap();
        assert!(global.is_empty());
    }

    #[tokio::test]
    async fn injected_failure_rejects_writes_and_keeps_data() {
        let store = MemoryStore::new(true);
        let mut colors = ColorMap::new();
        colors.insert("editor.background".into(), "#111111".into());
        store
            .write_colors(SettingsScope::Global, &colors)
            .await
            .unwrap();

        store.fail_writes(SettingsScope::Global, true);
        let mut updated = colors.clone();
        updated.insert("statusBar.background".into(), "#222222".into());
        let err = store
            .write_colors(SettingsScope::Global, &updated)
            .await
            .unwrap_err();
        assert!(matches!(err, SettingsError::Write(_)));

        let read = store.read_colors(SettingsScope::Global).await.unwrap();
        assert_eq!(read, colors);

        store.fail_writes(SettingsScope::Global, false);
        store
            .write_colors(SettingsScope::Global, &updated)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn injected_failure_rejects_reads() {
        let store = MemoryStore::new(true);
        store.fail_reads(SettingsScope::Global, true);

        let err = store.read_colors(SettingsScope::Global).await.unwrap_err();
        assert!(matches!(err, SettingsError::Read(_)));

        // The other scope still reads.
        store.read_colors(SettingsScope::Workspace).await.unwrap();
    }

    #[tokio::test]
    async fn workspace_scope_gated_on_has_workspace() {
        let store = MemoryStore::new(false);

        let read = store.read_colors(SettingsScope::Workspace).await.unwrap();
        assert!(read.is_empty());

        let err = store
            .write_colors(SettingsScope::Workspace, &ColorMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SettingsError::NoWorkspace));
    }

    #[tokio::test]
    async fn seeding_copies_both_scopes() {
        let source = MemoryStore::new(true);
        let mut global = ColorMap::new();
        global.insert("editor.background".into(), "#101010".into());
        source
            .write_colors(SettingsScope::Global, &global)
            .await
            .unwrap();
        let mut tokens = TokenMap::new();
        tokens.insert("comments".into(), serde_json::json!("#6a9955"));
        source
            .write_token_colors(SettingsScope::Workspace, &tokens)
            .await
            .unwrap();

        let copy = MemoryStore::seeded_from(&source, true).await.unwrap();
        assert_eq!(
            copy.read_colors(SettingsScope::Global).await.unwrap(),
            global
        );
        assert_eq!(
            copy.read_token_colors(SettingsScope::Workspace)
                .await
                .unwrap(),
            tokens
        );
    }
}
