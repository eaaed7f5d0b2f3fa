//! Applying settings to the store.
//!
//! Two entry points share one write machinery: [`ThemeApplier::apply_streaming`]
//! merges a single decoded protocol line, [`ThemeApplier::apply_customizations`]
//! replaces the theme with a complete validated payload. Both resolve their
//! write targets through [`ConfigScope::write_plan`] and walk them with the
//! same attempt-then-fall-back loop, so the two paths cannot diverge in
//! retry policy.

use serde_json::Value;
use tracing::{debug, info, warn};

use vibetint_common::{ColorMap, SettingsError, SettingsScope, TOKEN_RULES_KEY};
use vibetint_settings::SettingsStore;

use crate::protocol::StreamingSetting;
use crate::types::{
    ApplyError, ApplyResult, ConfigScope, ThemeCustomizations, TokenRule, TokenScope,
    TokenSettings,
};
use crate::values;

/// Writes theme customizations through the settings store.
///
/// Every apply is read-modify-write on a fresh snapshot; the store is
/// shared with other writers and last writer wins.
pub struct ThemeApplier<'a> {
    store: &'a dyn SettingsStore,
}

/// One write operation, expressed as data so the fallback loop can replay
/// it against successive targets.
enum WriteOp<'a> {
    Selector {
        name: &'a str,
        color: &'a str,
    },
    Token {
        scope: &'a str,
        color: &'a str,
        font_style: Option<&'a str>,
    },
    FullPayload(&'a ThemeCustomizations),
}

impl WriteOp<'_> {
    fn describe(&self) -> String {
        match self {
            WriteOp::Selector { name, .. } => format!("selector '{name}'"),
            WriteOp::Token { scope, .. } => format!("token rule '{scope}'"),
            WriteOp::FullPayload(_) => "theme payload".to_string(),
        }
    }
}

impl<'a> ThemeApplier<'a> {
    pub fn new(store: &'a dyn SettingsStore) -> Self {
        Self { store }
    }

    /// Merge one streamed setting into the store.
    ///
    /// The REMOVE sentinel deletes the key (a no-op when it is already
    /// absent); any other color upserts. Token rules are keyed by scope:
    /// the old rule for that exact scope is dropped and, unless removing,
    /// a replacement is appended.
    pub async fn apply_streaming(
        &self,
        setting: &StreamingSetting,
        has_workspace: bool,
    ) -> ApplyResult {
        let plan = ConfigScope::write_plan(has_workspace);
        let op = match setting {
            StreamingSetting::Selector { name, color } => WriteOp::Selector { name, color },
            StreamingSetting::Token {
                scope,
                color,
                font_style,
            } => WriteOp::Token {
                scope,
                color,
                font_style: font_style.as_deref(),
            },
        };
        self.apply_at_first_target(&plan.targets(), op).await
    }

    /// Replace the stored theme with a complete payload.
    ///
    /// All color values are validated up front with the same predicate the
    /// streaming parser uses; REMOVE is not accepted here, a full payload
    /// carries concrete values only. An invalid payload is a caller bug
    /// and fails hard, naming every offending key.
    pub async fn apply_customizations(
        &self,
        payload: &ThemeCustomizations,
        suppress_notifications: bool,
    ) -> ApplyResult {
        let invalid = invalid_color_keys(payload);
        if !invalid.is_empty() {
            return Err(ApplyError::fatal(format!(
                "theme payload contains invalid color values: {}",
                invalid.join(", ")
            )));
        }

        let plan = ConfigScope::write_plan(self.store.has_workspace());
        let result = self
            .apply_at_first_target(&plan.targets(), WriteOp::FullPayload(payload))
            .await;

        if let Ok(scope) = &result {
            if !suppress_notifications {
                info!(
                    %scope,
                    colors = payload.selectors.len(),
                    token_rules = payload.token_colors.len(),
                    "theme applied"
                );
            }
        }
        result
    }

    /// Empty the color namespace and drop the token rule array at one
    /// scope. Keys other tools keep in the token namespace stay.
    pub async fn clear_scope(&self, scope: SettingsScope) -> Result<(), SettingsError> {
        self.store.write_colors(scope, &ColorMap::new()).await?;
        let mut tokens = self.store.read_token_colors(scope).await?;
        if tokens.remove(TOKEN_RULES_KEY).is_some() {
            self.store.write_token_colors(scope, &tokens).await?;
        }
        info!(%scope, "cleared theme customizations");
        Ok(())
    }

    /// Attempt `op` against each target in order; the first target that
    /// takes the write wins and later ones are not touched. Only when
    /// every target fails does the caller see an error, aggregating each
    /// target's failure.
    async fn apply_at_first_target(
        &self,
        targets: &[SettingsScope],
        op: WriteOp<'_>,
    ) -> ApplyResult {
        let mut failures: Vec<String> = Vec::new();
        for &target in targets {
            match self.attempt(target, &op).await {
                Ok(()) => {
                    debug!(scope = %target, "applied {}", op.describe());
                    return Ok(target.into());
                }
                Err(e) => {
                    warn!(scope = %target, error = %e, "write failed, trying next target");
                    failures.push(format!("{target}: {e}"));
                }
            }
        }
        Err(
            ApplyError::recoverable(format!("failed to apply {} at any scope", op.describe()))
                .with_cause(failures.join("; "))
                .with_suggestion("check settings file permissions, or restart the tool"),
        )
    }

    async fn attempt(&self, target: SettingsScope, op: &WriteOp<'_>) -> Result<(), SettingsError> {
        match op {
            WriteOp::Selector { name, color } => {
                let mut colors = self.store.read_colors(target).await?;
                if values::is_remove_sentinel(color) {
                    colors.remove(*name);
                } else {
                    colors.insert(name.to_string(), color.to_string());
                }
                self.store.write_colors(target, &colors).await
            }
            WriteOp::Token {
                scope,
                color,
                font_style,
            } => {
                let mut tokens = self.store.read_token_colors(target).await?;
                let mut rules = match tokens.get(TOKEN_RULES_KEY) {
                    Some(Value::Array(rules)) => rules.clone(),
                    _ => Vec::new(),
                };
                rules.retain(|rule| !rule_matches_scope(rule, scope));
                if !values::is_remove_sentinel(color) {
                    rules.push(replacement_rule(scope, color, *font_style)?);
                }
                if rules.is_empty() {
                    tokens.remove(TOKEN_RULES_KEY);
                } else {
                    tokens.insert(TOKEN_RULES_KEY.to_string(), Value::Array(rules));
                }
                self.store.write_token_colors(target, &tokens).await
            }
            WriteOp::FullPayload(payload) => {
                self.store.write_colors(target, &payload.selectors).await?;
                if !payload.token_colors.is_empty() {
                    let mut tokens = self.store.read_token_colors(target).await?;
                    let rules = serde_json::to_value(&payload.token_colors).map_err(|e| {
                        SettingsError::Write(format!("failed to serialize token rules: {e}"))
                    })?;
                    tokens.insert(TOKEN_RULES_KEY.to_string(), rules);
                    self.store.write_token_colors(target, &tokens).await?;
                }
                Ok(())
            }
        }
    }
}

/// Whether a stored rule addresses exactly the incoming single scope.
/// Rules covering several scopes are never edited in place.
fn rule_matches_scope(rule: &Value, scope: &str) -> bool {
    rule.get("scope")
        .and_then(|v| serde_json::from_value::<TokenScope>(v.clone()).ok())
        .map(|s| s.matches_single(scope))
        .unwrap_or(false)
}

fn replacement_rule(
    scope: &str,
    color: &str,
    font_style: Option<&str>,
) -> Result<Value, SettingsError> {
    let rule = TokenRule {
        scope: TokenScope::One(scope.to_string()),
        settings: TokenSettings {
            foreground: Some(color.to_string()),
            background: None,
            font_style: font_style.map(str::to_string),
        },
    };
    serde_json::to_value(&rule)
        .map_err(|e| SettingsError::Write(format!("failed to serialize token rule: {e}")))
}

/// Every key in the payload whose color value fails validation, selectors
/// and token rules alike.
fn invalid_color_keys(payload: &ThemeCustomizations) -> Vec<String> {
    let mut invalid = Vec::new();
    for (key, value) in &payload.selectors {
        if !values::is_valid_color_token(value) {
            invalid.push(key.clone());
        }
    }
    for (index, rule) in payload.token_colors.iter().enumerate() {
        if let Some(foreground) = &rule.settings.foreground {
            if !values::is_valid_color_token(foreground) {
                invalid.push(format!("tokenColors[{index}].foreground"));
            }
        }
        if let Some(background) = &rule.settings.background {
            if !values::is_valid_color_token(background) {
                invalid.push(format!("tokenColors[{index}].background"));
            }
        }
    }
    invalid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::parse_line;
    use serde_json::json;
    use vibetint_common::TokenMap;
    use vibetint_settings::MemoryStore;

    async fn apply_lines(applier: &ThemeApplier<'_>, has_workspace: bool, lines: &[&str]) {
        for line in lines {
            let setting = parse_line(line).unwrap();
            applier
                .apply_streaming(&setting, has_workspace)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn incremental_edit_then_remove() {
        let store = MemoryStore::new(false);
        let applier = ThemeApplier::new(&store);

        apply_lines(&applier, false, &["SELECTOR:editor.background=#111111"]).await;
        apply_lines(&applier, false, &["SELECTOR:editor.background=#222222"]).await;
        let colors = store.read_colors(SettingsScope::Global).await.unwrap();
        assert_eq!(colors["editor.background"], "#222222");
        assert_eq!(colors.len(), 1);

        apply_lines(&applier, false, &["SELECTOR:editor.background=REMOVE"]).await;
        let colors = store.read_colors(SettingsScope::Global).await.unwrap();
        assert!(colors.is_empty());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let store = MemoryStore::new(false);
        let applier = ThemeApplier::new(&store);
        let remove = parse_line("SELECTOR:editor.background=REMOVE").unwrap();

        // Absent key: removal is a successful no-op.
        let scope = applier.apply_streaming(&remove, false).await.unwrap();
        assert_eq!(scope, ConfigScope::Global);
        let after_absent = store.read_colors(SettingsScope::Global).await.unwrap();

        // Present key: removal deletes it; same resulting map either way.
        apply_lines(&applier, false, &["SELECTOR:editor.background=#111111"]).await;
        applier.apply_streaming(&remove, false).await.unwrap();
        let after_present = store.read_colors(SettingsScope::Global).await.unwrap();
        assert_eq!(after_absent, after_present);
    }

    #[tokio::test]
    async fn token_rule_replaces_same_scope() {
        let store = MemoryStore::new(false);
        let mut tokens = TokenMap::new();
        tokens.insert(
            TOKEN_RULES_KEY.into(),
            json!([{ "scope": "comment", "settings": { "foreground": "#6a9955" } }]),
        );
        store
            .write_token_colors(SettingsScope::Global, &tokens)
            .await
            .unwrap();
        let applier = ThemeApplier::new(&store);

        apply_lines(&applier, false, &["TOKEN:comment=#ff0000,bold"]).await;

        let tokens = store.read_token_colors(SettingsScope::Global).await.unwrap();
        let rules = tokens[TOKEN_RULES_KEY].as_array().unwrap();
        assert_eq!(rules.len(), 1, "no duplicate rules for one scope");
        assert_eq!(rules[0]["scope"], "comment");
        assert_eq!(rules[0]["settings"]["foreground"], "#ff0000");
        assert_eq!(rules[0]["settings"]["fontStyle"], "bold");
    }

    #[tokio::test]
    async fn token_remove_deletes_without_replacement() {
        let store = MemoryStore::new(false);
        let mut tokens = TokenMap::new();
        tokens.insert(
            TOKEN_RULES_KEY.into(),
            json!([
                { "scope": "comment", "settings": { "foreground": "#6a9955" } },
                { "scope": "keyword", "settings": { "foreground": "#c586c0" } },
            ]),
        );
        store
            .write_token_colors(SettingsScope::Global, &tokens)
            .await
            .unwrap();
        let applier = ThemeApplier::new(&store);

        apply_lines(&applier, false, &["TOKEN:comment=REMOVE"]).await;

        let tokens = store.read_token_colors(SettingsScope::Global).await.unwrap();
        let rules = tokens[TOKEN_RULES_KEY].as_array().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0]["scope"], "keyword");
    }

    #[tokio::test]
    async fn token_remove_of_last_rule_drops_the_array() {
        let store = MemoryStore::new(false);
        let applier = ThemeApplier::new(&store);

        apply_lines(
            &applier,
            false,
            &["TOKEN:comment=#6a9955", "TOKEN:comment=REMOVE"],
        )
        .await;

        let tokens = store.read_token_colors(SettingsScope::Global).await.unwrap();
        assert!(tokens.get(TOKEN_RULES_KEY).is_none());
    }

    #[tokio::test]
    async fn multi_scope_rules_are_left_alone() {
        let store = MemoryStore::new(false);
        let mut tokens = TokenMap::new();
        tokens.insert(
            TOKEN_RULES_KEY.into(),
            json!([
                { "scope": ["comment"], "settings": { "foreground": "#6a9955" } },
                { "scope": ["comment", "string"], "settings": { "foreground": "#777777" } },
            ]),
        );
        store
            .write_token_colors(SettingsScope::Global, &tokens)
            .await
            .unwrap();
        let applier = ThemeApplier::new(&store);

        apply_lines(&applier, false, &["TOKEN:comment=#ff0000"]).await;

        let tokens = store.read_token_colors(SettingsScope::Global).await.unwrap();
        let rules = tokens[TOKEN_RULES_KEY].as_array().unwrap();
        // The singleton-list rule was replaced; the two-scope rule stayed.
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0]["scope"], json!(["comment", "string"]));
        assert_eq!(rules[1]["scope"], "comment");
    }

    #[tokio::test]
    async fn global_takes_writes_first() {
        let store = MemoryStore::new(true);
        let applier = ThemeApplier::new(&store);
        let setting = parse_line("SELECTOR:editor.background=#111111").unwrap();

        let scope = applier.apply_streaming(&setting, true).await.unwrap();
        assert_eq!(scope, ConfigScope::Global);

        let workspace = store.read_colors(SettingsScope::Workspace).await.unwrap();
        assert!(workspace.is_empty(), "workspace untouched after a global hit");
    }

    #[tokio::test]
    async fn falls_back_to_workspace_when_global_write_fails() {
        let store = MemoryStore::new(true);
        store.fail_writes(SettingsScope::Global, true);
        let applier = ThemeApplier::new(&store);
        let setting = parse_line("SELECTOR:editor.background=#111111").unwrap();

        let scope = applier.apply_streaming(&setting, true).await.unwrap();
        assert_eq!(scope, ConfigScope::Workspace);

        let workspace = store.read_colors(SettingsScope::Workspace).await.unwrap();
        assert_eq!(workspace["editor.background"], "#111111");
    }

    #[tokio::test]
    async fn all_targets_failing_aggregates_recoverable_error() {
        let store = MemoryStore::new(true);
        store.fail_writes(SettingsScope::Global, true);
        store.fail_writes(SettingsScope::Workspace, true);
        let applier = ThemeApplier::new(&store);
        let setting = parse_line("SELECTOR:editor.background=#111111").unwrap();

        let err = applier.apply_streaming(&setting, true).await.unwrap_err();
        assert!(err.recoverable);
        let cause = err.cause.unwrap();
        assert!(cause.contains("global"));
        assert!(cause.contains("workspace"));
        assert!(err.suggested_action.unwrap().contains("permissions"));
    }

    #[tokio::test]
    async fn without_workspace_only_global_is_attempted() {
        let store = MemoryStore::new(true);
        store.fail_writes(SettingsScope::Global, true);
        let applier = ThemeApplier::new(&store);
        let setting = parse_line("SELECTOR:editor.background=#111111").unwrap();

        // has_workspace = false narrows the plan to global despite the
        // store being capable of workspace writes.
        let err = applier.apply_streaming(&setting, false).await.unwrap_err();
        assert!(err.recoverable);
        let workspace = store.read_colors(SettingsScope::Workspace).await.unwrap();
        assert!(workspace.is_empty());
    }

    #[tokio::test]
    async fn batch_rejects_invalid_payload_naming_every_key() {
        let store = MemoryStore::new(false);
        let applier = ThemeApplier::new(&store);

        let payload: ThemeCustomizations = serde_json::from_value(json!({
            "selectors": {
                "editor.background": "red",
                "panel.border": "#ab",
                "statusBar.background": "#16213e",
                "badge.background": "REMOVE"
            },
            "tokenColors": [
                { "scope": "comment", "settings": { "foreground": "rgb(1,2,3)" } }
            ]
        }))
        .unwrap();

        let err = applier
            .apply_customizations(&payload, true)
            .await
            .unwrap_err();
        assert!(!err.recoverable);
        assert!(err.message.contains("editor.background"));
        assert!(err.message.contains("panel.border"));
        assert!(err.message.contains("badge.background"));
        assert!(err.message.contains("tokenColors[0].foreground"));
        assert!(!err.message.contains("statusBar.background"));

        // Nothing was written.
        let colors = store.read_colors(SettingsScope::Global).await.unwrap();
        assert!(colors.is_empty());
    }

    #[tokio::test]
    async fn batch_replaces_rules_and_preserves_opaque_token_keys() {
        let store = MemoryStore::new(false);
        let mut tokens = TokenMap::new();
        tokens.insert("comments".into(), json!("#556677"));
        tokens.insert(
            TOKEN_RULES_KEY.into(),
            json!([{ "scope": "old", "settings": { "foreground": "#000000" } }]),
        );
        store
            .write_token_colors(SettingsScope::Global, &tokens)
            .await
            .unwrap();
        let applier = ThemeApplier::new(&store);

        let payload: ThemeCustomizations = serde_json::from_value(json!({
            "selectors": { "editor.background": "#1a1a2e" },
            "tokenColors": [
                { "scope": "comment", "settings": { "foreground": "#6a9955", "fontStyle": "italic" } }
            ],
            "description": "test theme"
        }))
        .unwrap();

        let scope = applier.apply_customizations(&payload, true).await.unwrap();
        assert_eq!(scope, ConfigScope::Global);

        let tokens = store.read_token_colors(SettingsScope::Global).await.unwrap();
        assert_eq!(tokens["comments"], json!("#556677"));
        let rules = tokens[TOKEN_RULES_KEY].as_array().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0]["scope"], "comment");
    }

    #[tokio::test]
    async fn batch_falls_back_like_streaming() {
        let store = MemoryStore::new(true);
        store.fail_writes(SettingsScope::Global, true);
        let applier = ThemeApplier::new(&store);

        let payload: ThemeCustomizations = serde_json::from_value(json!({
            "selectors": { "editor.background": "#1a1a2e" }
        }))
        .unwrap();

        let scope = applier.apply_customizations(&payload, true).await.unwrap();
        assert_eq!(scope, ConfigScope::Workspace);
    }

    #[tokio::test]
    async fn streamed_selectors_match_batch_result() {
        let lines = [
            "SELECTOR:editor.background=#1a1a2e",
            "SELECTOR:editor.foreground=#e0e0e0",
            "SELECTOR:statusBar.background=#16213e",
        ];

        let streamed = MemoryStore::new(false);
        let applier = ThemeApplier::new(&streamed);
        apply_lines(&applier, false, &lines).await;

        let batched = MemoryStore::new(false);
        let applier = ThemeApplier::new(&batched);
        let mut selectors = ColorMap::new();
        selectors.insert("editor.background".into(), "#1a1a2e".into());
        selectors.insert("editor.foreground".into(), "#e0e0e0".into());
        selectors.insert("statusBar.background".into(), "#16213e".into());
        let payload = ThemeCustomizations {
            selectors,
            ..Default::default()
        };
        applier.apply_customizations(&payload, true).await.unwrap();

        assert_eq!(
            streamed.read_colors(SettingsScope::Global).await.unwrap(),
            batched.read_colors(SettingsScope::Global).await.unwrap()
        );
    }

    #[tokio::test]
    async fn clear_scope_keeps_foreign_token_keys() {
        let store = MemoryStore::new(false);
        let mut colors = ColorMap::new();
        colors.insert("editor.background".into(), "#111111".into());
        store
            .write_colors(SettingsScope::Global, &colors)
            .await
            .unwrap();
        let mut tokens = TokenMap::new();
        tokens.insert("comments".into(), json!("#556677"));
        tokens.insert(TOKEN_RULES_KEY.into(), json!([]));
        store
            .write_token_colors(SettingsScope::Global, &tokens)
            .await
            .unwrap();
        let applier = ThemeApplier::new(&store);

        applier.clear_scope(SettingsScope::Global).await.unwrap();

        let colors = store.read_colors(SettingsScope::Global).await.unwrap();
        assert!(colors.is_empty());
        let tokens = store.read_token_colors(SettingsScope::Global).await.unwrap();
        assert!(tokens.get(TOKEN_RULES_KEY).is_none());
        assert_eq!(tokens["comments"], json!("#556677"));
    }
}
