//! JSON file-backed settings store.
//!
//! One document per scope: the global file under the OS config directory
//! and an optional workspace file under `.vibetint/`. Each document is a
//! JSON object whose `colors` and `tokenColors` keys hold the two
//! namespaces. Unknown top-level keys belong to other tools and are
//! carried through every write untouched.
//!
//! Writes are atomic (write to `.tmp`, then rename) to prevent corruption
//! if the process dies mid-write.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use vibetint_common::{ColorMap, SettingsError, SettingsScope, TokenMap};

use crate::paths;
use crate::SettingsStore;

/// Top-level document key for the UI color namespace.
const COLORS_KEY: &str = "colors";
/// Top-level document key for the syntax token namespace.
const TOKEN_COLORS_KEY: &str = "tokenColors";

/// Settings store backed by one JSON file per scope.
#[derive(Debug)]
pub struct JsonSettingsStore {
    global_path: PathBuf,
    workspace_path: Option<PathBuf>,
}

impl JsonSettingsStore {
    pub fn new(global_path: PathBuf, workspace_path: Option<PathBuf>) -> Self {
        Self {
            global_path,
            workspace_path,
        }
    }

    /// Build a store on the platform default paths, with the workspace
    /// file derived from `workspace_root` when one is open.
    pub fn from_default_paths(workspace_root: Option<&Path>) -> Result<Self, SettingsError> {
        let global_path = paths::default_global_settings_path()?;
        let workspace_path = workspace_root.map(paths::workspace_settings_path);
        Ok(Self::new(global_path, workspace_path))
    }

    pub fn global_path(&self) -> &Path {
        &self.global_path
    }

    pub fn workspace_path(&self) -> Option<&Path> {
        self.workspace_path.as_deref()
    }

    fn path_for(&self, scope: SettingsScope) -> Result<&Path, SettingsError> {
        match scope {
            SettingsScope::Global => Ok(&self.global_path),
            SettingsScope::Workspace => self
                .workspace_path
                .as_deref()
                .ok_or(SettingsError::NoWorkspace),
        }
    }

    /// Read the whole document at one scope. A missing file is an empty
    /// document; malformed JSON is a parse error the caller surfaces.
    async fn read_document(&self, scope: SettingsScope) -> Result<Map<String, Value>, SettingsError> {
        let path = self.path_for(scope)?;
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(SettingsError::Read(format!(
                    "failed to read {}: {e}",
                    path.display()
                )))
            }
        };

        let value: Value = serde_json::from_str(&raw).map_err(|e| {
            SettingsError::Parse(format!("invalid JSON in {}: {e}", path.display()))
        })?;

        match value {
            Value::Object(map) => Ok(map),
            other => Err(SettingsError::Parse(format!(
                "expected a JSON object in {}, found {}",
                path.display(),
                json_kind(&other)
            ))),
        }
    }

    async fn write_document(
        &self,
        scope: SettingsScope,
        doc: Map<String, Value>,
    ) -> Result<(), SettingsError> {
        let path = self.path_for(scope)?;
        let text = serde_json::to_string_pretty(&Value::Object(doc))
            .map_err(|e| SettingsError::Write(format!("failed to serialize settings: {e}")))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                SettingsError::Write(format!(
                    "failed to create settings directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        // Atomic write: write to .tmp, then rename.
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &text).await.map_err(|e| {
            SettingsError::Write(format!("failed to write {}: {e}", tmp_path.display()))
        })?;

        if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
            warn!("atomic rename failed ({e}), falling back to direct write");
            tokio::fs::write(path, &text).await.map_err(|e2| {
                SettingsError::Write(format!("failed to write {}: {e2}", path.display()))
            })?;
        }

        debug!(scope = %scope, path = %path.display(), "settings saved");
        Ok(())
    }

    /// Replace one namespace key in the document, dropping the key when
    /// the replacement is empty so cleared files stay clean.
    async fn write_namespace(
        &self,
        scope: SettingsScope,
        key: &str,
        value: Value,
    ) -> Result<(), SettingsError> {
        let mut doc = self.read_document(scope).await?;
        let empty = match &value {
            Value::Object(o) => o.is_empty(),
            _ => false,
        };
        if empty {
            doc.remove(key);
        } else {
            doc.insert(key.to_string(), value);
        }
        self.write_document(scope, doc).await
    }
}

#[async_trait]
impl SettingsStore for JsonSettingsStore {
    fn has_workspace(&self) -> bool {
        self.workspace_path.is_some()
    }

    async fn read_colors(&self, scope: SettingsScope) -> Result<ColorMap, SettingsError> {
        // An absent workspace reads as empty; only writes demand one.
        if scope == SettingsScope::Workspace && self.workspace_path.is_none() {
            return Ok(ColorMap::new());
        }
        let doc = self.read_document(scope).await?;
        Ok(color_map_from(doc.get(COLORS_KEY)))
    }

    async fn write_colors(
        &self,
        scope: SettingsScope,
        colors: &ColorMap,
    ) -> Result<(), SettingsError> {
        let entries: Map<String, Value> = colors
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        self.write_namespace(scope, COLORS_KEY, Value::Object(entries))
            .await
    }

    async fn read_token_colors(&self, scope: SettingsScope) -> Result<TokenMap, SettingsError> {
        if scope == SettingsScope::Workspace && self.workspace_path.is_none() {
            return Ok(TokenMap::new());
        }
        let doc = self.read_document(scope).await?;
        Ok(token_map_from(doc.get(TOKEN_COLORS_KEY)))
    }

    async fn write_token_colors(
        &self,
        scope: SettingsScope,
        tokens: &TokenMap,
    ) -> Result<(), SettingsError> {
        let entries: Map<String, Value> = tokens
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        self.write_namespace(scope, TOKEN_COLORS_KEY, Value::Object(entries))
            .await
    }
}

/// Extract the color namespace from its document value. Entries that are
/// not strings were written by someone else; they are ignored on read, not
/// destroyed, since writes replace the whole namespace the applier already
/// re-read.
fn color_map_from(value: Option<&Value>) -> ColorMap {
    let mut map = ColorMap::new();
    if let Some(Value::Object(entries)) = value {
        for (key, v) in entries {
            match v.as_str() {
                Some(s) => {
                    map.insert(key.clone(), s.to_string());
                }
                None => warn!(key = %key, "ignoring non-string color value in settings"),
            }
        }
    }
    map
}

fn token_map_from(value: Option<&Value>) -> TokenMap {
    let mut map = TokenMap::new();
    if let Some(Value::Object(entries)) = value {
        for (key, v) in entries {
            map.insert(key.clone(), v.clone());
        }
    }
    map
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
