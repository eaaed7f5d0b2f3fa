//! Settings store for vibetint.
//!
//! The store is the host boundary the theme core writes through: two
//! namespaces (UI colors, syntax token customizations), each readable and
//! writable at two storage scopes (global/user-level and workspace-local).
//! The store is shared with other writers (the user editing the files by
//! hand, other tools), so every write is read-modify-write on a fresh
//! snapshot and nothing here assumes exclusive ownership.

pub mod json_store;
pub mod memory;
pub mod paths;

pub use json_store::JsonSettingsStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use vibetint_common::{ColorMap, SettingsError, SettingsScope, TokenMap};

/// The four primitive operations the theme core needs from the host
/// configuration store: read/write of each namespace at a given scope.
///
/// Each call is a suspension point; callers sequence them explicitly and
/// never run two mutations of the same store concurrently.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Whether the workspace scope is backed by a real location. Appliers
    /// plan their write targets off this.
    fn has_workspace(&self) -> bool;

    /// Read the UI color namespace at one scope. A scope with nothing
    /// stored reads as an empty map, not an error.
    async fn read_colors(&self, scope: SettingsScope) -> Result<ColorMap, SettingsError>;

    /// Replace the UI color namespace at one scope.
    async fn write_colors(
        &self,
        scope: SettingsScope,
        colors: &ColorMap,
    ) -> Result<(), SettingsError>;

    /// Read the syntax token namespace at one scope.
    async fn read_token_colors(&self, scope: SettingsScope) -> Result<TokenMap, SettingsError>;

    /// Replace the syntax token namespace at one scope.
    async fn write_token_colors(
        &self,
        scope: SettingsScope,
        tokens: &TokenMap,
    ) -> Result<(), SettingsError>;
}
