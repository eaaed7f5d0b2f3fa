//! Remove theme customizations.

use vibetint_common::SettingsScope;
use vibetint_settings::{JsonSettingsStore, SettingsStore};
use vibetint_theme::ThemeApplier;

use crate::cli::ClearTarget;

use super::CliError;

pub async fn run(store: &JsonSettingsStore, target: ClearTarget) -> Result<(), CliError> {
    let scopes: Vec<SettingsScope> = match target {
        ClearTarget::Global => vec![SettingsScope::Global],
        ClearTarget::Workspace => vec![SettingsScope::Workspace],
        ClearTarget::All => {
            let mut scopes = vec![SettingsScope::Global];
            if store.has_workspace() {
                scopes.push(SettingsScope::Workspace);
            }
            scopes
        }
    };

    let applier = ThemeApplier::new(store);
    for scope in &scopes {
        applier.clear_scope(*scope).await?;
    }

    let names: Vec<String> = scopes.iter().map(|s| s.to_string()).collect();
    println!("cleared theme customizations ({})", names.join(", "));
    Ok(())
}
