//! Apply a theme payload from a JSON file.

use vibetint_settings::JsonSettingsStore;
use vibetint_theme::{ThemeApplier, ThemeCustomizations};

use super::CliError;

pub async fn run(store: &JsonSettingsStore, file: &str) -> Result<(), CliError> {
    let text = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| CliError::Other(format!("could not read {file}: {e}")))?;
    let payload: ThemeCustomizations = serde_json::from_str(&text)
        .map_err(|e| CliError::Other(format!("{file} is not a valid theme payload: {e}")))?;

    let scope = ThemeApplier::new(store)
        .apply_customizations(&payload, false)
        .await?;

    println!(
        "applied {} colors and {} token rules ({scope} scope)",
        payload.selectors.len(),
        payload.token_colors.len()
    );
    Ok(())
}
