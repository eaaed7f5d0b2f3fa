//! Show the current theme customizations.

use vibetint_common::TOKEN_RULES_KEY;
use vibetint_settings::JsonSettingsStore;
use vibetint_theme::{ThemeReader, TokenRule};

use super::CliError;

pub async fn run(store: &JsonSettingsStore) -> Result<(), CliError> {
    let state = ThemeReader::new(store).current_state().await?;

    if !state.has_customizations {
        println!("no theme customizations set");
        return Ok(());
    }

    println!("scope: {}", state.scope);

    if !state.color_customizations.is_empty() {
        println!("colors:");
        for (key, value) in &state.color_customizations {
            println!("  {key} = {value}");
        }
    }

    if !state.token_customizations.is_empty() {
        println!("tokens:");
        for (key, value) in &state.token_customizations {
            if key == TOKEN_RULES_KEY {
                let Some(rules) = value.as_array() else {
                    println!("  {key} = {value}");
                    continue;
                };
                for raw in rules {
                    match serde_json::from_value::<TokenRule>(raw.clone()) {
                        Ok(rule) => println!("  {}", render_rule(&rule)),
                        Err(_) => println!("  {raw}"),
                    }
                }
            } else {
                println!("  {key} = {value}");
            }
        }
    }
    Ok(())
}

fn render_rule(rule: &TokenRule) -> String {
    let foreground = rule.settings.foreground.as_deref().unwrap_or("default");
    match rule.settings.font_style.as_deref() {
        Some(style) => format!("{} = {foreground} ({style})", rule.scope),
        None => format!("{} = {foreground}", rule.scope),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vibetint_theme::{TokenScope, TokenSettings};

    #[test]
    fn rule_rendering_includes_font_style() {
        let rule = TokenRule {
            scope: TokenScope::One("comment".into()),
            settings: TokenSettings {
                foreground: Some("#6a9955".into()),
                background: None,
                font_style: Some("italic".into()),
            },
        };
        assert_eq!(render_rule(&rule), "comment = #6a9955 (italic)");
    }

    #[test]
    fn rule_rendering_defaults_missing_foreground() {
        let rule = TokenRule {
            scope: TokenScope::Many(vec!["keyword".into(), "storage".into()]),
            settings: TokenSettings {
                foreground: None,
                background: None,
                font_style: None,
            },
        };
        assert_eq!(render_rule(&rule), "keyword, storage = default");
    }
}
