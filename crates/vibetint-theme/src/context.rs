//! Context block injected ahead of a generation request.
//!
//! Gives the generator a bounded view of what is already customized so it
//! can decide between a full theme and an incremental delta. One-way:
//! nothing ever parses this block back.

use serde_json::Value;

use vibetint_common::{TokenMap, TOKEN_RULES_KEY};

use crate::types::CurrentThemeState;

/// How many color entries the context block shows before truncating.
///
/// Policy knob, not an architectural limit: it bounds prompt size while
/// leaving enough signal for the generator to recognize an existing theme.
/// Changing it changes generator behavior reproducibly.
pub const MAX_CONTEXT_COLORS: usize = 5;

/// How many token rules the context block shows before truncating.
pub const MAX_CONTEXT_TOKEN_RULES: usize = 3;

/// Render the current state as a prompt prefix.
///
/// Empty string when nothing is customized, which downstream means "no
/// context injection; generate a full theme". Otherwise a header, up to
/// [`MAX_CONTEXT_COLORS`] color lines, up to [`MAX_CONTEXT_TOKEN_RULES`]
/// token lines, and a trailing `User request:` marker that anchors the
/// vibe text. Byte-identical for equal states; size bounded regardless of
/// how much is stored.
pub fn format_current_theme_context(state: &CurrentThemeState) -> String {
    if !state.has_customizations {
        return String::new();
    }

    let mut out = String::from("Current theme customizations:\n");

    if !state.color_customizations.is_empty() {
        out.push_str("Colors:\n");
        for (key, value) in state.color_customizations.iter().take(MAX_CONTEXT_COLORS) {
            out.push_str(&format!("- {key}: {value}\n"));
        }
        let total = state.color_customizations.len();
        if total > MAX_CONTEXT_COLORS {
            out.push_str(&format!("... and {} more\n", total - MAX_CONTEXT_COLORS));
        }
    }

    let rule_lines = token_rule_lines(&state.token_customizations);
    if !rule_lines.is_empty() {
        out.push_str("\nTokens:\n");
        for line in rule_lines.iter().take(MAX_CONTEXT_TOKEN_RULES) {
            out.push_str(line);
            out.push('\n');
        }
        if rule_lines.len() > MAX_CONTEXT_TOKEN_RULES {
            out.push_str(&format!(
                "... and {} more\n",
                rule_lines.len() - MAX_CONTEXT_TOKEN_RULES
            ));
        }
    }

    out.push_str("\nUser request:");
    out
}

/// Render the rules under the token namespace's rule array. Other keys in
/// the namespace are opaque to us and never shown.
fn token_rule_lines(tokens: &TokenMap) -> Vec<String> {
    let Some(Value::Array(rules)) = tokens.get(TOKEN_RULES_KEY) else {
        return Vec::new();
    };
    rules.iter().filter_map(render_rule).collect()
}

fn render_rule(rule: &Value) -> Option<String> {
    let scope = match rule.get("scope")? {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        _ => return None,
    };
    let settings = rule.get("settings");
    let foreground = settings
        .and_then(|s| s.get("foreground"))
        .and_then(Value::as_str)
        .unwrap_or("default");
    let font_style = settings
        .and_then(|s| s.get("fontStyle"))
        .and_then(Value::as_str);
    Some(match font_style {
        Some(style) => format!("- {scope}: {foreground} ({style})"),
        None => format!("- {scope}: {foreground}"),
    })
}
