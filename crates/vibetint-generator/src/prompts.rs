//! Prompt construction for theme generation.

/// System prompt for the line-oriented streaming protocol.
pub fn streaming_system_prompt() -> &'static str {
    "You are a color theme designer for a code editor. Translate the user's \
     vibe into concrete theme customizations.\n\
     \n\
     Output ONLY lines in these two formats, one setting per line:\n\
     SELECTOR:<ui.element.path>=<color>\n\
     TOKEN:<syntax scope>=<color>[,<fontStyle>]\n\
     \n\
     Colors are hex (#rgb, #rrggbb, or #rrggbbaa) or one of: transparent, \
     inherit, initial, unset. fontStyle is optional, e.g. italic or bold. \
     To delete a customization, use REMOVE as the color.\n\
     \n\
     Examples:\n\
     SELECTOR:editor.background=#1a1a2e\n\
     SELECTOR:statusBar.background=REMOVE\n\
     TOKEN:comment=#6a9955,italic\n\
     TOKEN:keyword.control=#c586c0\n\
     \n\
     If the request includes current theme customizations, emit only the \
     changes needed. Otherwise design a full theme: cover the editor \
     background and foreground, sidebar, status bar, activity bar, tabs, and \
     the common syntax scopes (comments, keywords, strings, functions, \
     types, variables).\n\
     \n\
     No prose, no markdown, no code fences."
}

/// System prompt for single-payload (non-streaming) generation.
pub fn payload_system_prompt() -> &'static str {
    "You are a color theme designer for a code editor. Translate the user's \
     vibe into concrete theme customizations.\n\
     \n\
     Respond with a single JSON object and nothing else:\n\
     {\n\
     \x20 \"selectors\": { \"<ui.element.path>\": \"<color>\", ... },\n\
     \x20 \"tokenColors\": [ { \"scope\": \"<syntax scope>\", \"settings\": \
     { \"foreground\": \"<color>\", \"fontStyle\": \"italic\" } }, ... ],\n\
     \x20 \"description\": \"<one sentence about the theme>\"\n\
     }\n\
     \n\
     Colors are hex (#rgb, #rrggbb, or #rrggbbaa) or one of: transparent, \
     inherit, initial, unset. Cover the editor background and foreground, \
     sidebar, status bar, activity bar, tabs, and the common syntax scopes.\n\
     \n\
     No markdown, no code fences, no text outside the JSON object."
}

/// User message: the current-theme context block (if any) followed by the
/// request itself.
pub fn user_message(context_block: &str, vibe: &str) -> String {
    if context_block.is_empty() {
        vibe.to_string()
    } else {
        format!("{context_block}\n{vibe}")
    }
}
