//! Color value validation for the theme protocol.
//!
//! Accepts `#RGB`, `#RRGGBB`, and `#RRGGBBAA` hex forms plus the CSS-wide
//! keywords `transparent`, `inherit`, `initial`, `unset`. Everything else
//! (named colors, `rgb()` functions) is rejected; the generator is
//! instructed to emit hex.

use regex::Regex;
use std::sync::LazyLock;

/// Regex for hex color: #RGB, #RRGGBB, or #RRGGBBAA (trailing alpha).
static HEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").unwrap());

/// Keywords accepted anywhere a color is accepted.
const COLOR_KEYWORDS: [&str; 4] = ["transparent", "inherit", "initial", "unset"];

/// Reserved value meaning "delete this key"; matched case-insensitively.
pub const REMOVE_SENTINEL: &str = "REMOVE";

/// Whether `value` is a legal color value. The REMOVE sentinel is *not* a
/// color; callers that accept it check [`is_remove_sentinel`] separately,
/// because "is this a legal color" and "does this mean delete the key" have
/// different consumers.
pub fn is_valid_color_token(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }
    if value.starts_with('#') {
        return HEX_RE.is_match(value);
    }
    COLOR_KEYWORDS
        .iter()
        .any(|keyword| value.eq_ignore_ascii_case(keyword))
}

/// Whether `value` is the deletion sentinel.
pub fn is_remove_sentinel(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case(REMOVE_SENTINEL)
}
