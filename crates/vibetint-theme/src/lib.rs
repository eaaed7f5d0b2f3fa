//! The streaming theme core: protocol parsing, validation, state reading,
//! context formatting, and application.
//!
//! The pipeline, leaf-first: [`values`] validates color tokens;
//! [`protocol`] decodes one `SELECTOR:`/`TOKEN:` line at a time; [`state`]
//! merges the store's two scopes into the effective current theme;
//! [`context`] renders that state as a bounded prompt prefix; [`apply`]
//! merges decoded settings (or a complete payload) back into the store
//! with scope fallback; [`stream`] drives the whole thing over a live
//! generation stream.

pub mod apply;
pub mod context;
pub mod protocol;
pub mod state;
pub mod stream;
pub mod types;
pub mod values;

pub use apply::ThemeApplier;
pub use context::{format_current_theme_context, MAX_CONTEXT_COLORS, MAX_CONTEXT_TOKEN_RULES};
pub use protocol::{parse_line, LineAssembler, LineParseError, ParseErrorReason, StreamingSetting};
pub use state::ThemeReader;
pub use stream::{AppliedSetting, FailedSetting, LineOutcome, StreamProcessor, StreamSummary};
pub use types::{
    ApplyError, ApplyResult, ConfigScope, CurrentThemeState, ThemeCustomizations, TokenRule,
    TokenScope, TokenSettings,
};
pub use values::{is_remove_sentinel, is_valid_color_token, REMOVE_SENTINEL};
