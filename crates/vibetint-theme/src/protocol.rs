//! The streaming theme protocol: one instruction per line.
//!
//! ```text
//! SELECTOR:<dot.path.key>=<hex|keyword|REMOVE>
//! TOKEN:<textmate.scope>=<hex|keyword|REMOVE>[,<fontStyle>]
//! ```
//!
//! The parser is stateless and called once per line; duplicate or
//! out-of-order lines are the applier's business. [`LineAssembler`] sits in
//! front of it and turns arbitrarily-split stream chunks into whole lines.

use std::fmt;

use crate::values;

const SELECTOR_PREFIX: &str = "SELECTOR:";
const TOKEN_PREFIX: &str = "TOKEN:";

/// One decoded protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamingSetting {
    /// A UI color slot keyed by dot-path selector.
    Selector { name: String, color: String },
    /// A syntax token rule keyed by TextMate scope.
    Token {
        scope: String,
        color: String,
        font_style: Option<String>,
    },
}

impl StreamingSetting {
    /// The key this setting targets, for logs and progress output.
    pub fn key(&self) -> &str {
        match self {
            StreamingSetting::Selector { name, .. } => name,
            StreamingSetting::Token { scope, .. } => scope,
        }
    }

    /// Whether this setting deletes its key rather than assigning it.
    pub fn is_removal(&self) -> bool {
        match self {
            StreamingSetting::Selector { color, .. }
            | StreamingSetting::Token { color, .. } => values::is_remove_sentinel(color),
        }
    }
}

impl fmt::Display for StreamingSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamingSetting::Selector { name, color } => write!(f, "{name} = {color}"),
            StreamingSetting::Token {
                scope,
                color,
                font_style: Some(style),
            } => write!(f, "{scope} = {color} ({style})"),
            StreamingSetting::Token {
                scope,
                color,
                font_style: None,
            } => write!(f, "{scope} = {color}"),
        }
    }
}

/// Why a line failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorReason {
    #[error("Empty line")]
    EmptyLine,
    #[error("Invalid selector format - expected name=color")]
    InvalidSelectorFormat,
    #[error("Invalid token format - expected scope=color[,fontStyle]")]
    InvalidTokenFormat,
    #[error("Line must start with SELECTOR: or TOKEN:")]
    UnknownPrefix,
    #[error("Invalid color format")]
    InvalidColor,
}

/// A failed parse. The raw offending line is always retained so stream
/// diagnostics can show exactly what the generator said.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}: {line:?}")]
pub struct LineParseError {
    pub reason: ParseErrorReason,
    pub line: String,
}

impl LineParseError {
    fn new(reason: ParseErrorReason, line: &str) -> Self {
        Self {
            reason,
            line: line.to_string(),
        }
    }
}

/// Parse one protocol line. Deterministic, no side effects.
pub fn parse_line(raw: &str) -> Result<StreamingSetting, LineParseError> {
    let line = raw.trim();
    if line.is_empty() {
        return Err(LineParseError::new(ParseErrorReason::EmptyLine, raw));
    }

    if let Some(rest) = line.strip_prefix(SELECTOR_PREFIX) {
        let Some((name, color)) = split_assignment(rest) else {
            return Err(LineParseError::new(
                ParseErrorReason::InvalidSelectorFormat,
                raw,
            ));
        };
        if !is_acceptable_color(&color) {
            return Err(LineParseError::new(ParseErrorReason::InvalidColor, raw));
        }
        return Ok(StreamingSetting::Selector { name, color });
    }

    if let Some(rest) = line.strip_prefix(TOKEN_PREFIX) {
        let Some((scope, color_and_style)) = split_assignment(rest) else {
            return Err(LineParseError::new(
                ParseErrorReason::InvalidTokenFormat,
                raw,
            ));
        };
        let (color, font_style) = match color_and_style.split_once(',') {
            Some((color, style)) => {
                let style = style.trim();
                (
                    color.trim().to_string(),
                    (!style.is_empty()).then(|| style.to_string()),
                )
            }
            None => (color_and_style, None),
        };
        if color.is_empty() {
            return Err(LineParseError::new(
                ParseErrorReason::InvalidTokenFormat,
                raw,
            ));
        }
        if !is_acceptable_color(&color) {
            return Err(LineParseError::new(ParseErrorReason::InvalidColor, raw));
        }
        return Ok(StreamingSetting::Token {
            scope,
            color,
            font_style,
        });
    }

    Err(LineParseError::new(ParseErrorReason::UnknownPrefix, raw))
}

/// Split `name=value` on the first `=`, trimming both halves. None when
/// the `=` is missing or either half is empty.
fn split_assignment(input: &str) -> Option<(String, String)> {
    let (left, right) = input.split_once('=')?;
    let left = left.trim();
    let right = right.trim();
    if left.is_empty() || right.is_empty() {
        return None;
    }
    Some((left.to_string(), right.to_string()))
}

fn is_acceptable_color(color: &str) -> bool {
    values::is_valid_color_token(color) || values::is_remove_sentinel(color)
}

/// Reassembles whole lines from arbitrarily-split stream chunks.
///
/// The generator's transport delivers text in chunks that land anywhere,
/// including mid-line; this buffers the partial tail so [`parse_line`]
/// only ever sees complete lines.
#[derive(Debug, Default)]
pub struct LineAssembler {
    buffer: String,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns the complete lines it closed, in order.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let mut line: String = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
            lines.push(line);
        }
        lines
    }

    /// Flush the trailing unterminated line, if any, once the stream ends.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let mut line = std::mem::take(&mut self.buffer);
        if line.ends_with('\r') {
            line.pop();
        }
        Some(line)
    }
}
