//! Driving a generation stream through parse-and-apply, line by line.

use tracing::{debug, warn};

use vibetint_settings::SettingsStore;

use crate::apply::ThemeApplier;
use crate::protocol::{parse_line, LineAssembler, LineParseError, StreamingSetting};
use crate::types::{ApplyError, ConfigScope};

/// A setting that made it into the store, and where it landed.
#[derive(Debug, Clone)]
pub struct AppliedSetting {
    pub setting: StreamingSetting,
    pub scope: ConfigScope,
}

/// A setting that parsed but could not be stored anywhere.
#[derive(Debug, Clone)]
pub struct FailedSetting {
    pub setting: StreamingSetting,
    pub error: ApplyError,
}

/// What became of one stream line.
#[derive(Debug, Clone)]
pub enum LineOutcome {
    Applied(AppliedSetting),
    Skipped(LineParseError),
    Failed(FailedSetting),
}

/// End-of-stream accounting for the caller's summary output.
#[derive(Debug, Default)]
pub struct StreamSummary {
    pub applied: Vec<AppliedSetting>,
    pub skipped: Vec<LineParseError>,
    pub failed: Vec<FailedSetting>,
}

impl StreamSummary {
    /// True when every decoded setting was stored. Skipped lines don't
    /// count against success; they are protocol noise, not lost settings.
    pub fn fully_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// The single scope everything landed in, when uniform.
    pub fn applied_scope(&self) -> Option<ConfigScope> {
        let first = self.applied.first()?.scope;
        self.applied
            .iter()
            .all(|a| a.scope == first)
            .then_some(first)
    }
}

/// Applies a streamed generation in arrival order.
///
/// Each line is parsed and applied independently: a malformed line is
/// skipped and logged, a failed write is recorded, and the stream keeps
/// going either way. Settings already applied stay applied if the caller
/// abandons the stream; a partial theme is a valid visible state, not
/// something to roll back.
pub struct StreamProcessor<'a> {
    applier: ThemeApplier<'a>,
    assembler: LineAssembler,
    has_workspace: bool,
    applied: Vec<AppliedSetting>,
    skipped: Vec<LineParseError>,
    failed: Vec<FailedSetting>,
}

impl<'a> StreamProcessor<'a> {
    pub fn new(store: &'a dyn SettingsStore, has_workspace: bool) -> Self {
        Self {
            applier: ThemeApplier::new(store),
            assembler: LineAssembler::new(),
            has_workspace,
            applied: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Feed one chunk of generator output. Returns the outcome of every
    /// line the chunk completed, in order, for progress display.
    pub async fn push_chunk(&mut self, chunk: &str) -> Vec<LineOutcome> {
        let mut outcomes = Vec::new();
        for line in self.assembler.push(chunk) {
            if let Some(outcome) = self.process_line(&line).await {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    /// Flush a trailing unterminated line and close out the stream.
    pub async fn finish(mut self) -> StreamSummary {
        if let Some(line) = self.assembler.finish() {
            self.process_line(&line).await;
        }
        StreamSummary {
            applied: self.applied,
            skipped: self.skipped,
            failed: self.failed,
        }
    }

    async fn process_line(&mut self, line: &str) -> Option<LineOutcome> {
        // Blank lines are formatting, not protocol; not worth recording.
        if line.trim().is_empty() {
            return None;
        }
        match parse_line(line) {
            Ok(setting) => {
                match self
                    .applier
                    .apply_streaming(&setting, self.has_workspace)
                    .await
                {
                    Ok(scope) => {
                        debug!(%setting, %scope, "applied streamed setting");
                        let applied = AppliedSetting { setting, scope };
                        self.applied.push(applied.clone());
                        Some(LineOutcome::Applied(applied))
                    }
                    Err(error) => {
                        warn!(%setting, %error, "failed to apply streamed setting");
                        let failed = FailedSetting { setting, error };
                        self.failed.push(failed.clone());
                        Some(LineOutcome::Failed(failed))
                    }
                }
            }
            Err(parse_error) => {
                // Generators interleave prose with protocol lines; that is
                // expected noise at debug level, never a stream abort.
                debug!(
                    line = %parse_error.line,
                    reason = %parse_error.reason,
                    "skipping non-protocol line"
                );
                self.skipped.push(parse_error.clone());
                Some(LineOutcome::Skipped(parse_error))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vibetint_common::SettingsScope;
    use vibetint_settings::{MemoryStore, SettingsStore};

    #[tokio::test]
    async fn malformed_line_mid_stream_does_not_abort() {
        let store = MemoryStore::new(false);
        let mut processor = StreamProcessor::new(&store, false);

        processor
            .push_chunk("SELECTOR:a.b=#111111\nGARBAGE\nSELECTOR:c.d=#222222\n")
            .await;
        let summary = processor.finish().await;

        assert_eq!(summary.applied.len(), 2);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].line, "GARBAGE");
        assert!(summary.fully_succeeded());

        let colors = store.read_colors(SettingsScope::Global).await.unwrap();
        assert_eq!(colors["a.b"], "#111111");
        assert_eq!(colors["c.d"], "#222222");
    }

    #[tokio::test]
    async fn chunks_split_mid_line_reassemble() {
        let store = MemoryStore::new(false);
        let mut processor = StreamProcessor::new(&store, false);

        assert!(processor.push_chunk("SELECTOR:editor.ba").await.is_empty());
        let outcomes = processor
            .push_chunk("ckground=#1a1a2e\nTOKEN:comment=#6a9955,italic\n")
            .await;
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0], LineOutcome::Applied(_)));

        let summary = processor.finish().await;
        assert_eq!(summary.applied.len(), 2);
    }

    #[tokio::test]
    async fn trailing_unterminated_line_is_flushed_on_finish() {
        let store = MemoryStore::new(false);
        let mut processor = StreamProcessor::new(&store, false);

        processor.push_chunk("SELECTOR:a.b=#111111").await;
        let summary = processor.finish().await;

        assert_eq!(summary.applied.len(), 1);
        let colors = store.read_colors(SettingsScope::Global).await.unwrap();
        assert_eq!(colors["a.b"], "#111111");
    }

    #[tokio::test]
    async fn apply_failure_is_recorded_and_stream_continues() {
        let store = MemoryStore::new(false);
        let mut processor = StreamProcessor::new(&store, false);

        processor.push_chunk("SELECTOR:a.b=#111111\n").await;
        store.fail_writes(SettingsScope::Global, true);
        processor.push_chunk("SELECTOR:c.d=#222222\n").await;
        store.fail_writes(SettingsScope::Global, false);
        processor.push_chunk("SELECTOR:e.f=#333333\n").await;

        let summary = processor.finish().await;
        assert_eq!(summary.applied.len(), 2);
        assert_eq!(summary.failed.len(), 1);
        assert!(!summary.fully_succeeded());
        assert_eq!(summary.failed[0].setting.key(), "c.d");
        assert!(summary.failed[0].error.recoverable);
    }

    #[tokio::test]
    async fn blank_lines_and_prose_are_treated_differently() {
        let store = MemoryStore::new(false);
        let mut processor = StreamProcessor::new(&store, false);

        processor
            .push_chunk("Here is your theme:\n\nSELECTOR:a.b=#111111\n\n")
            .await;
        let summary = processor.finish().await;

        // Prose is recorded as skipped; blank lines are not recorded at all.
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.applied.len(), 1);
    }

    #[tokio::test]
    async fn abandoned_stream_keeps_applied_settings() {
        let store = MemoryStore::new(false);
        let mut processor = StreamProcessor::new(&store, false);
        processor.push_chunk("SELECTOR:a.b=#111111\n").await;
        drop(processor);

        let colors = store.read_colors(SettingsScope::Global).await.unwrap();
        assert_eq!(colors["a.b"], "#111111");
    }

    #[tokio::test]
    async fn summary_reports_uniform_scope() {
        let store = MemoryStore::new(false);
        let mut processor = StreamProcessor::new(&store, false);
        processor
            .push_chunk("SELECTOR:a.b=#111111\nSELECTOR:c.d=#222222\n")
            .await;
        let summary = processor.finish().await;
        assert_eq!(summary.applied_scope(), Some(ConfigScope::Global));
    }
}
