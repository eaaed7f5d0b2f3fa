//! The generate command: vibe in, applied theme out.

use tokio::sync::mpsc;
use tracing::warn;

use vibetint_generator::prompts::{payload_system_prompt, streaming_system_prompt, user_message};
use vibetint_generator::{client_for, ChunkHandler, GenerationSession, Message, Provider};
use vibetint_settings::{JsonSettingsStore, MemoryStore, SettingsStore};
use vibetint_theme::{
    format_current_theme_context, CurrentThemeState, LineOutcome, StreamProcessor, StreamSummary,
    ThemeApplier, ThemeCustomizations, ThemeReader,
};

use super::CliError;

pub struct GenerateOpts {
    pub vibe: String,
    pub provider: Provider,
    pub model: Option<String>,
    pub no_stream: bool,
    pub dry_run: bool,
    pub quiet: bool,
}

pub async fn run(store: &JsonSettingsStore, opts: GenerateOpts) -> Result<(), CliError> {
    let has_workspace = store.has_workspace();

    // A dry run drives the whole pipeline against an in-memory copy of the
    // real settings; only the files on disk are spared.
    let memory;
    let target: &dyn SettingsStore = if opts.dry_run {
        memory = MemoryStore::seeded_from(store, has_workspace).await?;
        &memory
    } else {
        store
    };

    // Current customizations go into the prompt so the model edits what is
    // there instead of starting over. If they can't be read, generate from
    // scratch rather than refusing.
    let state = match ThemeReader::new(target).current_state().await {
        Ok(state) => state,
        Err(e) => {
            warn!(error = %e, "could not read current theme; generating from scratch");
            CurrentThemeState::empty()
        }
    };
    let context = format_current_theme_context(&state);

    let client = client_for(opts.provider, opts.model.as_deref())?;
    let mut session = GenerationSession::new(client);

    if !opts.quiet {
        println!("generating theme for \"{}\" via {}", opts.vibe, opts.provider);
    }

    if opts.no_stream {
        run_payload(target, &mut session, &context, &opts).await?;
    } else {
        run_streaming(target, has_workspace, &mut session, &context, &opts).await?;
    }

    let usage = session.usage();
    if !opts.quiet && usage.total_tokens() > 0 {
        println!(
            "tokens: {} in, {} out",
            usage.input_tokens, usage.output_tokens
        );
    }
    if opts.dry_run {
        println!("dry run: nothing was written");
    }
    Ok(())
}

/// Streaming path: apply each setting the moment its line completes.
async fn run_streaming(
    target: &dyn SettingsStore,
    has_workspace: bool,
    session: &mut GenerationSession,
    context: &str,
    opts: &GenerateOpts,
) -> Result<(), CliError> {
    let messages = [
        Message::system(streaming_system_prompt()),
        Message::user(user_message(context, &opts.vibe)),
    ];

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let on_chunk: ChunkHandler = Box::new(move |chunk| {
        let _ = tx.send(chunk);
    });

    let mut processor = StreamProcessor::new(target, has_workspace);
    let mut result = None;

    {
        let generation = session.generate_streaming(&messages, on_chunk);
        tokio::pin!(generation);

        // The channel closes when the generation future completes and drops
        // its sender, so this loop drains every chunk before breaking.
        loop {
            tokio::select! {
                res = &mut generation, if result.is_none() => {
                    result = Some(res);
                }
                maybe_chunk = rx.recv() => match maybe_chunk {
                    Some(chunk) => {
                        for outcome in processor.push_chunk(&chunk).await {
                            report_outcome(&outcome, opts.quiet);
                        }
                    }
                    None => break,
                }
            }
        }
    }

    let summary = processor.finish().await;
    print_summary(&summary, opts.quiet);

    // Settings applied before a mid-stream failure stay applied.
    match result {
        Some(Ok(_)) => {}
        Some(Err(e)) => return Err(e.into()),
        None => return Err(CliError::Other("generation ended without a result".into())),
    }
    if let Some(first) = summary.failed.first() {
        return Err(first.error.clone().into());
    }
    Ok(())
}

/// Non-streaming path: one JSON payload, validated and applied wholesale.
async fn run_payload(
    target: &dyn SettingsStore,
    session: &mut GenerationSession,
    context: &str,
    opts: &GenerateOpts,
) -> Result<(), CliError> {
    let messages = [
        Message::system(payload_system_prompt()),
        Message::user(user_message(context, &opts.vibe)),
    ];

    let response = session.generate(&messages).await?;
    let payload = match parse_payload(&response.content) {
        Ok(payload) if payload.is_empty() => {
            session.mark_error();
            return Err(CliError::Other(
                "generator returned an empty theme payload".into(),
            ));
        }
        Ok(payload) => payload,
        Err(e) => {
            session.mark_error();
            return Err(e);
        }
    };

    let scope = ThemeApplier::new(target)
        .apply_customizations(&payload, opts.quiet)
        .await?;

    if !opts.quiet && !payload.description.is_empty() {
        println!("{}", payload.description);
    }
    println!(
        "applied {} colors and {} token rules ({scope} scope)",
        payload.selectors.len(),
        payload.token_colors.len()
    );
    Ok(())
}

fn report_outcome(outcome: &LineOutcome, quiet: bool) {
    if quiet {
        return;
    }
    match outcome {
        LineOutcome::Applied(applied) if applied.setting.is_removal() => {
            println!("  removed {} ({})", applied.setting.key(), applied.scope);
        }
        LineOutcome::Applied(applied) => {
            println!("  applied {} ({})", applied.setting, applied.scope);
        }
        LineOutcome::Failed(failed) => {
            println!("  failed  {}: {}", failed.setting, failed.error);
        }
        // Non-protocol chatter; counted in the summary only.
        LineOutcome::Skipped(_) => {}
    }
}

fn print_summary(summary: &StreamSummary, quiet: bool) {
    let mut line = format!("applied {} settings", summary.applied.len());
    if let Some(scope) = summary.applied_scope() {
        line.push_str(&format!(" ({scope} scope)"));
    }
    if !summary.skipped.is_empty() {
        line.push_str(&format!(", skipped {} lines", summary.skipped.len()));
    }
    if !summary.failed.is_empty() {
        line.push_str(&format!(", {} failed", summary.failed.len()));
    }
    if !quiet || !summary.fully_succeeded() {
        println!("{line}");
    }
}

/// Models sometimes fence the JSON despite instructions; accept both.
fn parse_payload(content: &str) -> Result<ThemeCustomizations, CliError> {
    let body = strip_code_fence(content.trim());
    serde_json::from_str(body).map_err(|e| {
        CliError::Other(format!("generator returned an invalid theme payload: {e}"))
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.split_once('\n').map_or(rest, |(_, body)| body);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_parses_bare_json() {
        let payload = parse_payload(r#"{"selectors":{"editor.background":"#111111"}}"#).unwrap();
        assert_eq!(
            payload.selectors.get("editor.background").map(String::as_str),
            Some("#111111")
        );
    }

    #[test]
    fn payload_parses_fenced_json() {
        let fenced = "```json\n{\"selectors\":{\"editor.background\":\"#111111\"}}\n```";
        let payload = parse_payload(fenced).unwrap();
        assert_eq!(payload.selectors.len(), 1);
    }

    #[test]
    fn payload_rejects_prose() {
        assert!(parse_payload("here is your theme!").is_err());
    }

    #[test]
    fn fence_stripping_leaves_plain_text_alone() {
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }
}
