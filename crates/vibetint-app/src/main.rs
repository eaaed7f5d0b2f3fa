mod cli;
mod commands;

use tracing_subscriber::EnvFilter;

const LOG_CRATES: &[&str] = &[
    "vibetint_app",
    "vibetint_settings",
    "vibetint_theme",
    "vibetint_generator",
];

/// Load environment variables from a .env file (KEY=VALUE lines).
fn load_dotenv() {
    let manifest_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let candidates = [
        // Workspace root — two levels up from crates/vibetint-app/
        manifest_dir.join("..").join("..").join(".env"),
        // Current directory
        std::path::PathBuf::from(".env"),
    ];

    for path in &candidates {
        if let Ok(contents) = std::fs::read_to_string(path) {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    let key = key.trim();
                    let value = value.trim().trim_matches('"').trim_matches('\'');
                    if std::env::var(key).is_err() {
                        std::env::set_var(key, value);
                    }
                }
            }
            return;
        }
    }
}

fn crate_directives(level: &str) -> String {
    LOG_CRATES
        .iter()
        .map(|c| format!("{c}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Logs go to stderr so stdout stays clean for command output.
fn init_logging(cli_level: Option<&str>) {
    let filter = match cli_level {
        // A bare level (debug) covers all vibetint crates; anything with
        // '=' or ',' passes through as a full filter spec.
        Some(spec) if spec.contains('=') || spec.contains(',') => EnvFilter::new(spec),
        Some(level) => EnvFilter::new(crate_directives(level)),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(crate_directives("info"))),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    // Load .env before anything reads credentials
    load_dotenv();

    let args = cli::parse();
    init_logging(args.log_level.as_deref());

    if let Err(e) = run(args).await {
        eprintln!("error: {e}");
        if let Some(remedy) = e.remedy() {
            eprintln!("  {remedy}");
        }
        std::process::exit(1);
    }
}

async fn run(args: cli::Args) -> Result<(), commands::CliError> {
    let store = commands::open_store(args.workspace.as_deref())?;

    match args.command {
        cli::Command::Generate {
            vibe,
            provider,
            model,
            no_stream,
            dry_run,
            quiet,
        } => {
            let opts = commands::generate::GenerateOpts {
                vibe: vibe.join(" "),
                provider: provider.parse()?,
                model,
                no_stream,
                dry_run,
                quiet,
            };
            commands::generate::run(&store, opts).await
        }
        cli::Command::Apply { file } => commands::apply::run(&store, &file).await,
        cli::Command::Show => commands::show::run(&store).await,
        cli::Command::Clear { scope } => commands::clear::run(&store, scope).await,
    }
}
