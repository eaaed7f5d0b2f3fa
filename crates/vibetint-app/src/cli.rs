use clap::{Parser, Subcommand, ValueEnum};

/// vibetint — describe a vibe, get editor theme customizations.
#[derive(Parser, Debug)]
#[command(name = "vibetint", version, about)]
pub struct Args {
    /// Workspace root override (default: walk up from the current directory
    /// looking for a .vibetint/ marker).
    #[arg(long, global = true)]
    pub workspace: Option<String>,

    /// Log level override: a level (debug, info, ...) or a full filter spec.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate theme customizations from a vibe description and apply them.
    Generate {
        /// The vibe, e.g. "cozy autumn evening".
        #[arg(required = true)]
        vibe: Vec<String>,

        /// Generator backend (anthropic or gemini).
        #[arg(long, default_value = "anthropic")]
        provider: String,

        /// Model override for the chosen provider.
        #[arg(long)]
        model: Option<String>,

        /// Wait for the complete response and apply it as one payload
        /// instead of applying settings as they stream in.
        #[arg(long)]
        no_stream: bool,

        /// Run against an in-memory copy of the settings; report what would
        /// change without writing anything.
        #[arg(long)]
        dry_run: bool,

        /// Suppress per-setting progress output.
        #[arg(short, long)]
        quiet: bool,
    },

    /// Apply a theme payload from a JSON file.
    Apply {
        /// Path to a JSON file with selectors, tokenColors, and description.
        file: String,
    },

    /// Show the current theme customizations.
    Show,

    /// Remove theme customizations.
    Clear {
        /// Which scope to clear.
        #[arg(long, value_enum, default_value = "all")]
        scope: ClearTarget,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClearTarget {
    Global,
    Workspace,
    All,
}

pub fn parse() -> Args {
    Args::parse()
}
