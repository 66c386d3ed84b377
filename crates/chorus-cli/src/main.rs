//! `chorus` -- CLI binary for the chorus skill engine.
//!
//! Provides the following subcommands:
//!
//! - `chorus chat` -- Talk to the skill engine, one utterance per line.
//! - `chorus skills` -- List skills and toggle their enablement.
//! - `chorus sentences` -- Compile a sentence directory to JSON.
//! - `chorus config` -- Show the resolved configuration.

use clap::{Parser, Subcommand};

mod commands;

/// chorus skill engine CLI.
#[derive(Parser)]
#[command(name = "chorus", about = "chorus skill engine CLI", version)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Talk to the skill engine interactively or send a single utterance.
    Chat(commands::chat::ChatArgs),

    /// List, enable and disable skills.
    Skills(commands::skills_cmd::SkillsArgs),

    /// Work with sentence files.
    Sentences {
        #[command(subcommand)]
        action: SentencesCmd,
    },

    /// Show resolved configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCmd,
    },
}

/// Subcommands for `chorus sentences`.
#[derive(Subcommand)]
enum SentencesCmd {
    /// Compile a `<dir>/<locale>/*.sentences` tree.
    Compile {
        /// Root directory containing one subdirectory per locale.
        dir: String,

        /// Write the compiled table to this file instead of stdout.
        #[arg(short, long)]
        out: Option<String>,
    },
}

/// Subcommands for `chorus config`.
#[derive(Subcommand)]
enum ConfigCmd {
    /// Show the full resolved configuration.
    Show {
        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    match cli.command {
        Commands::Chat(args) => commands::chat::run(args).await?,
        Commands::Skills(args) => commands::skills_cmd::run(args).await?,
        Commands::Sentences { action } => match action {
            SentencesCmd::Compile { dir, out } => {
                commands::sentences_cmd::compile(&dir, out.as_deref()).await?;
            }
        },
        Commands::Config { action } => match action {
            ConfigCmd::Show { config } => {
                let platform = chorus_platform::NativePlatform::new();
                let cfg = commands::load_config(&platform, config.as_deref()).await?;
                commands::config_cmd::config_show(&cfg);
            }
        },
    }

    Ok(())
}
