//! convoctx CLI, the offline orchestrator.
//!
//! Commands:
//! - `init`      Print (or write) the default config
//! - `entities`  Tracked entities of a conversation
//! - `rank`      Importance score of every message
//! - `select`    Verbatim / summarized split under a token budget
//! - `cite`      Citation segments of an LLM response
//!
//! Results go to stdout as pretty JSON; logs go to stderr.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use convoctx_config::ConvoConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "convoctx",
    about = "convoctx: conversation context selection and citation parsing",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.convoctx/config.toml
    #[arg(short, long, global = true, env = "CONVOCTX_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the default configuration
    Init {
        /// Write it to ~/.convoctx/config.toml if no config exists yet
        #[arg(long)]
        write: bool,
    },

    /// List the entities tracked across a conversation
    Entities {
        /// Conversation JSON (object or bare message array)
        file: PathBuf,
    },

    /// Score every message of a conversation
    Rank {
        file: PathBuf,

        /// Order by descending score instead of conversation order
        #[arg(long)]
        sorted: bool,
    },

    /// Choose which messages are sent verbatim
    Select {
        file: PathBuf,

        /// Total token budget
        #[arg(short, long)]
        budget: Option<usize>,

        /// Trailing messages always kept
        #[arg(short, long)]
        keep_recent: Option<usize>,

        /// Tokens reserved for the summary
        #[arg(short, long)]
        summary_budget: Option<usize>,
    },

    /// Split an LLM response into text and citation badges
    Cite {
        /// Raw response text
        file: PathBuf,

        /// JSON object mapping citation numbers to source lists
        #[arg(long)]
        sources: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = || {
        load_config(cli.config.as_deref())
            .map_err(|e| format!("Failed to load configuration: {e}"))
    };

    match &cli.command {
        Commands::Init { write } => commands::init::run(*write)?,
        Commands::Entities { file } => commands::entities::run(file)?,
        Commands::Rank { file, sorted } => commands::rank::run(&config()?, file, *sorted)?,
        Commands::Select {
            file,
            budget,
            keep_recent,
            summary_budget,
        } => {
            let overrides = commands::select::Overrides {
                budget: *budget,
                keep_recent: *keep_recent,
                summary_budget: *summary_budget,
            };
            commands::select::run(&config()?, file, overrides)?
        }
        Commands::Cite { file, sources } => {
            commands::cite::run(&config()?, file, sources.as_deref())?
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<ConvoConfig, convoctx_config::ConfigError> {
    match path {
        Some(path) => {
            let mut config = ConvoConfig::load_from(path)?;
            config.apply_env_overrides(|key| std::env::var(key).ok());
            config.validate()?;
            Ok(config)
        }
        None => ConvoConfig::load(),
    }
}
