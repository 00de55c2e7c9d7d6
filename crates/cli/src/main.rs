//! Stake CLI - stake command

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod locks;
mod logging;
mod util;

/// Stake - track a development session and checkpoint it into git
#[derive(Parser)]
#[command(name = "stake")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start tracking the current repository
    Init {
        /// What you are building
        #[arg(long)]
        intent: Option<String>,
    },
    /// Watch the working tree and record changes until Ctrl-C
    Watch,
    /// Commit all pending changes as a named stake
    Stake {
        /// Stake name (becomes the commit title)
        name: String,
        /// Message placed above the generated summary
        message: String,
    },
    /// Show intent, pending changes and the last stake
    Status,
    /// Record every uncommitted file that is not pending yet
    Scan,
    /// Show summaries of past stakes
    History {
        /// Number of records to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Show or set the session intent
    Intent {
        /// New intent (omit to print the current one)
        text: Option<String>,
        /// Clear the intent
        #[arg(long, conflicts_with = "text")]
        clear: bool,
    },
    /// Drop all pending changes without committing
    Reset {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// View and edit project configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all configuration values
    List,
    /// Print one value (e.g. cache.vcs_status_ttl_secs)
    Get { key: String },
    /// Set one value
    Set { key: String, value: String },
    /// Show the config file path
    Path {
        /// Write the defaults if the file does not exist
        #[arg(long)]
        create: bool,
    },
    /// Print an annotated example configuration
    Example,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Watch installs its own subscriber with a file layer
    if !matches!(cli.command, Commands::Watch) {
        logging::init(cli.verbose);
    }

    match cli.command {
        Commands::Init { intent } => cmd::init::run(intent).await,
        Commands::Watch => cmd::watch::run(cli.verbose).await,
        Commands::Stake { name, message } => cmd::stake::run(&name, &message).await,
        Commands::Status => cmd::status::run().await,
        Commands::Scan => cmd::scan::run().await,
        Commands::History { limit } => cmd::history::run(limit).await,
        Commands::Intent { text, clear } => cmd::intent::run(text, clear).await,
        Commands::Reset { yes } => cmd::reset::run(yes).await,
        Commands::Config(command) => match command {
            ConfigCommands::List => cmd::config::run_list().await,
            ConfigCommands::Get { key } => cmd::config::run_get(&key).await,
            ConfigCommands::Set { key, value } => cmd::config::run_set(&key, &value).await,
            ConfigCommands::Path { create } => cmd::config::run_path(create).await,
            ConfigCommands::Example => cmd::config::run_example().await,
        },
    }
}
