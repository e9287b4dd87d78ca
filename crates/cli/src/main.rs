//! Planweave CLI — the main entry point.
//!
//! Commands:
//! - `chat`   — Interactive conversation or single-message mode
//! - `config` — Print the default configuration TOML

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "planweave",
    about = "Planweave — conversational learning-plan research agent",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the planning agent
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Print the learning plan JSON after the conversation ends
        #[arg(long)]
        show_plan: bool,
    },

    /// Print the default configuration TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Chat { message, show_plan } => commands::chat::run(message, show_plan).await?,
        Commands::Config => print!("{}", planweave_config::Settings::default_toml()),
    }

    Ok(())
}
