//! docsmith CLI — the main entry point.
//!
//! Commands:
//! - `chat` — Interactive documentation assistant (default)
//! - `init` — Initialize the config file and project context directory

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "docsmith",
    about = "docsmith — an LLM documentation assistant for local projects",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the documentation assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Initialize configuration and project context
    Init,
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
        Some(Commands::Chat { message }) => commands::chat::run(message).await?,
        Some(Commands::Init) => commands::init::run().await?,
        None => commands::chat::run(None).await?,
    }

    Ok(())
}
