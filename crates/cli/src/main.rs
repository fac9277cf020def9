//! hubpilot CLI: the main entry point.
//!
//! Commands:
//! - `init`    Write a starter config and sample inventory
//! - `chat`    Single-message or interactive chat with the assistant
//! - `tools`   Print the tool catalog offered to the model
//! - `serve`   Start the HTTP gateway
//! - `doctor`  Diagnose configuration and connectivity

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "hubpilot",
    about = "hubpilot: a sales assistant for local media advertising hubs",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter config and sample inventory
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Chat with the sales assistant
    Chat(commands::chat::ChatArgs),

    /// Print the tool catalog
    Tools {
        /// Print full JSON schemas
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Diagnose configuration and connectivity
    Doctor {
        /// Skip network checks
        #[arg(long)]
        offline: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false);
    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Init { force } => commands::init::run(force).await?,
        Commands::Chat(args) => commands::chat::run(args, cli.verbose).await?,
        Commands::Tools { json } => commands::tools::run(json)?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Doctor { offline } => commands::doctor::run(offline).await?,
    }

    Ok(())
}
