//! IronLoop CLI: the main entry point.
//!
//! Commands:
//! - `run`    Solve one request with the decide/act loop
//! - `tools`  List the built-in tools and their signatures
//! - `config` Print the default configuration, or validate the current one

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "ironloop",
    about = "IronLoop: solve requests by iterating oracle decisions over typed tools",
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
    /// Run the loop on a single request
    Run {
        /// The request to solve
        query: String,

        /// Override the iteration budget
        #[arg(short, long)]
        max_iterations: Option<usize>,

        /// Skip fact extraction before the loop
        #[arg(long)]
        no_extract: bool,
    },

    /// List available tools
    Tools,

    /// Show or validate configuration
    Config {
        /// Load and validate the current configuration instead of printing defaults
        #[arg(long)]
        validate: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the answer.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            query,
            max_iterations,
            no_extract,
        } => commands::run::run(&query, max_iterations, no_extract).await?,
        Commands::Tools => commands::tools::run()?,
        Commands::Config { validate } => commands::config_cmd::run(validate).await?,
    }

    Ok(())
}
