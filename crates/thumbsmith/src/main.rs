//! Thumbsmith CLI - Fetch remote images and produce resized thumbnail variants.
//!
//! Thumbsmith takes a list of image URLs, stages each one locally, and writes
//! one thumbnail per configured width, overlapping the network fetches with
//! the CPU-bound resizing.
//!
//! # Usage
//!
//! ```bash
//! # Fetch and resize a couple of images
//! thumbsmith run https://example.com/a.jpg https://example.com/b.jpg
//!
//! # Read URLs from a file, write thumbnails somewhere specific
//! thumbsmith run --urls-file images.txt --output-dir ./thumbs
//!
//! # View configuration
//! thumbsmith config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Fetch remote images and produce resized thumbnail variants.
#[derive(Parser, Debug)]
#[command(name = "thumbsmith", version, about)]
struct Cli {
    /// Log at debug level regardless of the configured level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit log events as line-delimited JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch the given sources and produce thumbnail variants
    Run(cli::run::RunArgs),

    /// Inspect or bootstrap the configuration file
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The config decides the log level and format, so it is read before
    // tracing exists; a broken file falls back to defaults with a bare
    // stderr warning instead of aborting.
    let config = thumbsmith_core::Config::load().unwrap_or_else(|e| {
        eprintln!("warning: ignoring config file: {e}");
        thumbsmith_core::Config::default()
    });
    logging::init(&config.logging, cli.verbose, cli.json_logs);
    tracing::debug!("thumbsmith v{} starting", thumbsmith_core::VERSION);

    match cli.command {
        Commands::Run(args) => cli::run::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
