// Copyright 2026 Feedpanel Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{Parser, Subcommand};
use feedpanel::cli;

#[derive(Parser)]
#[command(
    name = "feedpanel",
    about = "Feedpanel — headless feed scraper and panel dataset sync",
    version,
    after_help = "Run 'feedpanel <command> --help' for details on each command."
)]
struct Cli {
    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sync daemon (initial sync + periodic schedule)
    Start,
    /// Run one sync cycle and exit
    Sync,
    /// Log in interactively in a visible browser window
    Login,
    /// Show authentication state and dataset size
    Status,
    /// Print the persisted dataset
    Items {
        /// Output as JSON (machine-readable)
        #[arg(long)]
        json: bool,
    },
    /// Delete every persisted item
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.quiet {
        "feedpanel=error"
    } else if cli.verbose {
        "feedpanel=debug"
    } else {
        "feedpanel=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.parse().unwrap()),
        )
        .init();

    let result = match cli.command {
        Commands::Start => cli::start::run().await,
        Commands::Sync => cli::sync_cmd::run().await,
        Commands::Login => cli::login_cmd::run().await,
        Commands::Status => cli::status_cmd::run().await,
        Commands::Items { json } => cli::items_cmd::run(json).await,
        Commands::Clear => cli::clear_cmd::run().await,
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        eprintln!("  Error: {e:#}");
        std::process::exit(1);
    }

    result
}
