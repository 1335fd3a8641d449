//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;

use crate::config::Config;
use crate::logging;

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Load configuration
    let config_path = Config::resolve_path(cli.config.as_deref())?;
    let config = Config::load(&config_path)?.with_env(|name| std::env::var(name).ok());

    logging::init(&config.log.level, cli.verbose, cli.quiet, !cli.no_color)?;

    // Create context for commands
    let ctx = commands::Context {
        config,
        config_path,
        output_format: cli.output.unwrap_or_default(),
    };

    // Dispatch to appropriate command
    match cli.command {
        Commands::Generate(args) => commands::generate::execute(ctx, args).await,
        Commands::Stats(args) => commands::stats::execute(ctx, args).await,
        Commands::Config(args) => commands::config::execute(ctx, args),
    }
}
