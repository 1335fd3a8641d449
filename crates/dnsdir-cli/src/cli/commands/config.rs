//! `dnsdir config` - configuration file management.

use anyhow::Result;
use colored::Colorize;

use super::Context;
use crate::cli::args::{ConfigArgs, ConfigCommands};
use crate::config::Config;
use crate::output::mask_secret;

pub fn execute(ctx: Context, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(ctx),
        ConfigCommands::Path => show_path(&ctx),
        ConfigCommands::Init { force } => init_config(&ctx, force),
    }
}

fn show_config(ctx: Context) -> Result<()> {
    let mut config = ctx.config;
    config.source.api_key = config.source.api_key.as_deref().map(mask_secret);

    if ctx.output_format.print_structured(&config)? {
        return Ok(());
    }

    println!("{} {}", "Config file:".bold(), ctx.config_path.display());
    if !ctx.config_path.exists() {
        println!("{}", "(not found, using defaults)".dimmed());
    }
    println!();

    let unset = || "(not set)".dimmed().to_string();
    let source = &config.source;
    println!("{}", "[source]".bold());
    println!("  {} {}", "endpoint:".bold(), source.endpoint.clone().unwrap_or_else(unset));
    println!("  {} {}", "api_key:".bold(), source.api_key.clone().unwrap_or_else(unset));
    println!("  {} {}", "per_page:".bold(), source.per_page);
    println!("  {} {}", "max_pages:".bold(), source.max_pages);
    println!("  {} {}", "timeout_secs:".bold(), source.timeout_secs);
    println!("  {} {}", "max_retries:".bold(), source.max_retries);
    println!("  {} {}", "retry_backoff_ms:".bold(), source.retry_backoff_ms);
    println!("  {} {}", "requests_per_second:".bold(), source.requests_per_second);

    println!("{}", "[classify]".bold());
    println!(
        "  {} {}",
        "high_uptime_threshold:".bold(),
        config.classify.high_uptime_threshold
    );

    println!("{}", "[output]".bold());
    println!("  {} {}", "dir:".bold(), config.output.dir.display());
    println!("  {} {}", "prune_stale:".bold(), config.output.prune_stale);
    println!("  {} {}", "write_concurrency:".bold(), config.output.write_concurrency);

    println!("{}", "[log]".bold());
    println!("  {} {}", "level:".bold(), config.log.level);

    if let Err(e) = config.validate() {
        println!();
        println!("{} {e:#}", "Invalid:".red().bold());
    }
    Ok(())
}

fn show_path(ctx: &Context) -> Result<()> {
    println!("{}", ctx.config_path.display());
    Ok(())
}

fn init_config(ctx: &Context, force: bool) -> Result<()> {
    let path = &ctx.config_path;
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists.\n\nUse --force to overwrite it.",
            path.display()
        );
    }

    Config::default().save(path)?;
    eprintln!("{} Wrote {}", "Success:".green().bold(), path.display());
    Ok(())
}
