//! Command-line argument definitions using clap.

use chrono::{DateTime, Utc};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Public DNS resolver list generator
///
/// Fetches the dnsdirectory.com listing, sorts resolvers into global,
/// per-country and per-continent lists, and publishes them as TXT, JSON
/// and CSV files.
#[derive(Parser, Debug)]
#[command(name = "dnsdir")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: platform config dir)
    #[arg(short, long, env = "DNSDIR_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch, classify and publish every list
    Generate(GenerateArgs),

    /// Print statistics for the current listing without writing files
    Stats(StatsArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

// ============================================================================
// Record source, shared by generate and stats
// ============================================================================

#[derive(Args, Debug, Default, Clone)]
pub struct SourceArgs {
    /// Directory listing endpoint (or set DNSDIR_API_ENDPOINT)
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// API key sent as a bearer token (or set DNSDIR_API_KEY)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Read records from a previously published data/resolvers.json
    /// instead of the API
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,
}

// ============================================================================
// Generate command
// ============================================================================

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Root of the published tree
    #[arg(short = 'd', long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Generation time stamped into every file (RFC 3339, default: now)
    #[arg(long, value_name = "RFC3339", value_parser = parse_timestamp)]
    pub timestamp: Option<DateTime<Utc>>,

    /// Render everything but write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Keep country and continent files that no longer have resolvers
    #[arg(long)]
    pub no_prune: bool,
}

// ============================================================================
// Stats command
// ============================================================================

#[derive(Args, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Countries and organizations to show in pretty output
    #[arg(short = 'n', long, default_value = "10")]
    pub top: usize,
}

// ============================================================================
// Config command
// ============================================================================

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Print the config file path
    Path,

    /// Write a config file with every default filled in
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Parse an RFC 3339 timestamp into UTC
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected RFC 3339, e.g. 2024-01-15T06:00:00Z ({e})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_args() {
        let cli = Cli::parse_from([
            "dnsdir",
            "-vv",
            "generate",
            "--snapshot",
            "data/resolvers.json",
            "--timestamp",
            "2024-01-15T08:00:00+02:00",
            "--dry-run",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert!(args.dry_run);
        assert!(!args.no_prune);
        assert_eq!(
            args.timestamp.unwrap().to_rfc3339(),
            "2024-01-15T06:00:00+00:00"
        );
        assert_eq!(
            args.source.snapshot.unwrap(),
            PathBuf::from("data/resolvers.json")
        );
    }

    #[test]
    fn test_bad_timestamp_is_rejected() {
        let result = Cli::try_parse_from(["dnsdir", "generate", "--timestamp", "yesterday"]);
        assert!(result.is_err());
    }
}
