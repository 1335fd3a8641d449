//! `dnsdir generate` - fetch, classify and publish every list.

use anyhow::{Context as _, Result};
use chrono::{SubsecRound, Utc};
use colored::Colorize;
use dnsdir::render::format_timestamp;
use dnsdir::{Pipeline, PipelineConfig, RunReport};
use serde::Serialize;

use super::Context;
use crate::cli::args::GenerateArgs;

/// Machine-readable run summary
#[derive(Debug, Serialize)]
struct Summary<'a> {
    generated_at: String,
    output_dir: String,
    dry_run: bool,
    records: usize,
    records_ipv4: usize,
    records_ipv6: usize,
    countries: usize,
    continents: usize,
    groups: usize,
    files: usize,
    bytes: usize,
    pruned: &'a [String],
}

pub async fn execute(ctx: Context, args: GenerateArgs) -> Result<()> {
    let source = ctx.source(&args.source)?;
    let output = &ctx.config.output;

    let out_dir = args.out_dir.unwrap_or_else(|| output.dir.clone());
    let mut config = PipelineConfig::new(&out_dir);
    config.policy = ctx.config.policy();
    config.prune_stale = output.prune_stale && !args.no_prune;
    config.write_concurrency = output.write_concurrency;
    config.dry_run = args.dry_run;

    let generated_at = args.timestamp.unwrap_or_else(|| Utc::now().trunc_subsecs(0));
    let report = Pipeline::new(config)
        .run(source.as_ref(), generated_at)
        .await
        .with_context(|| format!("Generation into {} failed", out_dir.display()))?;

    let summary = Summary {
        generated_at: format_timestamp(report.generated_at),
        output_dir: out_dir.display().to_string(),
        dry_run: report.dry_run,
        records: report.records,
        records_ipv4: report.records_ipv4,
        records_ipv6: report.records_ipv6,
        countries: report.stats.totals.countries,
        continents: report.stats.totals.continents,
        groups: report.groups,
        files: report.files.len(),
        bytes: report.bytes,
        pruned: &report.pruned,
    };
    if !ctx.output_format.print_structured(&summary)? {
        print_pretty(&summary, &report);
    }
    Ok(())
}

fn print_pretty(summary: &Summary<'_>, report: &RunReport) {
    if summary.dry_run {
        println!("{}", "Dry run: nothing was written.".yellow().bold());
        for file in &report.files {
            println!("  {}", file.dimmed());
        }
        println!();
    }

    println!("{} {}", "Generated:".bold(), summary.generated_at.cyan());
    println!("{} {}", "Output:".bold(), summary.output_dir);
    println!(
        "{} {} ({} IPv4, {} IPv6)",
        "Resolvers:".bold(),
        summary.records.to_string().cyan().bold(),
        summary.records_ipv4,
        summary.records_ipv6
    );
    println!(
        "{} {} countries, {} continents",
        "Coverage:".bold(),
        summary.countries,
        summary.continents
    );
    println!(
        "{} {} files, {} bytes",
        "Files:".bold(),
        summary.files,
        summary.bytes
    );

    if !summary.pruned.is_empty() {
        println!();
        println!("{}", "Removed stale files:".bold());
        for path in summary.pruned {
            println!("  {} {}", "-".red(), path);
        }
    }
}
