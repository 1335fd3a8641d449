//! `dnsdir stats` - statistics of the current listing, without writing.

use anyhow::{Context as _, Result};
use chrono::Utc;
use colored::Colorize;
use dnsdir::render::format_timestamp;
use dnsdir::{classify, Stats};
use tabled::{settings::Style, Table, Tabled};

use super::Context;
use crate::cli::args::StatsArgs;

#[derive(Tabled)]
struct FeatureRow {
    #[tabled(rename = "Feature")]
    feature: &'static str,
    #[tabled(rename = "Servers")]
    count: usize,
}

#[derive(Tabled)]
struct CountryRow {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Country")]
    name: String,
    #[tabled(rename = "Servers")]
    count: usize,
}

#[derive(Tabled)]
struct OrganizationRow {
    #[tabled(rename = "Organization")]
    name: String,
    #[tabled(rename = "Servers")]
    count: usize,
}

pub async fn execute(ctx: Context, args: StatsArgs) -> Result<()> {
    let source = ctx.source(&args.source)?;
    let records = source
        .fetch()
        .await
        .with_context(|| format!("Fetching from {} failed", source.describe()))?;

    let classification = classify(&records, &ctx.config.policy());
    let stats = Stats::compute(&classification, &format_timestamp(Utc::now()));

    if !ctx.output_format.print_structured(&stats)? {
        print_pretty(&stats, args.top);
    }
    Ok(())
}

fn print_pretty(stats: &Stats, top: usize) {
    let totals = &stats.totals;
    println!(
        "{} {} ({} IPv4, {} IPv6)",
        "Resolvers:".bold(),
        totals.servers.to_string().cyan().bold(),
        totals.servers_ipv4,
        totals.servers_ipv6
    );
    println!(
        "{} {} countries, {} continents, {} organizations",
        "Coverage:".bold(),
        totals.countries,
        totals.continents,
        totals.organizations
    );
    println!();

    let f = &stats.by_feature;
    let features = vec![
        FeatureRow { feature: "Trusted", count: f.trusted },
        FeatureRow { feature: "DNSSEC aware", count: f.dnssec_aware },
        FeatureRow { feature: "DNSSEC validating", count: f.dnssec_validating },
        FeatureRow { feature: "Ad blocking", count: f.ad_blocking },
        FeatureRow { feature: "Malware blocking", count: f.malware_blocking },
        FeatureRow { feature: "Adult blocking", count: f.adult_blocking },
        FeatureRow { feature: "Anycast", count: f.anycast },
        FeatureRow { feature: "High uptime (30d)", count: f.high_uptime_30d },
    ];
    println!("{}", Table::new(&features).with(Style::rounded()));

    if !stats.top_countries.is_empty() {
        println!();
        println!("{}", "Top countries:".bold());
        let rows: Vec<CountryRow> = stats
            .top_countries
            .iter()
            .take(top)
            .map(|c| CountryRow {
                code: c.code.clone(),
                name: c.name.clone(),
                count: c.count,
            })
            .collect();
        println!("{}", Table::new(&rows).with(Style::rounded()));
    }

    if !stats.top_organizations.is_empty() {
        println!();
        println!("{}", "Top organizations:".bold());
        let rows: Vec<OrganizationRow> = stats
            .top_organizations
            .iter()
            .take(top)
            .map(|o| OrganizationRow {
                name: o.name.chars().take(40).collect(),
                count: o.count,
            })
            .collect();
        println!("{}", Table::new(&rows).with(Style::rounded()));
    }

    let unlocated = stats.unlocated();
    if unlocated > 0 {
        println!();
        println!(
            "{}",
            format!("{unlocated} resolvers have no usable country code").dimmed()
        );
    }
}
