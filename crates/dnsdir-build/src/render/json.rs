//! JSON documents under `data/`.

use super::{to_json, Artifact};
use crate::classify::Classification;
use crate::stats::{region_name, CountryCount, Stats};
use dnsdir_core::{layout, Continent, CountryCode, ResolverRecord, Result};
use serde::Serialize;
use std::net::IpAddr;

/// Countries listed in the `statistics` block of `resolvers.json`
const TOP_COUNTRIES: usize = 10;

#[derive(Serialize)]
struct FullDocument<'a> {
    metadata: FullMetadata<'a>,
    statistics: Statistics<'a>,
    resolvers: &'a [ResolverRecord],
}

#[derive(Serialize)]
struct FullMetadata<'a> {
    source: &'static str,
    generated_at: &'a str,
    total_servers: usize,
    total_countries: usize,
    total_continents: usize,
}

#[derive(Serialize)]
struct Statistics<'a> {
    by_ip_version: ByIpVersion,
    by_feature: FeatureSummary,
    top_countries: &'a [CountryCount],
}

#[derive(Serialize)]
struct ByIpVersion {
    ipv4: usize,
    ipv6: usize,
}

#[derive(Serialize)]
struct FeatureSummary {
    trusted: usize,
    dnssec_validating: usize,
    ad_blocking: usize,
    malware_blocking: usize,
    adult_blocking: usize,
}

#[derive(Serialize)]
struct MinimalDocument<'a> {
    generated_at: &'a str,
    resolvers: Vec<MinimalEntry<'a>>,
}

#[derive(Serialize)]
struct MinimalEntry<'a> {
    ip: IpAddr,
    country: Option<&'a CountryCode>,
    trusted: bool,
}

#[derive(Serialize)]
struct RegionDocument<'a, M> {
    metadata: M,
    resolvers: &'a [&'a ResolverRecord],
}

#[derive(Serialize)]
struct CountryMetadata<'a> {
    country_code: &'a CountryCode,
    country_name: String,
    continent_code: Option<Continent>,
    continent_name: Option<String>,
    generated_at: &'a str,
    total_servers: usize,
}

#[derive(Serialize)]
struct ContinentMetadata<'a> {
    continent_code: Continent,
    continent_name: String,
    generated_at: &'a str,
    total_servers: usize,
}

/// `data/resolvers.json`
pub fn full(classification: &Classification<'_>, stats: &Stats, timestamp: &str) -> Result<Artifact> {
    let records = classification.records();
    let features = &stats.by_feature;
    let top = &stats.top_countries[..stats.top_countries.len().min(TOP_COUNTRIES)];

    let document = FullDocument {
        metadata: FullMetadata {
            source: layout::SOURCE_URL,
            generated_at: timestamp,
            total_servers: records.len(),
            total_countries: stats.totals.countries,
            total_continents: stats.totals.continents,
        },
        statistics: Statistics {
            by_ip_version: ByIpVersion {
                ipv4: stats.totals.servers_ipv4,
                ipv6: stats.totals.servers_ipv6,
            },
            by_feature: FeatureSummary {
                trusted: features.trusted,
                dnssec_validating: features.dnssec_validating,
                ad_blocking: features.ad_blocking,
                malware_blocking: features.malware_blocking,
                adult_blocking: features.adult_blocking,
            },
            top_countries: top,
        },
        resolvers: records.as_slice(),
    };
    to_json(layout::RESOLVERS_JSON, &document)
}

/// `data/resolvers-minimal.json`
pub fn minimal(classification: &Classification<'_>, timestamp: &str) -> Result<Artifact> {
    let document = MinimalDocument {
        generated_at: timestamp,
        resolvers: classification
            .records()
            .iter()
            .map(|r| MinimalEntry {
                ip: r.ip,
                country: r.country_code.as_ref(),
                trusted: r.trusted,
            })
            .collect(),
    };
    to_json(layout::RESOLVERS_MINIMAL_JSON, &document)
}

/// `data/by-country/<CC>.json`, both IP versions
pub fn country(code: &CountryCode, members: &[&ResolverRecord], timestamp: &str) -> Result<Artifact> {
    let document = RegionDocument {
        metadata: CountryMetadata {
            country_code: code,
            country_name: region_name(members, |r| r.country.as_deref())
                .unwrap_or_else(|| code.to_string()),
            continent_code: members.iter().find_map(|r| r.continent_code),
            continent_name: region_name(members, |r| r.continent.as_deref()),
            generated_at: timestamp,
            total_servers: members.len(),
        },
        resolvers: members,
    };
    to_json(layout::country_json(code), &document)
}

/// `data/by-continent/<code>.json`, both IP versions
pub fn continent(
    continent: Continent,
    members: &[&ResolverRecord],
    timestamp: &str,
) -> Result<Artifact> {
    let document = RegionDocument {
        metadata: ContinentMetadata {
            continent_code: continent,
            continent_name: region_name(members, |r| r.continent.as_deref())
                .unwrap_or_else(|| continent.name().to_string()),
            generated_at: timestamp,
            total_servers: members.len(),
        },
        resolvers: members,
    };
    to_json(layout::continent_json(continent), &document)
}
