//! Flat CSV export. Nested record fields become dotted column names.

use super::Artifact;
use dnsdir_core::{layout, DnsdirError, RecordSet, ResolverRecord, Result};
use serde::Serialize;
use std::net::IpAddr;

/// Header row of `data/resolvers.csv`
pub const CSV_COLUMNS: [&str; 19] = [
    "ip",
    "version",
    "country_code",
    "country",
    "continent_code",
    "continent",
    "organization",
    "domain",
    "trusted",
    "anycast",
    "dnssec.aware",
    "dnssec.validating",
    "blocking.ads",
    "blocking.malware",
    "blocking.adult",
    "uptime.24h",
    "uptime.30d",
    "uptime.90d",
    "uptime.1y",
];

/// One row; field order must match [`CSV_COLUMNS`]
#[derive(Serialize)]
struct Row<'a> {
    ip: IpAddr,
    version: u8,
    country_code: Option<&'a str>,
    country: Option<&'a str>,
    continent_code: Option<&'static str>,
    continent: Option<&'a str>,
    organization: Option<&'a str>,
    domain: Option<&'a str>,
    trusted: bool,
    anycast: bool,
    dnssec_aware: bool,
    dnssec_validating: bool,
    blocking_ads: bool,
    blocking_malware: bool,
    blocking_adult: bool,
    uptime_24h: Option<f64>,
    uptime_30d: Option<f64>,
    uptime_90d: Option<f64>,
    uptime_1y: Option<f64>,
}

impl<'a> From<&'a ResolverRecord> for Row<'a> {
    fn from(r: &'a ResolverRecord) -> Self {
        Self {
            ip: r.ip,
            version: r.version.number(),
            country_code: r.country_code.as_ref().map(|c| c.as_str()),
            country: r.country.as_deref(),
            continent_code: r.continent_code.map(|c| c.code()),
            continent: r.continent.as_deref(),
            organization: r.organization.as_deref(),
            domain: r.domain.as_deref(),
            trusted: r.trusted,
            anycast: r.anycast,
            dnssec_aware: r.dnssec.aware,
            dnssec_validating: r.dnssec.validating,
            blocking_ads: r.blocking.ads,
            blocking_malware: r.blocking.malware,
            blocking_adult: r.blocking.adult,
            uptime_24h: r.uptime.last_24h,
            uptime_30d: r.uptime.last_30d,
            uptime_90d: r.uptime.last_90d,
            uptime_1y: r.uptime.last_1y,
        }
    }
}

/// `data/resolvers.csv`
pub fn render(records: &RecordSet) -> Result<Artifact> {
    let fail = |message: String| DnsdirError::Render {
        path: layout::RESOLVERS_CSV.to_string(),
        message,
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer
        .write_record(CSV_COLUMNS)
        .map_err(|e| fail(e.to_string()))?;
    for record in records {
        writer
            .serialize(Row::from(record))
            .map_err(|e| fail(e.to_string()))?;
    }
    let contents = writer.into_inner().map_err(|e| fail(e.to_string()))?;

    Ok(Artifact {
        path: layout::RESOLVERS_CSV.to_string(),
        contents,
    })
}
