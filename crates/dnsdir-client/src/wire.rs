//! Upstream payload shapes and their conversion into [`ResolverRecord`].
//!
//! The directory API is loosely typed: flags arrive as booleans, 0/1 or
//! strings, and uptimes as numbers or numeric strings. Everything here is
//! lenient per field. Only a page that is not a JSON object with a `data`
//! array counts as malformed.

use dnsdir_core::{
    Blocking, Continent, CountryCode, Dnssec, IpVersion, ResolverRecord, Uptime,
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::net::IpAddr;
use thiserror::Error;
use tracing::debug;

/// One page of the server listing
#[derive(Debug, Deserialize)]
pub struct ServerPage {
    /// Raw entries; each is converted on its own so one odd entry cannot
    /// poison the page
    pub data: Vec<Value>,
}

/// A server entry as the API describes it
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApiServer {
    #[serde(rename = "dns_server_ip_address")]
    pub ip: Option<String>,

    #[serde(rename = "dns_server_ip_address_version", deserialize_with = "lenient_u8")]
    pub version: Option<u8>,

    #[serde(rename = "country_id")]
    pub country_code: Option<String>,

    #[serde(rename = "country_name")]
    pub country: Option<String>,

    #[serde(rename = "continent_id")]
    pub continent_code: Option<String>,

    #[serde(rename = "continent_name")]
    pub continent: Option<String>,

    #[serde(rename = "dns_server_organization")]
    pub organization: Option<String>,

    #[serde(rename = "dns_server_domain")]
    pub domain: Option<String>,

    #[serde(rename = "dns_server_is_online", deserialize_with = "lenient_bool")]
    pub online: bool,

    #[serde(rename = "dns_server_is_trusted", deserialize_with = "lenient_bool")]
    pub trusted: bool,

    #[serde(rename = "dns_server_is_anycast", deserialize_with = "lenient_bool")]
    pub anycast: bool,

    #[serde(rename = "dns_server_dnssec_aware", deserialize_with = "lenient_bool")]
    pub dnssec_aware: bool,

    #[serde(rename = "dns_server_dnssec_validating", deserialize_with = "lenient_bool")]
    pub dnssec_validating: bool,

    #[serde(rename = "dns_server_is_ad_blocking", deserialize_with = "lenient_bool")]
    pub ad_blocking: bool,

    #[serde(rename = "dns_server_is_malware_blocking", deserialize_with = "lenient_bool")]
    pub malware_blocking: bool,

    #[serde(rename = "dns_server_is_porn_blocking", deserialize_with = "lenient_bool")]
    pub adult_blocking: bool,

    #[serde(rename = "dns_server_uptime_24h", deserialize_with = "lenient_f64")]
    pub uptime_24h: Option<f64>,

    #[serde(rename = "dns_server_uptime_30d", deserialize_with = "lenient_f64")]
    pub uptime_30d: Option<f64>,

    #[serde(rename = "dns_server_uptime_90d", deserialize_with = "lenient_f64")]
    pub uptime_90d: Option<f64>,

    #[serde(rename = "dns_server_uptime_1y", deserialize_with = "lenient_f64")]
    pub uptime_1y: Option<f64>,
}

/// Why an entry was left out of the record set
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Rejected {
    /// The entry does not parse as a server at all
    #[error("entry is not a server object: {0}")]
    Shape(String),

    /// No address
    #[error("entry has no address")]
    MissingIp,

    /// Address that does not parse
    #[error("invalid address {0:?}")]
    InvalidIp(String),
}

impl ApiServer {
    /// Parse one raw entry
    pub fn from_value(value: Value) -> Result<Self, Rejected> {
        serde_json::from_value(value).map_err(|e| Rejected::Shape(e.to_string()))
    }

    /// Convert into a record.
    ///
    /// The address family always wins over the version field. Codes that
    /// cannot name a file are dropped, and so are uptimes outside `[0, 100]`.
    pub fn into_record(self) -> Result<ResolverRecord, Rejected> {
        let raw_ip = non_empty(self.ip).ok_or(Rejected::MissingIp)?;
        let ip: IpAddr = raw_ip
            .parse()
            .map_err(|_| Rejected::InvalidIp(raw_ip.clone()))?;

        let version = IpVersion::of(&ip);
        if let Some(declared) = self.version {
            if declared != version.number() {
                debug!(ip = %ip, declared, "version field contradicts address, using address family");
            }
        }

        let country_code = non_empty(self.country_code).and_then(|code| {
            let parsed = CountryCode::new(&code);
            if parsed.is_none() {
                debug!(ip = %ip, code = %code, "ignoring unusable country code");
            }
            parsed
        });

        let continent_code = non_empty(self.continent_code).and_then(|code| {
            let parsed = Continent::from_code(&code);
            if parsed.is_none() {
                debug!(ip = %ip, code = %code, "ignoring unknown continent code");
            }
            parsed
        });

        Ok(ResolverRecord {
            ip,
            version,
            country_code,
            country: non_empty(self.country),
            continent_code,
            continent: non_empty(self.continent),
            organization: non_empty(self.organization),
            domain: non_empty(self.domain),
            trusted: self.trusted,
            anycast: self.anycast,
            dnssec: Dnssec {
                aware: self.dnssec_aware,
                validating: self.dnssec_validating,
            },
            blocking: Blocking {
                ads: self.ad_blocking,
                malware: self.malware_blocking,
                adult: self.adult_blocking,
            },
            uptime: Uptime {
                last_24h: self.uptime_24h,
                last_30d: self.uptime_30d,
                last_90d: self.uptime_90d,
                last_1y: self.uptime_1y,
            }
            .sanitized(),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        _ => false,
    })
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_u8<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u8>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().and_then(|v| u8::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}
