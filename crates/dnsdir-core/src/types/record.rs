use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::IpAddr;

use super::codes::{Continent, CountryCode, IpVersion};

/// One public DNS resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverRecord {
    /// Resolver address
    pub ip: IpAddr,

    /// IP version, always consistent with `ip`
    pub version: IpVersion,

    /// Two-letter country code (ISO 3166-1 alpha-2)
    #[serde(default)]
    pub country_code: Option<CountryCode>,

    /// Full country name
    #[serde(default)]
    pub country: Option<String>,

    /// Continent code
    #[serde(default)]
    pub continent_code: Option<Continent>,

    /// Continent name as reported upstream
    #[serde(default)]
    pub continent: Option<String>,

    /// Operating organization
    #[serde(default)]
    pub organization: Option<String>,

    /// Domain of the operator
    #[serde(default)]
    pub domain: Option<String>,

    /// Run by a well-known, trusted provider
    #[serde(default)]
    pub trusted: bool,

    /// Announced from multiple locations
    #[serde(default)]
    pub anycast: bool,

    /// DNSSEC support
    #[serde(default)]
    pub dnssec: Dnssec,

    /// Content filtering
    #[serde(default)]
    pub blocking: Blocking,

    /// Availability percentages
    #[serde(default)]
    pub uptime: Uptime,
}

/// DNSSEC capabilities of a resolver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dnssec {
    /// Passes DNSSEC records through
    #[serde(default)]
    pub aware: bool,

    /// Cryptographically validates responses
    #[serde(default)]
    pub validating: bool,
}

/// Content filtering performed by a resolver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blocking {
    /// Blocks advertising domains
    #[serde(default)]
    pub ads: bool,

    /// Blocks malware domains
    #[serde(default)]
    pub malware: bool,

    /// Blocks adult content
    #[serde(default)]
    pub adult: bool,
}

/// Uptime percentages over several windows, each in `[0, 100]` when present
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Uptime {
    /// Last 24 hours
    #[serde(default, rename = "24h")]
    pub last_24h: Option<f64>,

    /// Last 30 days
    #[serde(default, rename = "30d")]
    pub last_30d: Option<f64>,

    /// Last 90 days
    #[serde(default, rename = "90d")]
    pub last_90d: Option<f64>,

    /// Last year
    #[serde(default, rename = "1y")]
    pub last_1y: Option<f64>,
}

impl Uptime {
    /// Keep a percentage only if it is a finite value in `[0, 100]`
    #[must_use]
    pub fn sanitize(value: Option<f64>) -> Option<f64> {
        value.filter(|v| v.is_finite() && (0.0..=100.0).contains(v))
    }

    /// Drop every out-of-range value
    #[must_use]
    pub fn sanitized(self) -> Self {
        Self {
            last_24h: Self::sanitize(self.last_24h),
            last_30d: Self::sanitize(self.last_30d),
            last_90d: Self::sanitize(self.last_90d),
            last_1y: Self::sanitize(self.last_1y),
        }
    }
}

impl ResolverRecord {
    /// Create a record for an address with every optional field absent
    #[must_use]
    pub const fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            version: IpVersion::of(&ip),
            country_code: None,
            country: None,
            continent_code: None,
            continent: None,
            organization: None,
            domain: None,
            trusted: false,
            anycast: false,
            dnssec: Dnssec {
                aware: false,
                validating: false,
            },
            blocking: Blocking {
                ads: false,
                malware: false,
                adult: false,
            },
            uptime: Uptime {
                last_24h: None,
                last_30d: None,
                last_90d: None,
                last_1y: None,
            },
        }
    }

    /// Set the country; an invalid code leaves the record without one
    #[must_use]
    pub fn with_country(mut self, code: &str, name: Option<&str>) -> Self {
        self.country_code = CountryCode::new(code);
        self.country = name.map(String::from);
        self
    }

    /// Set the continent
    #[must_use]
    pub fn with_continent(mut self, continent: Continent) -> Self {
        self.continent_code = Some(continent);
        self.continent = Some(continent.name().to_string());
        self
    }

    /// Set the operating organization
    #[must_use]
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Mark the record as trusted or not
    #[must_use]
    pub const fn trusted(mut self, trusted: bool) -> Self {
        self.trusted = trusted;
        self
    }

    /// Set DNSSEC capabilities
    #[must_use]
    pub const fn with_dnssec(mut self, aware: bool, validating: bool) -> Self {
        self.dnssec = Dnssec { aware, validating };
        self
    }

    /// Set content filtering flags
    #[must_use]
    pub const fn with_blocking(mut self, ads: bool, malware: bool, adult: bool) -> Self {
        self.blocking = Blocking {
            ads,
            malware,
            adult,
        };
        self
    }

    /// Set uptime percentages; out-of-range values are dropped
    #[must_use]
    pub fn with_uptime(mut self, uptime: Uptime) -> Self {
        self.uptime = uptime.sanitized();
        self
    }

    /// Returns true if `version` agrees with the address family
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        matches!(
            (self.version, IpVersion::of(&self.ip)),
            (IpVersion::V4, IpVersion::V4) | (IpVersion::V6, IpVersion::V6)
        )
    }

    /// Returns true if the 30-day uptime is known and at least `threshold`
    #[must_use]
    pub fn has_high_uptime(&self, threshold: f64) -> bool {
        self.uptime.last_30d.is_some_and(|u| u >= threshold)
    }

    /// Restore every invariant a hand-edited or foreign record may break
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.version = IpVersion::of(&self.ip);
        self.uptime = self.uptime.sanitized();
        self
    }
}

/// The records of one run: unique by address, ascending numeric order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    records: Vec<ResolverRecord>,
}

impl RecordSet {
    /// Build a set, keeping the first record seen for every address.
    ///
    /// Returns the set and the number of duplicates that were discarded.
    pub fn from_records(records: impl IntoIterator<Item = ResolverRecord>) -> (Self, usize) {
        let mut seen = HashSet::new();
        let mut duplicates = 0;
        let mut unique = Vec::new();

        for record in records {
            if seen.insert(record.ip) {
                unique.push(record.normalized());
            } else {
                duplicates += 1;
            }
        }

        unique.sort_by_key(|r| r.ip);
        (Self { records: unique }, duplicates)
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the set holds no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate in ascending address order
    pub fn iter(&self) -> std::slice::Iter<'_, ResolverRecord> {
        self.records.iter()
    }

    /// The records as a sorted slice
    #[must_use]
    pub fn as_slice(&self) -> &[ResolverRecord] {
        &self.records
    }

    /// Number of records with the given IP version
    #[must_use]
    pub fn count_version(&self, version: IpVersion) -> usize {
        self.records.iter().filter(|r| r.version == version).count()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a ResolverRecord;
    type IntoIter = std::slice::Iter<'a, ResolverRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
