//! Summary counts published as `data/stats.json`.

use crate::classify::Classification;
use dnsdir_core::{layout, GlobalList, IpVersion, ResolverRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// How often the lists are regenerated, as advertised to consumers
pub const UPDATE_FREQUENCY: &str = "twice daily";

/// Entries in `top_organizations`
pub const TOP_ORGANIZATIONS: usize = 20;

/// Statistics over one classified record set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Generation timestamp, `YYYY-MM-DDTHH:MM:SSZ`
    pub last_updated: String,
    /// Advertised regeneration cadence
    pub update_frequency: String,
    /// Upstream directory the lists are built from
    pub data_source: String,
    /// Headline totals
    pub totals: Totals,
    /// Records per feature flag
    pub by_feature: FeatureCounts,
    /// Continent code → name and count
    pub by_continent: BTreeMap<String, NamedCount>,
    /// Country code → name and count
    pub by_country: BTreeMap<String, NamedCount>,
    /// Every country, largest first, ties broken by code
    pub top_countries: Vec<CountryCount>,
    /// Largest organizations, ties broken by name
    pub top_organizations: Vec<NamedCount>,
}

/// Headline totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Unique resolvers published
    pub servers: usize,
    /// IPv4 resolvers
    pub servers_ipv4: usize,
    /// IPv6 resolvers
    pub servers_ipv6: usize,
    /// Distinct country codes
    pub countries: usize,
    /// Distinct continent codes
    pub continents: usize,
    /// Distinct non-empty organization names
    pub organizations: usize,
}

/// Records per feature, both IP versions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCounts {
    /// Online resolvers; every published record is online
    pub online: usize,
    /// Flagged trusted by the directory
    pub trusted: usize,
    /// DNSSEC aware
    pub dnssec_aware: usize,
    /// DNSSEC validating
    pub dnssec_validating: usize,
    /// Blocks ads
    pub ad_blocking: usize,
    /// Blocks malware
    pub malware_blocking: usize,
    /// Blocks adult content
    pub adult_blocking: usize,
    /// Served over anycast
    pub anycast: usize,
    /// 30-day uptime at or above the high-uptime threshold
    pub high_uptime_30d: usize,
}

/// A display name with a record count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedCount {
    /// Display name
    pub name: String,
    /// Records in the group
    pub count: usize,
}

/// One row of `top_countries`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryCount {
    /// ISO 3166-1 alpha-2 code
    pub code: String,
    /// Country name, or the code when no record carries one
    pub name: String,
    /// Records in the country, both IP versions
    pub count: usize,
}

impl Stats {
    /// Derive statistics from a classification
    #[must_use]
    pub fn compute(classification: &Classification<'_>, last_updated: &str) -> Self {
        let records = classification.records();
        let threshold = classification.policy().high_uptime_threshold;
        let count = |predicate: fn(&ResolverRecord) -> bool| {
            records.iter().filter(|&r| predicate(r)).count()
        };

        let by_feature = FeatureCounts {
            online: records.len(),
            trusted: count(|r| r.trusted),
            dnssec_aware: count(|r| r.dnssec.aware),
            dnssec_validating: count(|r| r.dnssec.validating),
            ad_blocking: count(|r| r.blocking.ads),
            malware_blocking: count(|r| r.blocking.malware),
            adult_blocking: count(|r| r.blocking.adult),
            anycast: count(|r| r.anycast),
            high_uptime_30d: records
                .iter()
                .filter(|r| r.has_high_uptime(threshold))
                .count(),
        };

        let by_country: BTreeMap<String, NamedCount> = classification
            .countries()
            .into_iter()
            .map(|code| {
                let members = classification.country_members(code);
                let name = region_name(&members, |r| r.country.as_deref())
                    .unwrap_or_else(|| code.to_string());
                (
                    code.to_string(),
                    NamedCount {
                        name,
                        count: members.len(),
                    },
                )
            })
            .collect();

        let by_continent: BTreeMap<String, NamedCount> = classification
            .continents()
            .map(|(continent, members)| {
                let name = region_name(members, |r| r.continent.as_deref())
                    .unwrap_or_else(|| continent.name().to_string());
                (
                    continent.code().to_string(),
                    NamedCount {
                        name,
                        count: members.len(),
                    },
                )
            })
            .collect();

        let mut top_countries: Vec<CountryCount> = by_country
            .iter()
            .map(|(code, entry)| CountryCount {
                code: code.clone(),
                name: entry.name.clone(),
                count: entry.count,
            })
            .collect();
        top_countries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.code.cmp(&b.code)));

        let mut organizations: HashMap<&str, usize> = HashMap::new();
        for org in records.iter().filter_map(|r| r.organization.as_deref()) {
            *organizations.entry(org).or_default() += 1;
        }
        let organization_count = organizations.len();
        let mut top_organizations: Vec<NamedCount> = organizations
            .into_iter()
            .map(|(name, count)| NamedCount {
                name: name.to_string(),
                count,
            })
            .collect();
        top_organizations.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        top_organizations.truncate(TOP_ORGANIZATIONS);

        let totals = Totals {
            servers: records.len(),
            servers_ipv4: classification.global(GlobalList::All, IpVersion::V4).len(),
            servers_ipv6: classification.global(GlobalList::All, IpVersion::V6).len(),
            countries: by_country.len(),
            continents: by_continent.len(),
            organizations: organization_count,
        };

        Self {
            last_updated: last_updated.to_string(),
            update_frequency: UPDATE_FREQUENCY.to_string(),
            data_source: layout::SOURCE_URL.to_string(),
            totals,
            by_feature,
            by_continent,
            by_country,
            top_countries,
            top_organizations,
        }
    }

    /// Records without a usable country code
    #[must_use]
    pub fn unlocated(&self) -> usize {
        let located: usize = self.by_country.values().map(|c| c.count).sum();
        self.totals.servers.saturating_sub(located)
    }
}

/// Name of a region: the first member's upstream name, if any carries one
pub(crate) fn region_name<'r>(
    members: &[&'r ResolverRecord],
    name: impl Fn(&'r ResolverRecord) -> Option<&'r str>,
) -> Option<String> {
    members.iter().find_map(|r| name(*r)).map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{classify, ClassifyPolicy};
    use dnsdir_core::{Continent, RecordSet, Uptime};

    fn record(ip: &str) -> ResolverRecord {
        ResolverRecord::new(ip.parse().unwrap())
    }

    fn sample() -> RecordSet {
        RecordSet::from_records(vec![
            record("8.8.8.8")
                .with_country("US", Some("United States"))
                .with_continent(Continent::NorthAmerica)
                .with_organization("Google LLC")
                .trusted(true)
                .with_dnssec(true, true),
            record("8.8.4.4")
                .with_country("US", Some("United States"))
                .with_continent(Continent::NorthAmerica)
                .with_organization("Google LLC")
                .trusted(true),
            record("1.1.1.1")
                .with_country("AU", Some("Australia"))
                .with_continent(Continent::Oceania)
                .with_organization("Cloudflare")
                .with_uptime(Uptime {
                    last_30d: Some(99.99),
                    ..Uptime::default()
                }),
            record("2a10:50c0::ad1:ff")
                .with_country("DE", Some("Germany"))
                .with_organization("AdGuard")
                .with_blocking(true, true, false),
            record("192.0.2.1"),
        ])
        .0
    }

    #[test]
    fn test_totals_and_features() {
        let records = sample();
        let classification = classify(&records, &ClassifyPolicy::default());
        let stats = Stats::compute(&classification, "2024-01-15T06:00:00Z");

        assert_eq!(stats.last_updated, "2024-01-15T06:00:00Z");
        assert_eq!(stats.update_frequency, "twice daily");
        assert_eq!(
            stats.totals,
            Totals {
                servers: 5,
                servers_ipv4: 4,
                servers_ipv6: 1,
                countries: 3,
                continents: 2,
                organizations: 3,
            }
        );
        assert_eq!(stats.by_feature.online, 5);
        assert_eq!(stats.by_feature.trusted, 2);
        assert_eq!(stats.by_feature.dnssec_aware, 1);
        assert_eq!(stats.by_feature.ad_blocking, 1);
        assert_eq!(stats.by_feature.high_uptime_30d, 1);
        assert_eq!(stats.unlocated(), 1);
    }

    #[test]
    fn test_country_ranking_breaks_ties_by_code() {
        let records = sample();
        let classification = classify(&records, &ClassifyPolicy::default());
        let stats = Stats::compute(&classification, "2024-01-15T06:00:00Z");

        let ranking: Vec<(&str, usize)> = stats
            .top_countries
            .iter()
            .map(|c| (c.code.as_str(), c.count))
            .collect();
        assert_eq!(ranking, vec![("US", 2), ("AU", 1), ("DE", 1)]);
        assert_eq!(stats.by_country["DE"].name, "Germany");
        assert_eq!(stats.by_continent["OC"].count, 1);

        let orgs: Vec<&str> = stats
            .top_organizations
            .iter()
            .map(|o| o.name.as_str())
            .collect();
        assert_eq!(orgs, vec!["Google LLC", "AdGuard", "Cloudflare"]);
    }

    #[test]
    fn test_server_total_matches_all_lists() {
        let records = sample();
        let classification = classify(&records, &ClassifyPolicy::default());
        let stats = Stats::compute(&classification, "2024-01-15T06:00:00Z");

        assert_eq!(
            stats.totals.servers,
            stats.totals.servers_ipv4 + stats.totals.servers_ipv6
        );
        let listed: usize = stats.top_organizations.iter().map(|o| o.count).sum();
        assert_eq!(listed, 4);
    }

    #[test]
    fn test_json_keys() {
        let records = sample();
        let classification = classify(&records, &ClassifyPolicy::default());
        let json = serde_json::to_value(Stats::compute(&classification, "t")).unwrap();

        assert_eq!(json["totals"]["servers_ipv6"], 1);
        assert_eq!(json["by_feature"]["high_uptime_30d"], 1);
        assert_eq!(json["by_continent"]["NA"]["name"], "North America");
        assert_eq!(json["data_source"], "https://dnsdirectory.com");
    }
}
