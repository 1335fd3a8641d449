//! Assigns every record to the groups it belongs to.
//!
//! Classification is a pure function of the record set and the policy.
//! Because a [`RecordSet`] is already sorted by address, every group's
//! member list comes out sorted too.

use dnsdir_core::{
    Continent, CountryCode, GlobalList, GroupKey, IpVersion, RecordSet, ResolverRecord,
};
use std::collections::{BTreeMap, BTreeSet};

/// Default 30-day uptime percentage for `global/high-uptime`
pub const DEFAULT_HIGH_UPTIME_THRESHOLD: f64 = 99.0;

/// Tunables of the classifier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifyPolicy {
    /// Minimum 30-day uptime, in percent, for the high-uptime list
    pub high_uptime_threshold: f64,
}

impl Default for ClassifyPolicy {
    fn default() -> Self {
        Self {
            high_uptime_threshold: DEFAULT_HIGH_UPTIME_THRESHOLD,
        }
    }
}

impl ClassifyPolicy {
    /// Policy with a custom high-uptime threshold
    #[must_use]
    pub const fn with_high_uptime_threshold(threshold: f64) -> Self {
        Self {
            high_uptime_threshold: threshold,
        }
    }
}

/// Every published group `record` is a member of
#[must_use]
pub fn memberships(record: &ResolverRecord, policy: &ClassifyPolicy) -> Vec<GroupKey> {
    let version = record.version;
    let lists = [
        (GlobalList::All, true),
        (GlobalList::Trusted, record.trusted),
        (GlobalList::Dnssec, record.dnssec.validating),
        (GlobalList::AdBlocking, record.blocking.ads),
        (GlobalList::MalwareBlocking, record.blocking.malware),
        (GlobalList::FamilySafe, record.blocking.adult),
        (
            GlobalList::HighUptime,
            record.has_high_uptime(policy.high_uptime_threshold),
        ),
    ];

    let mut keys: Vec<GroupKey> = lists
        .into_iter()
        .filter(|(_, member)| *member)
        .map(|(list, _)| GroupKey::Global { list, version })
        .filter(GroupKey::is_published)
        .collect();

    if let Some(code) = &record.country_code {
        keys.push(GroupKey::Country {
            code: code.clone(),
            version,
        });
    }
    if let Some(continent) = record.continent_code {
        keys.push(GroupKey::Continent(continent));
    }
    keys
}

/// The result of classifying one record set
#[derive(Debug, Clone)]
pub struct Classification<'a> {
    records: &'a RecordSet,
    policy: ClassifyPolicy,
    groups: BTreeMap<GroupKey, Vec<&'a ResolverRecord>>,
}

/// Classify every record in `records`.
///
/// All published global groups are present in the result even when
/// empty; geographic groups exist only when they have members.
#[must_use]
pub fn classify<'a>(records: &'a RecordSet, policy: &ClassifyPolicy) -> Classification<'a> {
    let mut groups: BTreeMap<GroupKey, Vec<&'a ResolverRecord>> =
        GroupKey::published_globals().map(|key| (key, Vec::new())).collect();

    for record in records {
        for key in memberships(record, policy) {
            groups.entry(key).or_default().push(record);
        }
    }

    Classification {
        records,
        policy: *policy,
        groups,
    }
}

impl<'a> Classification<'a> {
    /// The classified record set
    #[must_use]
    pub const fn records(&self) -> &'a RecordSet {
        self.records
    }

    /// The policy the records were classified with
    #[must_use]
    pub const fn policy(&self) -> &ClassifyPolicy {
        &self.policy
    }

    /// Members of `key` in ascending address order; empty for unknown groups
    #[must_use]
    pub fn members(&self, key: &GroupKey) -> &[&'a ResolverRecord] {
        self.groups.get(key).map_or(&[], Vec::as_slice)
    }

    /// Every group with its members, in key order
    pub fn groups(&self) -> impl Iterator<Item = (&GroupKey, &[&'a ResolverRecord])> {
        self.groups.iter().map(|(key, members)| (key, members.as_slice()))
    }

    /// Number of groups, each of which becomes one TXT file
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Members of the global list for `list` and `version`
    #[must_use]
    pub fn global(&self, list: GlobalList, version: IpVersion) -> &[&'a ResolverRecord] {
        self.members(&GroupKey::Global { list, version })
    }

    /// Countries with at least one member of either IP version
    #[must_use]
    pub fn countries(&self) -> BTreeSet<&CountryCode> {
        self.groups
            .keys()
            .filter_map(|key| match key {
                GroupKey::Country { code, .. } => Some(code),
                _ => None,
            })
            .collect()
    }

    /// Continents with at least one member
    pub fn continents(&self) -> impl Iterator<Item = (Continent, &[&'a ResolverRecord])> {
        self.groups.iter().filter_map(|(key, members)| match key {
            GroupKey::Continent(continent) => Some((*continent, members.as_slice())),
            _ => None,
        })
    }

    /// Members of `code` across both IP versions, IPv4 first
    #[must_use]
    pub fn country_members(&self, code: &CountryCode) -> Vec<&'a ResolverRecord> {
        [IpVersion::V4, IpVersion::V6]
            .into_iter()
            .flat_map(|version| {
                self.members(&GroupKey::Country {
                    code: code.clone(),
                    version,
                })
                .iter()
                .copied()
            })
            .collect()
    }
}
