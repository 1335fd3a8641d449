use std::fmt;

use super::codes::{Continent, CountryCode, IpVersion};
use crate::layout;

/// Feature lists published under `resolvers/global/`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GlobalList {
    /// Every resolver
    All,
    /// Trusted providers
    Trusted,
    /// DNSSEC validating resolvers
    Dnssec,
    /// Ad-blocking resolvers
    AdBlocking,
    /// Malware-blocking resolvers
    MalwareBlocking,
    /// Adult-content-blocking resolvers
    FamilySafe,
    /// Resolvers with a 30-day uptime above the configured threshold
    HighUptime,
}

impl GlobalList {
    /// File stem shared by both IP versions
    #[must_use]
    pub const fn base_slug(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Trusted => "trusted",
            Self::Dnssec => "dnssec",
            Self::AdBlocking => "ad-blocking",
            Self::MalwareBlocking => "malware-blocking",
            Self::FamilySafe => "family-safe",
            Self::HighUptime => "high-uptime",
        }
    }
}

/// A classification bucket. Each one maps to exactly one TXT file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    /// A feature list under `resolvers/global/`
    Global {
        /// Which feature
        list: GlobalList,
        /// Which address family
        version: IpVersion,
    },
    /// `resolvers/by-country/` or `resolvers/by-country-ipv6/`
    Country {
        /// Country
        code: CountryCode,
        /// Address family
        version: IpVersion,
    },
    /// `resolvers/by-continent/`, both address families
    Continent(Continent),
}

impl GroupKey {
    /// Global lists that are published. The feature lists without an IPv6
    /// variant only ever carry IPv4 resolvers.
    pub const PUBLISHED_GLOBALS: [(GlobalList, IpVersion); 10] = [
        (GlobalList::All, IpVersion::V4),
        (GlobalList::All, IpVersion::V6),
        (GlobalList::Trusted, IpVersion::V4),
        (GlobalList::Trusted, IpVersion::V6),
        (GlobalList::Dnssec, IpVersion::V4),
        (GlobalList::Dnssec, IpVersion::V6),
        (GlobalList::AdBlocking, IpVersion::V4),
        (GlobalList::MalwareBlocking, IpVersion::V4),
        (GlobalList::FamilySafe, IpVersion::V4),
        (GlobalList::HighUptime, IpVersion::V4),
    ];

    /// Every published global key
    pub fn published_globals() -> impl Iterator<Item = Self> {
        Self::PUBLISHED_GLOBALS
            .into_iter()
            .map(|(list, version)| Self::Global { list, version })
    }

    /// Directory below `resolvers/`
    #[must_use]
    pub const fn directory(&self) -> &'static str {
        match self {
            Self::Global { .. } => layout::GLOBAL_DIR,
            Self::Country {
                version: IpVersion::V4,
                ..
            } => layout::COUNTRY_DIR,
            Self::Country {
                version: IpVersion::V6,
                ..
            } => layout::COUNTRY_IPV6_DIR,
            Self::Continent(_) => layout::CONTINENT_DIR,
        }
    }

    /// File stem, e.g. `all-ipv6`, `US` or `EU`
    #[must_use]
    pub fn slug(&self) -> String {
        match self {
            Self::Global { list, version } => match version {
                IpVersion::V4 => list.base_slug().to_string(),
                IpVersion::V6 => format!("{}-ipv6", list.base_slug()),
            },
            Self::Country { code, .. } => code.to_string(),
            Self::Continent(continent) => continent.code().to_string(),
        }
    }

    /// Relative path of the TXT list for this group
    #[must_use]
    pub fn txt_path(&self) -> String {
        format!("{}/{}/{}.txt", layout::RESOLVERS_ROOT, self.directory(), self.slug())
    }

    /// Returns true for the groups listed in [`Self::PUBLISHED_GLOBALS`]
    /// and every geographic group
    #[must_use]
    pub fn is_published(&self) -> bool {
        match self {
            Self::Global { list, version } => Self::PUBLISHED_GLOBALS.contains(&(*list, *version)),
            Self::Country { .. } | Self::Continent(_) => true,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.directory(), self.slug())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_paths() {
        let paths: Vec<String> = GroupKey::published_globals()
            .map(|k| k.txt_path())
            .collect();
        assert_eq!(
            paths,
            vec![
                "resolvers/global/all.txt",
                "resolvers/global/all-ipv6.txt",
                "resolvers/global/trusted.txt",
                "resolvers/global/trusted-ipv6.txt",
                "resolvers/global/dnssec.txt",
                "resolvers/global/dnssec-ipv6.txt",
                "resolvers/global/ad-blocking.txt",
                "resolvers/global/malware-blocking.txt",
                "resolvers/global/family-safe.txt",
                "resolvers/global/high-uptime.txt",
            ]
        );
    }

    #[test]
    fn test_geographic_paths() {
        let us = CountryCode::new("us").unwrap();
        let v4 = GroupKey::Country {
            code: us.clone(),
            version: IpVersion::V4,
        };
        let v6 = GroupKey::Country {
            code: us,
            version: IpVersion::V6,
        };
        assert_eq!(v4.txt_path(), "resolvers/by-country/US.txt");
        assert_eq!(v6.txt_path(), "resolvers/by-country-ipv6/US.txt");
        assert_eq!(
            GroupKey::Continent(Continent::Europe).txt_path(),
            "resolvers/by-continent/EU.txt"
        );
        assert_eq!(v4.to_string(), "by-country/US");
    }

    #[test]
    fn test_unpublished_global_variant() {
        let key = GroupKey::Global {
            list: GlobalList::FamilySafe,
            version: IpVersion::V6,
        };
        assert!(!key.is_published());
        assert_eq!(key.slug(), "family-safe-ipv6");
    }
}
