//! Fixed output layout. Consumers fetch these paths directly, so they
//! never change between runs.

use crate::{Continent, CountryCode};

/// Root of the plain-text lists
pub const RESOLVERS_ROOT: &str = "resolvers";

/// Root of the JSON/CSV data files
pub const DATA_ROOT: &str = "data";

/// `resolvers/global/`
pub const GLOBAL_DIR: &str = "global";

/// `resolvers/by-country/` (IPv4)
pub const COUNTRY_DIR: &str = "by-country";

/// `resolvers/by-country-ipv6/`
pub const COUNTRY_IPV6_DIR: &str = "by-country-ipv6";

/// `resolvers/by-continent/`
pub const CONTINENT_DIR: &str = "by-continent";

/// Full record set with metadata and statistics
pub const RESOLVERS_JSON: &str = "data/resolvers.json";

/// Reduced projection: ip, country, trusted
pub const RESOLVERS_MINIMAL_JSON: &str = "data/resolvers-minimal.json";

/// Flattened record set
pub const RESOLVERS_CSV: &str = "data/resolvers.csv";

/// Summary counts
pub const STATS_JSON: &str = "data/stats.json";

/// Upstream data source, quoted in every header
pub const SOURCE_URL: &str = "https://dnsdirectory.com";

/// `data/by-country/<CC>.json`
#[must_use]
pub fn country_json(code: &CountryCode) -> String {
    format!("{DATA_ROOT}/{COUNTRY_DIR}/{code}.json")
}

/// `data/by-continent/<code>.json`
#[must_use]
pub fn continent_json(continent: Continent) -> String {
    format!("{DATA_ROOT}/{CONTINENT_DIR}/{}.json", continent.code())
}

/// Directories whose contents mirror the current snapshot, with the
/// extension of the files they hold. Anything else in them is stale.
pub const MANAGED_DIRS: [(&str, &str); 5] = [
    ("resolvers/by-country", "txt"),
    ("resolvers/by-country-ipv6", "txt"),
    ("resolvers/by-continent", "txt"),
    ("data/by-country", "json"),
    ("data/by-continent", "json"),
];
