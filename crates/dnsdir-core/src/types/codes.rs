use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::DnsdirError;

/// IP protocol version of a resolver address
///
/// Serialized as the integers `4` and `6`, which is what both the upstream
/// API and the published JSON use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum IpVersion {
    /// IPv4
    V4,
    /// IPv6
    V6,
}

impl IpVersion {
    /// Version implied by the address family
    #[must_use]
    pub const fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => Self::V4,
            IpAddr::V6(_) => Self::V6,
        }
    }

    /// Numeric form (4 or 6)
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::V4 => 4,
            Self::V6 => 6,
        }
    }

    /// Human label used in list titles
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::V4 => "IPv4",
            Self::V6 => "IPv6",
        }
    }
}

impl From<IpVersion> for u8 {
    fn from(version: IpVersion) -> Self {
        version.number()
    }
}

impl TryFrom<u8> for IpVersion {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(Self::V4),
            6 => Ok(Self::V6),
            other => Err(format!("unknown IP version {other}")),
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// ISO 3166-1 alpha-2 country code
///
/// Always two upper-case ASCII letters. The code ends up in file names
/// (`resolvers/by-country/US.txt`), so nothing else is representable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    /// Parse a code leniently: surrounding whitespace and case are ignored.
    ///
    /// Returns `None` for anything that is not two ASCII letters.
    #[must_use]
    pub fn new(code: &str) -> Option<Self> {
        let code = code.trim();
        if code.len() == 2 && code.bytes().all(|b| b.is_ascii_alphabetic()) {
            Some(Self(code.to_ascii_uppercase()))
        } else {
            None
        }
    }

    /// The upper-case code
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CountryCode {
    type Err = DnsdirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or_else(|| DnsdirError::InvalidCode(s.to_string()))
    }
}

impl TryFrom<String> for CountryCode {
    type Error = DnsdirError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> Self {
        code.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Continent a resolver is located on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Continent {
    /// Africa
    #[serde(rename = "AF")]
    Africa,
    /// Asia
    #[serde(rename = "AS")]
    Asia,
    /// Europe
    #[serde(rename = "EU")]
    Europe,
    /// North America
    #[serde(rename = "NA")]
    NorthAmerica,
    /// Oceania
    #[serde(rename = "OC")]
    Oceania,
    /// South America
    #[serde(rename = "SA")]
    SouthAmerica,
}

impl Continent {
    /// Every continent, in code order
    pub const ALL: [Self; 6] = [
        Self::Africa,
        Self::Asia,
        Self::Europe,
        Self::NorthAmerica,
        Self::Oceania,
        Self::SouthAmerica,
    ];

    /// Two-letter continent code
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Africa => "AF",
            Self::Asia => "AS",
            Self::Europe => "EU",
            Self::NorthAmerica => "NA",
            Self::Oceania => "OC",
            Self::SouthAmerica => "SA",
        }
    }

    /// English display name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Africa => "Africa",
            Self::Asia => "Asia",
            Self::Europe => "Europe",
            Self::NorthAmerica => "North America",
            Self::Oceania => "Oceania",
            Self::SouthAmerica => "South America",
        }
    }

    /// Look up a continent by code, ignoring case and surrounding whitespace
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(code))
    }
}

impl FromStr for Continent {
    type Err = DnsdirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| DnsdirError::InvalidCode(s.to_string()))
    }
}

impl fmt::Display for Continent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ip_version_of_address() {
        assert_eq!(IpVersion::of(&"9.9.9.9".parse().unwrap()), IpVersion::V4);
        assert_eq!(
            IpVersion::of(&"2620:fe::fe".parse().unwrap()),
            IpVersion::V6
        );
    }

    #[test]
    fn test_ip_version_serializes_as_number() {
        assert_eq!(serde_json::to_string(&IpVersion::V6).unwrap(), "6");
        let parsed: IpVersion = serde_json::from_str("4").unwrap();
        assert_eq!(parsed, IpVersion::V4);
        assert!(serde_json::from_str::<IpVersion>("5").is_err());
    }

    #[test]
    fn test_country_code_normalizes() {
        assert_eq!(CountryCode::new(" us ").unwrap().as_str(), "US");
        assert!(CountryCode::new("").is_none());
        assert!(CountryCode::new("USA").is_none());
        assert!(CountryCode::new("../").is_none());
        assert!(CountryCode::new("1A").is_none());
    }

    #[test]
    fn test_country_code_rejects_invalid_json() {
        assert!(serde_json::from_str::<CountryCode>("\"de\"").is_ok());
        assert!(serde_json::from_str::<CountryCode>("\"x/y\"").is_err());
    }

    #[test]
    fn test_continent_codes() {
        assert_eq!(Continent::from_code("eu"), Some(Continent::Europe));
        assert_eq!(Continent::from_code("AN"), None);
        assert_eq!(Continent::NorthAmerica.name(), "North America");
        assert_eq!(serde_json::to_string(&Continent::Oceania).unwrap(), "\"OC\"");
        let mut sorted = Continent::ALL;
        sorted.sort_by_key(|c| c.code());
        assert_eq!(sorted, Continent::ALL);
    }
}
