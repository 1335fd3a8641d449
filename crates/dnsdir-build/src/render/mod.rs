//! In-memory rendering of every output file.
//!
//! Rendering never touches the filesystem. A run renders the complete
//! artifact list first and only then hands it to the
//! [`OutputStore`](crate::store::OutputStore), so a render failure leaves
//! the published tree untouched.

mod json;
mod table;
mod txt;

use crate::classify::Classification;
use crate::stats::Stats;
use chrono::{DateTime, Utc};
use dnsdir_core::{layout, DnsdirError, Result};
use serde::Serialize;

pub use table::CSV_COLUMNS;
pub use txt::title;

/// Timestamp format used in headers, metadata and stats
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// One fully rendered output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Path relative to the output root, always `/`-separated
    pub path: String,

    /// Exact file contents
    pub contents: Vec<u8>,
}

impl Artifact {
    /// Create an artifact from rendered text
    #[must_use]
    pub fn text(path: impl Into<String>, contents: String) -> Self {
        Self {
            path: path.into(),
            contents: contents.into_bytes(),
        }
    }

    /// Size of the rendered file in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    /// Returns true for a zero-byte file
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

/// Inputs every renderer shares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderContext {
    generated_at: DateTime<Utc>,
}

impl RenderContext {
    /// Render as of `generated_at`. The same instant and the same records
    /// always produce the same bytes.
    #[must_use]
    pub const fn new(generated_at: DateTime<Utc>) -> Self {
        Self { generated_at }
    }

    /// The generation instant
    #[must_use]
    pub const fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// The generation instant as `YYYY-MM-DDTHH:MM:SSZ`
    #[must_use]
    pub fn timestamp(&self) -> String {
        format_timestamp(self.generated_at)
    }
}

/// Format an instant the way every output file does
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Render every output file for `classification`.
///
/// The order is fixed: TXT lists by group, then the aggregate JSON files,
/// the per-region JSON files, stats and finally the CSV.
pub fn render_all(
    classification: &Classification<'_>,
    stats: &Stats,
    ctx: &RenderContext,
) -> Result<Vec<Artifact>> {
    let timestamp = ctx.timestamp();
    let mut artifacts = Vec::with_capacity(classification.group_count() * 2 + 4);

    for (key, members) in classification.groups() {
        let title = txt::title(key, members, classification.policy());
        artifacts.push(Artifact::text(
            key.txt_path(),
            txt::render(&title, members, &timestamp),
        ));
    }

    artifacts.push(json::full(classification, stats, &timestamp)?);
    artifacts.push(json::minimal(classification, &timestamp)?);

    for code in classification.countries() {
        let members = classification.country_members(code);
        artifacts.push(json::country(code, &members, &timestamp)?);
    }
    for (continent, members) in classification.continents() {
        artifacts.push(json::continent(continent, members, &timestamp)?);
    }

    artifacts.push(to_json(layout::STATS_JSON, stats)?);
    artifacts.push(table::render(classification.records())?);

    Ok(artifacts)
}

/// Pretty-print `value` with a trailing newline
pub(crate) fn to_json<T: Serialize + ?Sized>(path: impl Into<String>, value: &T) -> Result<Artifact> {
    let path = path.into();
    let mut contents = serde_json::to_vec_pretty(value).map_err(|e| DnsdirError::Render {
        path: path.clone(),
        message: e.to_string(),
    })?;
    contents.push(b'\n');
    Ok(Artifact { path, contents })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{classify, ClassifyPolicy};
    use chrono::TimeZone;
    use dnsdir_core::{Continent, RecordSet, ResolverRecord};

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 6, 0, 0).unwrap()
    }

    fn sample() -> RecordSet {
        RecordSet::from_records(vec![
            ResolverRecord::new("8.8.8.8".parse().unwrap())
                .with_country("US", Some("United States"))
                .with_continent(Continent::NorthAmerica)
                .trusted(true)
                .with_dnssec(true, true),
            ResolverRecord::new("1.1.1.1".parse().unwrap())
                .with_country("AU", Some("Australia"))
                .with_continent(Continent::Oceania),
        ])
        .0
    }

    fn render(records: &RecordSet) -> Vec<Artifact> {
        let classification = classify(records, &ClassifyPolicy::default());
        let ctx = RenderContext::new(generated_at());
        let stats = Stats::compute(&classification, &ctx.timestamp());
        render_all(&classification, &stats, &ctx).unwrap()
    }

    fn find<'a>(artifacts: &'a [Artifact], path: &str) -> &'a str {
        let artifact = artifacts
            .iter()
            .find(|a| a.path == path)
            .unwrap_or_else(|| panic!("missing {path}"));
        std::str::from_utf8(&artifact.contents).unwrap()
    }

    #[test]
    fn test_timestamp_format() {
        assert_eq!(format_timestamp(generated_at()), "2024-01-15T06:00:00Z");
    }

    #[test]
    fn test_full_artifact_list() {
        let artifacts = render(&sample());
        let paths: Vec<&str> = artifacts.iter().map(|a| a.path.as_str()).collect();

        // 10 global lists, 2 countries, 2 continents.
        assert_eq!(paths.iter().filter(|p| p.ends_with(".txt")).count(), 14);
        for path in [
            "resolvers/global/family-safe.txt",
            "resolvers/by-country/US.txt",
            "resolvers/by-continent/OC.txt",
            "data/resolvers.json",
            "data/resolvers-minimal.json",
            "data/by-country/AU.json",
            "data/by-continent/NA.json",
            "data/stats.json",
            "data/resolvers.csv",
        ] {
            assert!(paths.contains(&path), "missing {path}");
        }
        assert!(!paths.contains(&"resolvers/by-country-ipv6/US.txt"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        assert_eq!(render(&sample()), render(&sample()));
    }

    #[test]
    fn test_trusted_resolver_appears_in_its_lists() {
        let artifacts = render(&sample());

        for path in [
            "resolvers/global/all.txt",
            "resolvers/global/trusted.txt",
            "resolvers/global/dnssec.txt",
            "resolvers/by-country/US.txt",
            "resolvers/by-continent/NA.txt",
        ] {
            assert!(
                find(&artifacts, path).lines().any(|l| l == "8.8.8.8"),
                "8.8.8.8 missing from {path}"
            );
        }
        assert!(!find(&artifacts, "resolvers/global/trusted.txt").contains("1.1.1.1"));
    }

    #[test]
    fn test_json_outputs_end_with_newline() {
        let artifacts = render(&sample());
        for artifact in artifacts.iter().filter(|a| a.path.ends_with(".json")) {
            assert_eq!(artifact.contents.last(), Some(&b'\n'), "{}", artifact.path);
            assert!(artifact.contents.starts_with(b"{\n  \""), "{}", artifact.path);
        }
    }
}
