#![allow(clippy::unwrap_used)]
// End-to-end runs of the generation pipeline against a temporary tree.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

use dnsdir_build::{Pipeline, PipelineConfig, Stats};
use dnsdir_client::{DnsdirError, ResolverSource, Result, SnapshotSource};
use dnsdir_core::{Continent, RecordSet, ResolverRecord, Uptime};

// ── Helpers ─────────────────────────────────────────────────────────

struct StaticSource(Vec<ResolverRecord>);

#[async_trait]
impl ResolverSource for StaticSource {
    fn describe(&self) -> String {
        "static".into()
    }

    async fn fetch(&self) -> Result<RecordSet> {
        let (set, _) = RecordSet::from_records(self.0.clone());
        if set.is_empty() {
            return Err(DnsdirError::EmptyRecordSet);
        }
        Ok(set)
    }
}

struct FailingSource;

#[async_trait]
impl ResolverSource for FailingSource {
    fn describe(&self) -> String {
        "failing".into()
    }

    async fn fetch(&self) -> Result<RecordSet> {
        Err(DnsdirError::Connection("connection refused".into()))
    }
}

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, hour, 0, 0).unwrap()
}

fn record(ip: &str) -> ResolverRecord {
    ResolverRecord::new(ip.parse().unwrap())
}

fn world() -> Vec<ResolverRecord> {
    vec![
        record("8.8.8.8")
            .with_country("US", Some("United States"))
            .with_continent(Continent::NorthAmerica)
            .with_organization("Google LLC")
            .trusted(true)
            .with_dnssec(true, true)
            .with_uptime(Uptime {
                last_30d: Some(99.99),
                ..Uptime::default()
            }),
        record("2001:4860:4860::8888")
            .with_country("US", Some("United States"))
            .with_continent(Continent::NorthAmerica)
            .with_organization("Google LLC")
            .trusted(true)
            .with_dnssec(true, true),
        record("9.9.9.9")
            .with_country("CH", Some("Switzerland"))
            .with_continent(Continent::Europe)
            .with_organization("Quad9")
            .with_blocking(false, true, false),
        record("94.140.14.14")
            .with_country("CY", Some("Cyprus"))
            .with_continent(Continent::Europe)
            .with_organization("AdGuard")
            .with_blocking(true, true, true),
        record("203.0.113.53"),
    ]
}

fn config(dir: &Path) -> PipelineConfig {
    PipelineConfig::new(dir)
}

async fn run(dir: &Path, records: Vec<ResolverRecord>, hour: u32) -> dnsdir_build::RunReport {
    Pipeline::new(config(dir))
        .run(&StaticSource(records), at(hour))
        .await
        .unwrap()
}

/// Every file below `root`, keyed by relative path
fn read_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<String, Vec<u8>>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let relative = path
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/");
                out.insert(relative, fs::read(&path).unwrap());
            }
        }
    }
    let mut out = BTreeMap::new();
    walk(root, root, &mut out);
    out
}

fn mtimes(root: &Path) -> BTreeMap<String, SystemTime> {
    read_tree(root)
        .into_keys()
        .map(|p| {
            let modified = fs::metadata(root.join(&p)).unwrap().modified().unwrap();
            (p, modified)
        })
        .collect()
}

fn list(root: &Path, path: &str) -> Vec<String> {
    fs::read_to_string(root.join(path))
        .unwrap()
        .lines()
        .filter(|l| !l.starts_with('#'))
        .map(String::from)
        .collect()
}

// ── Scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_two_trusted_us_resolvers() {
    let dir = tempfile::tempdir().unwrap();
    run(
        dir.path(),
        vec![
            record("8.8.8.8")
                .with_country("US", None)
                .trusted(true)
                .with_dnssec(false, true),
            record("1.1.1.1").with_country("US", None).trusted(true),
        ],
        6,
    )
    .await;

    let us = fs::read_to_string(dir.path().join("resolvers/by-country/US.txt")).unwrap();
    assert!(us.contains("# Total: 2 servers\n"));
    assert_eq!(list(dir.path(), "resolvers/by-country/US.txt"), vec!["1.1.1.1", "8.8.8.8"]);
    assert_eq!(
        list(dir.path(), "resolvers/global/trusted.txt"),
        vec!["1.1.1.1", "8.8.8.8"]
    );
    assert_eq!(list(dir.path(), "resolvers/global/dnssec.txt"), vec!["8.8.8.8"]);
}

#[tokio::test]
async fn test_full_tree_layout() {
    let dir = tempfile::tempdir().unwrap();
    let report = run(dir.path(), world(), 6).await;

    let tree = read_tree(dir.path());
    for path in [
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
        "resolvers/by-country/US.txt",
        "resolvers/by-country-ipv6/US.txt",
        "resolvers/by-continent/EU.txt",
        "data/resolvers.json",
        "data/resolvers-minimal.json",
        "data/resolvers.csv",
        "data/stats.json",
        "data/by-country/CY.json",
        "data/by-continent/NA.json",
    ] {
        assert!(tree.contains_key(path), "missing {path}");
    }
    assert_eq!(tree.len(), report.files.len());
    assert!(!tree.contains_key("resolvers/by-country-ipv6/CH.txt"));
    assert_eq!(report.records, 5);
    assert_eq!(report.records_ipv6, 1);
    assert!(report.pruned.is_empty());
}

#[tokio::test]
async fn test_same_input_same_timestamp_is_byte_identical() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();

    let mut shuffled = world();
    shuffled.reverse();
    run(first.path(), world(), 6).await;
    run(second.path(), shuffled, 6).await;

    assert_eq!(read_tree(first.path()), read_tree(second.path()));
}

#[tokio::test]
async fn test_partition_and_counts() {
    let dir = tempfile::tempdir().unwrap();
    run(dir.path(), world(), 6).await;

    let v4 = list(dir.path(), "resolvers/global/all.txt");
    let v6 = list(dir.path(), "resolvers/global/all-ipv6.txt");
    assert!(v4.iter().all(|ip| !v6.contains(ip)));

    let stats: Stats =
        serde_json::from_slice(&fs::read(dir.path().join("data/stats.json")).unwrap()).unwrap();
    assert_eq!(stats.totals.servers, v4.len() + v6.len());
    assert_eq!(stats.last_updated, "2024-01-15T06:00:00Z");

    // Each located record sits in exactly one country list.
    let tree = read_tree(dir.path());
    let in_country_lists = |ip: &str| {
        tree.iter()
            .filter(|(p, _)| p.starts_with("resolvers/by-country"))
            .filter(|(_, bytes)| {
                String::from_utf8_lossy(bytes)
                    .lines()
                    .any(|line| line == ip)
            })
            .count()
    };
    assert_eq!(in_country_lists("9.9.9.9"), 1);
    assert_eq!(in_country_lists("2001:4860:4860::8888"), 1);
    assert_eq!(in_country_lists("203.0.113.53"), 0);

    assert_eq!(list(dir.path(), "resolvers/global/family-safe.txt"), vec!["94.140.14.14"]);
    assert_eq!(
        list(dir.path(), "resolvers/global/malware-blocking.txt"),
        vec!["9.9.9.9", "94.140.14.14"]
    );
    assert_eq!(list(dir.path(), "resolvers/global/high-uptime.txt"), vec!["8.8.8.8"]);
    assert!(list(dir.path(), "resolvers/global/trusted-ipv6.txt")
        .contains(&"2001:4860:4860::8888".to_string()));
}

#[tokio::test]
async fn test_fetch_failure_leaves_output_untouched() {
    let dir = tempfile::tempdir().unwrap();
    run(dir.path(), world(), 6).await;
    let before = read_tree(dir.path());
    let before_mtimes = mtimes(dir.path());

    let err = Pipeline::new(config(dir.path()))
        .run(&FailingSource, at(18))
        .await
        .unwrap_err();

    assert!(err.is_fetch_error());
    assert_eq!(read_tree(dir.path()), before);
    assert_eq!(mtimes(dir.path()), before_mtimes);
}

#[tokio::test]
async fn test_write_failure_keeps_committed_files_and_skips_pruning() {
    let dir = tempfile::tempdir().unwrap();
    run(dir.path(), world(), 6).await;

    // A regular file where the data directory belongs blocks every data/ write.
    fs::remove_dir_all(dir.path().join("data")).unwrap();
    fs::write(dir.path().join("data"), "not a directory\n").unwrap();

    let shrunk: Vec<ResolverRecord> = world()
        .into_iter()
        .filter(|r| r.ip.to_string() != "94.140.14.14")
        .collect();
    let mut config = config(dir.path());
    config.write_concurrency = 1;
    let err = Pipeline::new(config)
        .run(&StaticSource(shrunk), at(18))
        .await
        .unwrap_err();

    match &err {
        DnsdirError::Write { path, .. } => assert_eq!(path, &dir.path().join("data")),
        other => panic!("expected Write error, got: {other:?}"),
    }
    assert!(!err.is_fetch_error());

    // TXT lists are committed before the data files and stay complete.
    let us = fs::read_to_string(dir.path().join("resolvers/by-country/US.txt")).unwrap();
    assert!(us.contains("# Updated: 2024-01-15T18:00:00Z\n"));
    assert!(us.ends_with("#\n8.8.8.8\n"));
    assert_eq!(list(dir.path(), "resolvers/global/all.txt").len(), 3);

    // The blocked target is untouched and nothing was pruned.
    assert_eq!(
        fs::read_to_string(dir.path().join("data")).unwrap(),
        "not a directory\n"
    );
    assert!(dir.path().join("resolvers/by-country/CY.txt").exists());
}

#[tokio::test]
async fn test_stale_regions_are_pruned() {
    let dir = tempfile::tempdir().unwrap();
    run(dir.path(), world(), 6).await;
    assert!(dir.path().join("resolvers/by-country/CY.txt").exists());

    let shrunk: Vec<ResolverRecord> = world()
        .into_iter()
        .filter(|r| r.ip.to_string() != "94.140.14.14")
        .collect();
    let report = run(dir.path(), shrunk, 18).await;

    assert_eq!(
        report.pruned,
        vec!["data/by-country/CY.json", "resolvers/by-country/CY.txt"]
    );
    assert!(!dir.path().join("resolvers/by-country/CY.txt").exists());
    // Europe still has Quad9.
    assert!(dir.path().join("resolvers/by-continent/EU.txt").exists());
    // Global lists are rewritten, never pruned.
    assert_eq!(list(dir.path(), "resolvers/global/family-safe.txt"), Vec::<String>::new());
}

#[tokio::test]
async fn test_pruning_can_be_disabled() {
    let dir = tempfile::tempdir().unwrap();
    run(dir.path(), world(), 6).await;

    let mut config = config(dir.path());
    config.prune_stale = false;
    let report = Pipeline::new(config)
        .run(&StaticSource(vec![record("1.1.1.1")]), at(18))
        .await
        .unwrap();

    assert!(report.pruned.is_empty());
    assert!(dir.path().join("resolvers/by-country/US.txt").exists());
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.dry_run = true;

    let report = Pipeline::new(config)
        .run(&StaticSource(world()), at(6))
        .await
        .unwrap();

    assert!(report.dry_run);
    assert!(report.files.contains(&"data/resolvers.csv".to_string()));
    assert!(report.bytes > 0);
    assert!(read_tree(dir.path()).is_empty());
}

#[tokio::test]
async fn test_snapshot_of_published_tree_reproduces_it() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    run(first.path(), world(), 6).await;

    let snapshot = SnapshotSource::new(first.path().join("data/resolvers.json"));
    Pipeline::new(config(second.path()))
        .run(&snapshot, at(6))
        .await
        .unwrap();

    assert_eq!(read_tree(first.path()), read_tree(second.path()));
}
