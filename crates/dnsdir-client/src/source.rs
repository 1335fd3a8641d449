//! Where a run gets its records from.

use async_trait::async_trait;
use dnsdir_core::{DnsdirError, RecordSet, ResolverRecord, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::DirectoryClient;

/// A provider of the complete, current record set
#[async_trait]
pub trait ResolverSource: Send + Sync {
    /// Short description for logs
    fn describe(&self) -> String;

    /// Fetch every record. Either the whole set or an error; never a
    /// partial set.
    async fn fetch(&self) -> Result<RecordSet>;
}

/// Deduplicate and reject empty results
fn finish(records: Vec<ResolverRecord>, source: &str) -> Result<RecordSet> {
    let (set, duplicates) = RecordSet::from_records(records);
    if duplicates > 0 {
        warn!(source, duplicates, "dropped duplicate addresses");
    }
    if set.is_empty() {
        return Err(DnsdirError::EmptyRecordSet);
    }
    info!(source, records = set.len(), "record set ready");
    Ok(set)
}

#[async_trait]
impl ResolverSource for DirectoryClient {
    fn describe(&self) -> String {
        self.endpoint().to_string()
    }

    async fn fetch(&self) -> Result<RecordSet> {
        let listing = self.fetch_listing().await?;
        finish(listing.records, self.endpoint().as_str())
    }
}

/// The parts of a previously written `data/resolvers.json` we care about
#[derive(Debug, Deserialize)]
struct Snapshot {
    resolvers: Vec<ResolverRecord>,
}

/// Reads records from a snapshot written by an earlier run
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    path: PathBuf,
}

impl SnapshotSource {
    /// Read from `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Snapshot location
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ResolverSource for SnapshotSource {
    fn describe(&self) -> String {
        format!("snapshot {}", self.path.display())
    }

    async fn fetch(&self) -> Result<RecordSet> {
        let content =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|source| DnsdirError::Snapshot {
                    path: self.path.clone(),
                    source,
                })?;

        let snapshot: Snapshot = serde_json::from_str(&content).map_err(|e| {
            DnsdirError::MalformedPayload(format!("{}: {e}", self.path.display()))
        })?;

        finish(snapshot.resolvers, &self.describe())
    }
}
