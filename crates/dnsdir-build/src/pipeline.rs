//! One generation run: fetch, classify, render, commit.
//!
//! A run either publishes a complete new tree or leaves the previous one
//! alone. Nothing touches the output directory until the record set has
//! been fetched and every file has been rendered in memory.

use crate::classify::{classify, ClassifyPolicy};
use crate::render::{render_all, Artifact, RenderContext};
use crate::stats::Stats;
use crate::store::{OutputStore, DEFAULT_WRITE_CONCURRENCY};
use chrono::{DateTime, Utc};
use dnsdir_client::ResolverSource;
use dnsdir_core::{IpVersion, RecordSet, Result};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Not running
    Idle,
    /// Retrieving the record set from the source
    Fetching,
    /// Assigning records to groups and rendering every file in memory
    Classifying,
    /// Writing rendered files and pruning stale ones
    Materializing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Classifying => "classifying",
            Self::Materializing => "materializing",
        };
        f.write_str(name)
    }
}

/// Settings of a [`Pipeline`]
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root of the published tree
    pub output_dir: PathBuf,

    /// Classifier tunables
    pub policy: ClassifyPolicy,

    /// Remove stale country/continent files after a commit
    pub prune_stale: bool,

    /// Files written in parallel
    pub write_concurrency: usize,

    /// Render everything but write nothing
    pub dry_run: bool,
}

impl PipelineConfig {
    /// Defaults for publishing into `output_dir`
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            policy: ClassifyPolicy::default(),
            prune_stale: true,
            write_concurrency: DEFAULT_WRITE_CONCURRENCY,
            dry_run: false,
        }
    }
}

/// What a finished run did
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Generation instant stamped into every file
    pub generated_at: DateTime<Utc>,

    /// Unique records published
    pub records: usize,

    /// IPv4 records
    pub records_ipv4: usize,

    /// IPv6 records
    pub records_ipv6: usize,

    /// Classification groups, one TXT file each
    pub groups: usize,

    /// Files written, or that would be written on a dry run
    pub files: Vec<String>,

    /// Bytes written, or that would be written on a dry run
    pub bytes: usize,

    /// Stale files removed
    pub pruned: Vec<String>,

    /// Whether anything was written
    pub dry_run: bool,

    /// The published statistics
    pub stats: Stats,
}

/// Everything a run produces before it touches the disk
#[derive(Debug, Clone)]
pub struct Rendered {
    /// Files to publish, in render order
    pub artifacts: Vec<Artifact>,

    /// Statistics, also present among the artifacts as `data/stats.json`
    pub stats: Stats,

    /// Number of classification groups
    pub groups: usize,
}

/// Classify and render `records` without touching the filesystem
pub fn render(
    records: &RecordSet,
    policy: &ClassifyPolicy,
    generated_at: DateTime<Utc>,
) -> Result<Rendered> {
    let classification = classify(records, policy);
    let ctx = RenderContext::new(generated_at);
    let stats = Stats::compute(&classification, &ctx.timestamp());
    let artifacts = render_all(&classification, &stats, &ctx)?;
    Ok(Rendered {
        artifacts,
        stats,
        groups: classification.group_count(),
    })
}

/// Drives one run through its stages
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Pipeline with the given settings
    #[must_use]
    pub const fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// The pipeline's settings
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run once, stamping every file with `generated_at`.
    ///
    /// A fetch failure ends the run before the output directory is
    /// touched.
    pub async fn run(
        &self,
        source: &dyn ResolverSource,
        generated_at: DateTime<Utc>,
    ) -> Result<RunReport> {
        let started = Instant::now();
        let result = self.run_stages(source, generated_at).await;
        enter(Stage::Idle);

        match &result {
            Ok(report) => info!(
                records = report.records,
                files = report.files.len(),
                pruned = report.pruned.len(),
                dry_run = report.dry_run,
                elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                "run complete"
            ),
            Err(e) => error!(error = %e, "run failed, output left unchanged"),
        }
        result
    }

    async fn run_stages(
        &self,
        source: &dyn ResolverSource,
        generated_at: DateTime<Utc>,
    ) -> Result<RunReport> {
        enter(Stage::Fetching);
        info!(source = %source.describe(), "fetching records");
        let records = source.fetch().await?;

        enter(Stage::Classifying);
        let Rendered {
            artifacts,
            stats,
            groups,
        } = render(&records, &self.config.policy, generated_at)?;
        info!(records = records.len(), groups, "classified");

        enter(Stage::Materializing);
        let files: Vec<String> = artifacts.iter().map(|a| a.path.clone()).collect();
        let bytes = artifacts.iter().map(Artifact::len).sum();

        let pruned = if self.config.dry_run {
            info!(
                files = files.len(),
                bytes,
                dir = %self.config.output_dir.display(),
                "dry run, nothing written"
            );
            Vec::new()
        } else {
            let store = OutputStore::new(&self.config.output_dir)
                .with_concurrency(self.config.write_concurrency);
            store.commit(artifacts).await?;
            if self.config.prune_stale {
                let keep: HashSet<String> = files.iter().cloned().collect();
                store.prune(keep).await?
            } else {
                Vec::new()
            }
        };

        Ok(RunReport {
            generated_at,
            records: records.len(),
            records_ipv4: records.count_version(IpVersion::V4),
            records_ipv6: records.count_version(IpVersion::V6),
            groups,
            files,
            bytes,
            pruned,
            dry_run: self.config.dry_run,
            stats,
        })
    }
}

fn enter(stage: Stage) {
    info!(%stage, "stage");
}
