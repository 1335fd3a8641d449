//! Publishing rendered artifacts to the output tree.
//!
//! Every file is written to a temporary file in its destination directory,
//! synced, then renamed over the target. Readers see either the previous
//! or the new contents of a file, never a mix.

use crate::render::Artifact;
use dnsdir_core::{layout, DnsdirError, Result};
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default number of files written in parallel
pub const DEFAULT_WRITE_CONCURRENCY: usize = 8;

/// Prefix of in-flight temporary files
const TEMP_PREFIX: &str = ".dnsdir-";

/// The published output tree
#[derive(Debug, Clone)]
pub struct OutputStore {
    root: PathBuf,
    concurrency: usize,
}

/// Outcome of [`OutputStore::commit`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Files written
    pub written: usize,

    /// Bytes written across all files
    pub bytes: usize,
}

impl OutputStore {
    /// Store rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            concurrency: DEFAULT_WRITE_CONCURRENCY,
        }
    }

    /// Limit parallel writes; `0` is treated as `1`
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Output root
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Atomically replace every artifact's file.
    ///
    /// Writes run on the blocking pool, at most `concurrency` at a time.
    /// After the first failure no further writes are started, but writes
    /// already in flight are awaited before the error is returned, so the
    /// tree no longer changes once this returns. Files already renamed
    /// stay in place and the failing target keeps its previous contents.
    pub async fn commit(&self, artifacts: Vec<Artifact>) -> Result<CommitReport> {
        let mut pending = artifacts.into_iter();
        let mut in_flight = FuturesUnordered::new();
        let mut report = CommitReport::default();
        let mut failure = None;

        loop {
            while failure.is_none() && in_flight.len() < self.concurrency {
                let Some(artifact) = pending.next() else {
                    break;
                };
                let root = self.root.clone();
                in_flight.push(tokio::task::spawn_blocking(move || {
                    write_atomic(&root, &artifact).map(|()| artifact.contents.len())
                }));
            }

            let Some(joined) = in_flight.next().await else {
                break;
            };
            match joined.map_err(|e| DnsdirError::Internal(format!("write task: {e}"))) {
                Ok(Ok(bytes)) => {
                    report.written += 1;
                    report.bytes += bytes;
                }
                Ok(Err(e)) | Err(e) => {
                    if failure.is_none() {
                        warn!(error = %e, in_flight = in_flight.len(), "write failed, draining");
                        failure = Some(e);
                    }
                }
            }
        }

        if let Some(e) = failure {
            return Err(e);
        }

        info!(
            root = %self.root.display(),
            files = report.written,
            bytes = report.bytes,
            "output committed"
        );
        Ok(report)
    }

    /// Remove files in the managed directories that are not in `keep`,
    /// plus temporary files left behind by an interrupted run.
    ///
    /// Returns the removed paths relative to the root, sorted.
    pub async fn prune(&self, keep: HashSet<String>) -> Result<Vec<String>> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || prune_managed(&root, &keep))
            .await
            .map_err(|e| DnsdirError::Internal(format!("prune task: {e}")))?
    }
}

/// Write one artifact below `root` via temp file, sync and rename
pub fn write_atomic(root: &Path, artifact: &Artifact) -> Result<()> {
    let target = root.join(&artifact.path);
    let parent = target
        .parent()
        .ok_or_else(|| DnsdirError::Internal(format!("no parent for {}", artifact.path)))?;
    let write_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| DnsdirError::Write { path, source }
    };

    fs::create_dir_all(parent).map_err(write_err(parent))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(write_err(parent))?;
    tmp.write_all(&artifact.contents)
        .map_err(write_err(tmp.path()))?;
    tmp.as_file().sync_all().map_err(write_err(tmp.path()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(write_err(tmp.path()))?;
    }

    tmp.persist(&target).map_err(|e| DnsdirError::Write {
        path: target.clone(),
        source: e.error,
    })?;
    debug!(path = %artifact.path, bytes = artifact.contents.len(), "wrote file");
    Ok(())
}

fn prune_managed(root: &Path, keep: &HashSet<String>) -> Result<Vec<String>> {
    let mut removed = Vec::new();

    for (dir, extension) in layout::MANAGED_DIRS {
        let dir_path = root.join(dir);
        let entries = match fs::read_dir(&dir_path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(source) => {
                return Err(DnsdirError::Write {
                    path: dir_path,
                    source,
                })
            }
        };

        for entry in entries {
            let entry = entry.map_err(|source| DnsdirError::Write {
                path: dir_path.clone(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            let leftover = name.starts_with(TEMP_PREFIX);
            let managed = path.extension().and_then(|e| e.to_str()) == Some(extension);
            let relative = format!("{dir}/{name}");
            if !(leftover || (managed && !keep.contains(&relative))) {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => {
                    info!(path = %relative, "removed stale file");
                    removed.push(relative);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %relative, error = %e, "could not remove stale file"),
            }
        }
    }

    removed.sort();
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(path: &str, contents: &str) -> Artifact {
        Artifact::text(path, contents.to_string())
    }

    #[tokio::test]
    async fn test_commit_creates_directories_and_replaces_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = OutputStore::new(dir.path()).with_concurrency(2);

        store
            .commit(vec![
                artifact("resolvers/global/all.txt", "old\n"),
                artifact("data/stats.json", "{}\n"),
            ])
            .await
            .unwrap();
        let report = store
            .commit(vec![artifact("resolvers/global/all.txt", "new\n")])
            .await
            .unwrap();

        assert_eq!(report.written, 1);
        assert_eq!(report.bytes, 4);
        assert_eq!(
            fs::read_to_string(dir.path().join("resolvers/global/all.txt")).unwrap(),
            "new\n"
        );
        assert!(dir.path().join("data/stats.json").exists());

        // No temp files survive a successful commit.
        let leftovers = fs::read_dir(dir.path().join("resolvers/global"))
            .unwrap()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(TEMP_PREFIX))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_commit_stops_starting_writes_after_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("data"), "blocker").unwrap();
        let store = OutputStore::new(dir.path()).with_concurrency(1);

        let err = store
            .commit(vec![
                artifact("resolvers/global/all.txt", "first\n"),
                artifact("data/stats.json", "{}\n"),
                artifact("resolvers/global/trusted.txt", "never\n"),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, DnsdirError::Write { .. }));
        assert_eq!(
            fs::read_to_string(dir.path().join("resolvers/global/all.txt")).unwrap(),
            "first\n"
        );
        assert!(!dir.path().join("resolvers/global/trusted.txt").exists());
        assert_eq!(fs::read_to_string(dir.path().join("data")).unwrap(), "blocker");
    }

    #[cfg(unix)]
    #[test]
    fn test_written_files_are_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        write_atomic(dir.path(), &artifact("data/resolvers.csv", "ip\n")).unwrap();
        let mode = fs::metadata(dir.path().join("data/resolvers.csv"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[tokio::test]
    async fn test_prune_removes_only_stale_managed_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = OutputStore::new(dir.path());
        store
            .commit(vec![
                artifact("resolvers/by-country/US.txt", "x"),
                artifact("resolvers/by-country/ZZ.txt", "x"),
                artifact("resolvers/by-country/README.md", "x"),
                artifact("resolvers/global/all.txt", "x"),
                artifact("data/by-continent/AN.json", "x"),
            ])
            .await
            .unwrap();
        fs::write(dir.path().join("resolvers/by-country/.dnsdir-abc.tmp"), "x").unwrap();

        let keep: HashSet<String> = ["resolvers/by-country/US.txt".to_string()].into();
        let removed = store.prune(keep).await.unwrap();

        assert_eq!(
            removed,
            vec![
                "data/by-continent/AN.json",
                "resolvers/by-country/.dnsdir-abc.tmp",
                "resolvers/by-country/ZZ.txt",
            ]
        );
        assert!(dir.path().join("resolvers/by-country/US.txt").exists());
        assert!(dir.path().join("resolvers/by-country/README.md").exists());
        assert!(dir.path().join("resolvers/global/all.txt").exists());
    }

    #[tokio::test]
    async fn test_prune_on_fresh_tree_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let removed = OutputStore::new(dir.path())
            .prune(HashSet::new())
            .await
            .unwrap();
        assert!(removed.is_empty());
    }
}
