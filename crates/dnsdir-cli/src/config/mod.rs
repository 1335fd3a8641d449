//! Configuration management.
//!
//! Settings come from a TOML file, then `DNSDIR_*` environment variables,
//! then command-line flags; each layer overrides the one before.

use anyhow::{Context as _, Result};
use directories::ProjectDirs;
use dnsdir::{ClassifyPolicy, PageConfig, RetryConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Environment variable overriding `source.endpoint`
pub const ENDPOINT_ENV: &str = "DNSDIR_API_ENDPOINT";

/// Environment variable overriding `source.api_key`
pub const API_KEY_ENV: &str = "DNSDIR_API_KEY";

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Where records come from
    pub source: SourceConfig,

    /// Classifier settings
    pub classify: ClassifyConfig,

    /// Output tree settings
    pub output: OutputConfig,

    /// Logging
    pub log: LogConfig,
}

/// `[source]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// Directory listing endpoint
    pub endpoint: Option<String>,

    /// Bearer token for the listing API
    pub api_key: Option<String>,

    /// Entries per page
    pub per_page: u32,

    /// Upper bound on pages per run
    pub max_pages: u32,

    /// Per-request timeout
    pub timeout_secs: u64,

    /// Retries per page
    pub max_retries: u32,

    /// Initial retry backoff, doubled per attempt
    pub retry_backoff_ms: u64,

    /// Page request pacing; 0 disables it
    pub requests_per_second: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        let pages = PageConfig::default();
        let retry = RetryConfig::default();
        Self {
            endpoint: None,
            api_key: None,
            per_page: pages.per_page,
            max_pages: pages.max_pages,
            timeout_secs: 60,
            max_retries: retry.max_retries,
            retry_backoff_ms: u64::try_from(retry.initial_backoff.as_millis()).unwrap_or(u64::MAX),
            requests_per_second: 1,
        }
    }
}

impl SourceConfig {
    /// Pagination settings
    #[must_use]
    pub const fn pages(&self) -> PageConfig {
        PageConfig {
            per_page: self.per_page,
            max_pages: self.max_pages,
        }
    }

    /// Retry settings
    #[must_use]
    pub const fn retry(&self) -> RetryConfig {
        RetryConfig::new()
            .max_retries(self.max_retries)
            .initial_backoff(Duration::from_millis(self.retry_backoff_ms))
    }

    /// Request timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `[classify]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifyConfig {
    /// Minimum 30-day uptime for the high-uptime list
    pub high_uptime_threshold: f64,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            high_uptime_threshold: ClassifyPolicy::default().high_uptime_threshold,
        }
    }
}

/// `[output]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Root of the published tree
    pub dir: PathBuf,

    /// Remove country/continent files that no longer have resolvers
    pub prune_stale: bool,

    /// Files written in parallel
    pub write_concurrency: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            prune_stale: true,
            write_concurrency: dnsdir::store::DEFAULT_WRITE_CONCURRENCY,
        }
    }
}

/// `[log]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Default filter, e.g. `info` or `dnsdir_client=debug`
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Get the default config file path.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "dnsdirectory", "dnsdir")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// The explicit path if given, the default path otherwise
    pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
        explicit.map_or_else(Self::default_path, |p| Ok(p.to_path_buf()))
    }

    /// Load configuration from file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        Ok(config)
    }

    /// Apply `DNSDIR_*` overrides, reading variables through `lookup`
    #[must_use]
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let set = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        if let Some(endpoint) = set(lookup(ENDPOINT_ENV)) {
            self.source.endpoint = Some(endpoint);
        }
        if let Some(key) = set(lookup(API_KEY_ENV)) {
            self.source.api_key = Some(key);
        }
        self
    }

    /// Reject settings that would make a run fail half-way
    pub fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.source.endpoint {
            let url = Url::parse(endpoint)
                .with_context(|| format!("source.endpoint is not a valid URL: {endpoint}"))?;
            if !matches!(url.scheme(), "http" | "https") {
                anyhow::bail!("source.endpoint must be an http(s) URL: {endpoint}");
            }
        }
        if self.source.per_page == 0 || self.source.max_pages == 0 {
            anyhow::bail!("source.per_page and source.max_pages must be greater than 0");
        }
        let threshold = self.classify.high_uptime_threshold;
        if !(0.0..=100.0).contains(&threshold) {
            anyhow::bail!("classify.high_uptime_threshold must be within 0..=100, got {threshold}");
        }
        if self.output.write_concurrency == 0 {
            anyhow::bail!("output.write_concurrency must be greater than 0");
        }
        Ok(())
    }

    /// Classifier policy
    #[must_use]
    pub const fn policy(&self) -> ClassifyPolicy {
        ClassifyPolicy::with_high_uptime_threshold(self.classify.high_uptime_threshold)
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }
}
