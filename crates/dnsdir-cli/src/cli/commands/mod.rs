//! Command implementations.

pub mod config;
pub mod generate;
pub mod stats;

use anyhow::Context as _;
use dnsdir::{DirectoryClient, ResolverSource, SnapshotSource};
use std::path::PathBuf;

use super::args::SourceArgs;
use crate::config::{Config, ENDPOINT_ENV};
use crate::output::OutputFormat;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Effective configuration (file plus environment)
    pub config: Config,

    /// Where the configuration was looked up
    pub config_path: PathBuf,

    /// Output format
    pub output_format: OutputFormat,
}

impl Context {
    /// Build the record source selected by `args` and the configuration.
    ///
    /// A snapshot wins over any endpoint; flags win over the config file.
    pub fn source(&self, args: &SourceArgs) -> anyhow::Result<Box<dyn ResolverSource>> {
        self.config.validate()?;

        if let Some(path) = &args.snapshot {
            return Ok(Box::new(SnapshotSource::new(path)));
        }

        let source = &self.config.source;
        let endpoint = args
            .endpoint
            .clone()
            .or_else(|| source.endpoint.clone())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No listing endpoint configured.\n\n\
                     Set it with one of:\n  \
                     1. --endpoint <URL>\n  \
                     2. {ENDPOINT_ENV} environment variable\n  \
                     3. [source] endpoint in {}\n\n\
                     Or read an earlier run with --snapshot <FILE>",
                    self.config_path.display()
                )
            })?;

        let mut builder = DirectoryClient::builder(&endpoint)
            .pages(source.pages())
            .retry(source.retry())
            .timeout(source.timeout())
            .requests_per_second(source.requests_per_second);
        if let Some(key) = args.api_key.as_ref().or(source.api_key.as_ref()) {
            builder = builder.api_key(key);
        }

        let client = builder
            .build()
            .with_context(|| format!("Invalid endpoint {endpoint}"))?;
        Ok(Box::new(client))
    }
}
