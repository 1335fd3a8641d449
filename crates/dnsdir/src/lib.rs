//! Ready-to-use lists of public DNS resolvers, generated from the
//! dnsdirectory.com listing.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use dnsdir::{DirectoryClient, Pipeline, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> dnsdir::Result<()> {
//!     let client = DirectoryClient::builder("https://dnsdirectory.com/api/v1/dns-servers")
//!         .requests_per_second(1)
//!         .build()?;
//!
//!     let report = Pipeline::new(PipelineConfig::new("public"))
//!         .run(&client, chrono::Utc::now())
//!         .await?;
//!
//!     println!("{} resolvers in {} files", report.records, report.files.len());
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `default` - Uses rustls for TLS
//! - `rustls` - Use rustls for TLS (recommended)
//! - `native-tls` - Use system native TLS

#![doc(html_root_url = "https://docs.rs/dnsdir/1.0.0")]

// Re-export core types
pub use dnsdir_core::*;

// Re-export the fetcher
pub use dnsdir_client::{
    DirectoryClient, DirectoryClientBuilder, Listing, PageConfig, ResolverSource, RetryConfig,
    SnapshotSource,
};

// Re-export the list builder
pub use dnsdir_build::{
    classify, render, stats, store, Artifact, Classification, ClassifyPolicy, OutputStore,
    Pipeline, PipelineConfig, RenderContext, RunReport, Stage, Stats,
};

// Re-export runtime for convenience
pub use chrono;
pub use serde;
pub use serde_json;
pub use tokio;
