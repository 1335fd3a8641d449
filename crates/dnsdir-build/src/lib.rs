//! Turns a resolver record set into the published list tree.
//!
//! - [`classify`]: assigns records to global, country and continent groups
//! - [`render`]: renders TXT, JSON and CSV files in memory
//! - [`stats`]: the summary counts in `data/stats.json`
//! - [`store`]: atomic, parallel publication and stale-file pruning
//! - [`pipeline`]: one complete fetch-to-disk run

#![doc(html_root_url = "https://docs.rs/dnsdir-build/1.0.0")]

pub mod classify;
pub mod pipeline;
pub mod render;
pub mod stats;
pub mod store;

pub use classify::{classify, Classification, ClassifyPolicy};
pub use pipeline::{Pipeline, PipelineConfig, RunReport, Stage};
pub use render::{Artifact, RenderContext};
pub use stats::Stats;
pub use store::OutputStore;
