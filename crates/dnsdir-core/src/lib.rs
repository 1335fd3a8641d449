//! Core types for the public DNS resolver list generator.
//!
//! This crate provides the foundational types shared by the fetcher, the
//! list builder and the CLI:
//!
//! - **Types**: [`ResolverRecord`], the deduplicated [`RecordSet`], the
//!   validated [`CountryCode`] / [`Continent`] codes and the [`GroupKey`]
//!   buckets every output file is named after
//! - **Layout**: the fixed, consumer-facing output paths in [`layout`]
//! - **Errors**: the single error taxonomy [`DnsdirError`]
//!
//! # Example
//!
//! ```rust,ignore
//! use dnsdir_core::{RecordSet, ResolverRecord};
//!
//! let record = ResolverRecord::new("8.8.8.8".parse()?).with_country("US", Some("United States"));
//! let (set, duplicates) = RecordSet::from_records(vec![record]);
//! assert_eq!(set.len(), 1);
//! assert_eq!(duplicates, 0);
//! ```

#![doc(html_root_url = "https://docs.rs/dnsdir-core/1.0.0")]

mod error;
pub mod layout;
pub mod types;

pub use error::{DnsdirError, Result};
pub use types::*;
