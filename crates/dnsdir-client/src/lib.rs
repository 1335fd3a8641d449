//! HTTP client for the dnsdirectory.com resolver listing.
//!
//! [`DirectoryClient`] walks the paginated server listing, keeps the online
//! servers and converts them into [`dnsdir_core::ResolverRecord`]s.
//! [`SnapshotSource`] replays a previously written `resolvers.json`. Both
//! implement [`ResolverSource`], which is all the list builder needs.

#![doc(html_root_url = "https://docs.rs/dnsdir-client/1.0.0")]

mod client;
mod config;
mod source;
pub mod wire;

pub use client::{DirectoryClient, DirectoryClientBuilder, Listing};
pub use config::*;
pub use dnsdir_core::{DnsdirError, Result};
pub use source::{ResolverSource, SnapshotSource};
