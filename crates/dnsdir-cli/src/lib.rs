//! # dnsdir-cli
//!
//! Command-line front end for the resolver list generator.
//!
//! ## Features
//!
//! - **generate**: fetch the directory listing and publish the list tree
//! - **stats**: print the statistics of the current listing without writing
//! - **config**: inspect and initialize the TOML configuration file
//! - **Multiple output formats**: pretty tables, JSON, YAML

pub mod cli;
pub mod config;
pub mod logging;
pub mod output;

pub use cli::run;
