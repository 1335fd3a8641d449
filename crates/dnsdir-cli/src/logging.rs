//! Log subscriber setup. Logs go to stderr so stdout only carries command
//! output.

use anyhow::Result;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

/// HTTP stack crates that are capped at `warn` unless `RUST_LOG` says otherwise
const NOISY_CRATES: [&str; 5] = ["hyper", "hyper_util", "reqwest", "rustls", "h2"];

/// The filter directive for the given flags.
///
/// `-q` and `-v` win over everything, then `RUST_LOG`, then the configured
/// level.
#[must_use]
pub fn directive(configured: &str, verbose: u8, quiet: bool, rust_log: Option<&str>) -> String {
    if quiet {
        return "error".to_string();
    }
    match verbose {
        0 => rust_log
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(configured)
            .to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Install the global subscriber
pub fn init(configured: &str, verbose: u8, quiet: bool, ansi: bool) -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = directive(configured, verbose, quiet, rust_log.as_deref());

    let mut filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(&directive);
    for name in NOISY_CRATES {
        if !directive.contains(name) {
            filter = filter.add_directive(format!("{name}=warn").parse()?);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_target(verbose > 0)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_precedence() {
        assert_eq!(directive("info", 0, false, None), "info");
        assert_eq!(directive("info", 0, false, Some("dnsdir_client=trace")), "dnsdir_client=trace");
        assert_eq!(directive("info", 0, false, Some(" ")), "info");
        assert_eq!(directive("info", 1, false, Some("warn")), "debug");
        assert_eq!(directive("info", 3, false, None), "trace");
        assert_eq!(directive("debug", 2, true, None), "error");
    }
}
