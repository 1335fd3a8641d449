//! Client configuration types.

use dnsdir_core::DnsdirError;
use std::time::Duration;

/// Retry configuration for failed page requests
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,

    /// Initial backoff duration
    pub initial_backoff: Duration,

    /// Maximum backoff duration
    pub max_backoff: Duration,

    /// Whether to retry on rate limit errors
    pub retry_on_rate_limit: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryConfig {
    /// Three retries, starting at 30 seconds. Upstream hiccups tend to last
    /// longer than a typical client backoff.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(30),
            max_backoff: Duration::from_secs(120),
            retry_on_rate_limit: true,
        }
    }

    /// No retries at all
    #[must_use]
    pub const fn disabled() -> Self {
        Self::new().max_retries(0)
    }

    /// Set maximum retries
    #[must_use]
    pub const fn max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    /// Set initial backoff duration
    #[must_use]
    pub const fn initial_backoff(mut self, duration: Duration) -> Self {
        self.initial_backoff = duration;
        self
    }

    /// Set maximum backoff duration
    #[must_use]
    pub const fn max_backoff(mut self, duration: Duration) -> Self {
        self.max_backoff = duration;
        self
    }

    /// Set whether HTTP 429 responses are retried
    #[must_use]
    pub const fn retry_on_rate_limit(mut self, retry: bool) -> Self {
        self.retry_on_rate_limit = retry;
        self
    }

    /// Calculate backoff for a given attempt
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let initial = u64::try_from(self.initial_backoff.as_millis()).unwrap_or(u64::MAX);
        let max = u64::try_from(self.max_backoff.as_millis()).unwrap_or(u64::MAX);
        let backoff = initial.saturating_mul(2u64.saturating_pow(attempt));
        Duration::from_millis(backoff.min(max))
    }

    /// Delay before retrying after `error` on attempt `attempt` (0-based).
    ///
    /// A server `Retry-After` is honoured but never beyond `max_backoff`.
    #[must_use]
    pub fn delay_for(&self, error: &DnsdirError, attempt: u32) -> Duration {
        match error {
            DnsdirError::RateLimited {
                retry_after: Some(secs),
            } => Duration::from_secs(*secs).min(self.max_backoff),
            _ => self.backoff_for(attempt),
        }
    }

    /// Whether `error`, seen on attempt number `attempt` (0-based), is retried
    #[must_use]
    pub const fn should_retry(&self, error: &DnsdirError, attempt: u32) -> bool {
        if attempt >= self.max_retries {
            return false;
        }
        match error {
            DnsdirError::RateLimited { .. } => self.retry_on_rate_limit,
            other => other.is_retryable(),
        }
    }
}

/// Pagination settings for the directory listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageConfig {
    /// Entries requested per page; a shorter page ends the listing
    pub per_page: u32,

    /// Upper bound on pages fetched in one run
    pub max_pages: u32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            per_page: 1000,
            max_pages: 1000,
        }
    }
}
