//! Paginated client for the resolver directory API.

use crate::config::{PageConfig, RetryConfig};
use crate::wire::{ApiServer, ServerPage};
use dnsdir_core::{DnsdirError, ResolverRecord, Result};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::header::RETRY_AFTER;
use reqwest::Client as HttpClient;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default pacing between page requests
const DEFAULT_REQUESTS_PER_SECOND: u32 = 1;

/// Client for the resolver directory listing
#[derive(Clone)]
pub struct DirectoryClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: HttpClient,
    endpoint: Url,
    api_key: Option<String>,
    timeout: Duration,
    pages: PageConfig,
    retry_config: RetryConfig,
    limiter: Option<DefaultDirectRateLimiter>,
}

/// Result of walking every page of the listing
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Converted records of online servers, in upstream order
    pub records: Vec<ResolverRecord>,

    /// Pages requested
    pub pages: u32,

    /// Entries received across all pages
    pub received: usize,

    /// Entries skipped because the server is offline
    pub offline: usize,

    /// Entries skipped because they could not be converted
    pub rejected: usize,
}

impl DirectoryClient {
    /// Create a client for `endpoint` using default settings
    pub fn new(endpoint: impl AsRef<str>) -> Result<Self> {
        DirectoryClientBuilder::new(endpoint).build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder(endpoint: impl AsRef<str>) -> DirectoryClientBuilder {
        DirectoryClientBuilder::new(endpoint)
    }

    /// The listing endpoint
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// Walk the listing page by page until a short page or the page cap.
    ///
    /// Any page that still fails after its retries fails the whole walk;
    /// a partial listing is never returned.
    pub async fn fetch_listing(&self) -> Result<Listing> {
        let PageConfig { per_page, max_pages } = self.inner.pages;
        let mut listing = Listing::default();

        for page in 1..=max_pages {
            let entries = self.fetch_page(page).await?;
            let count = entries.len();
            listing.pages = page;
            listing.received += count;

            for entry in entries {
                let server = match ApiServer::from_value(entry) {
                    Ok(server) => server,
                    Err(e) => {
                        warn!(page, error = %e, "skipping entry");
                        listing.rejected += 1;
                        continue;
                    }
                };
                if !server.online {
                    listing.offline += 1;
                    continue;
                }
                match server.into_record() {
                    Ok(record) => listing.records.push(record),
                    Err(e) => {
                        warn!(page, error = %e, "skipping entry");
                        listing.rejected += 1;
                    }
                }
            }

            info!(page, count, "fetched page");

            if count < per_page as usize {
                break;
            }
            if page == max_pages {
                warn!(max_pages, "page cap reached, listing may be truncated");
            }
        }

        info!(
            pages = listing.pages,
            online = listing.records.len(),
            offline = listing.offline,
            rejected = listing.rejected,
            "listing complete"
        );
        Ok(listing)
    }

    /// Fetch one page (1-indexed), retrying transient failures
    pub async fn fetch_page(&self, page: u32) -> Result<Vec<serde_json::Value>> {
        let mut attempt = 0;
        loop {
            if let Some(limiter) = &self.inner.limiter {
                limiter.until_ready().await;
            }

            match self.request_page(page).await {
                Ok(entries) => return Ok(entries),
                Err(e) if self.inner.retry_config.should_retry(&e, attempt) => {
                    let delay = self.inner.retry_config.delay_for(&e, attempt);
                    attempt += 1;
                    warn!(
                        page,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "page request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Perform a single GET for one page
    async fn request_page(&self, page: u32) -> Result<Vec<serde_json::Value>> {
        let per_page = self.inner.pages.per_page.to_string();
        let page_str = page.to_string();
        let params = [
            ("dns_server_is_online", "true"),
            ("per_page", per_page.as_str()),
            ("page", page_str.as_str()),
            ("sort_by", "country_id"),
        ];
        debug!(url = %self.inner.endpoint, page, "GET request");

        let mut request = self
            .inner
            .http
            .get(self.inner.endpoint.clone())
            .query(&params);
        if let Some(key) = &self.inner.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| self.map_transport(&e))?;
        let status = response.status();

        if !status.is_success() {
            return Err(Self::handle_error(status.as_u16(), response).await);
        }

        let body = response.text().await.map_err(|e| self.map_transport(&e))?;
        let parsed: ServerPage = serde_json::from_str(&body)
            .map_err(|e| DnsdirError::MalformedPayload(format!("page {page}: {e}")))?;
        Ok(parsed.data)
    }

    fn map_transport(&self, e: &reqwest::Error) -> DnsdirError {
        if e.is_timeout() {
            DnsdirError::Timeout(self.inner.timeout.as_secs())
        } else if e.is_connect() {
            DnsdirError::Connection(e.to_string())
        } else {
            DnsdirError::Http(e.to_string())
        }
    }

    /// Convert an error response to a `DnsdirError`
    async fn handle_error(status: u16, response: reqwest::Response) -> DnsdirError {
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response.text().await.unwrap_or_default();

        // Try to parse error message from JSON
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("error")
                    .or_else(|| v.get("message"))
                    .and_then(|e| e.as_str())
                    .map(String::from)
            })
            .unwrap_or(body);

        match status {
            401 | 403 => DnsdirError::Unauthorized,
            429 => {
                warn!("rate limited by upstream");
                DnsdirError::RateLimited { retry_after }
            }
            _ => DnsdirError::Api {
                code: status,
                message,
            },
        }
    }
}

/// Builder for configuring a [`DirectoryClient`]
pub struct DirectoryClientBuilder {
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
    user_agent: String,
    pages: PageConfig,
    retry_config: RetryConfig,
    requests_per_second: Option<u32>,
}

impl DirectoryClientBuilder {
    /// Create a new builder for the given listing endpoint
    #[must_use]
    pub fn new(endpoint: impl AsRef<str>) -> Self {
        Self {
            endpoint: endpoint.as_ref().to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("dnsdir/{}", env!("CARGO_PKG_VERSION")),
            pages: PageConfig::default(),
            retry_config: RetryConfig::default(),
            requests_per_second: Some(DEFAULT_REQUESTS_PER_SECOND),
        }
    }

    /// Send a bearer token with every request
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Set pagination
    #[must_use]
    pub const fn pages(mut self, pages: PageConfig) -> Self {
        self.pages = pages;
        self
    }

    /// Set retry configuration
    #[must_use]
    pub const fn retry(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Pace page requests; `0` disables pacing
    #[must_use]
    pub const fn requests_per_second(mut self, rate: u32) -> Self {
        self.requests_per_second = if rate == 0 { None } else { Some(rate) };
        self
    }

    /// Build the client
    pub fn build(self) -> Result<DirectoryClient> {
        let endpoint = Url::parse(&self.endpoint)
            .map_err(|e| DnsdirError::InvalidUrl(format!("{}: {e}", self.endpoint)))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(DnsdirError::InvalidUrl(format!(
                "{}: only http and https are supported",
                self.endpoint
            )));
        }
        if self.pages.per_page == 0 || self.pages.max_pages == 0 {
            return Err(DnsdirError::Config(
                "per_page and max_pages must be greater than 0".into(),
            ));
        }

        let http = HttpClient::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .gzip(true)
            .build()
            .map_err(|e| DnsdirError::Http(format!("failed to build HTTP client: {e}")))?;

        let limiter = self
            .requests_per_second
            .and_then(NonZeroU32::new)
            .map(|rate| RateLimiter::direct(Quota::per_second(rate)));

        Ok(DirectoryClient {
            inner: Arc::new(ClientInner {
                http,
                endpoint,
                api_key: self.api_key.filter(|k| !k.is_empty()),
                timeout: self.timeout,
                pages: self.pages,
                retry_config: self.retry_config,
                limiter,
            }),
        })
    }
}
