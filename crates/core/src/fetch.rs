//! Thread page fetching.
//!
//! Pages live at `<thread url>/page-<n>`. The forum redirects requests for a
//! page past the end of the thread to the real last page, which is how the
//! last page number is discovered. Redirects are never followed
//! automatically: the probe needs to see them, and page fetches follow
//! exactly one hop by hand.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::{Client, Response};
use tracing::debug;
use url::Url;

use crate::{Result, ThreadwatchError};

/// Page number requested to provoke the redirect to the last page.
pub const DEFAULT_PROBE_PAGE: u32 = 9999;

/// HTTP client configuration for fetching thread pages.
///
/// This struct controls timeout and user agent settings for HTTP requests.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: "Mozilla/5.0 (compatible; threadwatch/0.3)".to_string(),
        }
    }
}

/// Where thread pages come from.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Highest page number of the thread at `base_url`.
    ///
    /// # Errors
    ///
    /// [`ThreadwatchError::LastPageUnresolved`] when the probe for
    /// `probe_page` is not redirected.
    async fn last_page(&self, base_url: &str, probe_page: u32) -> Result<u32>;

    /// Raw markup of one page of the thread at `base_url`.
    async fn fetch_page(&self, base_url: &str, page: u32) -> Result<String>;
}

/// Builds the URL of one page of a thread.
pub fn page_url(base_url: &str, page: u32) -> Result<Url> {
    let raw = format!("{}/page-{}", base_url.trim_end_matches('/'), page);
    Url::parse(&raw).map_err(|e| ThreadwatchError::InvalidUrl(format!("{raw}: {e}")))
}

/// Extracts the page number from a redirect target such as
/// `/threads/updates.123/page-42#posts`.
///
/// Returns `None` when the target has no `page-<n>` segment.
pub fn parse_page_number(location: &str) -> Option<u32> {
    let start = location.rfind("page-")? + "page-".len();
    let digits: String = location[start..].chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// The last `count` page numbers ending at `last_page`, ascending, never below 1.
pub fn recent_pages(last_page: u32, count: u32) -> std::ops::RangeInclusive<u32> {
    let first = last_page.saturating_sub(count.saturating_sub(1)).max(1);
    first..=last_page.max(1)
}

/// Fetches the most recent pages of a thread, oldest first.
///
/// The first failing page aborts the whole batch.
pub async fn fetch_recent_pages(
    source: &dyn PageSource, base_url: &str, last_page: u32, count: u32,
) -> Result<Vec<(u32, String)>> {
    let mut pages = Vec::new();

    for page in recent_pages(last_page, count) {
        let body = source.fetch_page(base_url, page).await?;
        debug!(page, bytes = body.len(), "fetched page");
        pages.push((page, body));
    }

    Ok(pages)
}

/// [`PageSource`] backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
    timeout: u64,
}

impl HttpPageSource {
    /// Builds the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadwatchError::HttpError`] if the TLS backend cannot be
    /// initialised.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(ThreadwatchError::HttpError)?;

        Ok(Self { client, timeout: config.timeout })
    }

    async fn get(&self, url: Url) -> Result<Response> {
        self.client
            .get(url)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ThreadwatchError::Timeout { timeout: self.timeout }
                } else {
                    ThreadwatchError::HttpError(e)
                }
            })
    }
}

/// Resolves the `Location` of a redirect response against the request URL.
fn redirect_target(response: &Response, request_url: &Url) -> Result<Option<Url>> {
    if !response.status().is_redirection() {
        return Ok(None);
    }

    let Some(location) = response.headers().get(LOCATION) else {
        return Ok(None);
    };

    let location = location
        .to_str()
        .map_err(|e| ThreadwatchError::InvalidUrl(format!("unreadable Location header: {e}")))?;

    request_url
        .join(location)
        .map(Some)
        .map_err(|e| ThreadwatchError::InvalidUrl(format!("{location}: {e}")))
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn last_page(&self, base_url: &str, probe_page: u32) -> Result<u32> {
        let url = page_url(base_url, probe_page)?;
        let response = self.get(url.clone()).await?;

        match redirect_target(&response, &url)? {
            Some(target) => {
                let page = parse_page_number(target.as_str()).unwrap_or(1);
                debug!(%target, page, "resolved last page");
                Ok(page)
            }
            None => Err(ThreadwatchError::LastPageUnresolved { url: base_url.to_string() }),
        }
    }

    async fn fetch_page(&self, base_url: &str, page: u32) -> Result<String> {
        let url = page_url(base_url, page)?;
        let mut response = self.get(url.clone()).await?;

        if let Some(target) = redirect_target(&response, &url)? {
            debug!(%url, %target, "following redirect");
            response = self.get(target).await?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(ThreadwatchError::HttpStatus { url: response.url().to_string(), status: status.as_u16() });
        }

        Ok(response.text().await?)
    }
}
