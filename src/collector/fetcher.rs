//! HTTP fetching for page-number sources
//!
//! This module handles:
//! - Building HTTP clients with the configured user agent string
//! - GET requests for single pages
//! - Mapping network failures and non-success statuses to `SourceError`

use crate::config::UserAgentConfig;
use crate::{SourceError, SourceResult};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use review_harvest::config::UserAgentConfig;
/// use review_harvest::collector::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "review-harvest".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "ops@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    // Format: Name/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches one page
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx | `Ok(FetchedPage)` |
/// | Other status | `SourceError::Status` |
/// | Timeout, connection or body error | `SourceError::Http` |
pub async fn fetch_page(client: &Client, url: &str) -> SourceResult<FetchedPage> {
    let http_error = |source| SourceError::Http {
        url: url.to_string(),
        source,
    };

    let response = client.get(url).send().await.map_err(http_error)?;
    let status = response.status();
    let final_url = response.url().to_string();

    if !status.is_success() {
        return Err(SourceError::Status {
            url: final_url,
            status: status.as_u16(),
        });
    }

    let body = response.text().await.map_err(http_error)?;

    Ok(FetchedPage {
        url: final_url,
        status: status.as_u16(),
        body,
    })
}
