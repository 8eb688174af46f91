//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests of a run:
//! - Building the shared client with the identifying user agent
//! - Fetching sitemap and page bodies
//! - HEAD and GET status probes used by link verification
//! - Describing transport failures for the error log

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::{Result, SweepError};
use reqwest::{redirect::Policy, Client};

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `crawler` - Timeout and redirect limits
/// * `user_agent` - Identification sent with every request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use sitemap_sweep::config::{CrawlerConfig, UserAgentConfig};
/// use sitemap_sweep::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default(), &UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(crawler.request_timeout())
        .redirect(Policy::limited(crawler.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a document body, requiring a 2xx answer
///
/// # Returns
///
/// * `Ok(String)` - Response body
/// * `Err(SweepError::Fetch)` - Transport failure or unreadable body
/// * `Err(SweepError::UnexpectedStatus)` - Non-2xx status
pub async fn fetch_text(client: &Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| SweepError::Fetch {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(SweepError::UnexpectedStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|source| SweepError::Fetch {
        url: url.to_string(),
        source,
    })
}

/// Sends a HEAD request and returns the final status code
pub async fn head_status(client: &Client, url: &str) -> std::result::Result<u16, reqwest::Error> {
    let response = client.head(url).send().await?;
    Ok(response.status().as_u16())
}

/// Sends a GET request, drains the body and returns the final status code
///
/// The body is read chunk by chunk and discarded. A failure while draining
/// does not change the outcome since the status has already arrived.
pub async fn get_status(client: &Client, url: &str) -> std::result::Result<u16, reqwest::Error> {
    let mut response = client.get(url).send().await?;
    let status = response.status().as_u16();

    loop {
        match response.chunk().await {
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(e) => {
                tracing::debug!("Stopped draining body of {}: {}", url, e);
                break;
            }
        }
    }

    Ok(status)
}

/// Produces a short description of a transport failure
pub fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_redirect() {
        format!("redirect error: {}", root_cause(error))
    } else if error.is_connect() {
        format!("connection failed: {}", root_cause(error))
    } else {
        root_cause(error)
    }
}

/// The innermost error message, which is usually the informative one
fn root_cause(error: &reqwest::Error) -> String {
    let mut current: &dyn std::error::Error = error;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}
