use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Sitemap-Sweep
///
/// Every section and key is optional; missing values fall back to the
/// defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of concurrent sitemap and page fetches
    #[serde(rename = "page-concurrency")]
    pub page_concurrency: usize,

    /// Maximum number of concurrent link verifications
    #[serde(rename = "link-concurrency")]
    pub link_concurrency: usize,

    /// Timeout applied to every individual request (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Upper bound of the random delay before each page fetch (milliseconds)
    #[serde(rename = "max-random-delay-ms")]
    pub max_random_delay_ms: u64,

    /// Maximum number of redirects followed per request
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,

    /// Keep query strings in link targets instead of dropping them
    #[serde(rename = "keep-query")]
    pub keep_query: bool,
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            page_concurrency: 50,
            link_concurrency: 10,
            request_timeout_secs: 30,
            max_random_delay_ms: 3000,
            max_redirects: 10,
            keep_query: false,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SitemapSweep".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the error log of a run
    #[serde(rename = "logs-dir")]
    pub logs_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            logs_dir: "./logs".to_string(),
        }
    }
}
