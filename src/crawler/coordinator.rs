//! Crawler coordinator - run orchestration logic
//!
//! A [`Coordinator`] owns everything one run needs (HTTP client,
//! configuration, deduplication state and cancellation token) and sequences
//! the phases:
//! - Resolving the sitemap into page URLs
//! - Harvesting links from every page
//! - Verifying every distinct link
//!
//! Each phase completes before the next starts.

use crate::config::Config;
use crate::crawler::harvester::{Harvester, Link};
use crate::crawler::pool::run_bounded;
use crate::crawler::sitemap::SitemapResolver;
use crate::crawler::verifier::{VerificationResult, Verifier};
use crate::crawler::build_http_client;
use crate::output::{aggregate, Report};
use crate::state::CrawlState;
use crate::url::QueryPolicy;
use crate::Result;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Pages and links found by the discovery phases
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Distinct pages listed by the sitemap
    pub pages: Vec<Url>,
    /// Distinct links harvested from those pages
    pub links: Vec<Link>,
}

/// Main run coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    client: Client,
    state: Arc<CrawlState>,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `cancel` - Token that aborts the run when cancelled
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(SweepError::HttpClient)` - The HTTP client could not be built
    pub fn new(config: Config, cancel: CancellationToken) -> Result<Self> {
        let client = build_http_client(&config.crawler, &config.user_agent)?;

        Ok(Self {
            config: Arc::new(config),
            client,
            state: Arc::new(CrawlState::new()),
            cancel,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolves the sitemap and harvests the links of every listed page
    pub async fn discover(&self, entrypoint: &Url) -> Result<Discovery> {
        let crawler = &self.config.crawler;
        tracing::info!("Resolving sitemap {}", entrypoint);

        let resolver = SitemapResolver::new(
            self.client.clone(),
            Arc::clone(&self.state),
            crawler.page_concurrency,
            self.cancel.clone(),
        );
        let pages = resolver.resolve(entrypoint).await?;
        tracing::info!(
            "Sitemap lists {} pages ({} URLs fetched or queued)",
            pages.len(),
            self.state.pages.len()
        );

        let harvester = Arc::new(Harvester::new(
            self.client.clone(),
            Arc::clone(&self.state),
            QueryPolicy::from_keep_query(crawler.keep_query),
            Duration::from_millis(crawler.max_random_delay_ms),
        ));

        let harvested = run_bounded(
            pages.clone(),
            crawler.page_concurrency,
            &self.cancel,
            move |page| {
                let harvester = Arc::clone(&harvester);
                async move { harvester.harvest(&page).await }
            },
        )
        .await?;

        let links: Vec<Link> = harvested.into_iter().flatten().collect();
        tracing::info!(
            "Found {} links on {} pages ({} distinct targets registered)",
            links.len(),
            pages.len(),
            self.state.links.len()
        );

        Ok(Discovery { pages, links })
    }

    /// Verifies the given links
    pub async fn verify(&self, links: Vec<Link>) -> Result<Vec<VerificationResult>> {
        let verifier = Verifier::new(
            self.client.clone(),
            self.config.crawler.link_concurrency,
            self.cancel.clone(),
        );
        verifier.verify(links).await
    }

    /// Runs discovery and verification without an operator gate in between
    pub async fn run(&self, entrypoint: &Url) -> Result<(Discovery, Report)> {
        let discovery = self.discover(entrypoint).await?;
        let results = self.verify(discovery.links.clone()).await?;
        Ok((discovery, aggregate(results)))
    }
}
