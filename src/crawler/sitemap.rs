//! Sitemap resolution
//!
//! Turns a sitemap entrypoint into the flat list of page URLs it describes.
//! Sitemap indices are followed recursively; every child is resolved
//! concurrently, while the number of simultaneous document fetches stays
//! bounded by the page concurrency gate.

use crate::crawler::fetcher::fetch_text;
use crate::state::CrawlState;
use crate::url::parse_location;
use crate::{Result, SweepError};
use futures::future::{join_all, BoxFuture, FutureExt};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Shape of a parsed sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// `<sitemapindex>`: every `<loc>` names another sitemap
    Index(Vec<String>),
    /// `<urlset>`: every `<loc>` names a page
    UrlSet(Vec<String>),
    /// Neither `<sitemap>` nor `<url>` entries were found
    Empty,
}

/// Parses sitemap XML
///
/// Tags are matched by local name, so namespaced documents (`<sm:loc>`) work.
/// Only a `<loc>` that is a direct child of `<url>` or `<sitemap>` counts;
/// extension elements such as `<image:loc>` are skipped. `<loc>` values are
/// trimmed and unescaped. A document with any `<sitemap>` entry is treated as
/// an index; otherwise `<url>` entries make it a URL set.
///
/// # Returns
///
/// * `Ok(SitemapDocument)` - The classified document
/// * `Err(String)` - The XML is malformed
pub fn parse_sitemap(xml: &str) -> std::result::Result<SitemapDocument, String> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    // Local names of the currently open elements
    let mut open: Vec<Vec<u8>> = Vec::new();
    let mut in_loc = false;
    let mut loc = String::new();
    let mut sitemaps = Vec::new();
    let mut pages = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.local_name().as_ref().to_vec();
                if name == b"loc" {
                    in_loc = matches!(
                        open.last().map(Vec::as_slice),
                        Some(b"url") | Some(b"sitemap")
                    );
                    loc.clear();
                }
                open.push(name);
            }
            Ok(Event::Text(e)) if in_loc => {
                let text = e.unescape().map_err(|e| e.to_string())?;
                loc.push_str(&text);
            }
            Ok(Event::CData(e)) if in_loc => {
                loc.push_str(&String::from_utf8_lossy(&e));
            }
            Ok(Event::End(e)) => {
                open.pop();
                if in_loc && e.local_name().as_ref() == b"loc" {
                    in_loc = false;
                    let value = loc.trim();
                    if !value.is_empty() {
                        match open.last().map(Vec::as_slice) {
                            Some(b"sitemap") => sitemaps.push(value.to_string()),
                            Some(b"url") => pages.push(value.to_string()),
                            _ => {}
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "malformed XML at position {}: {}",
                    reader.buffer_position(),
                    e
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    if !sitemaps.is_empty() {
        if !pages.is_empty() {
            tracing::debug!(
                "Ignoring {} <url> entries inside a sitemap index",
                pages.len()
            );
        }
        Ok(SitemapDocument::Index(sitemaps))
    } else if !pages.is_empty() {
        Ok(SitemapDocument::UrlSet(pages))
    } else {
        Ok(SitemapDocument::Empty)
    }
}

/// Recursive sitemap resolver
///
/// Every sitemap and page URL is claimed in the page registry before it is
/// followed, which also terminates cyclic indices.
pub struct SitemapResolver {
    client: Client,
    state: Arc<CrawlState>,
    gate: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl SitemapResolver {
    pub fn new(
        client: Client,
        state: Arc<CrawlState>,
        concurrency: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            state,
            gate: Arc::new(Semaphore::new(concurrency.max(1))),
            cancel,
        }
    }

    /// Resolves the entrypoint into the list of page URLs
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Url>)` - Distinct pages in the order they were discovered
    /// * `Err(SweepError::Fetch | SweepError::UnexpectedStatus)` - The entrypoint could not be retrieved
    /// * `Err(SweepError::Cancelled)` - The run was cancelled
    pub async fn resolve(&self, entrypoint: &Url) -> Result<Vec<Url>> {
        self.state.pages.register(entrypoint.as_str());
        let pages = self.resolve_node(entrypoint.clone(), true).await?;

        if self.cancel.is_cancelled() {
            return Err(SweepError::Cancelled);
        }

        Ok(pages)
    }

    fn resolve_node(&self, url: Url, is_root: bool) -> BoxFuture<'_, Result<Vec<Url>>> {
        async move {
            let body = match self.fetch(&url).await {
                Ok(body) => body,
                Err(SweepError::Cancelled) => return Err(SweepError::Cancelled),
                Err(e) if is_root => return Err(e),
                Err(e) => {
                    tracing::warn!("Skipping child sitemap: {}", e);
                    return Ok(Vec::new());
                }
            };

            let document = match parse_sitemap(&body) {
                Ok(document) => document,
                Err(message) => {
                    let error = SweepError::SitemapParse {
                        url: url.to_string(),
                        message,
                    };
                    tracing::warn!("{}", error);
                    return Ok(Vec::new());
                }
            };

            match document {
                SitemapDocument::Index(locations) => {
                    let children = self.claim(&url, locations);
                    tracing::info!(
                        "Sitemap index {} lists {} new sitemaps",
                        url,
                        children.len()
                    );

                    let nested =
                        join_all(children.into_iter().map(|child| self.resolve_node(child, false)))
                            .await;

                    let mut pages = Vec::new();
                    for result in nested {
                        pages.extend(result?);
                    }
                    Ok(pages)
                }
                SitemapDocument::UrlSet(locations) => {
                    let pages = self.claim(&url, locations);
                    tracing::info!("Sitemap {} lists {} new pages", url, pages.len());
                    Ok(pages)
                }
                SitemapDocument::Empty => {
                    tracing::warn!(
                        "Sitemap {} is neither a sitemap index nor a URL set; empty result",
                        url
                    );
                    Ok(Vec::new())
                }
            }
        }
        .boxed()
    }

    /// Parses `<loc>` values and keeps those not yet in the page registry
    fn claim(&self, source: &Url, locations: Vec<String>) -> Vec<Url> {
        locations
            .into_iter()
            .filter_map(|loc| match parse_location(&loc) {
                Some(url) => Some(url),
                None => {
                    tracing::debug!("Ignoring invalid <loc> {:?} in {}", loc, source);
                    None
                }
            })
            .filter(|url| self.state.pages.register(url.as_str()))
            .collect()
    }

    /// Fetches one document while holding a gate permit
    async fn fetch(&self, url: &Url) -> Result<String> {
        let _permit = tokio::select! {
            _ = self.cancel.cancelled() => return Err(SweepError::Cancelled),
            permit = self.gate.acquire() => permit.map_err(|_| SweepError::Cancelled)?,
        };

        tracing::debug!("Fetching sitemap {}", url);
        tokio::select! {
            _ = self.cancel.cancelled() => Err(SweepError::Cancelled),
            body = fetch_text(&self.client, url.as_str()) => body,
        }
    }
}
