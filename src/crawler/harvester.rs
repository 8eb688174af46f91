//! Page link harvesting
//!
//! This module fetches the pages listed by the sitemap and turns their
//! `<a href>` elements into deduplicated [`Link`]s.

use crate::crawler::fetcher::fetch_text;
use crate::state::CrawlState;
use crate::url::{normalize_link, QueryPolicy};
use rand::Rng;
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// A hyperlink discovered on a page
///
/// Only the first page to reference a target gets recorded as its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Page the link was found on
    pub origin_page_url: String,
    /// Visible text of the anchor, whitespace collapsed
    pub origin_anchor_text: String,
    /// Normalized absolute target
    pub target_url: String,
}

/// A raw anchor as it appears in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub href: String,
    pub text: String,
}

/// Extracts every `<a href>` from an HTML document
///
/// Anchor text is trimmed and inner runs of whitespace are collapsed to a
/// single space.
///
/// # Example
///
/// ```
/// use sitemap_sweep::crawler::extract_anchors;
///
/// let anchors = extract_anchors(r#"<p><a href="/docs">Read
///     the  docs</a></p>"#);
/// assert_eq!(anchors[0].href, "/docs");
/// assert_eq!(anchors[0].text, "Read the docs");
/// ```
pub fn extract_anchors(html: &str) -> Vec<Anchor> {
    let document = Html::parse_document(html);

    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            Some(Anchor {
                href: href.to_string(),
                text: collapse_whitespace(&element.text().collect::<String>()),
            })
        })
        .collect()
}

/// Returns the document's `<base href>` resolved against the page URL
pub fn document_base(html: &str, page_url: &Url) -> Url {
    let document = Html::parse_document(html);

    Selector::parse("base[href]")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .and_then(|element| element.value().attr("href"))
                .and_then(|href| page_url.join(href.trim()).ok())
        })
        .unwrap_or_else(|| page_url.clone())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fetches pages and admits their links into the run's link registry
pub struct Harvester {
    client: Client,
    state: Arc<CrawlState>,
    policy: QueryPolicy,
    max_delay: Duration,
}

impl Harvester {
    pub fn new(
        client: Client,
        state: Arc<CrawlState>,
        policy: QueryPolicy,
        max_delay: Duration,
    ) -> Self {
        Self {
            client,
            state,
            policy,
            max_delay,
        }
    }

    /// Harvests the links of one page
    ///
    /// Waits a random delay first. A page that cannot be fetched, or answers
    /// with a non-2xx status, contributes no links.
    pub async fn harvest(&self, page_url: &Url) -> Vec<Link> {
        let delay = random_delay(self.max_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let body = match fetch_text(&self.client, page_url.as_str()).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Skipping page: {}", e);
                return Vec::new();
            }
        };

        let links = self.admit(page_url, &body);
        tracing::info!("Link scraping {} found {} new links", page_url, links.len());
        links
    }

    /// Normalizes the anchors of a fetched page and registers new targets
    ///
    /// Registration happens per target under the registry lock, so two pages
    /// harvested at the same time never both admit the same target.
    pub fn admit(&self, page_url: &Url, html: &str) -> Vec<Link> {
        let base = document_base(html, page_url);

        extract_anchors(html)
            .into_iter()
            .filter_map(|anchor| {
                let target_url = normalize_link(&base, &anchor.href, self.policy)?;
                if !self.state.links.register(&target_url) {
                    return None;
                }
                Some(Link {
                    origin_page_url: page_url.to_string(),
                    origin_anchor_text: anchor.text,
                    target_url,
                })
            })
            .collect()
    }
}

/// Picks a delay uniformly from `[0, max]` at millisecond resolution
fn random_delay(max: Duration) -> Duration {
    let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CrawlerConfig, UserAgentConfig};
    use crate::crawler::build_http_client;

    fn harvester(policy: QueryPolicy) -> Harvester {
        let client =
            build_http_client(&CrawlerConfig::default(), &UserAgentConfig::default()).unwrap();
        Harvester::new(client, Arc::new(CrawlState::new()), policy, Duration::ZERO)
    }

    fn page() -> Url {
        Url::parse("https://example.com/blog/").unwrap()
    }

    #[test]
    fn test_extract_anchor_text_collapsed() {
        let html = r#"<a href="/a">
            Hello
            <b>World</b>
        </a>"#;
        let anchors = extract_anchors(html);
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].text, "Hello World");
    }

    #[test]
    fn test_anchor_without_href_ignored() {
        let anchors = extract_anchors(r#"<a name="top">Top</a><a href="/x">X</a>"#);
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].href, "/x");
    }

    #[test]
    fn test_admit_resolves_and_filters() {
        let html = r##"
            <a href="post-1">First</a>
            <a href="/about#team">About</a>
            <a href="mailto:hi@example.com">Mail</a>
            <a href="#comments">Comments</a>
            <a href="">Self</a>
            <a href="https://other.org/x?utm_source=blog">Other</a>
        "##;

        let links = harvester(QueryPolicy::Strip).admit(&page(), html);
        let targets: Vec<_> = links.iter().map(|l| l.target_url.as_str()).collect();

        assert_eq!(
            targets,
            vec![
                "https://example.com/blog/post-1",
                "https://example.com/about",
                "https://other.org/x",
            ]
        );
        assert_eq!(links[0].origin_page_url, "https://example.com/blog/");
        assert_eq!(links[0].origin_anchor_text, "First");
    }

    #[test]
    fn test_admit_dedups_within_and_across_pages() {
        let harvester = harvester(QueryPolicy::Strip);
        let first = Url::parse("https://example.com/one").unwrap();
        let second = Url::parse("https://example.com/two").unwrap();

        let links = harvester.admit(
            &first,
            r#"<a href="/shared">A</a><a href="/shared?x=1">B</a>"#,
        );
        assert_eq!(links.len(), 1);

        let links = harvester.admit(&second, r#"<a href="/shared">C</a>"#);
        assert!(links.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_admit_of_same_page_yields_each_target_once() {
        let harvester = Arc::new(harvester(QueryPolicy::Strip));
        let html: String = (0..50)
            .map(|i| format!(r#"<a href="/post-{}">Post {}</a>"#, i, i))
            .collect();
        let html = Arc::new(html);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let harvester = harvester.clone();
                let html = html.clone();
                tokio::spawn(async move { harvester.admit(&page(), &html) })
            })
            .collect();

        let mut links = Vec::new();
        for task in futures::future::join_all(tasks).await {
            links.extend(task.unwrap());
        }

        let targets: std::collections::HashSet<_> =
            links.iter().map(|l| l.target_url.clone()).collect();
        assert_eq!(links.len(), 50);
        assert_eq!(targets.len(), 50);
    }

    #[test]
    fn test_admit_keep_query_distinguishes_targets() {
        let links = harvester(QueryPolicy::Keep).admit(
            &page(),
            r#"<a href="/list?page=1">1</a><a href="/list?page=2">2</a>"#,
        );
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn test_base_href_is_honored() {
        let html = r#"<head><base href="https://cdn.example.com/docs/"></head>
            <a href="guide">Guide</a>"#;
        let links = harvester(QueryPolicy::Strip).admit(&page(), html);
        assert_eq!(links[0].target_url, "https://cdn.example.com/docs/guide");
    }

    #[test]
    fn test_random_delay_bounds() {
        assert_eq!(random_delay(Duration::ZERO), Duration::ZERO);
        for _ in 0..100 {
            assert!(random_delay(Duration::from_millis(50)) <= Duration::from_millis(50));
        }
    }
}
