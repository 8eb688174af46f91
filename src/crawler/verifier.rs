//! Link verification
//!
//! Every distinct link is checked in two bounded passes. The existence check
//! sends HEAD; links whose HEAD failed at the transport level are retried with
//! GET once the whole first pass has drained.

use crate::crawler::fetcher::{describe_error, get_status, head_status};
use crate::crawler::harvester::Link;
use crate::crawler::pool::run_bounded;
use crate::Result;
use reqwest::Client;
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Final classification of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// 2xx answer
    Healthy,
    /// Any other status
    HttpError,
    /// No response at all, even after the GET retry
    NetworkError,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::HttpError => write!(f, "http_error"),
            Self::NetworkError => write!(f, "network_error"),
        }
    }
}

/// Classifies a status code: `[200, 299]` is healthy, anything else is not
pub fn classify_status(status: u16) -> Outcome {
    if (200..=299).contains(&status) {
        Outcome::Healthy
    } else {
        Outcome::HttpError
    }
}

/// The verdict for one distinct link target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub origin_page_url: String,
    pub origin_anchor_text: String,
    pub target_url: String,
    /// `None` when no response was received
    pub status_code: Option<u16>,
    pub outcome: Outcome,
    /// Transport failure description for network errors
    pub error: Option<String>,
}

impl VerificationResult {
    pub fn from_status(link: Link, status: u16) -> Self {
        Self {
            origin_page_url: link.origin_page_url,
            origin_anchor_text: link.origin_anchor_text,
            target_url: link.target_url,
            status_code: Some(status),
            outcome: classify_status(status),
            error: None,
        }
    }

    pub fn network_error(link: Link, description: String) -> Self {
        Self {
            origin_page_url: link.origin_page_url,
            origin_anchor_text: link.origin_anchor_text,
            target_url: link.target_url,
            status_code: None,
            outcome: Outcome::NetworkError,
            error: Some(description),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.outcome == Outcome::Healthy
    }

    /// Formats the result as a report line
    ///
    /// `HTTP 404 for <target> (linked from <origin> with text <text>)`, or
    /// `Network error (<description>) for ...` when nothing answered.
    pub fn detail_line(&self) -> String {
        let cause = match (self.status_code, &self.error) {
            (Some(status), _) => format!("HTTP {}", status),
            (None, Some(description)) => format!("Network error ({})", description),
            (None, None) => "Network error".to_string(),
        };

        format!(
            "{} for {} (linked from {} with text {})",
            cause, self.target_url, self.origin_page_url, self.origin_anchor_text
        )
    }
}

/// Result of the existence check for one link
enum Attempt {
    Final(VerificationResult),
    Retry(Link, String),
}

async fn existence_check(client: Client, link: Link) -> Attempt {
    match head_status(&client, &link.target_url).await {
        Ok(status) => {
            tracing::debug!("HEAD {} -> {}", link.target_url, status);
            Attempt::Final(VerificationResult::from_status(link, status))
        }
        Err(e) => Attempt::Retry(link, describe_error(&e)),
    }
}

async fn fallback_fetch(client: Client, link: Link) -> VerificationResult {
    match get_status(&client, &link.target_url).await {
        Ok(status) => {
            tracing::debug!("GET {} -> {}", link.target_url, status);
            VerificationResult::from_status(link, status)
        }
        Err(e) => {
            let description = describe_error(&e);
            tracing::debug!("GET {} failed: {}", link.target_url, description);
            VerificationResult::network_error(link, description)
        }
    }
}

/// Two-phase link verifier
pub struct Verifier {
    client: Client,
    concurrency: usize,
    cancel: CancellationToken,
}

impl Verifier {
    pub fn new(client: Client, concurrency: usize, cancel: CancellationToken) -> Self {
        Self {
            client,
            concurrency,
            cancel,
        }
    }

    /// Verifies every link, producing exactly one result per link
    pub async fn verify(&self, links: Vec<Link>) -> Result<Vec<VerificationResult>> {
        let total = links.len();
        tracing::info!("Checking {} links with HEAD", total);

        let client = self.client.clone();
        let attempts = run_bounded(links, self.concurrency, &self.cancel, move |link| {
            existence_check(client.clone(), link)
        })
        .await?;

        let mut results = Vec::with_capacity(total);
        let mut retry = Vec::new();
        for attempt in attempts {
            match attempt {
                Attempt::Final(result) => results.push(result),
                Attempt::Retry(link, reason) => {
                    tracing::debug!("HEAD {} failed: {}", link.target_url, reason);
                    retry.push(link);
                }
            }
        }

        if !retry.is_empty() {
            tracing::info!("Retrying {} links with GET", retry.len());

            let client = self.client.clone();
            let retried = run_bounded(retry, self.concurrency, &self.cancel, move |link| {
                fallback_fetch(client.clone(), link)
            })
            .await?;
            results.extend(retried);
        }

        tracing::info!("Verified {} links", results.len());
        Ok(results)
    }
}
