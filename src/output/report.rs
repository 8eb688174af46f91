use crate::crawler::{Outcome, VerificationResult};
use std::collections::HashMap;

/// Verification results partitioned into healthy and failing links
///
/// Both partitions keep the order in which results arrived.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub healthy: Vec<VerificationResult>,
    pub failing: Vec<VerificationResult>,
}

/// Partitions verification results
///
/// `http_error` and `network_error` results both count as failing.
///
/// # Example
///
/// ```
/// use sitemap_sweep::crawler::{Link, VerificationResult};
/// use sitemap_sweep::output::aggregate;
///
/// let link = Link {
///     origin_page_url: "https://example.com/".to_string(),
///     origin_anchor_text: "Home".to_string(),
///     target_url: "https://example.com/missing".to_string(),
/// };
/// let report = aggregate(vec![VerificationResult::from_status(link, 404)]);
/// assert_eq!(report.error_count(), 1);
/// ```
pub fn aggregate(results: Vec<VerificationResult>) -> Report {
    let (healthy, failing): (Vec<_>, Vec<_>) = results.into_iter().partition(|r| r.is_healthy());
    Report { healthy, failing }
}

impl Report {
    /// Number of links checked
    pub fn total(&self) -> usize {
        self.healthy.len() + self.failing.len()
    }

    pub fn healthy_count(&self) -> usize {
        self.healthy.len()
    }

    pub fn error_count(&self) -> usize {
        self.failing.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.failing.is_empty()
    }

    /// Number of results per outcome
    pub fn outcome_counts(&self) -> HashMap<Outcome, usize> {
        let mut counts = HashMap::new();
        for result in self.healthy.iter().chain(&self.failing) {
            *counts.entry(result.outcome).or_insert(0) += 1;
        }
        counts
    }

    /// Detail lines of the failing results
    pub fn error_lines(&self) -> Vec<String> {
        self.failing.iter().map(|r| r.detail_line()).collect()
    }
}
