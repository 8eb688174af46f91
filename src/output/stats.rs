//! Run statistics
//!
//! This module collects the figures of a finished run and prints the
//! completion summary.

use crate::crawler::{Discovery, Outcome};
use crate::output::Report;
use std::path::PathBuf;
use std::time::Duration;

/// Figures describing one completed run
#[derive(Debug, Clone)]
pub struct RunStatistics {
    /// Number of distinct pages listed by the sitemap
    pub pages_crawled: usize,

    /// Number of distinct links harvested from those pages
    pub links_found: usize,

    /// Number of links that were verified
    pub links_checked: usize,

    /// Links answering with a non-2xx status
    pub http_errors: usize,

    /// Links that never answered
    pub network_errors: usize,

    /// Wall-clock time of the run
    pub elapsed: Duration,

    /// Error log written for this run, if any
    pub log_path: Option<PathBuf>,
}

impl RunStatistics {
    pub fn collect(
        discovery: &Discovery,
        report: &Report,
        elapsed: Duration,
        log_path: Option<PathBuf>,
    ) -> Self {
        let counts = report.outcome_counts();
        let count = |outcome: Outcome| counts.get(&outcome).copied().unwrap_or(0);

        Self {
            pages_crawled: discovery.pages.len(),
            links_found: discovery.links.len(),
            links_checked: report.total(),
            http_errors: count(Outcome::HttpError),
            network_errors: count(Outcome::NetworkError),
            elapsed,
            log_path,
        }
    }

    pub fn error_count(&self) -> usize {
        self.http_errors + self.network_errors
    }
}

/// Prints the completion summary to stdout
///
/// # Arguments
///
/// * `stats` - The statistics to display
/// * `report` - Its failing detail lines are echoed before the figures
pub fn print_statistics(stats: &RunStatistics, report: &Report) {
    if report.has_errors() {
        println!("=== Failing Links ===\n");
        for line in report.error_lines() {
            println!("  {}", line);
        }
        println!();
    }

    println!("=== Sweep Summary ===\n");
    println!("  Pages crawled: {}", stats.pages_crawled);
    println!("  Links found: {}", stats.links_found);
    println!("  Links checked: {}", stats.links_checked);
    println!(
        "  Errors: {} ({} HTTP, {} network)",
        stats.error_count(),
        stats.http_errors,
        stats.network_errors
    );
    println!("  Execution time: {:.2?}", stats.elapsed);

    if let Some(path) = &stats.log_path {
        println!("  Error log: {}", path.display());
    }
    println!();

    println!(
        "A total of {} links on {} pages was checked and {} produced errors",
        stats.links_checked,
        stats.pages_crawled,
        stats.error_count()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{Link, VerificationResult};
    use crate::output::aggregate;
    use url::Url;

    fn link(target: &str) -> Link {
        Link {
            origin_page_url: "https://example.com/".to_string(),
            origin_anchor_text: "text".to_string(),
            target_url: target.to_string(),
        }
    }

    #[test]
    fn test_collect_statistics() {
        let links = vec![
            link("https://example.com/a"),
            link("https://example.com/b"),
            link("https://example.com/c"),
        ];
        let discovery = Discovery {
            pages: vec![Url::parse("https://example.com/").unwrap()],
            links: links.clone(),
        };
        let report = aggregate(vec![
            VerificationResult::from_status(links[0].clone(), 200),
            VerificationResult::from_status(links[1].clone(), 410),
            VerificationResult::network_error(links[2].clone(), "dns error".to_string()),
        ]);

        let stats = RunStatistics::collect(&discovery, &report, Duration::from_secs(2), None);

        assert_eq!(stats.pages_crawled, 1);
        assert_eq!(stats.links_found, 3);
        assert_eq!(stats.links_checked, 3);
        assert_eq!(stats.http_errors, 1);
        assert_eq!(stats.network_errors, 1);
        assert_eq!(stats.error_count(), 2);
    }
}
