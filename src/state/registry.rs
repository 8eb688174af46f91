use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A thread-safe set of URLs that have already been claimed
///
/// Check-and-insert happens under a single lock acquisition, so when several
/// tasks race to register the same URL exactly one of them wins.
#[derive(Debug, Default)]
pub struct UrlRegistry {
    seen: Mutex<HashSet<String>>,
}

impl UrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a URL
    ///
    /// # Returns
    ///
    /// * `true` - The URL was new and is now claimed by the caller
    /// * `false` - The URL had already been registered
    pub fn register(&self, url: &str) -> bool {
        let mut seen = self.lock();
        if seen.contains(url) {
            return false;
        }
        seen.insert(url.to_string())
    }

    /// Number of URLs registered so far
    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Deduplication state of one run
///
/// `pages` holds every sitemap and page URL dispatched for fetching, `links`
/// every normalized link target admitted for verification.
#[derive(Debug, Default)]
pub struct CrawlState {
    pub pages: UrlRegistry,
    pub links: UrlRegistry,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }
}
