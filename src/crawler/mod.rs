//! Crawler module for sitemap traversal and link checking
//!
//! This module contains the core pipeline, including:
//! - HTTP fetching and status probes
//! - Recursive sitemap resolution
//! - HTML parsing and link harvesting
//! - Two-phase link verification
//! - The bounded worker pool shared by every fan-out
//! - Overall run coordination

mod coordinator;
mod fetcher;
mod harvester;
mod pool;
mod sitemap;
mod verifier;

pub use coordinator::{Coordinator, Discovery};
pub use fetcher::{build_http_client, describe_error, fetch_text, get_status, head_status};
pub use harvester::{document_base, extract_anchors, Anchor, Harvester, Link};
pub use pool::run_bounded;
pub use sitemap::{parse_sitemap, SitemapDocument, SitemapResolver};
pub use verifier::{classify_status, Outcome, VerificationResult, Verifier};
