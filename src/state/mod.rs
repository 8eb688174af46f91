//! State module for tracking crawl progress
//!
//! This module provides the per-run deduplication state.
//!
//! # Components
//!
//! - `UrlRegistry`: A mutex-guarded set of claimed URLs
//! - `CrawlState`: The page registry and the link registry of one run

mod registry;

// Re-export main types
pub use registry::{CrawlState, UrlRegistry};
