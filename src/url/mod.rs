//! URL handling module for Sitemap-Sweep
//!
//! This module provides entrypoint parsing, link normalization and the host
//! label used to name error logs.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::host_label;
pub use normalize::{normalize_link, parse_entrypoint, parse_location, QueryPolicy};
