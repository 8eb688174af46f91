//! Output module for aggregating and reporting verification results
//!
//! This module handles:
//! - Partitioning results into healthy and failing links
//! - Writing the error log of a run
//! - Printing run statistics

mod error_log;
mod report;
pub mod stats;

pub use error_log::{log_file_path, write_error_log};
pub use report::{aggregate, Report};
pub use stats::{print_statistics, RunStatistics};
