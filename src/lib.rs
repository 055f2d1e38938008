//! Brute-force base-station placement over urban building scenes.
//!
//! The pipeline extracts candidate rooftop sites from a scene, enumerates
//! every eligible placement of `k` stations, scores each one through a
//! signal oracle, and reports the best placement as CSV.

pub mod config;
pub mod constants;
pub mod enumerate;
pub mod error;
pub mod grid;
pub mod oracle;
pub mod parallel;
pub mod placement;
pub mod planner;
pub mod report;
pub mod scene;
pub mod scoring;
pub mod search;
pub mod site;

pub use config::RunConfig;
pub use error::{Error, OracleError, Result};
pub use planner::{run_search, run_search_parallel, SearchBuilder};
pub use report::SearchResult;
