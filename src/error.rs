//! Error types for siteplan.

use std::io;

use thiserror::Error;

/// Result type alias for siteplan operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for siteplan.
///
/// Configuration errors (`InvalidSize`, `Config`) abort before any work
/// begins. `OracleUnavailable` is per-placement and recoverable; the search
/// driver records it and continues. `AllEvaluationsFailed` is the terminal
/// state of a run in which no placement ever produced a usable score.
#[derive(Error, Debug)]
pub enum Error {
    #[error("no candidate sites to optimize")]
    NoCandidates,

    #[error("invalid placement size: k={k} with {n} candidates")]
    InvalidSize { k: usize, n: usize },

    #[error("scoring oracle unavailable: {0}")]
    OracleUnavailable(#[from] OracleError),

    #[error("all {attempted} placement evaluations failed")]
    AllEvaluationsFailed { attempted: u64 },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("scene error: {0}")]
    Scene(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Per-placement failure from the external scoring oracle.
#[derive(Error, Debug, Clone)]
pub enum OracleError {
    #[error("oracle unreachable: {0}")]
    Unreachable(String),

    #[error("malformed oracle result: {0}")]
    Malformed(String),

    #[error("evaluation exceeded {timeout_ms} ms")]
    TimedOut { timeout_ms: u64 },
}

impl Error {
    /// Check if the error is fatal for the whole run (as opposed to a
    /// single placement evaluation).
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::OracleUnavailable(_))
    }
}
