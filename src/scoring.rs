//! Scoring adapter: turns an oracle's per-cell coverage report into a
//! single comparable score.
//!
//! The adapter owns the oracle handle, the grid, the aggregation rule, and
//! the per-evaluation timeout. It is the only place coverage samples are
//! reduced to a number, so the sequential driver and the worker pool cannot
//! disagree about what a score means.

use crate::constants::*;
use crate::error::OracleError;
use crate::grid::{CoverageGrid, CoverageSample};
use crate::oracle::SignalOracle;
use crate::placement::Placement;
use crate::site::Site;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How per-cell signal strengths are reduced to a placement score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Aggregation {
    /// Plain sum of strengths across all cells.
    Sum,
    /// Sum with each cell clamped to a noise floor, so one dead cell
    /// cannot drag the total to negative infinity.
    SumClamped { floor_dbm: f64 },
}

impl Default for Aggregation {
    fn default() -> Self {
        Aggregation::SumClamped {
            floor_dbm: DEFAULT_NOISE_FLOOR_DBM,
        }
    }
}

impl Aggregation {
    pub fn reduce(&self, samples: &[CoverageSample]) -> f64 {
        match self {
            Aggregation::Sum => samples.iter().map(|s| s.strength_dbm).sum(),
            Aggregation::SumClamped { floor_dbm } => samples
                .iter()
                .map(|s| s.strength_dbm.max(*floor_dbm))
                .sum(),
        }
    }
}

/// Scores placements by calling the oracle once per placement.
pub struct ScoringAdapter {
    oracle: Arc<dyn SignalOracle>,
    grid: CoverageGrid,
    aggregation: Aggregation,
    timeout: Duration,
}

impl ScoringAdapter {
    pub fn new(
        oracle: Arc<dyn SignalOracle>,
        grid: CoverageGrid,
        aggregation: Aggregation,
        timeout: Duration,
    ) -> Self {
        ScoringAdapter {
            oracle,
            grid,
            aggregation,
            timeout,
        }
    }

    pub fn grid(&self) -> &CoverageGrid {
        &self.grid
    }

    pub fn oracle_name(&self) -> &str {
        self.oracle.name()
    }

    /// Raw coverage report for a placement, timeout applied. Used for
    /// exporting the winning placement's coverage map.
    pub fn samples(
        &self,
        placement: &Placement,
        candidates: &[Site],
    ) -> std::result::Result<Vec<CoverageSample>, OracleError> {
        let sites = placement.resolve(candidates);
        let started = Instant::now();
        let samples = self.oracle.evaluate(&sites, &self.grid)?;
        if started.elapsed() > self.timeout {
            return Err(OracleError::TimedOut {
                timeout_ms: self.timeout.as_millis() as u64,
            });
        }
        Ok(samples)
    }

    /// Score one placement. Every failure mode maps to an `OracleError`
    /// so the caller can record it and move on.
    pub fn score(
        &self,
        placement: &Placement,
        candidates: &[Site],
    ) -> std::result::Result<f64, OracleError> {
        let samples = self.samples(placement, candidates)?;
        if samples.is_empty() {
            return Err(OracleError::Malformed(
                "oracle returned no samples".to_string(),
            ));
        }
        let score = self.aggregation.reduce(&samples);
        if !score.is_finite() {
            return Err(OracleError::Malformed(format!(
                "aggregated score is not finite: {score}"
            )));
        }
        Ok(score)
    }
}
