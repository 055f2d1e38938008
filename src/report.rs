//! Run results and CSV export.
//!
//! `SearchResult` is the durable record of a run. CSV output is a pure
//! function of the result contents, so re-exporting the same result
//! produces byte-identical files. The run id is excluded from CSV for
//! exactly that reason.

use crate::grid::{CoverageGrid, CoverageSample, GridArray};
use crate::placement::{EvalFailure, ScoredPlacement};
use crate::site::Site;
use log::*;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;
use uuid::Uuid;

/// Outcome of a search run.
#[derive(Clone, Debug, Serialize)]
pub struct SearchResult {
    /// Unique id for this run, for log correlation.
    pub run_id: Uuid,
    /// The winning placement, if any evaluation succeeded.
    pub best: Option<ScoredPlacement>,
    /// The candidate list the placement indices refer to.
    pub candidates: Vec<Site>,
    /// Size of the full placement space.
    pub placements_total: u64,
    /// Placements actually evaluated (including failures).
    pub evaluated: u64,
    /// Evaluations that failed and were skipped.
    pub failures: Vec<EvalFailure>,
    /// Whether the whole space was evaluated, or the budget expired first.
    pub completed: bool,
    pub elapsed_ms: u64,
}

impl SearchResult {
    pub fn from_parts(
        best: Option<ScoredPlacement>,
        candidates: Vec<Site>,
        placements_total: u64,
        evaluated: u64,
        failures: Vec<EvalFailure>,
        completed: bool,
        elapsed: Duration,
    ) -> Self {
        let result = SearchResult {
            run_id: Uuid::new_v4(),
            best,
            candidates,
            placements_total,
            evaluated,
            failures,
            completed,
            elapsed_ms: elapsed.as_millis() as u64,
        };
        info!(
            "run {}: evaluated {}/{} placements, {} failures, best {:?}, {} ms",
            result.run_id,
            result.evaluated,
            result.placements_total,
            result.failures.len(),
            result.best.as_ref().map(|b| b.score),
            result.elapsed_ms
        );
        result
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// Sites of the winning placement, in candidate-index order.
    pub fn winning_sites(&self) -> Vec<&Site> {
        match &self.best {
            Some(best) => best.placement.resolve(&self.candidates),
            None => Vec::new(),
        }
    }

    /// Write the winning placement as CSV, one row per chosen site.
    ///
    /// The output depends only on the result contents. Exporting the same
    /// result twice yields byte-identical files.
    pub fn write_csv<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "site_id,x,y,z,placement_score")?;
        if let Some(best) = &self.best {
            for site in best.placement.resolve(&self.candidates) {
                writeln!(
                    out,
                    "{},{},{},{},{}",
                    site.id, site.position.x, site.position.y, site.position.z, best.score
                )?;
            }
        }
        Ok(())
    }
}

/// Write a coverage report as CSV, one row per grid cell in row-major
/// order. Samples are normalized through the grid so the row order never
/// depends on the order the oracle returned them in.
pub fn write_coverage_csv<W: Write>(
    out: &mut W,
    grid: &CoverageGrid,
    samples: &[CoverageSample],
) -> std::io::Result<()> {
    let mut cells: GridArray<Option<f64>> = GridArray::new(grid.cols(), grid.rows(), None);
    for sample in samples {
        match grid.cell_of(sample.location) {
            Some((col, row)) => cells.set(col, row, Some(sample.strength_dbm)),
            None => warn!(
                "coverage sample at ({}, {}) falls outside the grid, dropping",
                sample.location.x, sample.location.y
            ),
        }
    }

    writeln!(out, "x,y,z,signal_strength")?;
    for ((col, row), strength) in cells.iter() {
        if let Some(strength_dbm) = strength {
            let center = grid.cell_center(col, row);
            writeln!(
                out,
                "{},{},{},{}",
                center.x, center.y, center.z, strength_dbm
            )?;
        }
    }
    Ok(())
}
