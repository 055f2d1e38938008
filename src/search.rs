//! Search driver: exhaustive evaluation of the placement space.
//!
//! The `SearchEngine` walks the enumerator in index order, scoring one
//! placement at a time. It supports budgeting for incremental execution:
//! `step` returns `Running` when the budget runs out mid-search and can be
//! called again to resume from the next unevaluated index. Failed
//! evaluations are recorded and skipped; only a run in which every
//! evaluation failed is an error.

use crate::enumerate::PlacementEnumerator;
use crate::error::{Error, Result};
use crate::placement::{EvalFailure, ScoredPlacement};
use crate::report::SearchResult;
use crate::scoring::ScoringAdapter;
use crate::site::Site;
use log::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Budget controlling how long a search may run before yielding.
///
/// `has_budget` is polled between placement evaluations, never during one,
/// so a running oracle call is never interrupted.
pub struct SearchBudget {
    check: Box<dyn Fn() -> bool + Send + Sync>,
}

impl SearchBudget {
    pub fn new<F>(check: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        SearchBudget {
            check: Box::new(check),
        }
    }

    /// A budget that never runs out.
    pub fn unlimited() -> Self {
        SearchBudget::new(|| true)
    }

    /// A budget that expires after `limit` of wall-clock time.
    pub fn wall_clock(limit: Duration) -> Self {
        let deadline = Instant::now() + limit;
        SearchBudget::new(move || Instant::now() < deadline)
    }

    /// A budget driven by an external cancellation flag.
    pub fn cancel_flag(cancelled: Arc<AtomicBool>) -> Self {
        SearchBudget::new(move || !cancelled.load(Ordering::Relaxed))
    }

    pub fn has_budget(&self) -> bool {
        (self.check)()
    }
}

/// Result of a single step of the search engine.
pub enum SearchStep {
    /// Search is still in progress (budget exhausted).
    Running,
    /// Every placement has been evaluated.
    Complete,
}

/// Progress statistics for the search.
#[derive(Clone, Debug)]
pub struct SearchStats {
    pub placements_total: u64,
    pub evaluated: u64,
    pub failed: u64,
    pub best_score: Option<f64>,
}

/// Drives the exhaustive search over the placement space.
pub struct SearchEngine {
    enumerator: Box<dyn PlacementEnumerator>,
    adapter: ScoringAdapter,
    candidates: Vec<Site>,
    /// Index of the next placement to evaluate.
    next_index: u64,
    best: Option<ScoredPlacement>,
    failures: Vec<EvalFailure>,
    evaluated: u64,
    started: Instant,
}

impl SearchEngine {
    pub fn new(
        enumerator: Box<dyn PlacementEnumerator>,
        adapter: ScoringAdapter,
        candidates: Vec<Site>,
    ) -> Self {
        SearchEngine {
            enumerator,
            adapter,
            candidates,
            next_index: 0,
            best: None,
            failures: Vec::new(),
            evaluated: 0,
            started: Instant::now(),
        }
    }

    pub fn candidates(&self) -> &[Site] {
        &self.candidates
    }

    pub fn adapter(&self) -> &ScoringAdapter {
        &self.adapter
    }

    /// Get the best placement found so far, if any.
    pub fn best(&self) -> Option<&ScoredPlacement> {
        self.best.as_ref()
    }

    /// Get progress statistics.
    pub fn stats(&self) -> SearchStats {
        SearchStats {
            placements_total: self.enumerator.count(),
            evaluated: self.evaluated,
            failed: self.failures.len() as u64,
            best_score: self.best.as_ref().map(|b| b.score),
        }
    }

    /// Run the search until the budget is exhausted or the space is done.
    pub fn step(&mut self, budget: &SearchBudget) -> SearchStep {
        loop {
            let placement = match self.enumerator.placement(self.next_index) {
                Some(placement) => placement,
                None => {
                    debug!(
                        "search complete: evaluated={}, failed={}, best={:?}",
                        self.evaluated,
                        self.failures.len(),
                        self.best.as_ref().map(|b| b.score)
                    );
                    return SearchStep::Complete;
                }
            };
            let index = self.next_index;
            self.next_index += 1;
            self.evaluated += 1;

            match self.adapter.score(&placement, &self.candidates) {
                Ok(score) => {
                    let scored = ScoredPlacement {
                        placement,
                        score,
                        enumeration_index: index,
                    };
                    let improved = match &self.best {
                        Some(current) => scored.beats(current),
                        None => true,
                    };
                    if improved {
                        trace!("placement {} is the new best at {:.3}", index, score);
                        self.best = Some(scored);
                    }
                }
                Err(err) => {
                    warn!("placement {} failed: {}", index, err);
                    self.failures.push(EvalFailure {
                        enumeration_index: index,
                        reason: err.to_string(),
                    });
                }
            }

            if !budget.has_budget() {
                return SearchStep::Running;
            }
        }
    }

    /// Consume the engine into a result. `completed` records whether the
    /// whole space was evaluated or the budget expired first.
    pub fn finish(self, completed: bool) -> Result<SearchResult> {
        if self.best.is_none() {
            return Err(Error::AllEvaluationsFailed {
                attempted: self.evaluated,
            });
        }
        Ok(SearchResult::from_parts(
            self.best,
            self.candidates,
            self.enumerator.count(),
            self.evaluated,
            self.failures,
            completed,
            self.started.elapsed(),
        ))
    }
}
