//! Parallel search: a worker pool over the placement space.
//!
//! The calling thread feeds placements into a bounded channel in
//! enumeration order; each worker scores placements independently and
//! folds results into a shared collector. Because the winner comparison
//! uses the enumeration index as the tie-break, the outcome is identical
//! to the sequential search no matter how work interleaves across workers.

use crate::enumerate::PlacementEnumerator;
use crate::error::{Error, Result};
use crate::placement::{EvalFailure, Placement, ScoredPlacement};
use crate::report::SearchResult;
use crate::scoring::ScoringAdapter;
use crate::search::SearchBudget;
use crate::site::Site;
use crossbeam_channel::bounded;
use log::*;
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Instant;

#[derive(Default)]
struct Collector {
    best: Option<ScoredPlacement>,
    failures: Vec<EvalFailure>,
    evaluated: u64,
}

impl Collector {
    fn record_score(&mut self, scored: ScoredPlacement) {
        self.evaluated += 1;
        let improved = match &self.best {
            Some(current) => scored.beats(current),
            None => true,
        };
        if improved {
            self.best = Some(scored);
        }
    }

    fn record_failure(&mut self, failure: EvalFailure) {
        self.evaluated += 1;
        self.failures.push(failure);
    }
}

/// Evaluate the placement space on `worker_count` threads.
///
/// Each placement is handed to exactly one worker. The budget is polled
/// between sends; when it expires the feed stops, in-flight placements
/// finish, and the partial result is returned with `completed = false`.
pub fn run_parallel(
    enumerator: &dyn PlacementEnumerator,
    adapter: &ScoringAdapter,
    candidates: &[Site],
    worker_count: usize,
    budget: &SearchBudget,
) -> Result<SearchResult> {
    if worker_count < 1 {
        return Err(Error::Config(format!(
            "worker count must be at least 1, got {worker_count}"
        )));
    }

    let started = Instant::now();
    let collector = Mutex::new(Collector::default());
    let (tx, rx) = bounded::<(u64, Placement)>(worker_count * 2);

    let completed = thread::scope(|scope| {
        for worker in 0..worker_count {
            let rx = rx.clone();
            let collector = &collector;
            scope.spawn(move || {
                trace!("worker {} started", worker);
                for (index, placement) in rx.iter() {
                    match adapter.score(&placement, candidates) {
                        Ok(score) => {
                            let scored = ScoredPlacement {
                                placement,
                                score,
                                enumeration_index: index,
                            };
                            collector
                                .lock()
                                .unwrap_or_else(PoisonError::into_inner)
                                .record_score(scored);
                        }
                        Err(err) => {
                            warn!("worker {}: placement {} failed: {}", worker, index, err);
                            collector
                                .lock()
                                .unwrap_or_else(PoisonError::into_inner)
                                .record_failure(EvalFailure {
                                    enumeration_index: index,
                                    reason: err.to_string(),
                                });
                        }
                    }
                }
            });
        }
        drop(rx);

        let mut index = 0;
        let completed = loop {
            let placement = match enumerator.placement(index) {
                Some(placement) => placement,
                None => break true,
            };
            // send only fails once every receiver is gone, and workers
            // hold theirs until the channel closes
            if tx.send((index, placement)).is_err() {
                break false;
            }
            index += 1;
            if !budget.has_budget() {
                debug!("budget expired after feeding {} placements", index);
                break false;
            }
        };
        drop(tx);
        completed
    });

    let collector = collector
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner);
    if collector.best.is_none() {
        return Err(Error::AllEvaluationsFailed {
            attempted: collector.evaluated,
        });
    }
    debug!(
        "parallel search done: {} workers, evaluated {}, failed {}",
        worker_count,
        collector.evaluated,
        collector.failures.len()
    );
    Ok(SearchResult::from_parts(
        collector.best,
        candidates.to_vec(),
        enumerator.count(),
        collector.evaluated,
        collector.failures,
        completed,
        started.elapsed(),
    ))
}
