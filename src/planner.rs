//! Public API for the placement search.
//!
//! The `SearchBuilder` provides a fluent API for configuring a run. It
//! produces a `SearchEngine` that can be stepped incrementally, or the
//! convenience drivers `run_search` and `run_search_parallel` execute it
//! to completion (or until the budget expires).

use crate::enumerate::{ClusterLayout, ClusteredEnumerator, CombinationEnumerator, PlacementEnumerator};
use crate::error::{Error, Result};
use crate::grid::CoverageGrid;
use crate::oracle::SignalOracle;
use crate::parallel::run_parallel;
use crate::report::SearchResult;
use crate::scoring::{Aggregation, ScoringAdapter};
use crate::search::{SearchBudget, SearchEngine, SearchStep};
use crate::site::Site;
use log::*;
use std::sync::Arc;
use std::time::Duration;

use crate::constants::DEFAULT_TIMEOUT_PER_EVALUATION_MS;

/// Fluent configuration for a placement search.
pub struct SearchBuilder {
    oracle: Arc<dyn SignalOracle>,
    grid: CoverageGrid,
    candidates: Vec<Site>,
    k: usize,
    aggregation: Aggregation,
    cluster_layout: Option<ClusterLayout>,
    timeout: Duration,
}

impl SearchBuilder {
    pub fn new(oracle: Arc<dyn SignalOracle>, grid: CoverageGrid) -> Self {
        SearchBuilder {
            oracle,
            grid,
            candidates: Vec::new(),
            k: 1,
            aggregation: Aggregation::default(),
            cluster_layout: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_PER_EVALUATION_MS),
        }
    }

    /// Set the candidate sites to search over.
    pub fn candidates(mut self, candidates: Vec<Site>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Set the number of stations per placement (per cluster, when a
    /// cluster layout is set).
    pub fn k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Switch to clustered enumeration: every occupied cluster contributes
    /// `k` sites to each placement.
    pub fn cluster_layout(mut self, layout: ClusterLayout) -> Self {
        self.cluster_layout = Some(layout);
        self
    }

    pub fn timeout_per_evaluation(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn into_parts(self) -> Result<(Box<dyn PlacementEnumerator>, ScoringAdapter, Vec<Site>)> {
        if self.candidates.is_empty() {
            return Err(Error::NoCandidates);
        }
        let enumerator: Box<dyn PlacementEnumerator> = match &self.cluster_layout {
            Some(layout) => Box::new(ClusteredEnumerator::new(&self.candidates, self.k, layout)?),
            None => Box::new(CombinationEnumerator::new(self.candidates.len(), self.k)?),
        };
        let adapter = ScoringAdapter::new(self.oracle, self.grid, self.aggregation, self.timeout);
        info!(
            "search configured: {} candidates, {} placements, oracle '{}'",
            self.candidates.len(),
            enumerator.count(),
            adapter.oracle_name()
        );
        Ok((enumerator, adapter, self.candidates))
    }

    /// Build the search engine for incremental stepping.
    pub fn build(self) -> Result<SearchEngine> {
        let (enumerator, adapter, candidates) = self.into_parts()?;
        Ok(SearchEngine::new(enumerator, adapter, candidates))
    }

    /// Run the search sequentially under the given budget.
    pub fn run(self, budget: &SearchBudget) -> Result<SearchResult> {
        let mut engine = self.build()?;
        loop {
            match engine.step(budget) {
                SearchStep::Complete => return engine.finish(true),
                SearchStep::Running => {
                    if !budget.has_budget() {
                        return engine.finish(false);
                    }
                }
            }
        }
    }

    /// Run the search on a worker pool under the given budget.
    pub fn run_parallel(self, worker_count: usize, budget: &SearchBudget) -> Result<SearchResult> {
        let (enumerator, adapter, candidates) = self.into_parts()?;
        run_parallel(
            enumerator.as_ref(),
            &adapter,
            &candidates,
            worker_count,
            budget,
        )
    }
}

/// Run a configured search to completion (or budget expiry).
pub fn run_search(builder: SearchBuilder, budget: &SearchBudget) -> Result<SearchResult> {
    builder.run(budget)
}

/// Run a configured search on `worker_count` threads.
pub fn run_search_parallel(
    builder: SearchBuilder,
    worker_count: usize,
    budget: &SearchBudget,
) -> Result<SearchResult> {
    builder.run_parallel(worker_count, budget)
}
