//! Placement types: candidate subsets and their scored forms.

use crate::site::Site;
use serde::{Deserialize, Serialize};

/// A set of `k` candidate sites chosen from the candidate list, stored as
/// sorted indices into that list. Two placements with the same sites are
/// equal regardless of construction order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    indices: Vec<usize>,
}

impl Placement {
    pub fn new(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        Placement { indices }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Resolve the placement against the candidate list it was drawn from.
    pub fn resolve<'a>(&self, candidates: &'a [Site]) -> Vec<&'a Site> {
        self.indices.iter().map(|&i| &candidates[i]).collect()
    }
}

/// A placement together with its score and the position it was handed out
/// at by the enumerator. The enumeration index breaks score ties so that
/// results do not depend on evaluation order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoredPlacement {
    pub placement: Placement,
    pub score: f64,
    pub enumeration_index: u64,
}

impl ScoredPlacement {
    /// Whether this placement wins over `other`: strictly higher score, or
    /// equal score with an earlier enumeration index.
    pub fn beats(&self, other: &ScoredPlacement) -> bool {
        self.score > other.score
            || (self.score == other.score && self.enumeration_index < other.enumeration_index)
    }
}

/// Record of a placement whose evaluation failed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvalFailure {
    pub enumeration_index: u64,
    pub reason: String,
}
