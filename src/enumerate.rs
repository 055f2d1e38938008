//! Placement enumeration: lazy, deterministic generation of candidate
//! subsets.
//!
//! Enumerators hand out placements by index, which keeps memory constant
//! regardless of the size of the placement space and lets the search resume
//! from any position. `CombinationEnumerator` walks all C(n, k) subsets in
//! lexicographic index order. `ClusteredEnumerator` partitions candidates
//! into spatial cells and walks the Cartesian product of one-per-cluster
//! combinations.

use crate::error::{Error, Result};
use crate::placement::Placement;
use crate::site::Site;
use fnv::FnvHashMap;
use itertools::Itertools;
use log::*;
use serde::{Deserialize, Serialize};

/// Binomial coefficient C(n, k), or `None` on u64 overflow.
pub fn binomial(n: usize, k: usize) -> Option<u64> {
    if k > n {
        return Some(0);
    }
    let k = k.min(n - k);
    let mut result: u64 = 1;
    for i in 0..k {
        result = result.checked_mul((n - i) as u64)?;
        // Division is exact: the running product of j consecutive terms is
        // divisible by j!.
        result /= (i + 1) as u64;
    }
    Some(result)
}

/// Unrank `rank` into the `rank`-th k-subset of {0, .., n-1} in
/// lexicographic order.
fn unrank_combination(n: usize, k: usize, mut rank: u64) -> Vec<usize> {
    let mut indices = Vec::with_capacity(k);
    let mut j = 0;
    for slot in (1..=k).rev() {
        loop {
            let remaining = binomial(n - j - 1, slot - 1)
                .expect("subset count fits in u64 when the total count does");
            if rank < remaining {
                break;
            }
            rank -= remaining;
            j += 1;
        }
        indices.push(j);
        j += 1;
    }
    indices
}

/// Lazy source of placements, addressable by index.
///
/// `placement(i)` must be a pure function of `i`: the same enumerator
/// configuration always yields the same placement at the same index. The
/// search relies on this both for restarts and for the tie-break order.
pub trait PlacementEnumerator: Send + Sync {
    /// Total number of placements this enumerator yields.
    fn count(&self) -> u64;

    /// The placement at `index`, or `None` once past the end.
    fn placement(&self, index: u64) -> Option<Placement>;

    /// Iterate all placements in index order.
    fn iter(&self) -> Box<dyn Iterator<Item = Placement> + '_> {
        Box::new((0..self.count()).filter_map(move |i| self.placement(i)))
    }
}

/// Enumerates every k-subset of n candidates in lexicographic order.
pub struct CombinationEnumerator {
    n: usize,
    k: usize,
    count: u64,
}

impl CombinationEnumerator {
    pub fn new(n: usize, k: usize) -> Result<Self> {
        if k < 1 || k > n {
            return Err(Error::InvalidSize { k, n });
        }
        let count = binomial(n, k).ok_or_else(|| {
            Error::Config(format!(
                "placement space C({n}, {k}) exceeds u64 range"
            ))
        })?;
        debug!("combination enumerator: C({}, {}) = {} placements", n, k, count);
        Ok(CombinationEnumerator { n, k, count })
    }
}

impl PlacementEnumerator for CombinationEnumerator {
    fn count(&self) -> u64 {
        self.count
    }

    fn placement(&self, index: u64) -> Option<Placement> {
        if index >= self.count {
            return None;
        }
        Some(Placement::new(unrank_combination(self.n, self.k, index)))
    }
}

/// Spatial partition of the candidate plane into rectangular cells.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClusterLayout {
    pub origin_x: f64,
    pub origin_y: f64,
    pub cell_width: f64,
    pub cell_height: f64,
}

impl ClusterLayout {
    pub fn validate(&self) -> Result<()> {
        if !(self.cell_width.is_finite() && self.cell_width > 0.0)
            || !(self.cell_height.is_finite() && self.cell_height > 0.0)
        {
            return Err(Error::Config(format!(
                "cluster cells must have positive extent, got {} x {}",
                self.cell_width, self.cell_height
            )));
        }
        Ok(())
    }

    /// Cell coordinates of a site, by floor division from the origin.
    pub fn cell_of(&self, site: &Site) -> (i64, i64) {
        let cx = ((site.position.x - self.origin_x) / self.cell_width).floor() as i64;
        let cy = ((site.position.y - self.origin_y) / self.cell_height).floor() as i64;
        (cx, cy)
    }
}

/// One cluster of candidate indices plus its local subset count.
struct Cluster {
    cell: (i64, i64),
    members: Vec<usize>,
    combos: u64,
}

/// Enumerates the Cartesian product of per-cluster k-subsets: every
/// occupied cluster contributes exactly k sites to each placement.
///
/// Clusters are ordered by cell coordinates so the index order is a stable
/// function of the layout, not of candidate order.
pub struct ClusteredEnumerator {
    clusters: Vec<Cluster>,
    k: usize,
    count: u64,
}

impl ClusteredEnumerator {
    pub fn new(candidates: &[Site], k: usize, layout: &ClusterLayout) -> Result<Self> {
        layout.validate()?;
        if candidates.is_empty() {
            return Err(Error::NoCandidates);
        }

        let mut by_cell: FnvHashMap<(i64, i64), Vec<usize>> = FnvHashMap::default();
        for (i, site) in candidates.iter().enumerate() {
            by_cell.entry(layout.cell_of(site)).or_default().push(i);
        }

        let mut clusters = Vec::with_capacity(by_cell.len());
        for (cell, members) in by_cell.into_iter().sorted_by_key(|(cell, _)| *cell) {
            if k < 1 || k > members.len() {
                return Err(Error::InvalidSize {
                    k,
                    n: members.len(),
                });
            }
            let combos = binomial(members.len(), k).ok_or_else(|| {
                Error::Config(format!(
                    "cluster {:?} subset count C({}, {}) exceeds u64 range",
                    cell,
                    members.len(),
                    k
                ))
            })?;
            clusters.push(Cluster {
                cell,
                members,
                combos,
            });
        }

        let mut count: u64 = 1;
        for cluster in &clusters {
            count = count.checked_mul(cluster.combos).ok_or_else(|| {
                Error::Config("clustered placement space exceeds u64 range".to_string())
            })?;
        }

        debug!(
            "clustered enumerator: {} clusters, {} placements of {} sites each",
            clusters.len(),
            count,
            clusters.len() * k
        );
        Ok(ClusteredEnumerator { clusters, k, count })
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }
}

impl PlacementEnumerator for ClusteredEnumerator {
    fn count(&self) -> u64 {
        self.count
    }

    fn placement(&self, index: u64) -> Option<Placement> {
        if index >= self.count {
            return None;
        }
        // Mixed-radix decomposition: the last cluster is the fastest-varying
        // digit.
        let mut rank = index;
        let mut digits = vec![0u64; self.clusters.len()];
        for (slot, cluster) in self.clusters.iter().enumerate().rev() {
            digits[slot] = rank % cluster.combos;
            rank /= cluster.combos;
        }

        let mut indices = Vec::with_capacity(self.clusters.len() * self.k);
        for (cluster, &digit) in self.clusters.iter().zip(digits.iter()) {
            trace!("cluster {:?}: local subset {}", cluster.cell, digit);
            for local in unrank_combination(cluster.members.len(), self.k, digit) {
                indices.push(cluster.members[local]);
            }
        }
        Some(Placement::new(indices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::Point3;

    fn site(id: &str, x: f64, y: f64) -> Site {
        Site::new(id, Point3::new(x, y, 20.0), 20.0)
    }

    #[test]
    fn binomial_matches_known_values() {
        assert_eq!(binomial(3, 2), Some(3));
        assert_eq!(binomial(10, 3), Some(120));
        assert_eq!(binomial(52, 5), Some(2_598_960));
        assert_eq!(binomial(5, 0), Some(1));
        assert_eq!(binomial(4, 7), Some(0));
    }

    #[test]
    fn binomial_overflow_is_none() {
        assert_eq!(binomial(200, 100), None);
    }

    #[test]
    fn three_choose_two_in_order() {
        let e = CombinationEnumerator::new(3, 2).unwrap();
        assert_eq!(e.count(), 3);
        let all: Vec<Vec<usize>> = e.iter().map(|p| p.indices().to_vec()).collect();
        assert_eq!(all, vec![vec![0, 1], vec![0, 2], vec![1, 2]]);
    }

    #[test]
    fn past_the_end_is_none() {
        let e = CombinationEnumerator::new(3, 2).unwrap();
        assert!(e.placement(3).is_none());
    }

    #[test]
    fn enumeration_is_restartable() {
        let e = CombinationEnumerator::new(6, 3).unwrap();
        let full: Vec<Placement> = e.iter().collect();
        let resumed: Vec<Placement> = (7..e.count()).filter_map(|i| e.placement(i)).collect();
        assert_eq!(&full[7..], &resumed[..]);
    }

    #[test]
    fn all_subsets_are_distinct_and_sorted() {
        let e = CombinationEnumerator::new(7, 3).unwrap();
        let all: Vec<Placement> = e.iter().collect();
        assert_eq!(all.len(), 35);
        for p in &all {
            assert!(p.indices().windows(2).all(|w| w[0] < w[1]));
        }
        let mut dedup = all.clone();
        dedup.dedup();
        assert_eq!(dedup.len(), all.len());
    }

    #[test]
    fn k_out_of_range_is_invalid_size() {
        assert!(matches!(
            CombinationEnumerator::new(3, 0),
            Err(Error::InvalidSize { k: 0, n: 3 })
        ));
        assert!(matches!(
            CombinationEnumerator::new(3, 4),
            Err(Error::InvalidSize { k: 4, n: 3 })
        ));
    }

    fn layout() -> ClusterLayout {
        ClusterLayout {
            origin_x: 0.0,
            origin_y: 0.0,
            cell_width: 100.0,
            cell_height: 100.0,
        }
    }

    #[test]
    fn clusters_partition_by_cell() {
        let sites = vec![
            site("a", 10.0, 10.0),
            site("b", 20.0, 10.0),
            site("c", 150.0, 10.0),
            site("d", 160.0, 10.0),
        ];
        let e = ClusteredEnumerator::new(&sites, 1, &layout()).unwrap();
        assert_eq!(e.cluster_count(), 2);
        assert_eq!(e.count(), 4);
        let all: Vec<Vec<usize>> = e.iter().map(|p| p.indices().to_vec()).collect();
        assert_eq!(
            all,
            vec![vec![0, 2], vec![0, 3], vec![1, 2], vec![1, 3]]
        );
    }

    #[test]
    fn clustered_takes_k_per_cluster() {
        let sites = vec![
            site("a", 10.0, 10.0),
            site("b", 20.0, 10.0),
            site("c", 30.0, 10.0),
            site("d", 150.0, 10.0),
            site("e", 160.0, 10.0),
        ];
        let e = ClusteredEnumerator::new(&sites, 2, &layout()).unwrap();
        // C(3,2) * C(2,2) = 3
        assert_eq!(e.count(), 3);
        for p in e.iter() {
            assert_eq!(p.len(), 4);
        }
    }

    #[test]
    fn undersized_cluster_is_invalid_size() {
        let sites = vec![site("a", 10.0, 10.0), site("b", 150.0, 10.0)];
        assert!(matches!(
            ClusteredEnumerator::new(&sites, 2, &layout()),
            Err(Error::InvalidSize { k: 2, n: 1 })
        ));
    }

    #[test]
    fn negative_coordinates_fall_in_distinct_cells() {
        let l = layout();
        let left = site("l", -10.0, 5.0);
        let right = site("r", 10.0, 5.0);
        assert_eq!(l.cell_of(&left), (-1, 0));
        assert_eq!(l.cell_of(&right), (0, 0));
    }

    #[test]
    fn degenerate_layout_is_rejected() {
        let sites = vec![site("a", 10.0, 10.0)];
        let bad = ClusterLayout {
            origin_x: 0.0,
            origin_y: 0.0,
            cell_width: 0.0,
            cell_height: 100.0,
        };
        assert!(matches!(
            ClusteredEnumerator::new(&sites, 1, &bad),
            Err(Error::Config(_))
        ));
    }
}
