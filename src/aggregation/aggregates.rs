// Aggregate maps and greedy strength-based aggregation.

use std::collections::{HashMap, VecDeque};

use crate::aggregation::graph::MatrixGraph;
use crate::config::CoarseningCriterion;
use num_traits::Float;

/// Marker for a vertex not yet assigned to any aggregate.
pub const UNAGGREGATED: usize = usize::MAX;
/// Marker for a vertex without strong connections.
pub const ISOLATED: usize = usize::MAX - 1;
/// Marker for a vertex excluded from coarsening; it receives no coarse
/// correction and contributes nothing to the coarse system.
pub const SKIPPED: usize = usize::MAX - 2;

/// Per-vertex aggregate assignment.
///
/// During construction entries may hold the sentinels above; after
/// [`renumber`](Self::renumber) every entry is either a dense aggregate id in
/// `[0, count)` or `SKIPPED`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregatesMap {
    map: Vec<usize>,
}

impl AggregatesMap {
    /// A map over `n` vertices, all unaggregated.
    pub fn new(n: usize) -> Self {
        Self {
            map: vec![UNAGGREGATED; n],
        }
    }

    /// Wrap explicit assignments, sentinel values included.
    pub fn from_assignments(map: Vec<usize>) -> Self {
        Self { map }
    }

    /// Number of fine vertices covered by the map.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Raw assignment of vertex `v`, sentinels included.
    pub fn assignment(&self, v: usize) -> usize {
        self.map[v]
    }

    /// Aggregate id of vertex `v`, or `None` for sentinel assignments.
    pub fn aggregate(&self, v: usize) -> Option<usize> {
        let a = self.map[v];
        (a < SKIPPED).then_some(a)
    }

    /// Compact aggregate ids into `[0, count)` and return the count.
    ///
    /// Excluded vertices become `SKIPPED`. Isolated vertices turn into
    /// singleton aggregates so that every non-skipped unknown takes part in
    /// the coarse system. Ids are assigned in order of first appearance,
    /// which keeps the numbering deterministic.
    pub fn renumber(&mut self, excluded: &[bool]) -> usize {
        assert_eq!(
            excluded.len(),
            self.map.len(),
            "exclusion flags must cover every vertex"
        );
        let mut next = 0usize;
        let mut remap: HashMap<usize, usize> = HashMap::new();
        for v in 0..self.map.len() {
            if excluded[v] {
                self.map[v] = SKIPPED;
                continue;
            }
            let a = self.map[v];
            assert!(a != UNAGGREGATED, "vertex {v} was never aggregated");
            if a == ISOLATED {
                self.map[v] = next;
                next += 1;
            } else {
                let id = *remap.entry(a).or_insert_with(|| {
                    let id = next;
                    next += 1;
                    id
                });
                self.map[v] = id;
            }
        }
        next
    }
}

/// Diagnostic tallies from one aggregation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AggregationCounts {
    /// Aggregates built from strong connections.
    pub aggregates: usize,
    /// Vertices without any strong connection.
    pub isolated: usize,
    /// Aggregates consisting of a single vertex.
    pub singletons: usize,
    /// Vertices excluded from coarsening.
    pub skipped: usize,
}

/// Partition the graph into aggregates of strongly connected vertices.
///
/// A coupling counts as strong when |a_vj| / sqrt(|a_vv| |a_jj|) exceeds the
/// criterion's threshold. Aggregates grow breadth-first from the lowest
/// unassigned vertex until they reach the minimum size, never beyond the
/// maximum; a vertex whose strong neighbors are all taken joins the most
/// strongly coupled neighboring aggregate that still has room.
pub fn build_aggregates<T: Float>(
    graph: &MatrixGraph<'_, T>,
    criterion: &CoarseningCriterion<T>,
) -> (AggregatesMap, AggregationCounts) {
    let n = graph.vertices();
    let matrix = graph.matrix();
    let diag = matrix.diagonal();

    // Strong neighbors per vertex, with their connection strengths.
    let mut strong: Vec<Vec<(usize, T)>> = Vec::with_capacity(n);
    for v in 0..n {
        let mut row = Vec::new();
        let a_vv = diag[v].abs();
        for (j, value) in graph.edges(v) {
            let denom = a_vv * diag[j].abs();
            if denom > T::zero() {
                let strength = value.abs() / denom.sqrt();
                if strength > criterion.strength_threshold {
                    row.push((j, strength));
                }
            }
        }
        strong.push(row);
    }

    let mut aggregates = AggregatesMap::new(n);
    let mut counts = AggregationCounts::default();
    let mut sizes: Vec<usize> = Vec::new();

    for v in 0..n {
        if strong[v].is_empty() {
            aggregates.map[v] = ISOLATED;
            counts.isolated += 1;
        }
    }

    for seed in 0..n {
        if aggregates.map[seed] != UNAGGREGATED {
            continue;
        }
        let id = sizes.len();
        aggregates.map[seed] = id;
        let mut members = 1usize;
        let mut queue = VecDeque::from([seed]);
        while members < criterion.min_aggregate_size {
            let Some(v) = queue.pop_front() else { break };
            for &(j, _) in &strong[v] {
                if members >= criterion.max_aggregate_size {
                    break;
                }
                if aggregates.map[j] == UNAGGREGATED {
                    aggregates.map[j] = id;
                    members += 1;
                    queue.push_back(j);
                }
            }
        }
        if members == 1 {
            // Lone seed: fold it into the strongest neighboring aggregate
            // that is not yet full.
            let mut best: Option<(usize, T)> = None;
            for &(j, strength) in &strong[seed] {
                if let Some(other) = aggregates.aggregate(j) {
                    if sizes[other] < criterion.max_aggregate_size
                        && best.map_or(true, |(_, s)| strength > s)
                    {
                        best = Some((other, strength));
                    }
                }
            }
            if let Some((other, _)) = best {
                aggregates.map[seed] = other;
                sizes[other] += 1;
                continue;
            }
        }
        sizes.push(members);
    }

    counts.aggregates = sizes.len();
    counts.singletons = sizes.iter().filter(|&&s| s == 1).count();
    (aggregates, counts)
}
