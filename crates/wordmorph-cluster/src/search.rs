//! Branch-and-bound nearest-neighbor search
//!
//! Classifies a query word against the training set by walking the cluster
//! tree with a min-priority queue ordered by the morph cost from the query to
//! each node's center. A node is pruned when
//!
//! ```text
//! cost_to_center - node.max_dist_from_center > alpha * incumbent
//! ```
//!
//! since no descendant can then beat the incumbent by more than the factor
//! `alpha`. With `alpha = 1` the bound is admissible and the search exact;
//! `alpha > 1` widens the bound and trades recall for fewer oracle calls.
//!
//! The tree walk uses the fast cost oracle; every evaluated cost is memoized
//! per query so no training index is ever evaluated twice. A second "slow
//! pass" then re-scores the cheapest N fast-pass candidates with the full
//! cost oracle, which may replace the incumbent before the top-N report is
//! assembled.

use crate::error::ClusterResult;
use crate::matrix::UNCOMPUTED;
use crate::tree::{ClusterTree, NodeId};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::io::Write;
use wordmorph_core::BitonalImage;
use wordmorph_morph::{MorphEngine, MorphParams, MorphResult};

/// Per-query cost oracle: morph cost from the (already bound) query image to
/// a training item.
pub trait CostOracle {
    /// Morph cost from the query to training item `train_idx`.
    fn cost(&mut self, train_idx: usize) -> MorphResult<f64>;
}

/// [`CostOracle`] backed by the mesh morph engine.
pub struct MorphCostOracle<'a> {
    query: &'a BitonalImage,
    training: &'a [BitonalImage],
    params: &'a MorphParams,
    fast: bool,
}

impl<'a> MorphCostOracle<'a> {
    /// Fast-pipeline oracle (tree walk, first pass).
    pub fn fast(
        query: &'a BitonalImage,
        training: &'a [BitonalImage],
        params: &'a MorphParams,
    ) -> Self {
        MorphCostOracle {
            query,
            training,
            params,
            fast: true,
        }
    }

    /// Full-pipeline oracle (slow confirmation pass).
    pub fn full(
        query: &'a BitonalImage,
        training: &'a [BitonalImage],
        params: &'a MorphParams,
    ) -> Self {
        MorphCostOracle {
            query,
            training,
            params,
            fast: false,
        }
    }
}

impl CostOracle for MorphCostOracle<'_> {
    fn cost(&mut self, train_idx: usize) -> MorphResult<f64> {
        let train = &self.training[train_idx];
        if self.fast {
            MorphEngine::word_morph_cost_fast(self.query, train, self.params)
        } else {
            MorphEngine::word_morph_cost(self.query, train, self.params)
        }
    }
}

/// Parameters for one classification search.
#[derive(Debug, Clone)]
pub struct SearchParams {
    /// Pruning bound multiplier; 1.0 is exact, larger is approximate.
    pub alpha: f64,
    /// How many of the cheapest fast-pass candidates to re-score with the
    /// full cost oracle. 0 disables the slow pass.
    pub slow_pass_top_n: usize,
    /// How many ranked matches to report per query.
    pub top_n_matches: usize,
    /// Report at most one match per distinct label (first seen wins).
    pub unique_labels: bool,
}

impl Default for SearchParams {
    fn default() -> Self {
        SearchParams {
            alpha: 1.0,
            slow_pass_top_n: 10,
            top_n_matches: 10,
            unique_labels: true,
        }
    }
}

/// One entry of the per-query top-N report.
#[derive(Debug, Clone)]
pub struct RankedMatch {
    /// Training index of the match.
    pub train_idx: usize,
    /// Best known cost to the match.
    pub cost: f64,
    /// Label of the match.
    pub label: String,
}

/// Result of classifying one query word.
#[derive(Debug, Clone)]
pub struct Classification {
    /// Ground-truth label of the query.
    pub query_label: String,
    /// Training index of the best match.
    pub best_idx: usize,
    /// Cost to the best match.
    pub best_cost: f64,
    /// Whether the best match's label equals the query label.
    pub correct: bool,
    /// Total number of oracle evaluations (fast + slow).
    pub oracle_calls: usize,
    /// Top-N matches in ascending cost order.
    pub matches: Vec<RankedMatch>,
}

impl Classification {
    /// Append this query's block of the classification report.
    ///
    /// Format per query: the ground-truth label, a correct/WRONG flag with
    /// the winning cost, then the top-N `(index, cost, label)` lines in
    /// ascending cost order.
    pub fn write_report(&self, w: &mut impl Write, query_id: usize) -> std::io::Result<()> {
        writeln!(w, "#{query_id} ------")?;
        writeln!(w, "#{}", self.query_label)?;
        writeln!(
            w,
            "{query_id} : {} cost={:.6} best=#{} compares={}",
            if self.correct { "correct" } else { "WRONG" },
            self.best_cost,
            self.best_idx,
            self.oracle_calls,
        )?;
        for m in &self.matches {
            writeln!(w, "   {} {:.6} #{}", m.train_idx, m.cost, m.label)?;
        }
        Ok(())
    }
}

/// Min-heap entry; `BinaryHeap` is a max-heap, so the ordering is reversed.
struct QueueEntry {
    cost: f64,
    node: NodeId,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
    }
}
impl Eq for QueueEntry {}
impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.cost.total_cmp(&self.cost)
    }
}

/// Classify one query against the training set.
///
/// `fast_oracle` drives the tree walk; `full_oracle` re-scores the top
/// candidates in the slow pass. Every oracle result is memoized per training
/// index for the duration of this call.
///
/// # Errors
///
/// Propagates oracle failures (morph-engine contract violations).
pub fn classify(
    tree: &ClusterTree,
    fast_oracle: &mut dyn CostOracle,
    full_oracle: &mut dyn CostOracle,
    train_labels: &[String],
    query_label: &str,
    params: &SearchParams,
) -> ClusterResult<Classification> {
    let n = train_labels.len();
    let mut cache: Vec<Option<f64>> = vec![None; n];
    let mut oracle_calls = 0usize;

    let root = tree.root();
    let root_center = tree.node(root).center_idx;
    let root_cost = fast_oracle.cost(root_center)?;
    oracle_calls += 1;
    cache[root_center] = Some(root_cost);

    let mut best_cost = root_cost;
    let mut best_node = root;

    let mut queue = BinaryHeap::new();
    queue.push(QueueEntry {
        cost: root_cost,
        node: root,
    });

    while let Some(entry) = queue.pop() {
        let node = tree.node(entry.node);
        // the incumbent may have improved since this entry was pushed
        if entry.cost - node.max_dist_from_center > params.alpha * best_cost {
            continue;
        }
        let Some(children) = node.children else {
            continue;
        };
        for child_id in children {
            let child = tree.node(child_id);
            let cost = match cache[child.center_idx] {
                Some(c) => c,
                None => {
                    let c = fast_oracle.cost(child.center_idx)?;
                    oracle_calls += 1;
                    cache[child.center_idx] = Some(c);
                    c
                }
            };
            if cost - child.max_dist_from_center > params.alpha * best_cost {
                continue;
            }
            if cost < best_cost {
                best_cost = cost;
                best_node = child_id;
            }
            queue.push(QueueEntry {
                cost,
                node: child_id,
            });
        }
    }

    let mut best_idx = tree.node(best_node).center_idx;

    // rank every training index by its best known fast cost; indices the
    // walk never evaluated sort to the back behind the sentinel
    let mut ranked: Vec<(usize, f64)> = (0..n)
        .map(|i| (i, cache[i].unwrap_or(UNCOMPUTED)))
        .collect();
    sort_by_cost(&mut ranked);

    // slow pass: confirm the cheapest candidates with the full cost
    for k in 0..params.slow_pass_top_n.min(n) {
        let idx = ranked[k].0;
        let full = full_oracle.cost(idx)?;
        oracle_calls += 1;
        if full < best_cost {
            best_cost = full;
            best_idx = idx;
        }
        if full < ranked[k].1 {
            ranked[k].1 = full;
        }
    }
    sort_by_cost(&mut ranked);

    let mut matches = Vec::with_capacity(params.top_n_matches);
    for &(idx, cost) in &ranked {
        if matches.len() >= params.top_n_matches {
            break;
        }
        let label = &train_labels[idx];
        if params.unique_labels && matches.iter().any(|m: &RankedMatch| &m.label == label) {
            continue;
        }
        matches.push(RankedMatch {
            train_idx: idx,
            cost,
            label: label.clone(),
        });
    }

    Ok(Classification {
        query_label: query_label.to_string(),
        best_idx,
        best_cost,
        correct: train_labels[best_idx] == query_label,
        oracle_calls,
        matches,
    })
}

/// Stable ascending sort of `(index, cost)` pairs by cost.
///
/// Stability is the documented tie-break: equal costs keep their index
/// order, so the lowest training index wins a tie.
fn sort_by_cost(ranked: &mut [(usize, f64)]) {
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
}
