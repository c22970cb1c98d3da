//! Threaded batch operations
//!
//! The O(N^2) pairwise cost computation and multi-query classification are
//! both embarrassingly parallel. Work is partitioned by striding a flattened
//! index by the worker count, so every worker owns a disjoint interleaved
//! slice; workers hold only read-only borrows of the shared inputs and hand
//! their `(index, value)` results back to the joining thread, which performs
//! all writes. Workers are fork-joined per batch with `std::thread::scope`
//! (no persistent pool); a worker panic is resumed on the joining thread, so
//! thread failure is immediately fatal rather than quietly degrading
//! parallelism. Batches run to completion; there is no mid-batch
//! cancellation.
//!
//! All shared inputs (training images, parameters, the tree) are fully
//! constructed before any worker starts and are never mutated during the
//! parallel phase.

use crate::error::{ClusterError, ClusterResult};
use crate::matrix::{CostMatrix, MatrixChunk};
use crate::search::{Classification, MorphCostOracle, SearchParams, classify};
use crate::tree::ClusterTree;
use std::panic;
use std::path::Path;
use std::thread;
use wordmorph_core::BitonalImage;
use wordmorph_morph::{MorphEngine, MorphParams};

/// Sentinel written into not-yet-mirrored lower-triangle chunk cells.
const LOWER_TRIANGLE_SENTINEL: f64 = 999_998.0;

/// Resolve a requested worker count; 0 means one worker per available CPU.
pub fn resolve_thread_count(requested: usize) -> usize {
    if requested > 0 {
        requested
    } else {
        thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    }
}

/// One worker's share of the pairwise cost computation: every flattened
/// `(row, col)` index congruent to `thread_num` modulo `num_threads`, within
/// the row range `[row_first, row_last]`.
struct PairTask<'a> {
    thread_num: usize,
    num_threads: usize,
    row_first: usize,
    row_last: usize,
    training: &'a [BitonalImage],
    params: &'a MorphParams,
}

impl PairTask<'_> {
    /// Compute this worker's cells. Upper-triangle cells get the fast morph
    /// cost, the diagonal 0, and lower-triangle cells a sentinel that the
    /// mirror pass overwrites. Cell indices are relative to `row_first`.
    fn run(&self) -> ClusterResult<Vec<(usize, f64)>> {
        let n = self.training.len();
        let begin = self.row_first * n + self.thread_num;
        let end = (self.row_last + 1) * n;
        let mut cells = Vec::new();
        let mut idx = begin;
        while idx < end {
            let r = idx / n;
            let c = idx % n;
            let value = match r.cmp(&c) {
                std::cmp::Ordering::Less => MorphEngine::word_morph_cost_fast(
                    &self.training[r],
                    &self.training[c],
                    self.params,
                )?,
                std::cmp::Ordering::Equal => 0.0,
                std::cmp::Ordering::Greater => LOWER_TRIANGLE_SENTINEL,
            };
            cells.push((idx - self.row_first * n, value));
            idx += self.num_threads;
        }
        Ok(cells)
    }
}

/// Compute a row range of the pairwise cost matrix across `num_threads`
/// workers; returns the row-major cell values for those rows.
fn compute_rows(
    training: &[BitonalImage],
    row_first: usize,
    row_last: usize,
    params: &MorphParams,
    num_threads: usize,
) -> ClusterResult<Vec<f64>> {
    let n = training.len();
    let threads = resolve_thread_count(num_threads);
    let results: Vec<ClusterResult<Vec<(usize, f64)>>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let task = PairTask {
                    thread_num: t,
                    num_threads: threads,
                    row_first,
                    row_last,
                    training,
                    params,
                };
                scope.spawn(move || task.run())
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| panic::resume_unwind(e)))
            .collect()
    });

    let mut values = vec![0.0f64; (row_last - row_first + 1) * n];
    for result in results {
        for (idx, v) in result? {
            values[idx] = v;
        }
    }
    Ok(values)
}

/// Build the full symmetric pairwise cost matrix for a training set.
///
/// The upper triangle is computed with the fast morph cost (each cell by
/// exactly one worker), the diagonal is zero, and the lower triangle is
/// mirrored after the join.
pub fn build_cost_matrix(
    training: &[BitonalImage],
    train_first: usize,
    params: &MorphParams,
    num_threads: usize,
) -> ClusterResult<CostMatrix> {
    let n = training.len();
    if n == 0 {
        return Err(ClusterError::EmptyTrainingSet);
    }
    let values = compute_rows(training, 0, n - 1, params, num_threads)?;
    let mut matrix = CostMatrix::from_values(train_first, train_first + n - 1, values)?;
    matrix.mirror_lower_triangle();
    Ok(matrix)
}

/// Compute one row chunk of the pairwise cost matrix, for splitting a large
/// N x N build across machines. Row indices are relative to the training
/// range; the chunk is not mirrored (merging does that).
pub fn build_cost_chunk(
    training: &[BitonalImage],
    train_first: usize,
    chunk_first: usize,
    chunk_last: usize,
    params: &MorphParams,
    num_threads: usize,
) -> ClusterResult<MatrixChunk> {
    let n = training.len();
    if n == 0 {
        return Err(ClusterError::EmptyTrainingSet);
    }
    if chunk_last < chunk_first || chunk_last >= n {
        return Err(ClusterError::SizeMismatch {
            expected: n,
            actual: chunk_last + 1,
        });
    }
    let rows = compute_rows(training, chunk_first, chunk_last, params, num_threads)?;
    Ok(MatrixChunk {
        train_first,
        train_last: train_first + n - 1,
        chunk_first,
        chunk_last,
        rows,
    })
}

/// Load the pairwise cost matrix from `path` if the file exists, otherwise
/// build it and persist it there.
///
/// A stored matrix must cover the requested training range
/// `[train_first, train_first + len - 1]`; a range mismatch is fatal, never
/// silently recomputed.
pub fn build_or_load_cost_matrix(
    path: &Path,
    training: &[BitonalImage],
    train_first: usize,
    params: &MorphParams,
    num_threads: usize,
    description: &str,
) -> ClusterResult<CostMatrix> {
    if training.is_empty() {
        return Err(ClusterError::EmptyTrainingSet);
    }
    if path.exists() {
        return CostMatrix::load(path, train_first, train_first + training.len() - 1);
    }
    let matrix = build_cost_matrix(training, train_first, params, num_threads)?;
    matrix.save(path, description)?;
    Ok(matrix)
}

/// One worker's share of a classification batch: queries strided by the
/// worker count.
struct QueryTask<'a> {
    thread_num: usize,
    num_threads: usize,
    training: &'a [BitonalImage],
    train_labels: &'a [String],
    queries: &'a [BitonalImage],
    query_labels: &'a [String],
    tree: &'a ClusterTree,
    morph: &'a MorphParams,
    search: &'a SearchParams,
}

impl QueryTask<'_> {
    fn run(&self) -> ClusterResult<Vec<(usize, Classification)>> {
        let mut results = Vec::new();
        let mut q = self.thread_num;
        while q < self.queries.len() {
            let query = &self.queries[q];
            let mut fast = MorphCostOracle::fast(query, self.training, self.morph);
            let mut full = MorphCostOracle::full(query, self.training, self.morph);
            let classification = classify(
                self.tree,
                &mut fast,
                &mut full,
                self.train_labels,
                &self.query_labels[q],
                self.search,
            )?;
            results.push((q, classification));
            q += self.num_threads;
        }
        Ok(results)
    }
}

/// Classify a batch of query words against the training set, one worker per
/// stride of the query list. Results come back in query order.
pub fn classify_batch(
    training: &[BitonalImage],
    train_labels: &[String],
    queries: &[BitonalImage],
    query_labels: &[String],
    tree: &ClusterTree,
    morph: &MorphParams,
    search: &SearchParams,
    num_threads: usize,
) -> ClusterResult<Vec<Classification>> {
    if train_labels.len() != training.len() {
        return Err(ClusterError::LabelCountMismatch {
            labels: train_labels.len(),
            images: training.len(),
        });
    }
    if query_labels.len() != queries.len() {
        return Err(ClusterError::LabelCountMismatch {
            labels: query_labels.len(),
            images: queries.len(),
        });
    }
    let threads = resolve_thread_count(num_threads);
    let results: Vec<ClusterResult<Vec<(usize, Classification)>>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let task = QueryTask {
                    thread_num: t,
                    num_threads: threads,
                    training,
                    train_labels,
                    queries,
                    query_labels,
                    tree,
                    morph,
                    search,
                };
                scope.spawn(move || task.run())
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| panic::resume_unwind(e)))
            .collect()
    });

    let mut ordered: Vec<Option<Classification>> = vec![None; queries.len()];
    for result in results {
        for (q, classification) in result? {
            ordered[q] = Some(classification);
        }
    }
    // striding covers every query index exactly once
    Ok(ordered.into_iter().map(|c| c.unwrap()).collect())
}
