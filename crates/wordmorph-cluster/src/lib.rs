//! Wordmorph Cluster - cost-matrix construction and cluster-tree search
//!
//! Turns the pairwise morph cost into an approximate nearest-neighbor
//! classifier:
//!
//! - [`CostMatrix`] / [`MatrixChunk`] - the persisted N x N training cost
//!   matrix and its chunked on-disk format
//! - [`ClusterTree`] - agglomerative binary cluster tree with exact cached
//!   radii (and [`MergeLog`] resume)
//! - [`classify`] - branch-and-bound tree search with a fast first pass and
//!   a full-cost confirmation pass
//! - [`batch`] - fork-join threaded matrix construction and batch
//!   classification

pub mod batch;
pub mod error;
pub mod matrix;
pub mod search;
pub mod tree;

pub use batch::{
    build_cost_chunk, build_cost_matrix, build_or_load_cost_matrix, classify_batch,
    resolve_thread_count,
};
pub use error::{ClusterError, ClusterResult};
pub use matrix::{CostMatrix, MatrixChunk, MatrixHeader, UNCOMPUTED, merge_chunks};
pub use search::{
    Classification, CostOracle, MorphCostOracle, RankedMatch, SearchParams, classify,
};
pub use tree::{ClusterNode, ClusterTree, MergeLog, NodeId};
