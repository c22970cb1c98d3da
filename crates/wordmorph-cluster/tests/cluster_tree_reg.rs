//! Cluster tree regression test
//!
//! Builds trees over synthetic metric cost matrices and exhaustively checks
//! the pruning-safety invariant: every node's cached radius covers the
//! matrix cost from its center to every descendant word. Also exercises the
//! merge-log resume path end to end.
//!
//! Run with:
//! ```
//! cargo test -p wordmorph-cluster --test cluster_tree_reg
//! ```

use std::path::PathBuf;
use wordmorph_cluster::{ClusterTree, CostMatrix, MergeLog};

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("wordmorph_tree_reg").join(name);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Deterministic 1-D embedding: item `i` sits at `position(i)` on a line and
/// the cost between two items is their absolute distance. Absolute distance
/// is a metric, so the tree's pruning bound is meaningful.
fn position(i: usize) -> f64 {
    // fixed linear-congruential scramble, nothing fancy
    let h = (i as u64)
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    ((h >> 33) % 1000) as f64 / 10.0
}

fn line_matrix(n: usize) -> CostMatrix {
    let mut values = vec![0.0f64; n * n];
    for r in 0..n {
        for c in 0..n {
            values[r * n + c] = (position(r) - position(c)).abs();
        }
    }
    CostMatrix::from_values(0, n - 1, values).unwrap()
}

#[test]
fn cluster_tree_reg() {
    for n in [2usize, 3, 7, 25, 50] {
        let m = line_matrix(n);
        let tree = ClusterTree::build(&m).unwrap();

        assert_eq!(tree.node_count(), 2 * n - 1, "n={n}");
        assert_eq!(tree.num_words(), n, "n={n}");
        assert_eq!(tree.node(tree.root()).words.len(), n, "n={n}");

        // the pruning-safety invariant must hold exhaustively
        assert_eq!(tree.check_radius_invariant(&m), None, "n={n}");

        // every word appears in exactly one leaf and once in the root set
        let root = tree.node(tree.root());
        let mut seen = vec![false; n];
        for &w in &root.words {
            assert!(!seen[w], "word {w} duplicated in root of n={n}");
            seen[w] = true;
        }
        assert!(seen.iter().all(|&s| s));

        // internal nodes have exactly two children whose word sets partition
        // the parent's
        for id in 0..tree.node_count() {
            let node = tree.node(id);
            if let Some([a, b]) = node.children {
                let (na, nb) = (tree.node(a), tree.node(b));
                assert_eq!(na.words.len() + nb.words.len(), node.words.len());
                assert_eq!(node.center_idx, na.center_idx);
            }
        }
    }
}

#[test]
fn cluster_tree_merge_log_resume_reg() {
    let dir = temp_dir("resume");
    let log_path = dir.join("merges.log");
    let _ = std::fs::remove_file(&log_path);

    let n = 20usize;
    let m = line_matrix(n);

    // full run, recording every merge
    let reference = {
        let mut log = MergeLog::open_or_create(&log_path, n).unwrap();
        ClusterTree::build_with_log(&m, Some(&mut log)).unwrap()
    };

    // simulate an interrupted run: keep only the first half of the log
    let text = std::fs::read_to_string(&log_path).unwrap();
    let keep: Vec<&str> = text.lines().take(1 + (n - 1) / 2).collect();
    std::fs::write(&log_path, format!("{}\n", keep.join("\n"))).unwrap();

    // resume: replayed merges plus fresh ones give the same tree
    let mut log = MergeLog::open_or_create(&log_path, n).unwrap();
    assert_eq!(log.recorded().len(), (n - 1) / 2);
    let resumed = ClusterTree::build_with_log(&m, Some(&mut log)).unwrap();

    assert_eq!(resumed.node_count(), reference.node_count());
    assert_eq!(
        resumed.node(resumed.root()).center_idx,
        reference.node(reference.root()).center_idx
    );
    for id in 0..resumed.node_count() {
        assert_eq!(
            resumed.node(id).words,
            reference.node(id).words,
            "node {id} differs after resume"
        );
    }
    // and the log is now complete again
    assert_eq!(log.recorded().len(), n - 1);

    std::fs::remove_dir_all(dir).unwrap();
}
