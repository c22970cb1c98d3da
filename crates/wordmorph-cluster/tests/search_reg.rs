//! Branch-and-bound search regression test
//!
//! Two scenarios:
//!
//! 1. Exactness at `alpha = 1`: for a 50-item synthetic training set with a
//!    metric cost (absolute distance on a line), the tree search must return
//!    the brute-force argmin index and cost for every query.
//! 2. End-to-end recognition: a training set `{"cat", "dog", "cat"}` of
//!    synthetic word images and a query built as a noisy copy of the first
//!    "cat" must classify as "cat" (index 0 or 2) with `correct == true`.
//!
//! Run with:
//! ```
//! cargo test -p wordmorph-cluster --test search_reg
//! ```

use rand::rngs::StdRng;
use rand::{Rng, RngExt, SeedableRng};
use wordmorph_cluster::{
    ClusterTree, CostMatrix, CostOracle, SearchParams, build_cost_matrix, classify,
    classify_batch,
};
use wordmorph_core::{BACKGROUND, BitonalImage, INK};
use wordmorph_morph::{MorphParams, MorphResult};

/// Deterministic 1-D embedding used as a cheap metric.
fn position(i: usize) -> f64 {
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

/// Oracle measuring absolute distance from a query position on the line.
struct LineOracle {
    query_pos: f64,
    calls: usize,
}

impl CostOracle for LineOracle {
    fn cost(&mut self, train_idx: usize) -> MorphResult<f64> {
        self.calls += 1;
        Ok((self.query_pos - position(train_idx)).abs())
    }
}

#[test]
fn search_exact_at_alpha_one_reg() {
    let n = 50usize;
    let m = line_matrix(n);
    let tree = ClusterTree::build(&m).unwrap();
    assert_eq!(tree.check_radius_invariant(&m), None);
    let labels: Vec<String> = (0..n).map(|i| format!("word{i}")).collect();
    let params = SearchParams {
        alpha: 1.0,
        slow_pass_top_n: 0,
        ..SearchParams::default()
    };

    // every training item in turn plays the query
    for q in 0..n {
        let brute = (0..n)
            .min_by(|&a, &b| {
                (position(q) - position(a))
                    .abs()
                    .total_cmp(&(position(q) - position(b)).abs())
            })
            .unwrap();
        let brute_cost = (position(q) - position(brute)).abs();

        let mut fast = LineOracle {
            query_pos: position(q),
            calls: 0,
        };
        let mut full = LineOracle {
            query_pos: position(q),
            calls: 0,
        };
        let result = classify(&tree, &mut fast, &mut full, &labels, &labels[q], &params).unwrap();

        assert_eq!(result.best_cost, brute_cost, "query {q}");
        assert_eq!(
            position(result.best_idx),
            position(brute),
            "query {q}: got index {} (pos {}), brute force {} (pos {})",
            result.best_idx,
            position(result.best_idx),
            brute,
            position(brute)
        );
        // the search must never evaluate more than every training item once
        assert!(result.oracle_calls <= n);
    }
}

/// Synthetic "cat": two tall stems over a baseline, plus an ear-like dot.
fn cat_image(shift: u32) -> BitonalImage {
    let mut img = BitonalImage::new(44, 20).unwrap();
    img.fill_rect(2, 13, 40, 2, INK);
    img.fill_rect(4 + shift, 3, 2, 10, INK);
    img.fill_rect(30 + shift, 3, 2, 10, INK);
    img.fill_rect(16, 6, 3, 2, INK);
    img
}

/// Synthetic "dog": one wide hump and a descender below the baseline.
fn dog_image() -> BitonalImage {
    let mut img = BitonalImage::new(44, 20).unwrap();
    img.fill_rect(2, 9, 40, 2, INK);
    img.fill_rect(10, 4, 12, 2, INK);
    img.fill_rect(10, 4, 2, 7, INK);
    img.fill_rect(20, 4, 2, 7, INK);
    img.fill_rect(34, 9, 2, 9, INK);
    img
}

#[test]
fn search_end_to_end_cat_dog_cat_reg() {
    let training = vec![cat_image(0), dog_image(), cat_image(1)];
    let train_labels: Vec<String> = ["cat", "dog", "cat"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    // the query is a noisy copy of training word 0
    let mut rng = StdRng::seed_from_u64(0x77_0d_ca);
    let mut query = cat_image(0);
    for _ in 0..25 {
        let x = rng.random_range(0..query.width());
        let y = rng.random_range(0..query.height());
        let flip = if query.is_ink(x, y) { BACKGROUND } else { INK };
        query.set_pixel(x, y, flip).unwrap();
    }

    let morph = MorphParams::default();
    let matrix = build_cost_matrix(&training, 0, &morph, 2).unwrap();
    let tree = ClusterTree::build(&matrix).unwrap();
    assert_eq!(tree.check_radius_invariant(&matrix), None);

    let search = SearchParams::default();
    let results = classify_batch(
        &training,
        &train_labels,
        std::slice::from_ref(&query),
        &["cat".to_string()],
        &tree,
        &morph,
        &search,
        2,
    )
    .unwrap();

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert!(
        result.best_idx == 0 || result.best_idx == 2,
        "matched index {} instead of a cat",
        result.best_idx
    );
    assert!(result.correct);
    assert!(result.best_cost >= 0.0);

    // the report names the ground truth and the verdict
    let mut buf = Vec::new();
    result.write_report(&mut buf, 0).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.contains("#cat"));
    assert!(text.contains("correct"));
}
