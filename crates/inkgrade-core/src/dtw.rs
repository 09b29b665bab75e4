//! Dynamic time warping between two point sequences.
//!
//! Classic O(n·m) formulation with a full cumulative cost matrix and
//! Euclidean local cost. Callers resample both inputs to a few hundred
//! points at most before matching.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Outcome of a DTW alignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DtwResult {
    /// Cumulative cost at `(n-1, m-1)`; `+inf` when either input is empty.
    pub distance: f64,
    /// Index pairs `(i, j)` of the optimal alignment, from `(0, 0)` to `(n-1, m-1)`.
    pub path: Vec<(usize, usize)>,
}

impl DtwResult {
    /// Mean point distance over the pairs of the alignment path.
    ///
    /// `+inf` when the path is empty.
    pub fn mean_pair_distance(&self, a: &[Point], b: &[Point]) -> f64 {
        if self.path.is_empty() {
            return f64::INFINITY;
        }
        let total: f64 = self.path.iter().map(|&(i, j)| a[i].distance(b[j])).sum();
        total / self.path.len() as f64
    }
}

/// Align `a` and `b`.
///
/// Backtracking prefers the diagonal predecessor, then up (`i-1`), then
/// left (`j-1`) when costs tie.
pub fn dtw(a: &[Point], b: &[Point]) -> DtwResult {
    let (n, m) = (a.len(), b.len());
    if n == 0 || m == 0 {
        return DtwResult {
            distance: f64::INFINITY,
            path: Vec::new(),
        };
    }

    // row-major n x m
    let mut cost = vec![0.0f64; n * m];
    let at = |i: usize, j: usize| i * m + j;

    cost[0] = a[0].distance(b[0]);
    for i in 1..n {
        cost[at(i, 0)] = cost[at(i - 1, 0)] + a[i].distance(b[0]);
    }
    for j in 1..m {
        cost[at(0, j)] = cost[at(0, j - 1)] + a[0].distance(b[j]);
    }
    for i in 1..n {
        for j in 1..m {
            let best = cost[at(i - 1, j)]
                .min(cost[at(i, j - 1)])
                .min(cost[at(i - 1, j - 1)]);
            cost[at(i, j)] = a[i].distance(b[j]) + best;
        }
    }

    let mut path = Vec::with_capacity(n + m);
    let (mut i, mut j) = (n - 1, m - 1);
    path.push((i, j));
    while i > 0 || j > 0 {
        if i == 0 {
            j -= 1;
        } else if j == 0 {
            i -= 1;
        } else {
            let diag = cost[at(i - 1, j - 1)];
            let up = cost[at(i - 1, j)];
            let left = cost[at(i, j - 1)];
            let best = diag.min(up).min(left);
            if best == diag {
                i -= 1;
                j -= 1;
            } else if best == up {
                i -= 1;
            } else {
                j -= 1;
            }
        }
        path.push((i, j));
    }
    path.reverse();

    DtwResult {
        distance: cost[at(n - 1, m - 1)],
        path,
    }
}
