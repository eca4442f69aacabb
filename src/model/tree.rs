//! CART decision tree
//!
//! Gini-impurity binary splits over numeric features, stored as a flat node
//! arena. Trees are grown by the forest with bootstrap sample indices and a
//! random feature subset per split.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Minimum impurity decrease for a split to be worth keeping
const MIN_DECREASE: f64 = 1e-12;

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        class: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Growth limits shared by all trees in a forest
#[derive(Debug, Clone)]
pub(crate) struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub n_subfeatures: usize,
}

/// A fitted classification tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Grow a tree on the bootstrap sample given by `indices`
    ///
    /// Impurity decreases are accumulated into `importances`, weighted by the
    /// fraction of the sample reaching each split.
    pub(crate) fn fit(
        x: &[Vec<f64>],
        y: &[usize],
        indices: &[usize],
        n_classes: usize,
        params: &TreeParams,
        rng: &mut StdRng,
        importances: &mut [f64],
    ) -> Self {
        let mut nodes = Vec::new();
        let mut indices = indices.to_vec();
        let n_total = indices.len();
        build_node(
            x,
            y,
            &mut indices,
            n_classes,
            0,
            params,
            rng,
            importances,
            n_total,
            &mut nodes,
        );
        DecisionTree { nodes }
    }

    /// Predicted class for one feature row
    pub fn predict(&self, row: &[f64]) -> usize {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { class } => return *class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Number of nodes in the tree
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[allow(clippy::too_many_arguments)]
fn build_node(
    x: &[Vec<f64>],
    y: &[usize],
    indices: &mut [usize],
    n_classes: usize,
    depth: usize,
    params: &TreeParams,
    rng: &mut StdRng,
    importances: &mut [f64],
    n_total: usize,
    nodes: &mut Vec<Node>,
) -> usize {
    let counts = class_counts(y, indices, n_classes);
    let impurity = gini(&counts, indices.len());
    let majority = majority_class(&counts);

    let depth_capped = params.max_depth.is_some_and(|d| depth >= d);
    if indices.len() < params.min_samples_split || impurity == 0.0 || depth_capped {
        nodes.push(Node::Leaf { class: majority });
        return nodes.len() - 1;
    }

    // Search a random feature subset first; if none of those features admit a
    // valid split, keep going through the rest rather than giving up early.
    let n_features = x[0].len();
    let mut features: Vec<usize> = (0..n_features).collect();
    features.shuffle(rng);
    let subset = params.n_subfeatures.min(n_features);
    let (primary, fallback) = features.split_at(subset);
    let split = best_split(x, y, indices, n_classes, impurity, primary)
        .or_else(|| best_split(x, y, indices, n_classes, impurity, fallback));
    let split = match split {
        Some(s) => s,
        None => {
            nodes.push(Node::Leaf { class: majority });
            return nodes.len() - 1;
        }
    };

    importances[split.feature] += indices.len() as f64 / n_total as f64 * split.decrease;

    // Partition indices in place around the threshold
    let mut i = 0;
    let mut j = indices.len();
    while i < j {
        if x[indices[i]][split.feature] <= split.threshold {
            i += 1;
        } else {
            j -= 1;
            indices.swap(i, j);
        }
    }

    // Placeholder so children get stable arena slots
    let node_idx = nodes.len();
    nodes.push(Node::Leaf { class: majority });

    let (left_indices, right_indices) = indices.split_at_mut(i);
    let left = build_node(
        x,
        y,
        left_indices,
        n_classes,
        depth + 1,
        params,
        rng,
        importances,
        n_total,
        nodes,
    );
    let right = build_node(
        x,
        y,
        right_indices,
        n_classes,
        depth + 1,
        params,
        rng,
        importances,
        n_total,
        nodes,
    );

    nodes[node_idx] = Node::Split {
        feature: split.feature,
        threshold: split.threshold,
        left,
        right,
    };
    node_idx
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    /// Impurity decrease relative to the parent node
    decrease: f64,
}

/// Exhaustive threshold scan over the candidate features
///
/// Samples are sorted per feature; class counts shift across the boundary one
/// sample at a time so every candidate split costs O(1) to evaluate.
fn best_split(
    x: &[Vec<f64>],
    y: &[usize],
    indices: &[usize],
    n_classes: usize,
    node_impurity: f64,
    candidates: &[usize],
) -> Option<BestSplit> {
    let n = indices.len();
    let mut best: Option<BestSplit> = None;

    for &feature in candidates {
        let mut order = indices.to_vec();
        order.sort_by(|&a, &b| {
            x[a][feature]
                .partial_cmp(&x[b][feature])
                .unwrap_or(Ordering::Equal)
        });

        let mut left_counts = vec![0usize; n_classes];
        let mut right_counts = class_counts(y, &order, n_classes);

        for boundary in 0..n - 1 {
            let i = order[boundary];
            left_counts[y[i]] += 1;
            right_counts[y[i]] -= 1;

            let value = x[i][feature];
            let next = x[order[boundary + 1]][feature];
            if next <= value {
                // No threshold separates equal values
                continue;
            }

            let n_left = boundary + 1;
            let n_right = n - n_left;
            let weighted = (n_left as f64 / n as f64) * gini(&left_counts, n_left)
                + (n_right as f64 / n as f64) * gini(&right_counts, n_right);
            let decrease = node_impurity - weighted;

            if decrease > MIN_DECREASE
                && best.as_ref().map_or(true, |b| decrease > b.decrease)
            {
                best = Some(BestSplit {
                    feature,
                    threshold: (value + next) / 2.0,
                    decrease,
                });
            }
        }
    }

    best
}

fn class_counts(y: &[usize], indices: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &i in indices {
        counts[y[i]] += 1;
    }
    counts
}

fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

/// Majority class, lowest class id on ties
fn majority_class(counts: &[usize]) -> usize {
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best
}
