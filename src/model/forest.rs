//! Bagged ensemble of decision trees
//!
//! 100 Gini CART trees by default, each grown on a bootstrap sample with
//! sqrt-feature subsampling per split. All randomness comes from a single
//! seeded generator, so a given (data, params) pair always yields the same
//! forest.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::model::tree::{DecisionTree, TreeParams};
use crate::{FightError, Result};

/// Forest hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        ForestParams {
            n_trees: 100,
            max_depth: None,
            seed: 42,
        }
    }
}

/// One feature with its normalized importance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedFeature {
    pub name: String,
    pub importance: f64,
}

/// A fitted random-forest classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
    n_classes: usize,
    /// Mean-decrease-in-impurity importances, normalized to sum to 1
    importances: Vec<f64>,
}

impl RandomForest {
    /// Fit a forest on a feature matrix and class labels
    pub fn fit(x: &[Vec<f64>], y: &[usize], n_classes: usize, params: &ForestParams) -> Result<Self> {
        if x.is_empty() {
            return Err(FightError::Training("empty feature matrix".to_string()));
        }
        if x.len() != y.len() {
            return Err(FightError::Training(format!(
                "feature matrix has {} rows but {} labels",
                x.len(),
                y.len()
            )));
        }
        let n_features = x[0].len();
        if n_features == 0 {
            return Err(FightError::Training("feature matrix has no columns".to_string()));
        }
        if x.iter().any(|row| row.len() != n_features) {
            return Err(FightError::Training("ragged feature matrix".to_string()));
        }
        if n_classes == 0 || y.iter().any(|&label| label >= n_classes) {
            return Err(FightError::Training(format!(
                "labels out of range for {} classes",
                n_classes
            )));
        }

        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: 2,
            n_subfeatures: ((n_features as f64).sqrt().floor() as usize).max(1),
        };

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut importances = vec![0.0; n_features];
        let n = x.len();
        let mut trees = Vec::with_capacity(params.n_trees);
        for _ in 0..params.n_trees {
            let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            trees.push(DecisionTree::fit(
                x,
                y,
                &bootstrap,
                n_classes,
                &tree_params,
                &mut rng,
                &mut importances,
            ));
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for v in &mut importances {
                *v /= total;
            }
        }

        Ok(RandomForest {
            trees,
            n_features,
            n_classes,
            importances,
        })
    }

    /// Majority-vote prediction for one feature row
    pub fn predict(&self, row: &[f64]) -> usize {
        let mut votes = vec![0usize; self.n_classes];
        for tree in &self.trees {
            votes[tree.predict(row)] += 1;
        }
        // Ties break toward the lowest class id
        let mut best = 0;
        for (class, &count) in votes.iter().enumerate() {
            if count > votes[best] {
                best = class;
            }
        }
        best
    }

    pub fn predict_batch(&self, rows: &[Vec<f64>]) -> Vec<usize> {
        rows.iter().map(|row| self.predict(row)).collect()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Raw normalized importances, indexed like the training columns
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    /// Importances paired with column names, highest first
    ///
    /// Ties order alphabetically so ranking is deterministic.
    pub fn ranked_features(&self, names: &[String]) -> Vec<RankedFeature> {
        let mut ranked: Vec<RankedFeature> = names
            .iter()
            .zip(self.importances.iter())
            .map(|(name, &importance)| RankedFeature {
                name: name.clone(),
                importance,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..10 {
            x.push(vec![i as f64, 0.5]);
            y.push(0);
            x.push(vec![100.0 + i as f64, 0.5]);
            y.push(1);
        }
        (x, y)
    }

    #[test]
    fn test_fit_and_predict() {
        let (x, y) = separable();
        let params = ForestParams {
            n_trees: 25,
            ..Default::default()
        };
        let forest = RandomForest::fit(&x, &y, 2, &params).unwrap();

        assert_eq!(forest.n_trees(), 25);
        assert_eq!(forest.predict(&[3.0, 0.5]), 0);
        assert_eq!(forest.predict(&[105.0, 0.5]), 1);
    }

    #[test]
    fn test_deterministic_across_fits() {
        let (x, y) = separable();
        let params = ForestParams {
            n_trees: 10,
            ..Default::default()
        };
        let a = RandomForest::fit(&x, &y, 2, &params).unwrap();
        let b = RandomForest::fit(&x, &y, 2, &params).unwrap();

        assert_eq!(a.importances(), b.importances());
        let rows: Vec<Vec<f64>> = (0..200).map(|i| vec![i as f64, 0.5]).collect();
        assert_eq!(a.predict_batch(&rows), b.predict_batch(&rows));
    }

    #[test]
    fn test_importances_normalized() {
        let (x, y) = separable();
        let forest = RandomForest::fit(&x, &y, 2, &ForestParams::default()).unwrap();
        let sum: f64 = forest.importances().iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        // The constant second feature carries no importance
        assert_eq!(forest.importances()[1], 0.0);
    }

    #[test]
    fn test_ranked_features() {
        let (x, y) = separable();
        let forest = RandomForest::fit(&x, &y, 2, &ForestParams::default()).unwrap();
        let ranked = forest.ranked_features(&["distance".to_string(), "noise".to_string()]);
        assert_eq!(ranked[0].name, "distance");
        assert!(ranked[0].importance > ranked[1].importance);
    }

    #[test]
    fn test_fit_rejects_bad_input() {
        assert!(RandomForest::fit(&[], &[], 2, &ForestParams::default()).is_err());
        let x = vec![vec![1.0], vec![2.0]];
        assert!(RandomForest::fit(&x, &[0], 2, &ForestParams::default()).is_err());
        assert!(RandomForest::fit(&x, &[0, 5], 2, &ForestParams::default()).is_err());
    }
}
