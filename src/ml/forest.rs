// ============================================================
// Layer 5 - Random Forest Classifier
// ============================================================
// Bagged ensemble of CART trees:
//
//   for tree i in 0..n_trees:
//       rng_i    = StdRng::seed_from_u64(seed + i)
//       sample   = n draws with replacement from the training rows
//       tree_i   = DecisionTree::fit(sample, max_features = √n)
//
//   predict(x) = majority vote over tree_i(x), lowest class on ties
//
// Each tree owns its own seeded RNG, so a forest is a pure
// function of (data, params, seed). Retraining on the same
// corpus reproduces the same trees bit for bit.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::domain::traits::Classifier;
use crate::ml::tree::{majority, DecisionTree, MaxFeatures, TreeParams};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub seed:    u64,
    pub tree:    TreeParams,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            seed:    42,
            tree:    TreeParams { max_features: MaxFeatures::Sqrt, ..TreeParams::default() },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees:      Vec<DecisionTree>,
    n_features: usize,
    n_classes:  usize,
}

impl RandomForest {
    /// Fit `params.n_trees` trees on bootstrap samples of (x, y).
    /// `x` must be non-empty; the trainer checks this before calling.
    pub fn fit(x: &[Vec<f64>], y: &[usize], n_classes: usize, params: &ForestParams) -> Self {
        let n_samples  = x.len();
        let n_features = x.first().map(Vec::len).unwrap_or(0);
        let draw       = Uniform::from(0..n_samples);

        let trees = (0..params.n_trees.max(1))
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(i as u64));
                let bootstrap: Vec<usize> = (0..n_samples).map(|_| draw.sample(&mut rng)).collect();
                DecisionTree::fit(x, y, &bootstrap, n_classes, &params.tree, &mut rng)
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            "Fitted forest: {} trees, max depth {}",
            trees.len(),
            trees.iter().map(DecisionTree::depth).max().unwrap_or(0),
        );

        Self { trees, n_features, n_classes }
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".into());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            if tree.n_features() != self.n_features || tree.n_classes() != self.n_classes {
                return Err(format!("tree {i} shape differs from the forest"));
            }
            tree.validate().map_err(|e| format!("tree {i}: {e}"))?;
        }
        Ok(())
    }
}

impl Classifier for RandomForest {
    fn predict_one(&self, features: &[f64]) -> usize {
        let mut votes = vec![0usize; self.n_classes];
        for tree in &self.trees {
            votes[tree.predict_one(features)] += 1;
        }
        majority(&votes)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }
}
