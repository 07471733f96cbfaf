// ============================================================
// Layer 5 - Decision Tree Classifier (CART)
// ============================================================
// Binary classification tree grown by greedy Gini-impurity
// splits on numeric features:
//
//   Gini(node) = 1 - Σ p_c²
//   gain       = Gini(parent) - (n_l/n)·Gini(left) - (n_r/n)·Gini(right)
//
// For each candidate feature the samples are sorted once and the
// class counts are swept left to right, so every threshold (the
// midpoint between two consecutive distinct values) is scored in
// O(1). A sample goes LEFT when `x[feature] <= threshold`.
//
// Storage is a flat pre-order node array instead of boxed
// children. The root is node 0 and every child index is greater
// than its parent's, which keeps prediction iterative and lets a
// loaded artifact be checked for cycles and dangling indices.
//
// Ties are broken deterministically (first best split in feature
// order, lowest class index on equal votes), so the same data,
// parameters and RNG seed always grow the same tree.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::traits::Classifier;

// ─── Hyperparameters ──────────────────────────────────────────────────────────
/// How many features are considered at each split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// Every feature, every split (plain CART)
    All,
    /// A random subset of ⌈√n_features⌉ (random forest default)
    Sqrt,
}

impl MaxFeatures {
    fn count(self, n_features: usize) -> usize {
        match self {
            Self::All  => n_features,
            Self::Sqrt => ((n_features as f64).sqrt().ceil() as usize).clamp(1, n_features.max(1)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// None grows until leaves are pure or unsplittable
    pub max_depth:         Option<usize>,
    /// Nodes with fewer samples become leaves
    pub min_samples_split: usize,
    pub max_features:      MaxFeatures,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth:         None,
            min_samples_split: 2,
            max_features:      MaxFeatures::All,
        }
    }
}

// ─── Nodes ────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature:   usize,
        threshold: f64,
        left:      usize,
        right:     usize,
    },
    Leaf {
        class:   usize,
        samples: usize,
    },
}

// ─── DecisionTree ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes:      Vec<Node>,
    n_features: usize,
    n_classes:  usize,
}

impl DecisionTree {
    /// Grow a tree on the rows of `x` selected by `indices`.
    ///
    /// `indices` may repeat rows (bootstrap samples). Labels must be
    /// below `n_classes`; classes absent from this sample are simply
    /// never predicted. Callers guarantee at least one index and
    /// rows of equal width.
    pub fn fit<R: Rng + ?Sized>(
        x:         &[Vec<f64>],
        y:         &[usize],
        indices:   &[usize],
        n_classes: usize,
        params:    &TreeParams,
        rng:       &mut R,
    ) -> Self {
        let n_features = x.first().map(Vec::len).unwrap_or(0);
        let mut grower = Grower {
            x,
            y,
            n_classes,
            n_features,
            params,
            rng,
            nodes: Vec::new(),
        };
        grower.grow(indices.to_vec(), 0);

        Self { nodes: grower.nodes, n_features, n_classes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Longest root-to-leaf path; a lone leaf has depth 0.
    pub fn depth(&self) -> usize {
        let mut depths = vec![0usize; self.nodes.len()];
        let mut max = 0;
        for (i, node) in self.nodes.iter().enumerate() {
            if let Node::Split { left, right, .. } = *node {
                depths[left]  = depths[i] + 1;
                depths[right] = depths[i] + 1;
                max = max.max(depths[i] + 1);
            }
        }
        max
    }

    /// Structural check for trees read back from disk.
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Split { feature, threshold, left, right } => {
                    if feature >= self.n_features {
                        return Err(format!("node {i} splits on feature {feature} of {}", self.n_features));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {i} has a non-finite threshold"));
                    }
                    if left <= i || right <= i || left >= self.nodes.len() || right >= self.nodes.len() {
                        return Err(format!("node {i} has invalid children ({left}, {right})"));
                    }
                }
                Node::Leaf { class, .. } => {
                    if class >= self.n_classes {
                        return Err(format!("leaf {i} predicts class {class} of {}", self.n_classes));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Classifier for DecisionTree {
    fn predict_one(&self, features: &[f64]) -> usize {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { class, .. } => return class,
                Node::Split { feature, threshold, left, right } => {
                    idx = if features[feature] <= threshold { left } else { right };
                }
            }
        }
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }
}

// ─── Grower ───────────────────────────────────────────────────────────────────
// Holds the borrowed training data while the node array is built.
struct Grower<'a, R: Rng + ?Sized> {
    x:          &'a [Vec<f64>],
    y:          &'a [usize],
    n_classes:  usize,
    n_features: usize,
    params:     &'a TreeParams,
    rng:        &'a mut R,
    nodes:      Vec<Node>,
}

impl<R: Rng + ?Sized> Grower<'_, R> {
    /// Append the subtree for `indices` and return its root index.
    fn grow(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        let counts = self.class_counts(&indices);
        let at_depth_limit = self.params.max_depth.is_some_and(|d| depth >= d);
        let is_pure = counts.iter().filter(|&&c| c > 0).count() <= 1;

        if is_pure || at_depth_limit || indices.len() < self.params.min_samples_split {
            return self.push_leaf(&counts, indices.len());
        }

        let Some((feature, threshold)) = self.best_split(&indices, &counts) else {
            return self.push_leaf(&counts, indices.len());
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.x[i][feature] <= threshold);

        // A midpoint can round onto one of its neighbours
        if left_idx.is_empty() || right_idx.is_empty() {
            return self.push_leaf(&counts, indices.len());
        }

        // Reserve this node's slot so children get larger indices
        let me = self.nodes.len();
        self.nodes.push(Node::Leaf { class: 0, samples: 0 });
        let left  = self.grow(left_idx, depth + 1);
        let right = self.grow(right_idx, depth + 1);
        self.nodes[me] = Node::Split { feature, threshold, left, right };
        me
    }

    fn push_leaf(&mut self, counts: &[usize], samples: usize) -> usize {
        self.nodes.push(Node::Leaf { class: majority(counts), samples });
        self.nodes.len() - 1
    }

    fn class_counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            counts[self.y[i]] += 1;
        }
        counts
    }

    /// Best (feature, threshold) by Gini gain, or None if no split
    /// strictly reduces impurity.
    fn best_split(&mut self, indices: &[usize], parent: &[usize]) -> Option<(usize, f64)> {
        let n = indices.len() as f64;
        let parent_gini = gini(parent, n);

        let k = self.params.max_features.count(self.n_features);
        let mut features: Vec<usize> = if k >= self.n_features {
            (0..self.n_features).collect()
        } else {
            rand::seq::index::sample(&mut *self.rng, self.n_features, k).into_vec()
        };
        features.sort_unstable();

        let mut best: Option<(usize, f64)> = None;
        let mut best_gain = 0.0;
        let mut order = indices.to_vec();

        for feature in features {
            let x = self.x;
            order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

            let mut left  = vec![0usize; self.n_classes];
            let mut right = parent.to_vec();

            for pos in 0..order.len() - 1 {
                let class = self.y[order[pos]];
                left[class]  += 1;
                right[class] -= 1;

                let here = x[order[pos]][feature];
                let next = x[order[pos + 1]][feature];
                if here == next {
                    continue;
                }

                let n_left  = (pos + 1) as f64;
                let n_right = n - n_left;
                let gain = parent_gini
                    - (n_left / n) * gini(&left, n_left)
                    - (n_right / n) * gini(&right, n_right);

                if gain > best_gain + f64::EPSILON {
                    best_gain = gain;
                    best = Some((feature, here + (next - here) / 2.0));
                }
            }
        }

        best
    }
}

/// Gini impurity of a class histogram holding `n` samples.
pub(crate) fn gini(counts: &[usize], n: f64) -> f64 {
    if n == 0.0 {
        return 0.0;
    }
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

/// Most frequent class; the lowest index wins a tie.
pub(crate) fn majority(counts: &[usize]) -> usize {
    counts
        .iter()
        .enumerate()
        .fold((0, 0), |(best, best_n), (class, &n)| {
            if n > best_n { (class, n) } else { (best, best_n) }
        })
        .0
}
