// ============================================================
// Layer 5 - Trained Model
// ============================================================
// The persisted classifier behind each recommender. Two
// algorithms are supported:
//
//   Forest → bagged CART ensemble (default for both targets)
//   Tree   → a single CART tree
//
// The serialised form is plain JSON: the tree nodes themselves,
// not an opaque blob, so any runtime can replay a prediction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::traits::Classifier;
use crate::ml::forest::RandomForest;
use crate::ml::tree::DecisionTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Forest,
    Tree,
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "forest" | "random_forest" => Ok(Self::Forest),
            "tree" | "decision_tree"   => Ok(Self::Tree),
            other => Err(format!("unknown model kind '{other}' (expected 'forest' or 'tree')")),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forest => write!(f, "forest"),
            Self::Tree   => write!(f, "tree"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum TrainedModel {
    Forest(RandomForest),
    Tree(DecisionTree),
}

impl TrainedModel {
    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Forest(_) => ModelKind::Forest,
            Self::Tree(_)   => ModelKind::Tree,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Forest(m) => m.validate(),
            Self::Tree(m)   => m.validate(),
        }
    }

    /// Fraction of rows whose prediction equals the label.
    /// An empty evaluation set scores 0.
    pub fn accuracy(&self, x: &[Vec<f64>], y: &[usize]) -> f64 {
        if x.is_empty() {
            return 0.0;
        }
        let correct = x
            .iter()
            .zip(y)
            .filter(|(row, &label)| self.predict_one(row) == label)
            .count();
        correct as f64 / x.len() as f64
    }
}

impl Classifier for TrainedModel {
    fn predict_one(&self, features: &[f64]) -> usize {
        match self {
            Self::Forest(m) => m.predict_one(features),
            Self::Tree(m)   => m.predict_one(features),
        }
    }

    fn n_features(&self) -> usize {
        match self {
            Self::Forest(m) => m.n_features(),
            Self::Tree(m)   => m.n_features(),
        }
    }

    fn n_classes(&self) -> usize {
        match self {
            Self::Forest(m) => m.n_classes(),
            Self::Tree(m)   => m.n_classes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_parsing() {
        assert_eq!("forest".parse::<ModelKind>().unwrap(), ModelKind::Forest);
        assert_eq!("Decision_Tree".parse::<ModelKind>().unwrap(), ModelKind::Tree);
        assert!("svm".parse::<ModelKind>().is_err());
        assert_eq!(ModelKind::Tree.to_string(), "tree");
    }

    #[test]
    fn test_serialised_model_is_tagged_with_algorithm() {
        let x = vec![vec![0.0], vec![1.0]];
        let y = vec![0, 1];
        let mut rng = <rand::rngs::StdRng as rand::SeedableRng>::seed_from_u64(1);
        let tree = DecisionTree::fit(&x, &y, &[0, 1], 2, &Default::default(), &mut rng);
        let model = TrainedModel::Tree(tree);

        let json: serde_json::Value = serde_json::to_value(&model).unwrap();
        assert_eq!(json["algorithm"], "tree");
        assert_eq!(model.accuracy(&x, &y), 1.0);
        assert_eq!(model.kind(), ModelKind::Tree);
    }
}
