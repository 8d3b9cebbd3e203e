//! Model specifications and the fitted-model enum

use super::classifier::Classifier;
use super::decision_tree::{Criterion, DecisionTree};
use super::naive_bayes::GaussianNaiveBayes;
use super::random_forest::{MaxFeatures, RandomForest};
use crate::ensemble::ClassifierId;
use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Model family plus hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelKind {
    RandomForest {
        n_estimators: usize,
        #[serde(default)]
        max_depth: Option<usize>,
        min_samples_leaf: usize,
        max_features: MaxFeatures,
        #[serde(default)]
        oob_score: bool,
    },
    DecisionTree {
        #[serde(default)]
        max_depth: Option<usize>,
        min_samples_split: usize,
        min_samples_leaf: usize,
        #[serde(default)]
        min_impurity_decrease: f64,
        #[serde(default)]
        criterion: Criterion,
    },
    GaussianNb {
        var_smoothing: f64,
    },
}

impl ModelKind {
    /// Unfitted model seeded with `seed`
    pub fn build(&self, seed: u64) -> TrainedModel {
        match self {
            ModelKind::RandomForest {
                n_estimators,
                max_depth,
                min_samples_leaf,
                max_features,
                oob_score,
            } => {
                let mut rf = RandomForest::new(*n_estimators)
                    .with_min_samples_leaf(*min_samples_leaf)
                    .with_max_features(*max_features)
                    .with_oob_score(*oob_score)
                    .with_random_state(seed);
                if let Some(d) = max_depth {
                    rf = rf.with_max_depth(*d);
                }
                TrainedModel::RandomForest(rf)
            }
            ModelKind::DecisionTree {
                max_depth,
                min_samples_split,
                min_samples_leaf,
                min_impurity_decrease,
                criterion,
            } => {
                let mut tree = DecisionTree::new()
                    .with_min_samples_split(*min_samples_split)
                    .with_min_samples_leaf(*min_samples_leaf)
                    .with_min_impurity_decrease(*min_impurity_decrease)
                    .with_criterion(*criterion)
                    .with_random_state(seed);
                if let Some(d) = max_depth {
                    tree = tree.with_max_depth(*d);
                }
                TrainedModel::DecisionTree(tree)
            }
            ModelKind::GaussianNb { var_smoothing } => TrainedModel::GaussianNaiveBayes(
                GaussianNaiveBayes::new().with_var_smoothing(*var_smoothing),
            ),
        }
    }

    pub fn family(&self) -> &'static str {
        match self {
            ModelKind::RandomForest { .. } => "random forest",
            ModelKind::DecisionTree { .. } => "decision tree",
            ModelKind::GaussianNb { .. } => "gaussian naive bayes",
        }
    }
}

/// A named model in the list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub id: ClassifierId,
    pub model: ModelKind,
}

impl ModelSpec {
    pub fn new(id: impl Into<ClassifierId>, model: ModelKind) -> Self {
        Self {
            id: id.into(),
            model,
        }
    }

    /// Forest of 100 trees with sqrt feature sampling
    pub fn random_forest(id: impl Into<ClassifierId>) -> Self {
        Self::new(
            id,
            ModelKind::RandomForest {
                n_estimators: 100,
                max_depth: None,
                min_samples_leaf: 1,
                max_features: MaxFeatures::Sqrt,
                oob_score: true,
            },
        )
    }

    /// Single pruned tree: at most 30 levels, 20 rows to split, 7 per leaf
    pub fn decision_tree(id: impl Into<ClassifierId>) -> Self {
        Self::new(
            id,
            ModelKind::DecisionTree {
                max_depth: Some(30),
                min_samples_split: 20,
                min_samples_leaf: 7,
                min_impurity_decrease: 0.0,
                criterion: Criterion::Gini,
            },
        )
    }

    pub fn naive_bayes(id: impl Into<ClassifierId>) -> Self {
        Self::new(id, ModelKind::GaussianNb { var_smoothing: 1e-9 })
    }

    /// `rf`, `rpart` and `nb`
    pub fn defaults() -> Vec<ModelSpec> {
        vec![
            Self::random_forest("rf"),
            Self::decision_tree("rpart"),
            Self::naive_bayes("nb"),
        ]
    }
}

/// Enum to hold fitted model variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrainedModel {
    RandomForest(RandomForest),
    DecisionTree(DecisionTree),
    GaussianNaiveBayes(GaussianNaiveBayes),
}

impl TrainedModel {
    fn inner(&self) -> &dyn Classifier {
        match self {
            TrainedModel::RandomForest(m) => m,
            TrainedModel::DecisionTree(m) => m,
            TrainedModel::GaussianNaiveBayes(m) => m,
        }
    }

    /// Out-of-bag accuracy for forests fitted with it enabled
    pub fn oob_score(&self) -> Option<f64> {
        match self {
            TrainedModel::RandomForest(rf) => rf.oob_score_value(),
            _ => None,
        }
    }
}

impl Classifier for TrainedModel {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<usize>, n_classes: usize) -> Result<()> {
        match self {
            TrainedModel::RandomForest(m) => m.fit(x, y, n_classes),
            TrainedModel::DecisionTree(m) => m.fit(x, y, n_classes),
            TrainedModel::GaussianNaiveBayes(m) => m.fit(x, y, n_classes),
        }
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        self.inner().predict(x)
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        self.inner().feature_importances()
    }
}
