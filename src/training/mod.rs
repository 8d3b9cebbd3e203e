//! Model training
//!
//! The classifiers whose votes feed the ensemble:
//! - CART decision tree
//! - Random forest
//! - Gaussian naive Bayes
//!
//! plus k-fold cross-validation and [`ModelList`], which fits every
//! configured model against one shared set of folds.

mod classifier;
mod model_list;
mod models;
pub mod cross_validation;
pub mod decision_tree;
pub mod naive_bayes;
pub mod random_forest;

pub use classifier::{Classifier, LabelEncoder};
pub use cross_validation::{CVResults, CVSplit, CVStrategy, CrossValidator};
pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use model_list::{Evaluation, FittedModel, ModelList, TrainedModelList};
pub use models::{ModelKind, ModelSpec, TrainedModel};
pub use naive_bayes::GaussianNaiveBayes;
pub use random_forest::{MaxFeatures, RandomForest};
