//! Barbell Ensemble - accuracy-weighted voting over weight-lifting classifiers
//!
//! Classifies how a barbell lift was performed (classes `A` to `E`) from
//! wearable sensor readings. Several classifiers are trained on the same
//! cleaned data and combined by a hard vote in which each classifier's vote
//! counts in proportion to its measured accuracy.
//!
//! # Modules
//!
//! - [`ensemble`] - Weighted-vote aggregation (the core of the crate)
//! - [`metrics`] - Confusion matrices, accuracy, kappa, per-class statistics
//! - [`data`] - CSV loading, cleaning, feature matrices, partitioning
//! - [`training`] - Decision tree, random forest, naive Bayes, cross-validation
//! - [`config`] - Report configuration
//! - [`report`] - The end-to-end pipeline
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Voting and scoring
pub mod ensemble;
pub mod metrics;

// Data and models
pub mod data;
pub mod training;

// Pipeline
pub mod config;
pub mod report;

// Services
pub mod cli;

pub use error::{BarbellError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{BarbellError, Result};

    // Ensemble
    pub use crate::ensemble::{
        AccuracyTable, ClassifierId, EnsembleOutcome, Label, LabelSet, PredictionMatrix,
        WeightTable, WeightedVoteAggregator,
    };

    // Metrics
    pub use crate::metrics::{accuracy, ConfusionMatrix};

    // Data
    pub use crate::data::{CleaningConfig, DataCleaner, DataLoader, LabeledDataset, UnlabeledDataset};

    // Training
    pub use crate::training::{Classifier, ModelList, ModelSpec, TrainedModelList};

    // Pipeline
    pub use crate::config::{ReportConfig, WeightSource};
    pub use crate::report::{Report, ReportOutcome};
}
