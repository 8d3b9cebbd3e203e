//! Report configuration

use crate::data::CleaningConfig;
use crate::error::{BarbellError, Result};
use crate::training::{CVStrategy, ModelSpec};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Resampling used to estimate each model's accuracy during training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CvConfig {
    /// Number of folds
    pub folds: usize,
    /// Keep class shares equal across folds
    pub stratified: bool,
}

impl Default for CvConfig {
    fn default() -> Self {
        Self {
            folds: 5,
            stratified: true,
        }
    }
}

impl CvConfig {
    pub fn strategy(&self) -> CVStrategy {
        if self.stratified {
            CVStrategy::StratifiedKFold {
                n_splits: self.folds,
                shuffle: true,
            }
        } else {
            CVStrategy::KFold {
                n_splits: self.folds,
                shuffle: true,
            }
        }
    }
}

/// Which accuracy estimate becomes the voting weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightSource {
    /// Accuracy on the hold-out part of the training file
    #[default]
    Holdout,
    /// Mean cross-validated accuracy on the training part
    CrossValidation,
}

/// Everything a report run needs besides the input files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub cleaning: CleaningConfig,
    /// Column holding the class label
    pub label_column: String,
    /// Column identifying test rows
    pub id_column: String,
    /// Share of each class used for training; the rest is held out
    pub train_fraction: f64,
    pub cv: CvConfig,
    /// Seed for partitioning, folds and model randomness
    pub seed: u64,
    pub weights: WeightSource,
    pub models: Vec<ModelSpec>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            cleaning: CleaningConfig::default(),
            label_column: "classe".to_string(),
            id_column: "problem_id".to_string(),
            train_fraction: 0.7,
            cv: CvConfig::default(),
            seed: 1234,
            weights: WeightSource::Holdout,
            models: ModelSpec::defaults(),
        }
    }
}

impl ReportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cleaning(mut self, cleaning: CleaningConfig) -> Self {
        self.cleaning = cleaning;
        self
    }

    pub fn with_label_column(mut self, column: impl Into<String>) -> Self {
        self.label_column = column.into();
        self
    }

    pub fn with_id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = column.into();
        self
    }

    pub fn with_train_fraction(mut self, fraction: f64) -> Self {
        self.train_fraction = fraction;
        self
    }

    pub fn with_folds(mut self, folds: usize) -> Self {
        self.cv.folds = folds;
        self
    }

    pub fn with_stratified_folds(mut self, stratified: bool) -> Self {
        self.cv.stratified = stratified;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_weights(mut self, source: WeightSource) -> Self {
        self.weights = source;
        self
    }

    pub fn with_models(mut self, models: Vec<ModelSpec>) -> Self {
        self.models = models;
        self
    }

    /// Check the settings before any data is read
    pub fn validate(&self) -> Result<()> {
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(BarbellError::ConfigError(format!(
                "train_fraction must be in (0, 1), got {}",
                self.train_fraction
            )));
        }
        if self.cv.folds < 2 {
            return Err(BarbellError::ConfigError(format!(
                "cv.folds must be at least 2, got {}",
                self.cv.folds
            )));
        }
        if !(0.0..=1.0).contains(&self.cleaning.max_missing_fraction) {
            return Err(BarbellError::ConfigError(format!(
                "cleaning.max_missing_fraction must be in [0, 1], got {}",
                self.cleaning.max_missing_fraction
            )));
        }
        if self.label_column.is_empty() {
            return Err(BarbellError::ConfigError("label_column is empty".to_string()));
        }
        if self.models.is_empty() {
            return Err(BarbellError::ConfigError("no models configured".to_string()));
        }
        let mut seen = HashSet::new();
        for spec in &self.models {
            if !seen.insert(spec.id.as_str()) {
                return Err(BarbellError::ConfigError(format!(
                    "duplicate model id {}",
                    spec.id
                )));
            }
        }
        Ok(())
    }

    /// Save the configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}
