//! Fitting a list of models against one shared set of folds

use super::classifier::{Classifier, LabelEncoder};
use super::cross_validation::{CVResults, CVStrategy, CrossValidator};
use super::models::{ModelSpec, TrainedModel};
use crate::data::{FeatureImputer, LabeledDataset};
use crate::ensemble::{AccuracyTable, ClassifierId, Label, LabelSet, PredictionMatrix};
use crate::error::{BarbellError, Result};
use crate::metrics::{accuracy, ConfusionMatrix};
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Builds and fits every model in a list
#[derive(Debug, Clone)]
pub struct ModelList {
    specs: Vec<ModelSpec>,
    cv: CVStrategy,
    seed: u64,
}

/// A fitted model with its resampling record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedModel {
    pub id: ClassifierId,
    pub family: String,
    pub model: TrainedModel,
    pub cv: CVResults,
    pub oob_score: Option<f64>,
    pub training_time_secs: f64,
}

/// Predictions and scores of every model on labelled rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub predictions: PredictionMatrix,
    pub accuracies: AccuracyTable,
    pub confusion: BTreeMap<ClassifierId, ConfusionMatrix>,
}

impl ModelList {
    pub fn new(specs: Vec<ModelSpec>) -> Self {
        Self {
            specs,
            cv: CVStrategy::default(),
            seed: 42,
        }
    }

    pub fn with_cv(mut self, cv: CVStrategy) -> Self {
        self.cv = cv;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn specs(&self) -> &[ModelSpec] {
        &self.specs
    }

    /// Cross-validate each model on the same folds, then fit it on all rows
    pub fn fit(&self, train: &LabeledDataset) -> Result<TrainedModelList> {
        if self.specs.is_empty() {
            return Err(BarbellError::InvalidInput("model list is empty".to_string()));
        }
        let mut seen = HashSet::new();
        for spec in &self.specs {
            if !seen.insert(&spec.id) {
                return Err(BarbellError::InvalidInput(format!(
                    "duplicate model id {}",
                    spec.id
                )));
            }
        }

        let encoder = LabelEncoder::new(train.label_set());
        let y = encoder.encode(&train.y)?;
        let n_classes = encoder.n_classes();

        let imputer = FeatureImputer::fit(&train.x);
        let mut x = train.x.clone();
        imputer.transform(&mut x)?;

        let folds = CrossValidator::new(self.cv)
            .with_random_state(self.seed)
            .split(y.as_slice().unwrap_or(&[]))?;
        info!(
            models = self.specs.len(),
            folds = folds.len(),
            strategy = self.cv.name(),
            samples = x.nrows(),
            "Fitting model list"
        );

        let mut models = Vec::with_capacity(self.specs.len());
        for spec in &self.specs {
            let start = Instant::now();

            let scores = folds
                .par_iter()
                .map(|split| {
                    let x_train = x.select(Axis(0), &split.train_indices);
                    let y_train: Array1<usize> =
                        split.train_indices.iter().map(|&i| y[i]).collect();
                    let x_test = x.select(Axis(0), &split.test_indices);

                    let mut model = spec.model.build(self.seed);
                    model.fit(&x_train, &y_train, n_classes)?;
                    let predicted = model.predict(&x_test)?;

                    let correct = split
                        .test_indices
                        .iter()
                        .zip(predicted.iter())
                        .filter(|(&i, &p)| y[i] == p)
                        .count();
                    debug!(model = %spec.id, fold = split.fold_idx, correct, "Fold scored");
                    Ok(correct as f64 / split.test_indices.len() as f64)
                })
                .collect::<Result<Vec<f64>>>()?;
            let cv = CVResults::from_scores(scores);

            let mut model = spec.model.build(self.seed);
            model.fit(&x, &y, n_classes)?;
            let training_time_secs = start.elapsed().as_secs_f64();

            info!(
                model = %spec.id,
                family = spec.model.family(),
                cv_accuracy = cv.mean_score,
                cv_std = cv.std_score,
                secs = training_time_secs,
                "Model fitted"
            );

            models.push(FittedModel {
                id: spec.id.clone(),
                family: spec.model.family().to_string(),
                oob_score: model.oob_score(),
                model,
                cv,
                training_time_secs,
            });
        }

        Ok(TrainedModelList {
            encoder,
            feature_names: train.feature_names.clone(),
            imputer,
            models,
        })
    }
}

/// Fitted models sharing one label encoding and imputer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModelList {
    encoder: LabelEncoder,
    feature_names: Vec<String>,
    imputer: FeatureImputer,
    models: Vec<FittedModel>,
}

impl TrainedModelList {
    pub fn models(&self) -> &[FittedModel] {
        &self.models
    }

    pub fn labels(&self) -> &LabelSet {
        self.encoder.labels()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn get(&self, id: &ClassifierId) -> Option<&FittedModel> {
        self.models.iter().find(|m| &m.id == id)
    }

    /// Mean cross-validated accuracy per model
    pub fn cv_accuracies(&self) -> Result<AccuracyTable> {
        AccuracyTable::from_pairs(self.models.iter().map(|m| (m.id.clone(), m.cv.mean_score)))
    }

    /// One predicted label per row and model
    pub fn predict_matrix(&self, x: &Array2<f64>) -> Result<PredictionMatrix> {
        if x.ncols() != self.feature_names.len() {
            return Err(BarbellError::ShapeError {
                expected: format!("{} features", self.feature_names.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        let mut x = x.clone();
        self.imputer.transform(&mut x)?;

        let columns = self
            .models
            .iter()
            .map(|m| {
                let classes = m.model.predict(&x)?;
                Ok((m.id.clone(), self.encoder.decode(&classes)?))
            })
            .collect::<Result<Vec<(ClassifierId, Vec<Label>)>>>()?;

        PredictionMatrix::from_columns(columns)
    }

    /// Score every model against known labels
    pub fn evaluate(&self, data: &LabeledDataset) -> Result<Evaluation> {
        let predictions = self.predict_matrix(&data.x)?;
        let labels = self.labels().union(&data.label_set());

        let mut accuracies = AccuracyTable::new();
        let mut confusion = BTreeMap::new();
        for id in predictions.classifiers() {
            let predicted: Vec<Label> = predictions
                .column(id)
                .map(|col| col.to_vec())
                .unwrap_or_default();
            let acc = accuracy(&data.y, &predicted);
            accuracies.insert(id.clone(), acc)?;
            confusion.insert(
                id.clone(),
                ConfusionMatrix::with_labels(labels.clone(), &data.y, &predicted)?,
            );
            info!(model = %id, accuracy = acc, "Hold-out accuracy");
        }

        Ok(Evaluation {
            predictions,
            accuracies,
            confusion,
        })
    }

    /// Named feature importances of one model, largest first
    pub fn feature_importances(&self, id: &ClassifierId) -> Option<Vec<(String, f64)>> {
        let importances = self.get(id)?.model.feature_importances()?;
        let mut named: Vec<(String, f64)> = self
            .feature_names
            .iter()
            .cloned()
            .zip(importances.iter().copied())
            .collect();
        named.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Some(named)
    }

    /// Save the fitted list as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a list written by [`TrainedModelList::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
