//! End-to-end report: clean, partition, train, score, vote, predict

use crate::config::{ReportConfig, WeightSource};
use crate::data::{
    CleaningSummary, DataCleaner, DataLoader, LabeledDataset, StratifiedPartitioner,
    UnlabeledDataset,
};
use crate::ensemble::{
    weight_mass, AccuracyTable, ClassifierId, EnsembleOutcome, Label, WeightTable,
    WeightedVoteAggregator, WEIGHT_SUM_TOLERANCE,
};
use crate::error::{BarbellError, Result};
use crate::metrics::ConfusionMatrix;
use crate::training::{CVResults, ModelList, TrainedModelList};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Features listed per model in the outcome
const TOP_FEATURES: usize = 10;

/// Rows on each side of the train / hold-out split
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PartitionSizes {
    pub train: usize,
    pub holdout: usize,
}

/// How one model did in training and on the hold-out rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSummary {
    pub id: ClassifierId,
    pub family: String,
    pub cv: CVResults,
    pub oob_score: Option<f64>,
    pub holdout_accuracy: f64,
    pub confusion: ConfusionMatrix,
    pub training_time_secs: f64,
    /// Most important features, largest first; empty when the model has none
    pub top_features: Vec<(String, f64)>,
}

/// Ensemble answer for one unlabelled row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestPrediction {
    pub id: String,
    pub predictions: BTreeMap<ClassifierId, Label>,
    pub ensemble: Label,
    /// Vote weight behind the ensemble label
    pub support: f64,
}

/// Everything a report run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportOutcome {
    pub cleaning: CleaningSummary,
    pub partition: PartitionSizes,
    pub models: Vec<ModelSummary>,
    pub weight_source: WeightSource,
    pub accuracies: AccuracyTable,
    pub weights: WeightTable,
    /// Ensemble scored on the hold-out rows
    pub ensemble: EnsembleOutcome,
    pub test_predictions: Vec<TestPrediction>,
    pub elapsed_secs: f64,
}

impl ReportOutcome {
    /// Hold-out accuracy of the ensemble
    pub fn ensemble_accuracy(&self) -> Option<f64> {
        self.ensemble.accuracy
    }

    /// Model with the best hold-out accuracy; the first listed wins ties
    pub fn best_model(&self) -> Option<&ModelSummary> {
        self.models.iter().fold(None, |best, m| match best {
            Some(b) if b.holdout_accuracy >= m.holdout_accuracy => Some(b),
            _ => Some(m),
        })
    }
}

/// Runs the full pipeline for one configuration
#[derive(Debug, Clone)]
pub struct Report {
    config: ReportConfig,
    loader: DataLoader,
}

impl Report {
    pub fn new(config: ReportConfig) -> Self {
        Self {
            config,
            loader: DataLoader::new(),
        }
    }

    pub fn with_loader(mut self, loader: DataLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Run with `config` and return only the outcome
    pub fn run(
        config: &ReportConfig,
        training_csv: impl AsRef<Path>,
        test_csv: Option<&Path>,
    ) -> Result<ReportOutcome> {
        let (outcome, _) = Self::new(config.clone()).execute(training_csv, test_csv)?;
        Ok(outcome)
    }

    /// Run the pipeline, keeping the fitted models
    pub fn execute(
        &self,
        training_csv: impl AsRef<Path>,
        test_csv: Option<&Path>,
    ) -> Result<(ReportOutcome, TrainedModelList)> {
        let start = Instant::now();
        let config = &self.config;
        config.validate()?;

        let raw = self.loader.load_csv(training_csv.as_ref())?;
        info!(
            path = %training_csv.as_ref().display(),
            rows = raw.height(),
            columns = raw.width(),
            "Loaded training data"
        );

        let cleaner = DataCleaner::new(config.cleaning.clone())
            .with_protected_columns(vec![config.label_column.clone()]);
        let (clean, cleaning) = cleaner.clean(&raw)?;
        info!(
            rows = cleaning.rows_after,
            features = cleaning.features.len(),
            dropped = cleaning.columns_dropped(),
            "Cleaned training data"
        );

        let dataset = LabeledDataset::from_frame(&clean, &cleaning.features, &config.label_column)?;
        let partition =
            StratifiedPartitioner::new(config.train_fraction, config.seed).split(&dataset.y)?;
        let train = dataset.subset(&partition.train);
        let holdout = dataset.subset(&partition.holdout);
        info!(
            train = train.n_samples(),
            holdout = holdout.n_samples(),
            "Partitioned training data"
        );

        let trained = ModelList::new(config.models.clone())
            .with_cv(config.cv.strategy())
            .with_seed(config.seed)
            .fit(&train)?;

        let evaluation = trained.evaluate(&holdout)?;
        let accuracies = match config.weights {
            WeightSource::Holdout => evaluation.accuracies.clone(),
            WeightSource::CrossValidation => trained.cv_accuracies()?,
        };

        let aggregator = WeightedVoteAggregator::new();
        let ensemble = aggregator.aggregate(&evaluation.predictions, &accuracies, Some(&holdout.y))?;
        check_weight_mass(&ensemble);
        info!(
            accuracy = ensemble.accuracy.unwrap_or(0.0),
            source = ?config.weights,
            "Ensemble scored on hold-out rows"
        );

        let models = trained
            .models()
            .iter()
            .map(|m| {
                let confusion = evaluation.confusion.get(&m.id).cloned().ok_or_else(|| {
                    BarbellError::InvalidInput(format!("no hold-out evaluation for {}", m.id))
                })?;
                Ok(ModelSummary {
                    id: m.id.clone(),
                    family: m.family.clone(),
                    cv: m.cv.clone(),
                    oob_score: m.oob_score,
                    holdout_accuracy: evaluation.accuracies.get(&m.id).unwrap_or(0.0),
                    confusion,
                    training_time_secs: m.training_time_secs,
                    top_features: trained
                        .feature_importances(&m.id)
                        .map(|mut f| {
                            f.truncate(TOP_FEATURES);
                            f
                        })
                        .unwrap_or_default(),
                })
            })
            .collect::<Result<Vec<ModelSummary>>>()?;

        let test_predictions = match test_csv {
            Some(path) => self.predict_test(path, &trained, &accuracies)?,
            None => Vec::new(),
        };

        let outcome = ReportOutcome {
            cleaning,
            partition: PartitionSizes {
                train: partition.train.len(),
                holdout: partition.holdout.len(),
            },
            models,
            weight_source: config.weights,
            weights: ensemble.weights.clone(),
            accuracies,
            ensemble,
            test_predictions,
            elapsed_secs: start.elapsed().as_secs_f64(),
        };
        info!(secs = outcome.elapsed_secs, "Report complete");
        Ok((outcome, trained))
    }

    fn predict_test(
        &self,
        path: &Path,
        trained: &TrainedModelList,
        accuracies: &AccuracyTable,
    ) -> Result<Vec<TestPrediction>> {
        let raw = self.loader.load_csv(path)?;
        let test = UnlabeledDataset::from_frame(&raw, trained.feature_names(), &self.config.id_column)?;
        info!(path = %path.display(), rows = test.n_samples(), "Loaded test data");

        let matrix = trained.predict_matrix(&test.x)?;
        let outcome = WeightedVoteAggregator::new()
            .with_labels(trained.labels().clone())
            .aggregate(&matrix, accuracies, None)?;
        check_weight_mass(&outcome);

        let rows = test
            .ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let predictions = matrix
                    .classifiers()
                    .iter()
                    .zip(matrix.row(i).iter())
                    .map(|(c, l)| (c.clone(), l.clone()))
                    .collect();
                let ensemble = outcome.predictions[i].clone();
                let support = outcome
                    .labels
                    .index_of(&ensemble)
                    .map_or(0.0, |slot| outcome.votes[i].weight(slot));
                debug!(id = %id, label = %ensemble, support, "Test row predicted");
                TestPrediction {
                    id: id.clone(),
                    predictions,
                    ensemble,
                    support,
                }
            })
            .collect();
        Ok(rows)
    }
}

/// Every row's votes should add up to one
fn check_weight_mass(outcome: &EnsembleOutcome) {
    let off = weight_mass(outcome)
        .iter()
        .filter(|mass| (**mass - 1.0).abs() > WEIGHT_SUM_TOLERANCE)
        .count();
    if off > 0 {
        warn!(rows = off, "Vote weights do not sum to one");
    }
}
