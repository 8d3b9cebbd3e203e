//! Accuracy-weighted voting over per-classifier label predictions

use super::labels::{ClassifierId, Label, LabelSet};
use crate::error::{BarbellError, Result};
use crate::metrics::ConfusionMatrix;
use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Tolerance used when checking that weights sum to one
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Predicted labels for N samples from M classifiers.
///
/// Row `i` holds every classifier's prediction for sample `i`; column `j`
/// belongs to `classifiers()[j]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionMatrix {
    classifiers: Vec<ClassifierId>,
    labels: Array2<Label>,
}

impl PredictionMatrix {
    /// Build from one prediction column per classifier
    pub fn from_columns<I>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (ClassifierId, Vec<Label>)>,
    {
        let columns: Vec<(ClassifierId, Vec<Label>)> = columns.into_iter().collect();
        if columns.is_empty() {
            return Err(BarbellError::InvalidInput(
                "prediction matrix needs at least one classifier".to_string(),
            ));
        }

        let n_samples = columns[0].1.len();
        let mut seen = HashSet::new();
        for (id, column) in &columns {
            if !seen.insert(id.clone()) {
                return Err(BarbellError::InvalidInput(format!(
                    "classifier {} appears twice in the prediction matrix",
                    id
                )));
            }
            if column.len() != n_samples {
                return Err(BarbellError::InvalidInput(format!(
                    "classifier {} has {} predictions, expected {}",
                    id,
                    column.len(),
                    n_samples
                )));
            }
        }

        let n_classifiers = columns.len();
        let labels = Array2::from_shape_fn((n_samples, n_classifiers), |(i, j)| {
            columns[j].1[i].clone()
        });
        let classifiers = columns.into_iter().map(|(id, _)| id).collect();

        Ok(Self { classifiers, labels })
    }

    /// Build from per-sample rows, each ordered like `classifiers`
    pub fn from_rows(classifiers: Vec<ClassifierId>, rows: Vec<Vec<Label>>) -> Result<Self> {
        let n_classifiers = classifiers.len();
        let mut columns: Vec<(ClassifierId, Vec<Label>)> = classifiers
            .into_iter()
            .map(|id| (id, Vec::with_capacity(rows.len())))
            .collect();

        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_classifiers {
                return Err(BarbellError::InvalidInput(format!(
                    "row {} has {} predictions, expected {}",
                    i,
                    row.len(),
                    n_classifiers
                )));
            }
            for (column, label) in columns.iter_mut().zip(row) {
                column.1.push(label);
            }
        }

        Self::from_columns(columns)
    }

    pub fn n_samples(&self) -> usize {
        self.labels.nrows()
    }

    pub fn n_classifiers(&self) -> usize {
        self.labels.ncols()
    }

    pub fn classifiers(&self) -> &[ClassifierId] {
        &self.classifiers
    }

    /// Predictions of every classifier for one sample
    pub fn row(&self, sample: usize) -> ArrayView1<'_, Label> {
        self.labels.row(sample)
    }

    /// All predictions of one classifier
    pub fn column(&self, id: &ClassifierId) -> Option<ArrayView1<'_, Label>> {
        self.classifiers
            .iter()
            .position(|c| c == id)
            .map(|j| self.labels.column(j))
    }

    pub fn get(&self, sample: usize, id: &ClassifierId) -> Option<&Label> {
        let j = self.classifiers.iter().position(|c| c == id)?;
        self.labels.get((sample, j))
    }

    /// Every label that appears anywhere in the matrix
    pub fn label_set(&self) -> LabelSet {
        self.labels.iter().cloned().collect()
    }
}

/// Standalone accuracy of each classifier on held-out data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccuracyTable {
    scores: BTreeMap<ClassifierId, f64>,
}

impl AccuracyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(classifier, accuracy)` pairs
    pub fn from_pairs<I, K>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<ClassifierId>,
    {
        let mut table = Self::new();
        for (id, accuracy) in pairs {
            table.insert(id.into(), accuracy)?;
        }
        Ok(table)
    }

    /// Record an accuracy; it must be a finite value in [0, 1]
    pub fn insert(&mut self, id: ClassifierId, accuracy: f64) -> Result<()> {
        check_accuracy(&id, accuracy)?;
        self.scores.insert(id, accuracy);
        Ok(())
    }

    pub fn get(&self, id: &ClassifierId) -> Option<f64> {
        self.scores.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.scores.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ClassifierId, f64)> {
        self.scores.iter().map(|(id, &acc)| (id, acc))
    }
}

fn check_accuracy(id: &ClassifierId, accuracy: f64) -> Result<()> {
    if !accuracy.is_finite() || !(0.0..=1.0).contains(&accuracy) {
        return Err(BarbellError::InvalidInput(format!(
            "accuracy of {} must lie in [0, 1], got {}",
            id, accuracy
        )));
    }
    Ok(())
}

/// Normalized classifier weights: `accuracy / sum(accuracies)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable {
    weights: BTreeMap<ClassifierId, f64>,
}

impl WeightTable {
    /// Derive weights from accuracies. Fails when the accuracies sum to zero.
    pub fn from_accuracies(accuracies: &AccuracyTable) -> Result<Self> {
        if accuracies.is_empty() {
            return Err(BarbellError::InvalidInput(
                "accuracy table is empty".to_string(),
            ));
        }
        for (id, accuracy) in accuracies.iter() {
            check_accuracy(id, accuracy)?;
        }

        let total = accuracies.total();
        if !(total > 0.0) {
            return Err(BarbellError::DegenerateWeights { total });
        }

        let weights = accuracies
            .iter()
            .map(|(id, accuracy)| (id.clone(), accuracy / total))
            .collect();

        Ok(Self { weights })
    }

    pub fn get(&self, id: &ClassifierId) -> Option<f64> {
        self.weights.get(id).copied()
    }

    pub fn sum(&self) -> f64 {
        self.weights.values().sum()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ClassifierId, f64)> {
        self.weights.iter().map(|(id, &w)| (id, w))
    }
}

/// Accumulated vote weight per label slot of a [`LabelSet`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteVector {
    slots: Vec<f64>,
}

impl VoteVector {
    pub fn zeros(n_labels: usize) -> Self {
        Self {
            slots: vec![0.0; n_labels],
        }
    }

    pub fn add(&mut self, slot: usize, weight: f64) {
        self.slots[slot] += weight;
    }

    pub fn weight(&self, slot: usize) -> f64 {
        self.slots[slot]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.slots
    }

    /// Slot with the largest weight; the lowest slot wins ties.
    ///
    /// Weights within [`WEIGHT_SUM_TOLERANCE`] of each other count as tied,
    /// so sums that only differ by rounding still go to the lowest slot.
    pub fn winner(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (slot, &weight) in self.slots.iter().enumerate() {
            match best {
                Some((_, best_weight)) if weight <= best_weight + WEIGHT_SUM_TOLERANCE => {}
                _ => best = Some((slot, weight)),
            }
        }
        best.map(|(slot, _)| slot)
    }

    /// Label → weight view for reporting
    pub fn by_label(&self, labels: &LabelSet) -> BTreeMap<Label, f64> {
        labels
            .iter()
            .cloned()
            .zip(self.slots.iter().copied())
            .collect()
    }
}

/// Output of one aggregation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleOutcome {
    /// Canonical label ordering used for the vote slots
    pub labels: LabelSet,
    /// Weights each classifier voted with
    pub weights: WeightTable,
    /// One ensemble prediction per sample, in input order
    pub predictions: Vec<Label>,
    /// Vote weights per sample
    pub votes: Vec<VoteVector>,
    /// Ensemble vs. truth, when truth was supplied
    pub confusion: Option<ConfusionMatrix>,
    /// Fraction of samples predicted correctly, when truth was supplied
    pub accuracy: Option<f64>,
}

/// Combines several classifiers' predictions into one label per sample,
/// weighting each vote by the classifier's measured accuracy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeightedVoteAggregator {
    /// Fixed label universe; derived from the inputs when absent
    labels: Option<LabelSet>,
}

impl WeightedVoteAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed label universe (e.g. `A`..`E`) for the vote slots
    pub fn with_labels(mut self, labels: LabelSet) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Aggregate a prediction matrix.
    ///
    /// `truth` is only used for scoring the ensemble; weights come strictly
    /// from `accuracies`.
    pub fn aggregate(
        &self,
        predictions: &PredictionMatrix,
        accuracies: &AccuracyTable,
        truth: Option<&[Label]>,
    ) -> Result<EnsembleOutcome> {
        let n_samples = predictions.n_samples();
        if n_samples == 0 {
            return Err(BarbellError::InvalidInput(
                "prediction matrix has no samples".to_string(),
            ));
        }
        check_same_classifiers(predictions, accuracies)?;

        if let Some(truth) = truth {
            if truth.len() != n_samples {
                return Err(BarbellError::InvalidInput(format!(
                    "truth has {} labels, prediction matrix has {} samples",
                    truth.len(),
                    n_samples
                )));
            }
        }

        let weights = WeightTable::from_accuracies(accuracies)?;
        let labels = self.resolve_labels(predictions, truth)?;

        // (column, weight), summed in classifier-id order
        let mut columns: Vec<(usize, f64)> = predictions
            .classifiers()
            .iter()
            .enumerate()
            .map(|(j, id)| (j, weights.get(id).unwrap_or(0.0)))
            .collect();
        let ids = predictions.classifiers();
        columns.sort_by(|a, b| ids[a.0].cmp(&ids[b.0]));

        debug!(
            n_samples,
            n_classifiers = predictions.n_classifiers(),
            n_labels = labels.len(),
            "Aggregating weighted votes"
        );

        let tallied: Vec<(Label, VoteVector)> = (0..n_samples)
            .into_par_iter()
            .map(|i| tally_row(predictions.row(i), &columns, &labels))
            .collect::<Result<Vec<_>>>()?;

        let (predicted, votes): (Vec<Label>, Vec<VoteVector>) = tallied.into_iter().unzip();

        let (confusion, accuracy) = match truth {
            Some(truth) => {
                let cm = ConfusionMatrix::with_labels(labels.clone(), truth, &predicted)?;
                let accuracy = cm.accuracy();
                (Some(cm), Some(accuracy))
            }
            None => (None, None),
        };

        Ok(EnsembleOutcome {
            labels,
            weights,
            predictions: predicted,
            votes,
            confusion,
            accuracy,
        })
    }

    /// Vote on a single sample given one label per classifier
    pub fn predict_row(
        &self,
        row: &[(ClassifierId, Label)],
        accuracies: &AccuracyTable,
    ) -> Result<Label> {
        let (ids, labels): (Vec<ClassifierId>, Vec<Label>) = row.iter().cloned().unzip();
        let matrix = PredictionMatrix::from_rows(ids, vec![labels])?;
        let outcome = self.aggregate(&matrix, accuracies, None)?;
        outcome
            .predictions
            .into_iter()
            .next()
            .ok_or_else(|| BarbellError::InvalidInput("empty prediction row".to_string()))
    }

    fn resolve_labels(
        &self,
        predictions: &PredictionMatrix,
        truth: Option<&[Label]>,
    ) -> Result<LabelSet> {
        let observed = predictions.label_set();
        match &self.labels {
            Some(fixed) => {
                if let Some(unknown) = observed.iter().find(|l| !fixed.contains(l)) {
                    return Err(BarbellError::InvalidInput(format!(
                        "predicted label {} is not part of the label set",
                        unknown
                    )));
                }
                let truth_set: LabelSet = truth.unwrap_or(&[]).iter().cloned().collect();
                Ok(fixed.union(&truth_set))
            }
            None => {
                let truth_set: LabelSet = truth.unwrap_or(&[]).iter().cloned().collect();
                Ok(observed.union(&truth_set))
            }
        }
    }
}

fn check_same_classifiers(predictions: &PredictionMatrix, accuracies: &AccuracyTable) -> Result<()> {
    for id in predictions.classifiers() {
        if accuracies.get(id).is_none() {
            return Err(BarbellError::InvalidInput(format!(
                "classifier {} has predictions but no accuracy",
                id
            )));
        }
    }
    for (id, _) in accuracies.iter() {
        if !predictions.classifiers().contains(id) {
            return Err(BarbellError::InvalidInput(format!(
                "classifier {} has an accuracy but no predictions",
                id
            )));
        }
    }
    Ok(())
}

fn tally_row(
    row: ArrayView1<'_, Label>,
    columns: &[(usize, f64)],
    labels: &LabelSet,
) -> Result<(Label, VoteVector)> {
    let mut votes = VoteVector::zeros(labels.len());
    for &(j, weight) in columns {
        let label = &row[j];
        let slot = labels.index_of(label).ok_or_else(|| {
            BarbellError::InvalidInput(format!("label {} missing from label set", label))
        })?;
        votes.add(slot, weight);
    }

    let winner = votes
        .winner()
        .and_then(|slot| labels.get(slot))
        .cloned()
        .ok_or_else(|| BarbellError::InvalidInput("no labels to vote on".to_string()))?;

    Ok((winner, votes))
}

/// Sum of weights along the classifier axis, for sanity checks in reports
pub fn weight_mass(outcome: &EnsembleOutcome) -> Vec<f64> {
    outcome
        .votes
        .iter()
        .map(|v| v.as_slice().iter().sum())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l(s: &str) -> Label {
        Label::from(s)
    }

    fn column(id: &str, labels: &[&str]) -> (ClassifierId, Vec<Label>) {
        (ClassifierId::from(id), labels.iter().map(|&s| l(s)).collect())
    }

    #[test]
    fn test_weights_from_accuracies() {
        let acc = AccuracyTable::from_pairs(vec![("rf", 0.95), ("gbm", 0.90), ("lda", 0.60)]).unwrap();
        let weights = WeightTable::from_accuracies(&acc).unwrap();

        assert!((weights.sum() - 1.0).abs() < WEIGHT_SUM_TOLERANCE);
        assert!((weights.get(&"rf".into()).unwrap() - 0.95 / 2.45).abs() < 1e-12);
        assert!((weights.get(&"lda".into()).unwrap() - 0.60 / 2.45).abs() < 1e-12);
    }

    #[test]
    fn test_zero_accuracies_are_degenerate() {
        let acc = AccuracyTable::from_pairs(vec![("c1", 0.0), ("c2", 0.0)]).unwrap();
        let err = WeightTable::from_accuracies(&acc).unwrap_err();
        assert!(matches!(err, BarbellError::DegenerateWeights { .. }));
    }

    #[test]
    fn test_accuracy_out_of_range_rejected() {
        let mut acc = AccuracyTable::new();
        assert!(acc.insert("rf".into(), 1.5).is_err());
        assert!(acc.insert("rf".into(), f64::NAN).is_err());
        assert!(acc.insert("rf".into(), -0.1).is_err());
        assert!(acc.is_empty());
    }

    #[test]
    fn test_end_to_end_single_sample() {
        let matrix = PredictionMatrix::from_columns(vec![
            column("rf", &["A"]),
            column("gbm", &["A"]),
            column("lda", &["B"]),
        ])
        .unwrap();
        let acc = AccuracyTable::from_pairs(vec![("rf", 0.95), ("gbm", 0.90), ("lda", 0.60)]).unwrap();

        let outcome = WeightedVoteAggregator::new()
            .aggregate(&matrix, &acc, None)
            .unwrap();

        assert_eq!(outcome.predictions, vec![l("A")]);
        let votes = outcome.votes[0].by_label(&outcome.labels);
        assert!((votes[&l("A")] - 0.7551).abs() < 1e-3);
        assert!((votes[&l("B")] - 0.2449).abs() < 1e-3);
        assert!(outcome.accuracy.is_none());
    }

    #[test]
    fn test_tie_goes_to_first_label() {
        let matrix = PredictionMatrix::from_columns(vec![
            column("x", &["B", "A"]),
            column("y", &["A", "B"]),
        ])
        .unwrap();
        let acc = AccuracyTable::from_pairs(vec![("x", 0.8), ("y", 0.8)]).unwrap();

        let outcome = WeightedVoteAggregator::new()
            .aggregate(&matrix, &acc, None)
            .unwrap();

        assert_eq!(outcome.predictions, vec![l("A"), l("A")]);
    }

    #[test]
    fn test_tie_between_summed_weights() {
        // 0.1/0.6 + 0.2/0.6 rounds just below 0.3/0.6
        let matrix = PredictionMatrix::from_columns(vec![
            column("c1", &["B"]),
            column("c2", &["B"]),
            column("c3", &["A"]),
        ])
        .unwrap();
        let acc = AccuracyTable::from_pairs(vec![("c1", 0.1), ("c2", 0.2), ("c3", 0.3)]).unwrap();
        let outcome = WeightedVoteAggregator::new()
            .aggregate(&matrix, &acc, None)
            .unwrap();
        assert_eq!(outcome.predictions, vec![l("A")]);

        // here the single B weight rounds just above the A sum
        let matrix = PredictionMatrix::from_columns(vec![
            column("c1", &["B"]),
            column("c2", &["A"]),
            column("c3", &["A"]),
        ])
        .unwrap();
        let acc = AccuracyTable::from_pairs(vec![("c1", 0.9), ("c2", 0.3), ("c3", 0.6)]).unwrap();
        let outcome = WeightedVoteAggregator::new()
            .aggregate(&matrix, &acc, None)
            .unwrap();
        assert_eq!(outcome.predictions, vec![l("A")]);
    }

    #[test]
    fn test_winner_tolerance() {
        let mut votes = VoteVector::zeros(3);
        votes.add(0, 0.4999999999999999);
        votes.add(1, 0.5);
        assert_eq!(votes.winner(), Some(0));

        votes.add(2, 0.6);
        assert_eq!(votes.winner(), Some(2));
    }

    #[test]
    fn test_tie_order_follows_fixed_label_set() {
        let matrix = PredictionMatrix::from_columns(vec![
            column("x", &["E"]),
            column("y", &["C"]),
        ])
        .unwrap();
        let acc = AccuracyTable::from_pairs(vec![("x", 0.5), ("y", 0.5)]).unwrap();
        let labels: LabelSet = ["A", "B", "C", "D", "E"].iter().map(|&s| l(s)).collect();

        let outcome = WeightedVoteAggregator::new()
            .with_labels(labels)
            .aggregate(&matrix, &acc, None)
            .unwrap();

        assert_eq!(outcome.predictions, vec![l("C")]);
        assert_eq!(outcome.votes[0].as_slice().len(), 5);
    }

    #[test]
    fn test_unanimous_rows_ignore_weights() {
        let matrix = PredictionMatrix::from_columns(vec![
            column("a", &["D", "C"]),
            column("b", &["D", "C"]),
            column("c", &["D", "C"]),
        ])
        .unwrap();
        let acc = AccuracyTable::from_pairs(vec![("a", 0.1), ("b", 0.99), ("c", 0.3)]).unwrap();

        let outcome = WeightedVoteAggregator::new()
            .aggregate(&matrix, &acc, None)
            .unwrap();

        assert_eq!(outcome.predictions, vec![l("D"), l("C")]);
    }

    #[test]
    fn test_single_nonzero_weight_dictates() {
        let matrix = PredictionMatrix::from_columns(vec![
            column("only", &["B", "E", "A"]),
            column("zero1", &["A", "A", "C"]),
            column("zero2", &["A", "A", "C"]),
        ])
        .unwrap();
        let acc = AccuracyTable::from_pairs(vec![("only", 0.7), ("zero1", 0.0), ("zero2", 0.0)]).unwrap();

        let outcome = WeightedVoteAggregator::new()
            .aggregate(&matrix, &acc, None)
            .unwrap();

        assert_eq!(outcome.predictions, vec![l("B"), l("E"), l("A")]);
    }

    #[test]
    fn test_missing_accuracy_is_invalid_input() {
        let matrix = PredictionMatrix::from_columns(vec![
            column("rf", &["A"]),
            column("knn", &["B"]),
        ])
        .unwrap();
        let acc = AccuracyTable::from_pairs(vec![("rf", 0.9)]).unwrap();

        let err = WeightedVoteAggregator::new()
            .aggregate(&matrix, &acc, None)
            .unwrap_err();
        assert!(matches!(err, BarbellError::InvalidInput(msg) if msg.contains("knn")));
    }

    #[test]
    fn test_extra_accuracy_is_invalid_input() {
        let matrix = PredictionMatrix::from_columns(vec![column("rf", &["A"])]).unwrap();
        let acc = AccuracyTable::from_pairs(vec![("rf", 0.9), ("nb", 0.5)]).unwrap();

        let err = WeightedVoteAggregator::new()
            .aggregate(&matrix, &acc, None)
            .unwrap_err();
        assert!(matches!(err, BarbellError::InvalidInput(_)));
    }

    #[test]
    fn test_degenerate_weights_surface_from_aggregate() {
        let matrix = PredictionMatrix::from_columns(vec![
            column("c1", &["A"]),
            column("c2", &["B"]),
        ])
        .unwrap();
        let acc = AccuracyTable::from_pairs(vec![("c1", 0.0), ("c2", 0.0)]).unwrap();

        let err = WeightedVoteAggregator::new()
            .aggregate(&matrix, &acc, None)
            .unwrap_err();
        assert!(matches!(err, BarbellError::DegenerateWeights { .. }));
    }

    #[test]
    fn test_empty_matrix_rejected() {
        let matrix = PredictionMatrix::from_columns(vec![column("rf", &[])]).unwrap();
        let acc = AccuracyTable::from_pairs(vec![("rf", 0.9)]).unwrap();
        assert!(WeightedVoteAggregator::new().aggregate(&matrix, &acc, None).is_err());
        assert!(PredictionMatrix::from_columns(Vec::new()).is_err());
    }

    #[test]
    fn test_ragged_and_duplicate_columns_rejected() {
        let ragged = PredictionMatrix::from_columns(vec![
            column("a", &["A", "B"]),
            column("b", &["A"]),
        ]);
        assert!(ragged.is_err());

        let duplicate = PredictionMatrix::from_columns(vec![
            column("a", &["A"]),
            column("a", &["B"]),
        ]);
        assert!(duplicate.is_err());
    }

    #[test]
    fn test_truth_scores_ensemble() {
        let matrix = PredictionMatrix::from_columns(vec![
            column("rf", &["A", "B", "C", "D"]),
            column("rpart", &["A", "B", "C", "A"]),
            column("nb", &["B", "C", "C", "A"]),
        ])
        .unwrap();
        let acc = AccuracyTable::from_pairs(vec![("rf", 0.9), ("rpart", 0.7), ("nb", 0.5)]).unwrap();
        let truth = vec![l("A"), l("B"), l("C"), l("D")];

        let outcome = WeightedVoteAggregator::new()
            .aggregate(&matrix, &acc, Some(&truth))
            .unwrap();

        // Last row: A gets 0.7+0.5 against D's 0.9
        assert_eq!(outcome.predictions, vec![l("A"), l("B"), l("C"), l("A")]);
        assert!((outcome.accuracy.unwrap() - 0.75).abs() < 1e-12);
        let cm = outcome.confusion.unwrap();
        assert_eq!(cm.count(&l("D"), &l("A")), Some(1));
    }

    #[test]
    fn test_truth_length_mismatch() {
        let matrix = PredictionMatrix::from_columns(vec![column("rf", &["A", "B"])]).unwrap();
        let acc = AccuracyTable::from_pairs(vec![("rf", 0.9)]).unwrap();
        let truth = vec![l("A")];
        assert!(WeightedVoteAggregator::new()
            .aggregate(&matrix, &acc, Some(&truth))
            .is_err());
    }

    #[test]
    fn test_predictions_come_from_row() {
        let matrix = PredictionMatrix::from_columns(vec![
            column("a", &["A", "E", "C", "B"]),
            column("b", &["D", "E", "B", "B"]),
            column("c", &["D", "A", "C", "E"]),
        ])
        .unwrap();
        let acc = AccuracyTable::from_pairs(vec![("a", 0.4), ("b", 0.35), ("c", 0.9)]).unwrap();
        let outcome = WeightedVoteAggregator::new()
            .with_labels(["A", "B", "C", "D", "E"].iter().map(|&s| l(s)).collect())
            .aggregate(&matrix, &acc, None)
            .unwrap();

        for (i, predicted) in outcome.predictions.iter().enumerate() {
            assert!(matrix.row(i).iter().any(|label| label == predicted));
        }
        for mass in weight_mass(&outcome) {
            assert!((mass - 1.0).abs() < WEIGHT_SUM_TOLERANCE);
        }
    }

    #[test]
    fn test_unknown_label_with_fixed_set() {
        let matrix = PredictionMatrix::from_columns(vec![column("a", &["Z"])]).unwrap();
        let acc = AccuracyTable::from_pairs(vec![("a", 0.4)]).unwrap();
        let result = WeightedVoteAggregator::new()
            .with_labels(["A", "B"].iter().map(|&s| l(s)).collect())
            .aggregate(&matrix, &acc, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_predict_row() {
        let acc = AccuracyTable::from_pairs(vec![("rf", 0.95), ("gbm", 0.90), ("lda", 0.60)]).unwrap();
        let row = vec![
            (ClassifierId::from("rf"), l("C")),
            (ClassifierId::from("gbm"), l("D")),
            (ClassifierId::from("lda"), l("D")),
        ];
        let label = WeightedVoteAggregator::new().predict_row(&row, &acc).unwrap();
        assert_eq!(label, l("D"));
    }
}
