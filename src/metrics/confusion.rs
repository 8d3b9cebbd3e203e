//! Confusion matrix and the statistics derived from it

use crate::ensemble::{Label, LabelSet};
use crate::error::{BarbellError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-class statistics (one-vs-rest)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassStats {
    pub label: Label,
    /// TP / (TP + FN)
    pub sensitivity: Option<f64>,
    /// TN / (TN + FP)
    pub specificity: Option<f64>,
    /// TP / (TP + FP)
    pub precision: Option<f64>,
    /// Share of samples whose reference label is this class
    pub prevalence: f64,
    /// Mean of sensitivity and specificity
    pub balanced_accuracy: Option<f64>,
}

/// Counts of (reference label, predicted label) pairs.
///
/// Rows are reference (true) labels, columns are predictions, both in the
/// canonical order of the label set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    labels: LabelSet,
    counts: Array2<usize>,
}

impl ConfusionMatrix {
    /// Tabulate using every label seen in either sequence
    pub fn from_labels(truth: &[Label], predicted: &[Label]) -> Result<Self> {
        let labels: LabelSet = truth.iter().chain(predicted.iter()).cloned().collect();
        Self::with_labels(labels, truth, predicted)
    }

    /// Tabulate over a fixed label set
    pub fn with_labels(labels: LabelSet, truth: &[Label], predicted: &[Label]) -> Result<Self> {
        if truth.len() != predicted.len() {
            return Err(BarbellError::InvalidInput(format!(
                "truth has {} labels, predictions have {}",
                truth.len(),
                predicted.len()
            )));
        }
        if truth.is_empty() {
            return Err(BarbellError::InvalidInput(
                "cannot build a confusion matrix from zero samples".to_string(),
            ));
        }

        let k = labels.len();
        let mut counts = Array2::<usize>::zeros((k, k));
        for (t, p) in truth.iter().zip(predicted.iter()) {
            let row = labels.index_of(t).ok_or_else(|| {
                BarbellError::InvalidInput(format!("reference label {} not in label set", t))
            })?;
            let col = labels.index_of(p).ok_or_else(|| {
                BarbellError::InvalidInput(format!("predicted label {} not in label set", p))
            })?;
            counts[[row, col]] += 1;
        }

        Ok(Self { labels, counts })
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn counts(&self) -> &Array2<usize> {
        &self.counts
    }

    /// Number of samples with reference `truth` predicted as `predicted`
    pub fn count(&self, truth: &Label, predicted: &Label) -> Option<usize> {
        let row = self.labels.index_of(truth)?;
        let col = self.labels.index_of(predicted)?;
        Some(self.counts[[row, col]])
    }

    pub fn total(&self) -> usize {
        self.counts.sum()
    }

    fn correct(&self) -> usize {
        self.counts.diag().sum()
    }

    /// Fraction of samples on the diagonal
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.correct() as f64 / total as f64
    }

    /// Share of samples misclassified
    pub fn error_rate(&self) -> f64 {
        1.0 - self.accuracy()
    }

    /// Cohen's kappa: agreement corrected for chance
    pub fn kappa(&self) -> f64 {
        let n = self.total() as f64;
        if n == 0.0 {
            return 0.0;
        }
        let observed = self.accuracy();
        let expected: f64 = (0..self.labels.len())
            .map(|i| {
                let row: usize = self.counts.row(i).sum();
                let col: usize = self.counts.column(i).sum();
                (row as f64 / n) * (col as f64 / n)
            })
            .sum();

        if (1.0 - expected).abs() < f64::EPSILON {
            return if (observed - 1.0).abs() < f64::EPSILON { 1.0 } else { 0.0 };
        }
        (observed - expected) / (1.0 - expected)
    }

    /// One-vs-rest statistics for every label
    pub fn class_stats(&self) -> Vec<ClassStats> {
        let total = self.total();
        self.labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let tp = self.counts[[i, i]];
                let actual: usize = self.counts.row(i).sum();
                let predicted: usize = self.counts.column(i).sum();
                let fn_ = actual - tp;
                let fp = predicted - tp;
                let tn = total - tp - fn_ - fp;

                let sensitivity = ratio(tp, tp + fn_);
                let specificity = ratio(tn, tn + fp);
                let balanced_accuracy = match (sensitivity, specificity) {
                    (Some(se), Some(sp)) => Some((se + sp) / 2.0),
                    _ => None,
                };

                ClassStats {
                    label: label.clone(),
                    sensitivity,
                    specificity,
                    precision: ratio(tp, tp + fp),
                    prevalence: if total > 0 { actual as f64 / total as f64 } else { 0.0 },
                    balanced_accuracy,
                }
            })
            .collect()
    }
}

fn ratio(num: usize, den: usize) -> Option<f64> {
    if den == 0 {
        None
    } else {
        Some(num as f64 / den as f64)
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .labels
            .iter()
            .map(|l| l.as_str().len())
            .chain(std::iter::once(self.total().to_string().len()))
            .max()
            .unwrap_or(1)
            .max(4);

        write!(f, "{:>w$}", "ref\\pred", w = width + 4)?;
        for label in self.labels.iter() {
            write!(f, " {:>w$}", label.as_str(), w = width)?;
        }
        writeln!(f)?;

        for (i, label) in self.labels.iter().enumerate() {
            write!(f, "{:>w$}", label.as_str(), w = width + 4)?;
            for j in 0..self.labels.len() {
                write!(f, " {:>w$}", self.counts[[i, j]], w = width)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(s: &[&str]) -> Vec<Label> {
        s.iter().map(|&x| Label::from(x)).collect()
    }

    #[test]
    fn test_counts_and_accuracy() {
        let truth = labels(&["A", "A", "B", "B", "C"]);
        let pred = labels(&["A", "B", "B", "B", "A"]);
        let cm = ConfusionMatrix::from_labels(&truth, &pred).unwrap();

        assert_eq!(cm.total(), 5);
        assert_eq!(cm.count(&"A".into(), &"B".into()), Some(1));
        assert_eq!(cm.count(&"C".into(), &"A".into()), Some(1));
        assert!((cm.accuracy() - 0.6).abs() < 1e-12);
        assert!((cm.error_rate() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_class_stats() {
        let truth = labels(&["A", "A", "B", "B"]);
        let pred = labels(&["A", "B", "B", "B"]);
        let cm = ConfusionMatrix::from_labels(&truth, &pred).unwrap();
        let stats = cm.class_stats();

        let a = &stats[0];
        assert_eq!(a.sensitivity, Some(0.5));
        assert_eq!(a.specificity, Some(1.0));
        assert_eq!(a.precision, Some(1.0));
        assert!((a.prevalence - 0.5).abs() < 1e-12);

        let b = &stats[1];
        assert_eq!(b.sensitivity, Some(1.0));
        assert!((b.precision.unwrap() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_kappa_perfect_and_chance() {
        let truth = labels(&["A", "B", "A", "B"]);
        let cm = ConfusionMatrix::from_labels(&truth, &truth).unwrap();
        assert!((cm.kappa() - 1.0).abs() < 1e-12);

        // Always predicting one class scores zero kappa
        let pred = labels(&["A", "A", "A", "A"]);
        let cm = ConfusionMatrix::from_labels(&truth, &pred).unwrap();
        assert!(cm.kappa().abs() < 1e-12);
    }

    #[test]
    fn test_unseen_class_has_no_precision() {
        let truth = labels(&["A", "C"]);
        let pred = labels(&["A", "A"]);
        let cm = ConfusionMatrix::from_labels(&truth, &pred).unwrap();
        let c = cm.class_stats().into_iter().find(|s| s.label.as_str() == "C").unwrap();
        assert_eq!(c.precision, None);
        assert_eq!(c.sensitivity, Some(0.0));
    }

    #[test]
    fn test_length_mismatch_and_empty() {
        assert!(ConfusionMatrix::from_labels(&labels(&["A"]), &labels(&[])).is_err());
        assert!(ConfusionMatrix::from_labels(&[], &[]).is_err());
    }

    #[test]
    fn test_display_contains_labels() {
        let truth = labels(&["A", "B"]);
        let cm = ConfusionMatrix::from_labels(&truth, &truth).unwrap();
        let text = cm.to_string();
        assert!(text.contains("ref\\pred"));
        assert!(text.lines().count() == 3);
    }
}
