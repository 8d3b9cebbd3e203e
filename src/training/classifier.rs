//! Classifier trait and label encoding

use crate::ensemble::{Label, LabelSet};
use crate::error::{BarbellError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// A multi-class classifier working on encoded class indices
pub trait Classifier: Send + Sync {
    /// Short model family name
    fn name(&self) -> &'static str;

    /// Fit to rows of `x` with class indices `y` in `0..n_classes`
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<usize>, n_classes: usize) -> Result<()>;

    /// Predict one class index per row
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>>;

    /// Normalized feature importances, when the model has them
    fn feature_importances(&self) -> Option<Array1<f64>> {
        None
    }
}

/// Maps labels to dense class indices following the canonical label order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelEncoder {
    labels: LabelSet,
}

impl LabelEncoder {
    pub fn new(labels: LabelSet) -> Self {
        Self { labels }
    }

    pub fn n_classes(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn encode(&self, labels: &[Label]) -> Result<Array1<usize>> {
        labels
            .iter()
            .map(|l| {
                self.labels.index_of(l).ok_or_else(|| {
                    BarbellError::InvalidInput(format!("label {} unknown to encoder", l))
                })
            })
            .collect::<Result<Vec<usize>>>()
            .map(Array1::from_vec)
    }

    pub fn decode(&self, classes: &Array1<usize>) -> Result<Vec<Label>> {
        classes
            .iter()
            .map(|&c| {
                self.labels.get(c).cloned().ok_or_else(|| {
                    BarbellError::InvalidInput(format!("class index {} out of range", c))
                })
            })
            .collect()
    }
}

/// Check that `x` and `y` agree and are non-empty
pub(crate) fn check_fit_input(x: &Array2<f64>, y: &Array1<usize>, n_classes: usize) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(BarbellError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(BarbellError::TrainingError("no training samples".to_string()));
    }
    if let Some(&bad) = y.iter().find(|&&c| c >= n_classes) {
        return Err(BarbellError::TrainingError(format!(
            "class index {} out of range for {} classes",
            bad, n_classes
        )));
    }
    Ok(())
}

/// Index of the largest count; the lowest index wins ties
pub(crate) fn majority(counts: &[usize]) -> usize {
    let mut best = 0;
    for (i, &c) in counts.iter().enumerate() {
        if c > counts[best] {
            best = i;
        }
    }
    best
}
