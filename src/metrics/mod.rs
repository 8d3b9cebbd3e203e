//! Evaluation metrics for label predictions

mod confusion;

pub use confusion::{ClassStats, ConfusionMatrix};

use crate::ensemble::Label;

/// Fraction of positions where `predicted` equals `truth`
pub fn accuracy(truth: &[Label], predicted: &[Label]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth
        .iter()
        .zip(predicted.iter())
        .filter(|(t, p)| t == p)
        .count();
    correct as f64 / truth.len() as f64
}
