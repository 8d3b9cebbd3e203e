//! Stratified train / hold-out partitioning

use crate::ensemble::Label;
use crate::error::{BarbellError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Row indices of the two sides of a partition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partition {
    pub train: Vec<usize>,
    pub holdout: Vec<usize>,
}

/// Splits rows so each class keeps its share on both sides
#[derive(Debug, Clone)]
pub struct StratifiedPartitioner {
    train_fraction: f64,
    seed: u64,
}

impl StratifiedPartitioner {
    pub fn new(train_fraction: f64, seed: u64) -> Self {
        Self {
            train_fraction,
            seed,
        }
    }

    /// Each class sends `ceil(n_class * train_fraction)` rows to training.
    /// Both index lists come back sorted.
    pub fn split(&self, labels: &[Label]) -> Result<Partition> {
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(BarbellError::ValidationError(format!(
                "train fraction must be in (0, 1), got {}",
                self.train_fraction
            )));
        }

        let mut by_class: BTreeMap<&Label, Vec<usize>> = BTreeMap::new();
        for (i, label) in labels.iter().enumerate() {
            by_class.entry(label).or_default().push(i);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut train = Vec::new();
        let mut holdout = Vec::new();

        for indices in by_class.values_mut() {
            indices.shuffle(&mut rng);
            let n_train = ((indices.len() as f64) * self.train_fraction).ceil() as usize;
            let n_train = n_train.min(indices.len());
            train.extend_from_slice(&indices[..n_train]);
            holdout.extend_from_slice(&indices[n_train..]);
        }

        if train.is_empty() || holdout.is_empty() {
            return Err(BarbellError::ValidationError(format!(
                "partition of {} rows left an empty side (train {}, holdout {})",
                labels.len(),
                train.len(),
                holdout.len()
            )));
        }

        train.sort_unstable();
        holdout.sort_unstable();
        Ok(Partition { train, holdout })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n_per_class: usize) -> Vec<Label> {
        ["A", "B", "C"]
            .iter()
            .flat_map(|&c| std::iter::repeat(Label::from(c)).take(n_per_class))
            .collect()
    }

    #[test]
    fn test_split_preserves_class_shares() {
        let y = labels(10);
        let part = StratifiedPartitioner::new(0.7, 42).split(&y).unwrap();

        assert_eq!(part.train.len(), 21);
        assert_eq!(part.holdout.len(), 9);
        for class in ["A", "B", "C"] {
            let n = part.train.iter().filter(|&&i| y[i].as_str() == class).count();
            assert_eq!(n, 7);
        }
    }

    #[test]
    fn test_split_is_disjoint_and_complete() {
        let y = labels(7);
        let part = StratifiedPartitioner::new(0.6, 1).split(&y).unwrap();
        let mut all: Vec<usize> = part.train.iter().chain(part.holdout.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..y.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_seeded() {
        let y = labels(20);
        let a = StratifiedPartitioner::new(0.5, 9).split(&y).unwrap();
        let b = StratifiedPartitioner::new(0.5, 9).split(&y).unwrap();
        let c = StratifiedPartitioner::new(0.5, 10).split(&y).unwrap();
        assert_eq!(a.train, b.train);
        assert_ne!(a.train, c.train);
    }

    #[test]
    fn test_invalid_fraction_and_tiny_input() {
        let y = labels(3);
        assert!(StratifiedPartitioner::new(1.0, 0).split(&y).is_err());
        assert!(StratifiedPartitioner::new(0.0, 0).split(&y).is_err());
        // one row per class always lands in training
        let single = vec![Label::from("A")];
        assert!(StratifiedPartitioner::new(0.5, 0).split(&single).is_err());
    }
}
