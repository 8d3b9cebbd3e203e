//! Gaussian naive Bayes classifier

use super::classifier::{check_fit_input, Classifier};
use crate::error::{BarbellError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Gaussian naive Bayes with per-class feature means and variances
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaussianNaiveBayes {
    /// Class x feature means
    means: Array2<f64>,
    /// Class x feature variances, smoothed
    variances: Array2<f64>,
    /// Log prior per class; classes absent from training get -inf
    log_priors: Vec<f64>,
    /// Fraction of the largest feature variance added to every variance
    var_smoothing: f64,
    fitted: bool,
}

impl Default for GaussianNaiveBayes {
    fn default() -> Self {
        Self::new()
    }
}

impl GaussianNaiveBayes {
    pub fn new() -> Self {
        Self {
            means: Array2::zeros((0, 0)),
            variances: Array2::zeros((0, 0)),
            log_priors: Vec::new(),
            var_smoothing: 1e-9,
            fitted: false,
        }
    }

    /// Set variance smoothing parameter
    pub fn with_var_smoothing(mut self, smoothing: f64) -> Self {
        self.var_smoothing = smoothing.max(0.0);
        self
    }

    /// Normalized log posterior per class
    pub fn predict_log_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.fitted {
            return Err(BarbellError::ModelNotFitted);
        }
        if x.ncols() != self.means.ncols() {
            return Err(BarbellError::ShapeError {
                expected: format!("{} features", self.means.ncols()),
                actual: format!("{} features", x.ncols()),
            });
        }

        let n_classes = self.log_priors.len();
        let mut log_probs = Array2::zeros((x.nrows(), n_classes));

        for (i, row) in x.rows().into_iter().enumerate() {
            for (c, &log_prior) in self.log_priors.iter().enumerate() {
                log_probs[[i, c]] = if log_prior.is_finite() {
                    log_prior + self.log_likelihood(row, c)
                } else {
                    f64::NEG_INFINITY
                };
            }
        }

        // log-sum-exp
        for mut row in log_probs.rows_mut() {
            let max_val = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let log_sum = row.iter().map(|&v| (v - max_val).exp()).sum::<f64>().ln();
            for val in row.iter_mut() {
                *val = *val - max_val - log_sum;
            }
        }

        Ok(log_probs)
    }

    /// Posterior probabilities per class
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        Ok(self.predict_log_proba(x)?.mapv(f64::exp))
    }

    fn log_likelihood(&self, x: ArrayView1<'_, f64>, class: usize) -> f64 {
        x.iter()
            .zip(self.means.row(class).iter())
            .zip(self.variances.row(class).iter())
            .map(|((&xi, &mean), &var)| -0.5 * ((xi - mean).powi(2) / var + var.ln() + (2.0 * PI).ln()))
            .sum()
    }

    /// Class priors
    pub fn class_priors(&self) -> Vec<f64> {
        self.log_priors.iter().map(|lp| lp.exp()).collect()
    }

    /// Class x feature means
    pub fn feature_means(&self) -> &Array2<f64> {
        &self.means
    }
}

impl Classifier for GaussianNaiveBayes {
    fn name(&self) -> &'static str {
        "gaussian_nb"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<usize>, n_classes: usize) -> Result<()> {
        check_fit_input(x, y, n_classes)?;

        let n_samples = x.nrows();
        let n_features = x.ncols();

        let epsilon = self.var_smoothing
            * x.axis_iter(Axis(1))
                .map(|col| col.var(0.0))
                .fold(0.0, f64::max);
        // constant-only data still needs a positive variance
        let epsilon = if epsilon > 0.0 { epsilon } else { self.var_smoothing.max(1e-12) };

        let mut means = Array2::zeros((n_classes, n_features));
        let mut m2 = Array2::<f64>::zeros((n_classes, n_features));
        let mut counts = vec![0usize; n_classes];

        // Welford per class and feature
        for (row, &class) in x.rows().into_iter().zip(y.iter()) {
            counts[class] += 1;
            let n = counts[class] as f64;
            for (j, &val) in row.iter().enumerate() {
                let delta = val - means[[class, j]];
                means[[class, j]] += delta / n;
                let delta2 = val - means[[class, j]];
                m2[[class, j]] += delta * delta2;
            }
        }

        let mut variances = Array2::zeros((n_classes, n_features));
        for c in 0..n_classes {
            for j in 0..n_features {
                variances[[c, j]] = if counts[c] > 0 {
                    m2[[c, j]] / counts[c] as f64 + epsilon
                } else {
                    1.0
                };
            }
        }

        self.log_priors = counts
            .iter()
            .map(|&n| {
                if n == 0 {
                    f64::NEG_INFINITY
                } else {
                    (n as f64 / n_samples as f64).ln()
                }
            })
            .collect();
        self.means = means;
        self.variances = variances;
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        let log_probs = self.predict_log_proba(x)?;
        Ok(log_probs
            .rows()
            .into_iter()
            .map(|row| {
                let mut best = 0;
                for (c, &v) in row.iter().enumerate() {
                    if v > row[best] {
                        best = c;
                    }
                }
                best
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_classification_data() -> (Array2<f64>, Array1<usize>) {
        // Two well-separated clusters around (0, 0) and (5, 5)
        let x = Array2::from_shape_vec(
            (20, 2),
            vec![
                -1.0, -1.0, -0.5, -0.5, 0.0, 0.0, 0.5, 0.5, -1.0, 0.0, //
                -0.5, 0.5, 0.0, -0.5, 0.5, -1.0, -0.2, -0.8, -0.8, -0.2, //
                4.0, 4.0, 4.5, 4.5, 5.0, 5.0, 5.5, 5.5, 4.0, 5.0, //
                4.5, 5.5, 5.0, 4.5, 5.5, 4.0, 4.2, 4.8, 4.8, 4.2,
            ],
        )
        .unwrap();
        let y = Array1::from_vec([vec![0usize; 10], vec![1usize; 10]].concat());
        (x, y)
    }

    #[test]
    fn test_gaussian_naive_bayes() {
        let (x, y) = create_classification_data();
        let mut nb = GaussianNaiveBayes::new();
        nb.fit(&x, &y, 2).unwrap();

        let predictions = nb.predict(&x).unwrap();
        assert_eq!(predictions, y);
    }

    #[test]
    fn test_gaussian_proba() {
        let (x, y) = create_classification_data();
        let mut nb = GaussianNaiveBayes::new();
        nb.fit(&x, &y, 2).unwrap();

        let proba = nb.predict_proba(&x).unwrap();
        for row in proba.rows() {
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9, "Probabilities should sum to 1, got {}", sum);
        }
    }

    #[test]
    fn test_class_priors() {
        let (x, y) = create_classification_data();
        let mut nb = GaussianNaiveBayes::new();
        nb.fit(&x, &y, 2).unwrap();

        let priors = nb.class_priors();
        assert!((priors[0] - 0.5).abs() < 1e-12);
        assert!((priors[1] - 0.5).abs() < 1e-12);
        assert!((nb.feature_means()[[1, 0]] - 4.7).abs() < 1e-12);
    }

    #[test]
    fn test_absent_class_never_predicted() {
        let (x, y) = create_classification_data();
        let mut nb = GaussianNaiveBayes::new();
        nb.fit(&x, &y, 3).unwrap();

        let predictions = nb.predict(&x).unwrap();
        assert!(predictions.iter().all(|&c| c < 2));
        assert_eq!(nb.class_priors()[2], 0.0);
    }

    #[test]
    fn test_not_fitted() {
        let nb = GaussianNaiveBayes::new();
        assert!(nb.predict(&Array2::zeros((1, 2))).is_err());
    }
}
