//! Feature matrices extracted from cleaned frames

use crate::ensemble::{Label, LabelSet};
use crate::error::{BarbellError, Result};
use ndarray::{Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Features plus known labels
#[derive(Debug, Clone)]
pub struct LabeledDataset {
    pub feature_names: Vec<String>,
    pub x: Array2<f64>,
    pub y: Vec<Label>,
}

impl LabeledDataset {
    /// Extract `features` and the label column from a frame.
    /// Missing feature values stay NaN until imputed.
    pub fn from_frame(df: &DataFrame, features: &[String], label_column: &str) -> Result<Self> {
        let x = columns_to_array2(df, features)?;
        let labels = df
            .column(label_column)
            .map_err(|_| BarbellError::FeatureNotFound(label_column.to_string()))?
            .cast(&DataType::String)?;

        let y = labels
            .str()?
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                v.map(|s| Label::new(s.trim()))
                    .ok_or_else(|| BarbellError::DataError(format!("row {} has no label", i)))
            })
            .collect::<Result<Vec<Label>>>()?;

        Ok(Self {
            feature_names: features.to_vec(),
            x,
            y,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    pub fn label_set(&self) -> LabelSet {
        self.y.iter().cloned().collect()
    }

    /// Rows at `indices`, in that order
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            feature_names: self.feature_names.clone(),
            x: self.x.select(Axis(0), indices),
            y: indices.iter().map(|&i| self.y[i].clone()).collect(),
        }
    }
}

/// Features of rows without labels (the prediction targets of the report)
#[derive(Debug, Clone)]
pub struct UnlabeledDataset {
    pub feature_names: Vec<String>,
    pub x: Array2<f64>,
    /// Row identifiers, from the id column or the row position
    pub ids: Vec<String>,
}

impl UnlabeledDataset {
    pub fn from_frame(df: &DataFrame, features: &[String], id_column: &str) -> Result<Self> {
        let x = columns_to_array2(df, features)?;
        let ids = match df.column(id_column) {
            Ok(series) => series
                .cast(&DataType::String)?
                .str()?
                .into_iter()
                .enumerate()
                .map(|(i, v)| v.map(|s| s.to_string()).unwrap_or_else(|| (i + 1).to_string()))
                .collect(),
            Err(_) => {
                warn!(column = %id_column, "Id column not found, numbering rows");
                (1..=df.height()).map(|i| i.to_string()).collect()
            }
        };

        Ok(Self {
            feature_names: features.to_vec(),
            x,
            ids,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }
}

/// Extract named columns into a row-major matrix; nulls become NaN
pub fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let series = df
                .column(col_name)
                .map_err(|_| BarbellError::FeatureNotFound(col_name.clone()))?;
            let series_f64 = series.cast(&DataType::Float64)?;
            let values: Vec<f64> = series_f64
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect();
            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_data[c][r]))
}

/// Mean imputation fitted on training rows
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureImputer {
    means: Vec<f64>,
}

impl FeatureImputer {
    /// Learn column means, ignoring NaN entries
    pub fn fit(x: &Array2<f64>) -> Self {
        let means = x
            .axis_iter(Axis(1))
            .map(|col| {
                let (sum, count) = col
                    .iter()
                    .filter(|v| !v.is_nan())
                    .fold((0.0, 0usize), |(s, c), &v| (s + v, c + 1));
                if count == 0 {
                    0.0
                } else {
                    sum / count as f64
                }
            })
            .collect();
        Self { means }
    }

    /// Replace NaN entries in place; returns how many were filled
    pub fn transform(&self, x: &mut Array2<f64>) -> Result<usize> {
        if x.ncols() != self.means.len() {
            return Err(BarbellError::ShapeError {
                expected: format!("{} columns", self.means.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        let mut filled = 0;
        for (mut col, &mean) in x.axis_iter_mut(Axis(1)).zip(self.means.iter()) {
            for v in col.iter_mut() {
                if v.is_nan() {
                    *v = mean;
                    filled += 1;
                }
            }
        }
        if filled > 0 {
            warn!(filled, "Imputed missing feature values with training means");
        }
        Ok(filled)
    }
}
