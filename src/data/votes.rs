//! Prediction tables and accuracy files for stand-alone voting

use crate::ensemble::{AccuracyTable, ClassifierId, Label, PredictionMatrix};
use crate::error::{BarbellError, Result};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;

/// Column holding the combined label in prediction files this crate writes
pub const ENSEMBLE_COLUMN: &str = "ensemble";

/// Per-classifier predictions read from a frame, plus optional truth
#[derive(Debug, Clone)]
pub struct VoteTable {
    pub matrix: PredictionMatrix,
    pub truth: Option<Vec<Label>>,
    /// Row ids, when the frame has the id column
    pub ids: Option<Vec<String>>,
}

impl VoteTable {
    /// Every column except `truth_column`, `id_column` and
    /// [`ENSEMBLE_COLUMN`] is one classifier's predictions
    pub fn from_frame(
        df: &DataFrame,
        truth_column: Option<&str>,
        id_column: Option<&str>,
    ) -> Result<Self> {
        let truth = match truth_column {
            Some(name) => {
                let series = df
                    .column(name)
                    .map_err(|_| BarbellError::FeatureNotFound(name.to_string()))?;
                Some(labels_of(series)?)
            }
            None => None,
        };

        let ids = match id_column.and_then(|name| df.column(name).ok()) {
            Some(series) => Some(
                series
                    .cast(&DataType::String)?
                    .str()?
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| v.map(|s| s.to_string()).unwrap_or_else(|| (i + 1).to_string()))
                    .collect(),
            ),
            None => None,
        };

        let columns = df
            .get_columns()
            .iter()
            .filter(|s| {
                let name = s.name().as_str();
                Some(name) != truth_column && Some(name) != id_column && name != ENSEMBLE_COLUMN
            })
            .map(|s| Ok((ClassifierId::new(s.name().as_str()), labels_of(s)?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            matrix: PredictionMatrix::from_columns(columns)?,
            truth,
            ids,
        })
    }
}

fn labels_of(series: &Series) -> Result<Vec<Label>> {
    let name = series.name().to_string();
    series
        .cast(&DataType::String)?
        .str()?
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.map(|s| Label::new(s.trim())).ok_or_else(|| {
                BarbellError::InvalidInput(format!("column {} has no label in row {}", name, i))
            })
        })
        .collect()
}

/// Read a JSON object mapping classifier ids to accuracies
pub fn load_accuracies(path: impl AsRef<Path>) -> Result<AccuracyTable> {
    let json = std::fs::read_to_string(path)?;
    let raw: BTreeMap<String, f64> = serde_json::from_str(&json)?;
    AccuracyTable::from_pairs(raw)
}
