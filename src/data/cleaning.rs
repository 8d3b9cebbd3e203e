//! Row and column cleaning for the raw sensor export
//!
//! The raw export interleaves per-window summary rows (`new_window == "yes"`)
//! with the raw measurements. Summary statistics columns are empty on every
//! other row, so once those rows are gone the columns are mostly missing and
//! get dropped as well.

use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Variance below which a column counts as constant
const ZERO_VARIANCE_EPS: f64 = 1e-12;

/// Cleaning configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CleaningConfig {
    /// Column flagging summary rows; `None` keeps every row
    pub summary_column: Option<String>,
    /// Value of `summary_column` that marks a summary row
    pub summary_marker: String,
    /// Bookkeeping columns that never become features
    pub drop_columns: Vec<String>,
    /// Drop columns whose missing share exceeds this fraction
    pub max_missing_fraction: f64,
    /// Drop numeric columns with zero variance
    pub drop_zero_variance: bool,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            summary_column: Some("new_window".to_string()),
            summary_marker: "yes".to_string(),
            drop_columns: [
                "",
                "X",
                "user_name",
                "raw_timestamp_part_1",
                "raw_timestamp_part_2",
                "cvtd_timestamp",
                "new_window",
                "num_window",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            max_missing_fraction: 0.5,
            drop_zero_variance: true,
        }
    }
}

impl CleaningConfig {
    /// Keep summary rows
    pub fn without_summary_filter(mut self) -> Self {
        self.summary_column = None;
        self
    }

    pub fn with_drop_columns(mut self, columns: Vec<String>) -> Self {
        self.drop_columns = columns;
        self
    }

    pub fn with_max_missing_fraction(mut self, fraction: f64) -> Self {
        self.max_missing_fraction = fraction;
        self
    }
}

/// What the cleaner removed and kept
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub rows_before: usize,
    pub rows_after: usize,
    pub summary_rows_removed: usize,
    pub dropped_bookkeeping: Vec<String>,
    pub dropped_missing: Vec<String>,
    pub dropped_non_numeric: Vec<String>,
    pub dropped_zero_variance: Vec<String>,
    /// Numeric feature columns retained, in file order
    pub features: Vec<String>,
}

impl CleaningSummary {
    pub fn columns_dropped(&self) -> usize {
        self.dropped_bookkeeping.len()
            + self.dropped_missing.len()
            + self.dropped_non_numeric.len()
            + self.dropped_zero_variance.len()
    }
}

/// Removes summary rows and unusable columns
#[derive(Debug, Clone)]
pub struct DataCleaner {
    config: CleaningConfig,
    /// Columns passed through untouched (label, row id)
    protected: Vec<String>,
}

impl DataCleaner {
    pub fn new(config: CleaningConfig) -> Self {
        Self {
            config,
            protected: Vec::new(),
        }
    }

    /// Columns that bypass every column filter and are kept in the output
    pub fn with_protected_columns(mut self, columns: Vec<String>) -> Self {
        self.protected = columns;
        self
    }

    /// Clean a frame. The result holds the retained features followed by any
    /// protected columns present in the input.
    pub fn clean(&self, df: &DataFrame) -> Result<(DataFrame, CleaningSummary)> {
        let mut summary = CleaningSummary {
            rows_before: df.height(),
            ..Default::default()
        };

        let rows = self.drop_summary_rows(df)?;
        summary.rows_after = rows.height();
        summary.summary_rows_removed = summary.rows_before - summary.rows_after;

        let n_rows = rows.height();
        for series in rows.get_columns() {
            let name = series.name().to_string();
            if self.protected.contains(&name) {
                continue;
            }
            if self.config.drop_columns.contains(&name) {
                summary.dropped_bookkeeping.push(name);
                continue;
            }

            let missing = if n_rows == 0 {
                1.0
            } else {
                series.null_count() as f64 / n_rows as f64
            };
            if missing > self.config.max_missing_fraction {
                summary.dropped_missing.push(name);
                continue;
            }

            if !series.dtype().is_numeric() {
                summary.dropped_non_numeric.push(name);
                continue;
            }

            if self.config.drop_zero_variance && is_constant(series)? {
                summary.dropped_zero_variance.push(name);
                continue;
            }

            summary.features.push(name);
        }

        let mut keep = summary.features.clone();
        for name in &self.protected {
            if rows.column(name).is_ok() {
                keep.push(name.clone());
            }
        }
        let cleaned = rows.select(keep)?;

        info!(
            rows_removed = summary.summary_rows_removed,
            columns_dropped = summary.columns_dropped(),
            features = summary.features.len(),
            "Cleaned dataset"
        );
        debug!(
            missing = ?summary.dropped_missing.len(),
            non_numeric = ?summary.dropped_non_numeric,
            zero_variance = ?summary.dropped_zero_variance,
            "Dropped columns"
        );

        Ok((cleaned, summary))
    }

    fn drop_summary_rows(&self, df: &DataFrame) -> Result<DataFrame> {
        let column = match &self.config.summary_column {
            Some(column) => column,
            None => return Ok(df.clone()),
        };

        let series = match df.column(column) {
            Ok(series) => series.cast(&DataType::String)?,
            Err(_) => {
                warn!(column = %column, "Summary column not found, keeping all rows");
                return Ok(df.clone());
            }
        };

        let marker = self.config.summary_marker.as_str();
        let mask: BooleanChunked = series
            .str()?
            .into_iter()
            .map(|value| Some(value.map_or(true, |v| v.trim() != marker)))
            .collect();

        Ok(df.filter(&mask)?)
    }
}

fn is_constant(series: &Series) -> Result<bool> {
    let values = series.cast(&DataType::Float64)?;
    let mut count = 0usize;
    let mut mean = 0.0f64;
    let mut m2 = 0.0f64;
    for v in values.f64()?.into_iter().flatten() {
        count += 1;
        let delta = v - mean;
        mean += delta / count as f64;
        m2 += delta * (v - mean);
    }
    if count < 2 {
        return Ok(true);
    }
    Ok(m2 / (count as f64) < ZERO_VARIANCE_EPS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_frame() -> DataFrame {
        df!(
            "user_name" => &["carlitos", "carlitos", "pedro", "pedro", "jeremy"],
            "new_window" => &["no", "yes", "no", "no", "no"],
            "roll_belt" => &[1.0, 2.0, 3.0, 4.0, 5.0],
            "avg_roll_belt" => &[None, Some(2.5), None, None, None],
            "constant" => &[7.0, 7.0, 7.0, 7.0, 7.0],
            "note" => &["a", "b", "c", "d", "e"],
            "classe" => &["A", "A", "B", "C", "E"]
        )
        .unwrap()
    }

    #[test]
    fn test_clean_drops_rows_and_columns() {
        let cleaner = DataCleaner::new(CleaningConfig::default())
            .with_protected_columns(vec!["classe".to_string()]);
        let (cleaned, summary) = cleaner.clean(&raw_frame()).unwrap();

        assert_eq!(summary.rows_before, 5);
        assert_eq!(summary.rows_after, 4);
        assert_eq!(summary.summary_rows_removed, 1);
        assert_eq!(summary.features, vec!["roll_belt".to_string()]);
        assert!(summary.dropped_bookkeeping.contains(&"user_name".to_string()));
        assert_eq!(summary.dropped_missing, vec!["avg_roll_belt".to_string()]);
        assert_eq!(summary.dropped_non_numeric, vec!["note".to_string()]);
        assert_eq!(summary.dropped_zero_variance, vec!["constant".to_string()]);

        assert_eq!(cleaned.width(), 2);
        assert_eq!(cleaned.height(), 4);
        assert!(cleaned.column("classe").is_ok());
    }

    #[test]
    fn test_missing_summary_column_keeps_rows() {
        let df = df!("x" => &[1.0, 2.0], "y" => &[3.0, 5.0]).unwrap();
        let (cleaned, summary) = DataCleaner::new(CleaningConfig::default()).clean(&df).unwrap();
        assert_eq!(cleaned.height(), 2);
        assert_eq!(summary.features.len(), 2);
    }

    #[test]
    fn test_summary_filter_disabled() {
        let config = CleaningConfig::default().without_summary_filter();
        let cleaner = DataCleaner::new(config).with_protected_columns(vec!["classe".to_string()]);
        let (_, summary) = cleaner.clean(&raw_frame()).unwrap();
        assert_eq!(summary.rows_after, 5);
        // avg_roll_belt is 80% missing even with the summary row kept
        assert!(summary.dropped_missing.contains(&"avg_roll_belt".to_string()));
    }
}
