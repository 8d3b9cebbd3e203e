//! CSV loading for the sensor measurement files

use crate::error::{BarbellError, Result};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Markers the source files use for missing measurements
pub const DEFAULT_NULL_MARKERS: &[&str] = &["NA", "#DIV/0!", ""];

/// CSV loader with the null handling the sensor exports need
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Strings parsed as missing values
    null_markers: Vec<String>,
    /// Rows used for schema inference
    infer_schema_length: Option<usize>,
    /// Field separator
    separator: u8,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            null_markers: DEFAULT_NULL_MARKERS.iter().map(|s| s.to_string()).collect(),
            infer_schema_length: Some(10_000),
            separator: b',',
        }
    }

    /// Replace the null markers
    pub fn with_null_markers(mut self, markers: Vec<String>) -> Self {
        self.null_markers = markers;
        self
    }

    /// Set the number of rows used for schema inference (`None` scans all)
    pub fn with_infer_schema_length(mut self, rows: Option<usize>) -> Self {
        self.infer_schema_length = rows;
        self
    }

    /// Set field separator
    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    /// Load a CSV file with a header row
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BarbellError::DataError(format!(
                "file not found: {}",
                path.display()
            )));
        }

        let null_values = NullValues::AllColumns(
            self.null_markers.iter().map(|s| s.as_str().into()).collect(),
        );
        let parse_opts = CsvParseOptions::default()
            .with_separator(self.separator)
            .with_null_values(Some(null_values));

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .with_parse_options(parse_opts)
            .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
            .finish()?;

        debug!(
            path = %path.display(),
            rows = df.height(),
            cols = df.width(),
            "Loaded CSV"
        );

        Ok(df)
    }

    /// Summarize a file for the `info` command
    pub fn describe(&self, path: impl AsRef<Path>, label_column: &str) -> Result<DatasetInfo> {
        let path = path.as_ref();
        let df = self.load_csv(path)?;

        let columns = df
            .get_columns()
            .iter()
            .map(|s| ColumnInfo {
                name: s.name().to_string(),
                dtype: format!("{}", s.dtype()),
                null_count: s.null_count(),
            })
            .collect();

        let label_counts = match df.column(label_column) {
            Ok(series) => Some(value_counts(series)?),
            Err(_) => None,
        };

        Ok(DatasetInfo {
            path: path.to_path_buf(),
            n_rows: df.height(),
            n_cols: df.width(),
            columns,
            label_counts,
        })
    }
}

/// Count occurrences of each (stringified) value in a column, sorted by value
pub fn value_counts(series: &Series) -> Result<Vec<(String, usize)>> {
    let as_str = series.cast(&DataType::String)?;
    let mut counts: std::collections::BTreeMap<String, usize> = std::collections::BTreeMap::new();
    for value in as_str.str()?.into_iter().flatten() {
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }
    Ok(counts.into_iter().collect())
}

/// Column summary
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: String,
    pub null_count: usize,
}

/// Dataset summary
#[derive(Debug, Clone)]
pub struct DatasetInfo {
    pub path: PathBuf,
    pub n_rows: usize,
    pub n_cols: usize,
    pub columns: Vec<ColumnInfo>,
    /// Rows per label, when the label column exists
    pub label_counts: Option<Vec<(String, usize)>>,
}
