//! Data handling: loading, cleaning, feature extraction and partitioning

pub mod cleaning;
pub mod dataset;
pub mod loader;
pub mod partition;
pub mod votes;

pub use cleaning::{CleaningConfig, CleaningSummary, DataCleaner};
pub use dataset::{columns_to_array2, FeatureImputer, LabeledDataset, UnlabeledDataset};
pub use loader::{value_counts, ColumnInfo, DataLoader, DatasetInfo, DEFAULT_NULL_MARKERS};
pub use partition::{Partition, StratifiedPartitioner};
pub use votes::{load_accuracies, VoteTable, ENSEMBLE_COLUMN};
