//! Ensemble module
//!
//! Combines the predictions of several independently trained classifiers:
//! - Label and classifier identifiers with a canonical label ordering
//! - Accuracy-derived weight tables
//! - Weighted hard voting with a deterministic tie-break

mod labels;
mod voting;

pub use labels::{ClassifierId, Label, LabelSet};
pub use voting::{
    weight_mass, AccuracyTable, EnsembleOutcome, PredictionMatrix, VoteVector, WeightTable,
    WeightedVoteAggregator, WEIGHT_SUM_TOLERANCE,
};
