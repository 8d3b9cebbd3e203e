//! Class labels, classifier identifiers and the canonical label ordering

use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorical class symbol (e.g. `"A"` .. `"E"`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Name of one independently trained classifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassifierId(String);

impl ClassifierId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassifierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassifierId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ClassifierId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Sorted, deduplicated set of labels.
///
/// The position of a label in this set is its vote slot, and the order is the
/// tie-break order: when several labels share the maximum vote weight the one
/// that sorts first wins.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet {
    labels: Vec<Label>,
}

impl LabelSet {
    pub fn new<I>(labels: I) -> Self
    where
        I: IntoIterator<Item = Label>,
    {
        let mut labels: Vec<Label> = labels.into_iter().collect();
        labels.sort();
        labels.dedup();
        Self { labels }
    }

    /// Merge another set into this one, keeping canonical order
    pub fn union(&self, other: &LabelSet) -> LabelSet {
        LabelSet::new(self.labels.iter().chain(other.labels.iter()).cloned())
    }

    /// Vote slot of a label
    pub fn index_of(&self, label: &Label) -> Option<usize> {
        self.labels.binary_search(label).ok()
    }

    pub fn contains(&self, label: &Label) -> bool {
        self.index_of(label).is_some()
    }

    pub fn get(&self, idx: usize) -> Option<&Label> {
        self.labels.get(idx)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter()
    }

    pub fn as_slice(&self) -> &[Label] {
        &self.labels
    }
}

impl FromIterator<Label> for LabelSet {
    fn from_iter<T: IntoIterator<Item = Label>>(iter: T) -> Self {
        LabelSet::new(iter)
    }
}
