//! Summary value types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// One attribute value, identified by its attribute position
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExplanationItem {
    pub column: usize,
    pub value: String,
}

impl ExplanationItem {
    pub fn new(column: usize, value: impl Into<String>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }
}

impl fmt::Display for ExplanationItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a{}={}", self.column, self.value)
    }
}

/// A set of attribute values over-represented among outliers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemsetResult {
    /// Fraction of all outliers carrying every item
    pub support: f64,
    /// Number of outliers carrying every item
    pub num_records: usize,
    /// Outlier rate with the items over the outlier rate without them
    pub ratio: f64,
    pub items: Vec<ExplanationItem>,
}

impl fmt::Display for ItemsetResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = self.items.iter().map(ToString::to_string).collect();
        write!(
            f,
            "{{{}}} support={:.4} records={} ratio={:.3}",
            items.join(", "),
            self.support,
            self.num_records,
            self.ratio
        )
    }
}

/// What a summarizer reports for one consumed batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub num_outliers: usize,
    pub num_inliers: usize,
    pub itemsets: Vec<ItemsetResult>,
    /// Time spent producing this summary
    pub creation_time: Duration,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.num_outliers + self.num_inliers
    }
}
