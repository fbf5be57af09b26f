use outlier_summary::ItemsetResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub num_outliers: usize,
    pub num_inliers: usize,
    /// Time spent draining the ingester
    pub load_time: Duration,
    /// Transform and classification time, summarization excluded
    pub execution_time: Duration,
    pub summarization_time: Duration,
    pub itemsets: Vec<ItemsetResult>,
}

impl AnalysisResult {
    pub fn total_records(&self) -> usize {
        self.num_outliers + self.num_inliers
    }

    /// Records per second over everything after loading
    pub fn throughput(&self) -> f64 {
        let seconds = (self.execution_time + self.summarization_time).as_secs_f64();
        if seconds > 0.0 {
            self.total_records() as f64 / seconds
        } else {
            0.0
        }
    }
}
