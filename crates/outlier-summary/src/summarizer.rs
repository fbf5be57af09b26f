//! Single-attribute explanation of a classified batch
//!
//! Every attribute value seen in the batch is a candidate. A candidate is
//! reported when enough outliers carry it (`min_support`) and when outliers are
//! sufficiently more frequent among records carrying it than among records
//! that do not (`min_risk_ratio`).

use crate::summary::{ExplanationItem, ItemsetResult, Summary};
use outlier_core::{ClassificationResult, Error, PipelineConfig, Result, ResultStream, Stage};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, instrument};

/// A stage turning classification results into summaries
pub trait Summarizer: Stage<Input = ClassificationResult, Output = Summary> {}

impl<T> Summarizer for T where T: Stage<Input = ClassificationResult, Output = Summary> + ?Sized {}

#[derive(Debug, Default, Clone, Copy)]
struct Counts {
    outliers: usize,
    inliers: usize,
}

/// Outlier rate among exposed records over the rate among unexposed ones
///
/// Zero when no exposed record is an outlier. A value carried by every record
/// has nothing to contrast against and scores 1. Otherwise infinite when every
/// outlier is exposed.
pub fn risk_ratio(
    exposed_outliers: usize,
    exposed_inliers: usize,
    total_outliers: usize,
    total_inliers: usize,
) -> f64 {
    let exposed = exposed_outliers + exposed_inliers;
    let unexposed_outliers = total_outliers - exposed_outliers;
    let unexposed = unexposed_outliers + total_inliers - exposed_inliers;
    if exposed == 0 || exposed_outliers == 0 {
        return 0.0;
    }
    if unexposed == 0 {
        return 1.0;
    }
    if unexposed_outliers == 0 {
        return f64::INFINITY;
    }
    (exposed_outliers as f64 / exposed as f64) / (unexposed_outliers as f64 / unexposed as f64)
}

pub struct BatchSummarizer {
    min_support: f64,
    min_risk_ratio: f64,
    output: ResultStream<Summary>,
}

impl BatchSummarizer {
    pub fn new(min_support: f64, min_risk_ratio: f64) -> Result<Self> {
        if !(min_support > 0.0 && min_support <= 1.0) {
            return Err(Error::invalid_option("min_support", format!("{} must be in (0, 1]", min_support)));
        }
        if !(min_risk_ratio >= 0.0) {
            return Err(Error::invalid_option(
                "min_risk_ratio",
                format!("{} must be non-negative", min_risk_ratio),
            ));
        }
        Ok(Self {
            min_support,
            min_risk_ratio,
            output: ResultStream::new(),
        })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Self::new(config.min_support, config.min_risk_ratio)
    }

    fn summarize(&self, batch: &[ClassificationResult]) -> (usize, usize, Vec<ItemsetResult>) {
        let mut totals = Counts::default();
        let mut per_item: HashMap<ExplanationItem, Counts> = HashMap::new();
        for result in batch {
            for (column, value) in result.record().attributes().iter().enumerate() {
                let counts = per_item
                    .entry(ExplanationItem::new(column, value.as_str()))
                    .or_default();
                if result.is_outlier() {
                    counts.outliers += 1;
                } else {
                    counts.inliers += 1;
                }
            }
            if result.is_outlier() {
                totals.outliers += 1;
            } else {
                totals.inliers += 1;
            }
        }

        let mut itemsets: Vec<ItemsetResult> = per_item
            .into_iter()
            .filter(|(_, counts)| counts.outliers > 0)
            .filter_map(|(item, counts)| {
                let support = counts.outliers as f64 / totals.outliers as f64;
                let ratio = risk_ratio(counts.outliers, counts.inliers, totals.outliers, totals.inliers);
                (support >= self.min_support && ratio >= self.min_risk_ratio).then(|| ItemsetResult {
                    support,
                    num_records: counts.outliers,
                    ratio,
                    items: vec![item],
                })
            })
            .collect();
        itemsets.sort_by(|a, b| {
            b.ratio
                .partial_cmp(&a.ratio)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.support.partial_cmp(&a.support).unwrap_or(Ordering::Equal))
                .then_with(|| a.items.cmp(&b.items))
        });
        (totals.outliers, totals.inliers, itemsets)
    }
}

impl Stage for BatchSummarizer {
    type Input = ClassificationResult;
    type Output = Summary;

    /// Emits exactly one [`Summary`] per call, empty batches included
    #[instrument(skip_all, fields(results = batch.len()))]
    fn consume(&mut self, batch: Vec<ClassificationResult>) -> Result<()> {
        let started = Instant::now();
        let (num_outliers, num_inliers, itemsets) = self.summarize(&batch);
        debug!(num_outliers, num_inliers, itemsets = itemsets.len(), "batch summarized");
        self.output.push(Summary {
            num_outliers,
            num_inliers,
            itemsets,
            creation_time: started.elapsed(),
        });
        Ok(())
    }

    fn stream(&mut self) -> &mut ResultStream<Summary> {
        &mut self.output
    }
}
