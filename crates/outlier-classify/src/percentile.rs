//! Percentile cutoff classifier
//!
//! Each consumed batch gets its own cutoff: the `target_percentile` quantile of
//! the batch's scores. A record is an outlier when its score reaches the
//! cutoff. Scores are read from the first metric.

use outlier_core::{
    ClassificationResult, Error, OutlierClassifier, PipelineConfig, Record, Result,
};
use statrs::statistics::{Data, OrderStatistics};
use std::collections::VecDeque;
use tracing::{debug, instrument};

pub struct PercentileClassifier {
    target_percentile: f64,
    pending: VecDeque<ClassificationResult>,
    last_cutoff: Option<f64>,
}

impl PercentileClassifier {
    pub fn new(target_percentile: f64) -> Result<Self> {
        if !(target_percentile > 0.0 && target_percentile < 1.0) {
            return Err(Error::invalid_option(
                "target_percentile",
                format!("{} must be in (0, 1)", target_percentile),
            ));
        }
        Ok(Self {
            target_percentile,
            pending: VecDeque::new(),
            last_cutoff: None,
        })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Self::new(config.target_percentile)
    }

    pub fn target_percentile(&self) -> f64 {
        self.target_percentile
    }

    /// Cutoff of the most recent non-empty batch
    pub fn cutoff(&self) -> Option<f64> {
        self.last_cutoff
    }

    /// Results computed but not yet pulled
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

fn score_of(record: &Record) -> Result<f64> {
    let score = *record
        .metrics()
        .first()
        .ok_or_else(|| Error::InvalidInput("record has no score metric".to_string()))?;
    if !score.is_finite() {
        return Err(Error::InvalidInput(format!("non-finite score {}", score)));
    }
    Ok(score)
}

impl Iterator for PercentileClassifier {
    type Item = Result<ClassificationResult>;

    fn next(&mut self) -> Option<Self::Item> {
        self.pending.pop_front().map(Ok)
    }
}

impl OutlierClassifier for PercentileClassifier {
    #[instrument(skip_all, fields(records = records.len(), percentile = self.target_percentile))]
    fn consume(&mut self, records: Vec<Record>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let scores = records.iter().map(score_of).collect::<Result<Vec<_>>>()?;
        let cutoff = Data::new(scores.clone()).quantile(self.target_percentile);
        self.last_cutoff = Some(cutoff);

        let mut outliers = 0usize;
        for (record, score) in records.into_iter().zip(scores) {
            let is_outlier = score >= cutoff;
            outliers += usize::from(is_outlier);
            self.pending.push_back(ClassificationResult::new(record, is_outlier));
        }
        debug!(cutoff, outliers, "batch classified");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn scored(scores: &[f64]) -> Vec<Record> {
        scores.iter().map(|s| Record::new(vec![*s])).collect()
    }

    #[test]
    fn test_top_scores_are_outliers() {
        let mut classifier = PercentileClassifier::new(0.9).unwrap();
        let scores: Vec<f64> = (1..=100).map(f64::from).collect();
        classifier.consume(scored(&scores)).unwrap();

        let results: Vec<_> = classifier.stream().unwrap().drain();
        assert_eq!(results.len(), 100);
        let flagged: Vec<f64> = results
            .iter()
            .filter(|r| r.is_outlier())
            .map(|r| r.record().metrics()[0])
            .collect();
        assert_eq!(flagged, (91..=100).map(f64::from).collect::<Vec<_>>());
        assert!(classifier.cutoff().unwrap() > 90.0);
    }

    #[test]
    fn test_order_and_identity_preserved() {
        let mut classifier = PercentileClassifier::new(0.5).unwrap();
        let input = scored(&[5.0, 1.0, 9.0, 3.0]);
        classifier.consume(input.clone()).unwrap();
        let records: Vec<Record> = classifier.map(|r| r.unwrap().into_record()).collect();
        assert_eq!(records, input);
    }

    #[test]
    fn test_ties_at_cutoff_are_outliers() {
        let mut classifier = PercentileClassifier::new(0.5).unwrap();
        classifier.consume(scored(&[2.0, 2.0, 2.0])).unwrap();
        assert_relative_eq!(classifier.cutoff().unwrap(), 2.0);
        assert!(classifier.all(|r| r.unwrap().is_outlier()));
    }

    #[test]
    fn test_exhaustion_is_final() {
        let mut classifier = PercentileClassifier::new(0.99).unwrap();
        classifier.consume(scored(&[1.0, 2.0])).unwrap();
        assert_eq!(classifier.stream().unwrap().len(), 2);
        assert!(classifier.next().is_none());
        assert!(classifier.stream().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(PercentileClassifier::new(0.0).is_err());
        assert!(PercentileClassifier::new(1.0).is_err());
        let mut classifier = PercentileClassifier::new(0.5).unwrap();
        assert!(classifier.consume(vec![Record::new(vec![])]).is_err());
        assert!(classifier.consume(scored(&[f64::NAN])).is_err());
        assert_eq!(classifier.pending(), 0);
        classifier.consume(Vec::new()).unwrap();
        assert!(classifier.cutoff().is_none());
    }
}
