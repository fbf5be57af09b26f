//! The unit of data flow through a pipeline

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One observation: positional numeric metrics plus categorical attributes
///
/// Records are immutable once built. The only sanctioned mutation is
/// [`Record::stamp_time`], used by the window engine to write the window start
/// into a freshly aggregated record it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    metrics: Vec<f64>,
    attributes: Vec<String>,
}

impl Record {
    /// Create a record with metrics only
    pub fn new(metrics: Vec<f64>) -> Self {
        Self {
            metrics,
            attributes: Vec::new(),
        }
    }

    /// Create a record with metrics and attributes
    pub fn with_attributes(metrics: Vec<f64>, attributes: Vec<String>) -> Self {
        Self { metrics, attributes }
    }

    /// Derive a record that carries new metrics but keeps this record's attributes
    pub fn derive(&self, metrics: Vec<f64>) -> Self {
        Self {
            metrics,
            attributes: self.attributes.clone(),
        }
    }

    pub fn metrics(&self) -> &[f64] {
        &self.metrics
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Number of metric dimensions
    pub fn dimensions(&self) -> usize {
        self.metrics.len()
    }

    /// Read the time coordinate stored at `column`
    pub fn time(&self, column: usize) -> Result<f64> {
        self.metrics
            .get(column)
            .copied()
            .ok_or_else(|| Error::time_column_out_of_range(column, self.metrics.len()))
    }

    /// Overwrite the time coordinate at `column`
    pub fn stamp_time(&mut self, column: usize, time: f64) -> Result<()> {
        let dimensions = self.metrics.len();
        let slot = self
            .metrics
            .get_mut(column)
            .ok_or_else(|| Error::time_column_out_of_range(column, dimensions))?;
        *slot = time;
        Ok(())
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record {{ metrics: {:?}", self.metrics)?;
        if !self.attributes.is_empty() {
            write!(f, ", attributes: {:?}", self.attributes)?;
        }
        write!(f, " }}")
    }
}

/// Output of a classifier: the classified record and its verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    record: Record,
    is_outlier: bool,
}

impl ClassificationResult {
    pub fn new(record: Record, is_outlier: bool) -> Self {
        Self { record, is_outlier }
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn is_outlier(&self) -> bool {
        self.is_outlier
    }

    pub fn into_record(self) -> Record {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_lookup() {
        let record = Record::new(vec![12.0, 3.5]);
        assert_eq!(record.time(0).unwrap(), 12.0);
        assert_eq!(record.time(1).unwrap(), 3.5);
        assert!(matches!(record.time(2), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_stamp_time_only_touches_time_slot() {
        let mut record = Record::new(vec![1.0, 2.0, 3.0]);
        record.stamp_time(1, 40.0).unwrap();
        assert_eq!(record.metrics(), &[1.0, 40.0, 3.0]);
        assert!(record.stamp_time(5, 0.0).is_err());
    }

    #[test]
    fn test_derive_keeps_attributes() {
        let record = Record::with_attributes(vec![1.0, 2.0], vec!["eu-west".into(), "v2".into()]);
        let scored = record.derive(vec![0.75]);
        assert_eq!(scored.metrics(), &[0.75]);
        assert_eq!(scored.attributes(), record.attributes());
    }

    #[test]
    fn test_display() {
        let record = Record::with_attributes(vec![1.0], vec!["a".into()]);
        assert_eq!(record.to_string(), "Record { metrics: [1.0], attributes: [\"a\"] }");
        assert_eq!(Record::new(vec![2.0]).to_string(), "Record { metrics: [2.0] }");
    }
}
