//! Data ingestion
//!
//! An ingester hands the pipeline its complete, time-ordered input in one
//! call.

use outlier_core::{Error, Record, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Finite source of records
pub trait DataIngester {
    /// Every remaining record, in time order
    fn drain(&mut self) -> Result<Vec<Record>>;
}

impl<I: DataIngester + ?Sized> DataIngester for Box<I> {
    fn drain(&mut self) -> Result<Vec<Record>> {
        (**self).drain()
    }
}

/// Records held in memory; drains once
#[derive(Debug, Clone, Default)]
pub struct MemoryIngester {
    records: Vec<Record>,
}

impl MemoryIngester {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }
}

impl From<Vec<Record>> for MemoryIngester {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}

impl DataIngester for MemoryIngester {
    fn drain(&mut self) -> Result<Vec<Record>> {
        Ok(std::mem::take(&mut self.records))
    }
}

/// Where and how to read a CSV source
///
/// Column names refer to the header row. Metric columns must parse as
/// floating point; attribute columns are taken verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvSource {
    pub path: PathBuf,
    pub metrics: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<String>,
}

/// Reads a headed CSV file into records
#[derive(Debug, Clone)]
pub struct CsvIngester {
    source: CsvSource,
}

impl CsvIngester {
    pub fn new(source: CsvSource) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &CsvSource {
        &self.source
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| Error::invalid_option("csv column", format!("no column named '{}'", name)))
}

impl DataIngester for CsvIngester {
    fn drain(&mut self) -> Result<Vec<Record>> {
        if self.source.metrics.is_empty() {
            return Err(Error::missing_option("metrics"));
        }
        let mut reader = csv::Reader::from_path(&self.source.path)?;
        let headers = reader.headers()?.clone();
        let metric_columns = self
            .source
            .metrics
            .iter()
            .map(|name| column_index(&headers, name))
            .collect::<Result<Vec<_>>>()?;
        let attribute_columns = self
            .source
            .attributes
            .iter()
            .map(|name| column_index(&headers, name))
            .collect::<Result<Vec<_>>>()?;

        let mut records = Vec::new();
        for (line, row) in reader.records().enumerate() {
            let row = row?;
            let metrics = metric_columns
                .iter()
                .map(|&c| {
                    let field = row.get(c).unwrap_or("").trim();
                    field.parse::<f64>().map_err(|_| {
                        Error::InvalidInput(format!(
                            "row {}: '{}' in column '{}' is not a number",
                            line + 1,
                            field,
                            &headers[c]
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let attributes = attribute_columns
                .iter()
                .map(|&c| row.get(c).unwrap_or("").to_string())
                .collect();
            records.push(Record::with_attributes(metrics, attributes));
        }
        debug!(path = %self.source.path.display(), records = records.len(), "csv ingested");
        Ok(records)
    }
}
