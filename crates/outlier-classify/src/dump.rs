//! Classification dump decorator
//!
//! [`DumpClassifier`] forwards every result of its inner classifier unchanged
//! and writes one `"<index>,<flag>"` line per result, `flag` being `1` for an
//! outlier. The sink is flushed and dropped as soon as the inner classifier is
//! first exhausted, or when the decorator is dropped, whichever comes first.
//! Results of batches consumed after that are still forwarded, just no longer
//! written.
//!
//! A failed write is reported in place of the result it was writing; that
//! result is lost but keeps its index, so later lines still line up with
//! result positions.

use outlier_core::{ClassificationResult, OutlierClassifier, PipelineConfig, Record, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, warn};

pub struct DumpClassifier<C: OutlierClassifier, W: Write = BufWriter<File>> {
    inner: C,
    sink: Option<W>,
    count: u64,
}

impl<C: OutlierClassifier> DumpClassifier<C, BufWriter<File>> {
    /// Dump to `dump_classifier_<query_name>.txt` inside the dump directory
    pub fn create(inner: C, config: &PipelineConfig) -> Result<Self> {
        let path = Self::dump_file(config);
        fs::create_dir_all(&config.dump_directory)?;
        let file = File::create(&path)?;
        debug!(path = %path.display(), "classification dump opened");
        Ok(Self::with_writer(inner, BufWriter::new(file)))
    }

    pub fn dump_file(config: &PipelineConfig) -> PathBuf {
        config.dump_path(&format!("dump_classifier_{}.txt", config.query_name))
    }
}

impl<C: OutlierClassifier, W: Write> DumpClassifier<C, W> {
    pub fn with_writer(inner: C, writer: W) -> Self {
        Self {
            inner,
            sink: Some(writer),
            count: 0,
        }
    }

    /// Results pulled from the inner classifier so far, failed writes included
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Whether the sink is still held
    pub fn is_open(&self) -> bool {
        self.sink.is_some()
    }

    fn release(&mut self) -> Result<()> {
        if let Some(mut sink) = self.sink.take() {
            sink.flush()?;
            debug!(lines = self.count, "classification dump released");
        }
        Ok(())
    }

    fn write_line(&mut self, result: &ClassificationResult) -> Result<()> {
        if let Some(sink) = self.sink.as_mut() {
            writeln!(sink, "{},{}", self.count, u8::from(result.is_outlier()))?;
        }
        Ok(())
    }
}

impl<C: OutlierClassifier, W: Write> Iterator for DumpClassifier<C, W> {
    type Item = Result<ClassificationResult>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.next() {
            Some(Ok(result)) => {
                let written = self.write_line(&result);
                self.count += 1;
                Some(written.map(|()| result))
            }
            Some(Err(e)) => Some(Err(e)),
            None => {
                match self.release() {
                    Ok(()) => None,
                    Err(e) => Some(Err(e)),
                }
            }
        }
    }
}

impl<C: OutlierClassifier, W: Write> OutlierClassifier for DumpClassifier<C, W> {
    fn initialize(&mut self) -> Result<()> {
        self.inner.initialize()
    }

    fn consume(&mut self, records: Vec<Record>) -> Result<()> {
        self.inner.consume(records)
    }
}

impl<C: OutlierClassifier, W: Write> Drop for DumpClassifier<C, W> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(error = %e, "classification dump could not be flushed");
        }
    }
}
