//! Before/after record dumps around a transform
//!
//! Each input batch is appended to `before-<suffix>.csv` and whatever the
//! inner transform buffered in response to `after-<suffix>.csv`. Rows hold the
//! metrics followed by the attributes, with no header.

use outlier_core::{Error, FeatureTransform, PipelineConfig, Record, Result, ResultStream, Stage};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

struct Sinks {
    before: csv::Writer<File>,
    after: csv::Writer<File>,
}

impl Sinks {
    fn open(directory: &Path, suffix: &str) -> Result<Self> {
        fs::create_dir_all(directory)?;
        let open = |prefix: &str| -> Result<csv::Writer<File>> {
            let path = directory.join(format!("{}-{}.csv", prefix, suffix));
            Ok(csv::WriterBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_path(path)?)
        };
        Ok(Self {
            before: open("before")?,
            after: open("after")?,
        })
    }

    fn flush(&mut self) -> Result<()> {
        self.before.flush()?;
        self.after.flush()?;
        Ok(())
    }
}

fn write_rows<'a>(writer: &mut csv::Writer<File>, records: impl IntoIterator<Item = &'a Record>) -> Result<usize> {
    let mut rows = 0;
    for record in records {
        let row = record
            .metrics()
            .iter()
            .map(|m| m.to_string())
            .chain(record.attributes().iter().cloned());
        writer.write_record(row)?;
        rows += 1;
    }
    Ok(rows)
}

/// Records what goes into and comes out of the inner transform
///
/// The sinks are opened by `initialize` and released by `shutdown`, or on
/// drop if the pipeline fails first.
pub struct BeforeAfterDumpingTransform<T: FeatureTransform> {
    inner: T,
    directory: PathBuf,
    suffix: String,
    sinks: Option<Sinks>,
}

impl<T: FeatureTransform> BeforeAfterDumpingTransform<T> {
    pub fn new(inner: T, directory: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            inner,
            directory: directory.into(),
            suffix: suffix.into(),
            sinks: None,
        }
    }

    /// `None` unless `config.dump_before_after` is set
    pub fn from_config(inner: T, config: &PipelineConfig) -> Option<Self> {
        config
            .dump_before_after
            .as_ref()
            .map(|suffix| Self::new(inner, config.dump_directory.clone(), suffix.clone()))
    }

    pub fn before_path(&self) -> PathBuf {
        self.directory.join(format!("before-{}.csv", self.suffix))
    }

    pub fn after_path(&self) -> PathBuf {
        self.directory.join(format!("after-{}.csv", self.suffix))
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: FeatureTransform> Stage for BeforeAfterDumpingTransform<T> {
    type Input = Record;
    type Output = Record;

    fn initialize(&mut self) -> Result<()> {
        self.inner.initialize()?;
        if self.sinks.is_none() {
            self.sinks = Some(Sinks::open(&self.directory, &self.suffix)?);
        }
        Ok(())
    }

    #[instrument(skip_all, fields(records = batch.len(), suffix = %self.suffix))]
    fn consume(&mut self, batch: Vec<Record>) -> Result<()> {
        let sinks = self.sinks.as_mut().ok_or_else(|| {
            Error::ContractViolation("before/after dump consumed outside initialize..shutdown".to_string())
        })?;
        let before = write_rows(&mut sinks.before, &batch)?;

        let already = self.inner.stream().len();
        self.inner.consume(batch)?;
        let fresh = &self.inner.stream().buffered()[already..];
        let after = write_rows(&mut sinks.after, fresh)?;
        sinks.flush()?;
        debug!(before, after, "before/after rows written");
        Ok(())
    }

    fn stream(&mut self) -> &mut ResultStream<Record> {
        self.inner.stream()
    }

    fn shutdown(&mut self) -> Result<()> {
        let already = self.inner.stream().len();
        self.inner.shutdown()?;
        if let Some(mut sinks) = self.sinks.take() {
            // Shutdown may flush trailing output, e.g. final windows
            write_rows(&mut sinks.after, &self.inner.stream().buffered()[already..])?;
            sinks.flush()?;
        }
        Ok(())
    }
}

impl<T: FeatureTransform> Drop for BeforeAfterDumpingTransform<T> {
    fn drop(&mut self) {
        if let Some(mut sinks) = self.sinks.take() {
            if let Err(e) = sinks.flush() {
                warn!(error = %e, "before/after dump could not be flushed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outlier_core::WindowConfig;

    /// Emits every record whose first metric is even
    #[derive(Default)]
    struct KeepEven {
        output: ResultStream<Record>,
    }

    impl Stage for KeepEven {
        type Input = Record;
        type Output = Record;

        fn consume(&mut self, batch: Vec<Record>) -> Result<()> {
            self.output
                .extend(batch.into_iter().filter(|r| r.metrics()[0] % 2.0 == 0.0));
            Ok(())
        }

        fn stream(&mut self) -> &mut ResultStream<Record> {
            &mut self.output
        }
    }

    fn lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_dumps_inputs_and_fresh_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let mut stage = BeforeAfterDumpingTransform::new(KeepEven::default(), dir.path(), "t");
        stage.initialize().unwrap();
        stage
            .consume(vec![
                Record::with_attributes(vec![1.0], vec!["a".to_string()]),
                Record::with_attributes(vec![2.0], vec!["b".to_string()]),
            ])
            .unwrap();
        stage.consume(vec![Record::new(vec![4.0, 0.5])]).unwrap();
        stage.shutdown().unwrap();

        assert_eq!(lines(&stage.before_path()), vec!["1,a", "2,b", "4,0.5"]);
        assert_eq!(lines(&stage.after_path()), vec!["2,b", "4,0.5"]);
        // Output stays buffered for the next stage
        assert_eq!(stage.stream().drain().len(), 2);
    }

    #[test]
    fn test_outputs_drained_between_batches_are_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let mut stage = BeforeAfterDumpingTransform::new(KeepEven::default(), dir.path(), "d");
        stage.initialize().unwrap();
        stage.consume(vec![Record::new(vec![2.0])]).unwrap();
        assert_eq!(stage.stream().drain().len(), 1);
        stage.consume(vec![Record::new(vec![6.0])]).unwrap();
        stage.shutdown().unwrap();
        assert_eq!(lines(&stage.after_path()), vec!["2", "6"]);
    }

    #[test]
    fn test_trailing_output_from_shutdown_is_dumped() {
        use outlier_window::{IncrementalCount, SlidingWindowTransform};

        let dir = tempfile::tempdir().unwrap();
        let windows = SlidingWindowTransform::new(IncrementalCount::new(), WindowConfig::tumbling(10.0), 0);
        let mut stage = BeforeAfterDumpingTransform::new(windows, dir.path(), "w");
        stage.initialize().unwrap();
        stage
            .consume([0.0, 3.0, 12.0].iter().map(|t| Record::new(vec![*t])).collect())
            .unwrap();
        assert_eq!(lines(&stage.after_path()).len(), 1);
        stage.shutdown().unwrap();
        assert_eq!(lines(&stage.after_path()), vec!["0", "10"]);
    }

    #[test]
    fn test_drop_without_shutdown_releases_sinks() {
        let dir = tempfile::tempdir().unwrap();
        let mut stage = BeforeAfterDumpingTransform::new(KeepEven::default(), dir.path(), "p");
        stage.initialize().unwrap();
        stage.consume(vec![Record::new(vec![8.0])]).unwrap();
        let (before, after) = (stage.before_path(), stage.after_path());
        drop(stage);
        assert_eq!(lines(&before), vec!["8"]);
        assert_eq!(lines(&after), vec!["8"]);
    }

    #[test]
    fn test_consume_requires_initialize() {
        let dir = tempfile::tempdir().unwrap();
        let mut stage = BeforeAfterDumpingTransform::new(KeepEven::default(), dir.path(), "x");
        assert!(matches!(
            stage.consume(vec![Record::new(vec![2.0])]),
            Err(Error::ContractViolation(_))
        ));
    }

    #[test]
    fn test_from_config() {
        let config = PipelineConfig::new();
        assert!(BeforeAfterDumpingTransform::from_config(KeepEven::default(), &config).is_none());
        let config = config.with_before_after_dump("run").with_dump_directory("/tmp/dumps");
        let stage = BeforeAfterDumpingTransform::from_config(KeepEven::default(), &config).unwrap();
        assert_eq!(stage.before_path(), PathBuf::from("/tmp/dumps/before-run.csv"));
    }
}
