//! Batch scoring stage

use crate::model::{model_for, BatchTrainScore, BoxedModel};
use outlier_core::{Error, FeatureTransform, PipelineConfig, Record, Result, ResultStream, Stage};
use tracing::{debug, instrument};

/// A transform that scores records with a trainable model
///
/// Reporting decorators use this to reach the model and the feature vectors
/// it was trained on.
pub trait ScoredTransform: FeatureTransform {
    fn model(&self) -> &dyn BatchTrainScore;

    /// Feature vector the model sees for `record`
    fn features(&self, record: &Record) -> Result<Vec<f64>>;
}

impl<T: ScoredTransform + ?Sized> ScoredTransform for Box<T> {
    fn model(&self) -> &dyn BatchTrainScore {
        (**self).model()
    }

    fn features(&self, record: &Record) -> Result<Vec<f64>> {
        (**self).features(record)
    }
}

/// Which metric columns reach the model
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Projection {
    #[default]
    All,
    /// Exactly these columns, in this order
    Columns(Vec<usize>),
    /// Every column but one (typically the time column)
    Excluding(usize),
}

impl Projection {
    pub fn apply(&self, metrics: &[f64]) -> Result<Vec<f64>> {
        match self {
            Projection::All => Ok(metrics.to_vec()),
            Projection::Columns(columns) => columns
                .iter()
                .map(|&c| {
                    metrics.get(c).copied().ok_or_else(|| {
                        Error::InvalidInput(format!(
                            "feature column {} out of range for {} metrics",
                            c,
                            metrics.len()
                        ))
                    })
                })
                .collect(),
            Projection::Excluding(excluded) => {
                if *excluded >= metrics.len() {
                    return Err(Error::time_column_out_of_range(*excluded, metrics.len()));
                }
                Ok(metrics
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| i != excluded)
                    .map(|(_, v)| *v)
                    .collect())
            }
        }
    }
}

/// Trains on every consumed batch, then emits `[score]` per input record
///
/// Attributes are carried over unchanged.
pub struct BatchScoreTransform<M: BatchTrainScore = BoxedModel> {
    model: M,
    projection: Projection,
    output: ResultStream<Record>,
}

impl BatchScoreTransform<BoxedModel> {
    /// Model from `config.transform`; the time column is excluded when windowing
    pub fn from_config(config: &PipelineConfig) -> Self {
        let transform = Self::new(model_for(config.transform));
        if config.window.is_some() {
            transform.with_projection(Projection::Excluding(config.time_column))
        } else {
            transform
        }
    }
}

impl<M: BatchTrainScore> BatchScoreTransform<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            projection: Projection::All,
            output: ResultStream::new(),
        }
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }
}

impl<M: BatchTrainScore> Stage for BatchScoreTransform<M> {
    type Input = Record;
    type Output = Record;

    #[instrument(skip(self, batch), fields(model = self.model.name(), records = batch.len()))]
    fn consume(&mut self, batch: Vec<Record>) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let points = batch
            .iter()
            .map(|r| self.projection.apply(r.metrics()))
            .collect::<Result<Vec<_>>>()?;
        self.model.train(&points)?;

        let scored = batch
            .iter()
            .zip(&points)
            .map(|(record, point)| Ok(record.derive(vec![self.model.score(point)?])))
            .collect::<Result<Vec<_>>>()?;
        debug!(scored = scored.len(), "batch scored");
        self.output.extend(scored);
        Ok(())
    }

    fn stream(&mut self) -> &mut ResultStream<Record> {
        &mut self.output
    }
}

impl<M: BatchTrainScore> ScoredTransform for BatchScoreTransform<M> {
    fn model(&self) -> &dyn BatchTrainScore {
        &self.model
    }

    fn features(&self, record: &Record) -> Result<Vec<f64>> {
        self.projection.apply(record.metrics())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GaussianModel, MadModel};
    use outlier_core::{TransformKind, WindowConfig};

    fn batch() -> Vec<Record> {
        [1.0, 2.0, 3.0, 4.0, 5.0, 50.0]
            .iter()
            .enumerate()
            .map(|(i, v)| Record::with_attributes(vec![*v], vec![format!("host-{}", i)]))
            .collect()
    }

    #[test]
    fn test_one_score_per_record_with_attributes() {
        let mut transform = BatchScoreTransform::new(MadModel::new());
        transform.initialize().unwrap();
        transform.consume(batch()).unwrap();
        transform.shutdown().unwrap();

        let out = transform.stream().drain();
        assert_eq!(out.len(), 6);
        for (i, record) in out.iter().enumerate() {
            assert_eq!(record.dimensions(), 1);
            assert_eq!(record.attributes(), &[format!("host-{}", i)]);
        }
        let top = out
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.metrics()[0].total_cmp(&b.1.metrics()[0]))
            .map(|(i, _)| i);
        assert_eq!(top, Some(5));
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let mut transform = BatchScoreTransform::new(GaussianModel::new());
        transform.consume(Vec::new()).unwrap();
        assert!(transform.stream().is_empty());
    }

    #[test]
    fn test_projection() {
        let metrics = [10.0, 1.0, 2.0];
        assert_eq!(Projection::All.apply(&metrics).unwrap(), vec![10.0, 1.0, 2.0]);
        assert_eq!(Projection::Excluding(0).apply(&metrics).unwrap(), vec![1.0, 2.0]);
        assert_eq!(Projection::Columns(vec![2, 0]).apply(&metrics).unwrap(), vec![2.0, 10.0]);
        assert!(Projection::Excluding(3).apply(&metrics).is_err());
        assert!(Projection::Columns(vec![5]).apply(&metrics).is_err());
    }

    #[test]
    fn test_from_config_drops_time_column_when_windowed() {
        let plain = BatchScoreTransform::from_config(&PipelineConfig::new());
        assert_eq!(plain.projection(), &Projection::All);
        assert_eq!(plain.model().name(), "gaussian");

        let config = PipelineConfig::new()
            .with_time_column(1)
            .with_transform(TransformKind::Mad)
            .with_window(WindowConfig::tumbling(10.0));
        let windowed = BatchScoreTransform::from_config(&config);
        assert_eq!(windowed.projection(), &Projection::Excluding(1));
        assert_eq!(windowed.model().name(), "mad");
    }

    #[test]
    fn test_model_errors_propagate() {
        let mut transform = BatchScoreTransform::new(GaussianModel::new());
        assert!(transform.consume(vec![Record::new(vec![1.0])]).is_err());
        assert!(transform.stream().is_empty());
    }
}
