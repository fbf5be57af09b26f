//! Score-surface and mixture reporting
//!
//! [`GridDumpingTransform`] wraps a [`ScoredTransform`]. After each inner
//! `consume` it can score a regular grid over the batch's bounding box and
//! write the mixture parameters of the freshly trained model. Neither side
//! effect touches the inner output stream.

use crate::dump::{matrix_data, vector_data, write_json, ScoredPoint};
use crate::model::BatchTrainScore;
use crate::transform::ScoredTransform;
use outlier_core::{Error, PipelineConfig, Record, Result, ResultStream, Stage};
use std::path::PathBuf;
use tracing::{debug, instrument, warn};

/// Upper bound on the number of grid points scored per dump
pub const MAX_GRID_POINTS: usize = 1_000_000;

/// Axis-aligned bounds of a set of feature vectors
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox {
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

impl BoundingBox {
    /// `None` for an empty set
    pub fn of(points: &[Vec<f64>]) -> Result<Option<Self>> {
        let Some(first) = points.first() else {
            return Ok(None);
        };
        let mut bounds = Self {
            min: first.clone(),
            max: first.clone(),
        };
        for point in &points[1..] {
            if point.len() != bounds.dimensions() {
                return Err(Error::dimension_mismatch(bounds.dimensions(), point.len(), "bounding box"));
            }
            for (d, v) in point.iter().enumerate() {
                bounds.min[d] = bounds.min[d].min(*v);
                bounds.max[d] = bounds.max[d].max(*v);
            }
        }
        Ok(Some(bounds))
    }

    pub fn dimensions(&self) -> usize {
        self.min.len()
    }

    /// `points_per_dimension` evenly spaced values per axis, endpoints included
    ///
    /// Points are ordered with the last dimension varying fastest.
    pub fn grid(&self, points_per_dimension: usize) -> Result<Vec<Vec<f64>>> {
        if points_per_dimension < 2 {
            return Err(Error::invalid_option(
                "score_grid_points_per_dimension",
                "a grid needs at least 2 points per dimension",
            ));
        }
        let dims = self.dimensions();
        let total = u32::try_from(dims)
            .ok()
            .and_then(|d| points_per_dimension.checked_pow(d))
            .filter(|n| *n <= MAX_GRID_POINTS)
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "grid of {}^{} points exceeds {}",
                    points_per_dimension, dims, MAX_GRID_POINTS
                ))
            })?;

        let steps: Vec<f64> = (0..dims)
            .map(|d| (self.max[d] - self.min[d]) / (points_per_dimension - 1) as f64)
            .collect();
        let mut grid = Vec::with_capacity(total);
        for index in 0..total {
            let mut rest = index;
            let mut point = vec![0.0; dims];
            for d in (0..dims).rev() {
                let k = rest % points_per_dimension;
                rest /= points_per_dimension;
                point[d] = self.min[d] + steps[d] * k as f64;
            }
            grid.push(point);
        }
        Ok(grid)
    }
}

#[derive(Debug, Clone)]
struct GridTarget {
    path: PathBuf,
    points_per_dimension: usize,
}

#[derive(Debug, Clone)]
struct MixtureTarget {
    directory: PathBuf,
    suffix: String,
}

/// Dumps scored grids and mixture parameters around an inner scorer
pub struct GridDumpingTransform<T: ScoredTransform> {
    inner: T,
    grid: Option<GridTarget>,
    mixture: Option<MixtureTarget>,
}

impl<T: ScoredTransform> GridDumpingTransform<T> {
    /// A decorator with no dump enabled; forwards only
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            grid: None,
            mixture: None,
        }
    }

    /// Enable the dumps named in `config`
    pub fn from_config(inner: T, config: &PipelineConfig) -> Self {
        let mut decorator = Self::new(inner);
        if let Some(file) = &config.dump_score_grid {
            decorator = decorator.with_grid_dump(
                config.dump_path(file),
                config.score_grid_points_per_dimension,
            );
        }
        if let Some(suffix) = &config.dump_mixture_components {
            decorator = decorator.with_mixture_dump(config.dump_directory.clone(), suffix.clone());
        }
        decorator
    }

    pub fn with_grid_dump(mut self, path: impl Into<PathBuf>, points_per_dimension: usize) -> Self {
        self.grid = Some(GridTarget {
            path: path.into(),
            points_per_dimension,
        });
        self
    }

    pub fn with_mixture_dump(mut self, directory: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        self.mixture = Some(MixtureTarget {
            directory: directory.into(),
            suffix: suffix.into(),
        });
        self
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }

    fn dump_grid(&self, target: &GridTarget, bounds: &BoundingBox) -> Result<()> {
        let model = self.inner.model();
        let scored = bounds
            .grid(target.points_per_dimension)?
            .into_iter()
            .map(|point| {
                let score = model.score(&point)?;
                Ok(ScoredPoint::new(point, score))
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(points = scored.len(), "scored grid");
        write_json(&target.path, &scored)
    }

    fn dump_mixture(&self, target: &MixtureTarget) -> Result<()> {
        let model = self.inner.model();
        let Some(mixture) = model.as_mixture() else {
            warn!(model = model.name(), "model has no mixture components, skipping dump");
            return Ok(());
        };
        let file = |prefix: &str| target.directory.join(format!("{}-{}", prefix, target.suffix));

        write_json(&file("weights"), &mixture.cluster_proportions())?;
        let covariances: Vec<_> = mixture.cluster_covariances().iter().map(matrix_data).collect();
        write_json(&file("covariances"), &covariances)?;
        let centers: Vec<_> = mixture.cluster_centers().iter().map(vector_data).collect();
        write_json(&file("centers"), &centers)
    }
}

impl<T: ScoredTransform> Stage for GridDumpingTransform<T> {
    type Input = Record;
    type Output = Record;

    fn initialize(&mut self) -> Result<()> {
        self.inner.initialize()
    }

    #[instrument(skip_all, fields(records = batch.len()))]
    fn consume(&mut self, batch: Vec<Record>) -> Result<()> {
        // Bounds come from the features before the batch moves into the scorer
        let bounds = match &self.grid {
            Some(_) => {
                let features = batch
                    .iter()
                    .map(|r| self.inner.features(r))
                    .collect::<Result<Vec<_>>>()?;
                BoundingBox::of(&features)?
            }
            None => None,
        };
        let empty = batch.is_empty();
        self.inner.consume(batch)?;
        if empty {
            return Ok(());
        }

        if let (Some(target), Some(bounds)) = (&self.grid, &bounds) {
            self.dump_grid(target, bounds)?;
        }
        if let Some(target) = &self.mixture {
            self.dump_mixture(target)?;
        }
        Ok(())
    }

    fn stream(&mut self) -> &mut ResultStream<Record> {
        self.inner.stream()
    }

    fn shutdown(&mut self) -> Result<()> {
        self.inner.shutdown()
    }
}

impl<T: ScoredTransform> ScoredTransform for GridDumpingTransform<T> {
    fn model(&self) -> &dyn BatchTrainScore {
        self.inner.model()
    }

    fn features(&self, record: &Record) -> Result<Vec<f64>> {
        self.inner.features(record)
    }
}
