//! Scoring model boundary
//!
//! The pipeline does not care how a score is computed. A model is trained on
//! one batch of feature vectors and then scores arbitrary points, higher
//! meaning more anomalous. Models built from mixtures can additionally expose
//! their parameters through [`MixtureModel`] for diagnostics.

use crate::gaussian::GaussianModel;
use crate::mad::MadModel;
use nalgebra::{DMatrix, DVector};
use outlier_core::{Result, TransformKind};

/// Train-then-score model over dense feature vectors
pub trait BatchTrainScore {
    /// Fit the model to `points`; replaces any previous fit
    fn train(&mut self, points: &[Vec<f64>]) -> Result<()>;

    /// Score one point against the last fit
    fn score(&self, point: &[f64]) -> Result<f64>;

    fn name(&self) -> &'static str;

    /// Mixture parameters, when the model has them
    fn as_mixture(&self) -> Option<&dyn MixtureModel> {
        None
    }
}

impl<M: BatchTrainScore + ?Sized> BatchTrainScore for Box<M> {
    fn train(&mut self, points: &[Vec<f64>]) -> Result<()> {
        (**self).train(points)
    }

    fn score(&self, point: &[f64]) -> Result<f64> {
        (**self).score(point)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn as_mixture(&self) -> Option<&dyn MixtureModel> {
        (**self).as_mixture()
    }
}

pub type BoxedModel = Box<dyn BatchTrainScore>;

/// Introspectable mixture parameters
pub trait MixtureModel {
    /// Mixing weight of each component
    fn cluster_proportions(&self) -> Vec<f64>;

    fn cluster_centers(&self) -> Vec<DVector<f64>>;

    fn cluster_covariances(&self) -> Vec<DMatrix<f64>>;
}

/// Build the model named by the configuration
pub fn model_for(kind: TransformKind) -> BoxedModel {
    match kind {
        TransformKind::Gaussian => Box::new(GaussianModel::new()),
        TransformKind::Mad => Box::new(MadModel::new()),
    }
}
