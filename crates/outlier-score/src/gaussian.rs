//! Multivariate normal scoring
//!
//! Fits a single Gaussian (mean and sample covariance) and scores points by
//! squared Mahalanobis distance. Exposed as a one-component mixture so the
//! mixture dump decorator can report it.

use crate::model::{BatchTrainScore, MixtureModel};
use nalgebra::{DMatrix, DVector};
use outlier_core::{Error, Result};
use tracing::debug;

/// Ridge added to the diagonal when the sample covariance is singular
const RIDGE: f64 = 1e-6;

#[derive(Debug, Clone)]
struct Fit {
    mean: DVector<f64>,
    covariance: DMatrix<f64>,
    precision: DMatrix<f64>,
}

/// Single-component Gaussian model
#[derive(Debug, Clone, Default)]
pub struct GaussianModel {
    fit: Option<Fit>,
}

impl GaussianModel {
    pub fn new() -> Self {
        Self::default()
    }

    fn fitted(&self) -> Result<&Fit> {
        self.fit
            .as_ref()
            .ok_or_else(|| Error::Computation("Gaussian model scored before training".to_string()))
    }

    pub fn mean(&self) -> Option<&DVector<f64>> {
        self.fit.as_ref().map(|f| &f.mean)
    }

    pub fn covariance(&self) -> Option<&DMatrix<f64>> {
        self.fit.as_ref().map(|f| &f.covariance)
    }
}

impl BatchTrainScore for GaussianModel {
    fn train(&mut self, points: &[Vec<f64>]) -> Result<()> {
        if points.len() < 2 {
            return Err(Error::InsufficientData {
                expected: 2,
                actual: points.len(),
            });
        }
        let dims = points[0].len();
        if dims == 0 {
            return Err(Error::InvalidInput("cannot fit a zero-dimensional Gaussian".to_string()));
        }

        let mut mean = DVector::zeros(dims);
        for point in points {
            if point.len() != dims {
                return Err(Error::dimension_mismatch(dims, point.len(), "Gaussian fit"));
            }
            mean += DVector::from_column_slice(point);
        }
        mean /= points.len() as f64;

        let mut covariance = DMatrix::zeros(dims, dims);
        for point in points {
            let centered = DVector::from_column_slice(point) - &mean;
            covariance += &centered * centered.transpose();
        }
        covariance /= (points.len() - 1) as f64;

        let precision = match covariance.clone().try_inverse() {
            Some(inverse) => inverse,
            None => {
                debug!(dims, "singular covariance, regularizing");
                (&covariance + DMatrix::identity(dims, dims) * RIDGE)
                    .try_inverse()
                    .ok_or_else(|| Error::Computation("covariance is not invertible".to_string()))?
            }
        };

        self.fit = Some(Fit {
            mean,
            covariance,
            precision,
        });
        Ok(())
    }

    fn score(&self, point: &[f64]) -> Result<f64> {
        let fit = self.fitted()?;
        if point.len() != fit.mean.len() {
            return Err(Error::dimension_mismatch(fit.mean.len(), point.len(), "Gaussian score"));
        }
        let centered = DVector::from_column_slice(point) - &fit.mean;
        Ok((&fit.precision * &centered).dot(&centered))
    }

    fn name(&self) -> &'static str {
        "gaussian"
    }

    fn as_mixture(&self) -> Option<&dyn MixtureModel> {
        Some(self)
    }
}

impl MixtureModel for GaussianModel {
    fn cluster_proportions(&self) -> Vec<f64> {
        self.fit.as_ref().map_or_else(Vec::new, |_| vec![1.0])
    }

    fn cluster_centers(&self) -> Vec<DVector<f64>> {
        self.fit.iter().map(|f| f.mean.clone()).collect()
    }

    fn cluster_covariances(&self) -> Vec<DMatrix<f64>> {
        self.fit.iter().map(|f| f.covariance.clone()).collect()
    }
}
